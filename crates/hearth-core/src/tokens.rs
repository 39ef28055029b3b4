// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic approximate token counting.
//!
//! The estimate is provider-agnostic: roughly four characters per token,
//! plus a fixed overhead per chat message for role and framing.

use crate::types::ChatMessage;

/// Characters per token used by the estimator.
const CHARS_PER_TOKEN: usize = 4;

/// Fixed per-message overhead (role, separators).
pub const MESSAGE_OVERHEAD: usize = 4;

/// Estimates the token count of a string.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Estimates the token count of one chat message including tool payloads.
pub fn message_tokens(message: &ChatMessage) -> usize {
    let mut total = MESSAGE_OVERHEAD;
    if let Some(content) = &message.content {
        total += estimate_tokens(content);
    }
    if let Some(calls) = &message.tool_calls {
        for call in calls {
            total += estimate_tokens(&call.name) + estimate_tokens(&call.arguments);
        }
    }
    if let Some(id) = &message.tool_call_id {
        total += estimate_tokens(id);
    }
    total
}

/// Estimates the token count of a whole prompt.
pub fn messages_tokens(messages: &[ChatMessage]) -> usize {
    messages.iter().map(message_tokens).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_text_is_zero_tokens() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn rounds_up_partial_tokens() {
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn message_includes_overhead() {
        let msg = ChatMessage::user("abcd");
        assert_eq!(message_tokens(&msg), MESSAGE_OVERHEAD + 1);
    }

    proptest! {
        #[test]
        fn estimate_is_monotonic_in_length(a in ".{0,64}", b in ".{0,64}") {
            let joined = format!("{a}{b}");
            prop_assert!(estimate_tokens(&joined) >= estimate_tokens(&a));
        }
    }
}
