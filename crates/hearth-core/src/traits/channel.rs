// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery to the chat front-end.

use async_trait::async_trait;

use crate::error::HearthError;
use crate::types::OutboundEnvelope;

/// Pushes replies to whichever front-end is currently connected.
#[async_trait]
pub trait OutboundSink: Send + Sync {
    async fn push(&self, envelope: OutboundEnvelope) -> Result<(), HearthError>;
}
