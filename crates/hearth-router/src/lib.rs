// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model routing for the Hearth agent.
//!
//! This crate provides:
//! - [`parse_model_key`]: splits `provider/model` keys
//! - [`ModelRouter`]: resolves keys against the catalog and sends requests
//!   through a retrying client with an ordered fallback chain
//!
//! Any model id may be used as long as its provider is configured and the
//! `provider/model` key is listed in the catalog.

pub mod retry;
pub mod router;

pub use retry::RetryPolicy;
pub use router::{ModelRouter, parse_model_key};
