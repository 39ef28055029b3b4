// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hybrid memory search for the Hearth agent runtime.
//!
//! - **MemoryStore**: FTS5 (BM25) and BLOB-vector candidate retrieval over
//!   the message log and memory chunks
//! - **HybridRetriever**: vector + lexical search merged with reciprocal rank
//!   fusion, relevance gating and token packing
//! - **Reindexer**: embedding backfill driven by the `reindex` command

pub mod fusion;
pub mod reindex;
pub mod retriever;
pub mod store;
pub mod types;

pub use fusion::{RRF_K, reciprocal_rank_fusion};
pub use reindex::Reindexer;
pub use retriever::HybridRetriever;
pub use store::MemoryStore;
pub use types::Candidate;
