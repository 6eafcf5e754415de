//! Roster repository metrics
//!
//! # Overview
//!
//! A roster is a static list of students, each optionally holding a reference
//! to a GitHub repository (a full URL or an `owner/repo` shorthand).
//! The library enriches such a roster with live metrics pulled from the
//! hosting API: total commit count, the most recent commit and an estimated
//! lines-of-code figure.
//!
//! Enrichment has to work under the API's rate limits, so rows are processed
//! in fixed-size batches with a pacing delay between batches; the batch size
//! and the delay depend on whether an access token is present.
//! All rows within a batch are fetched concurrently and a failure of any
//! single row never aborts its siblings.
//! After every batch the accumulated results are merged back into the roster
//! by stable per-row identity and the merged snapshot is emitted, so a
//! consumer can render incremental progress while later batches are still
//! running.

#[cfg(feature = "api")]
pub mod api;

#[cfg(feature = "aggregator")]
pub mod debounce;
#[cfg(feature = "aggregator")]
pub mod merge;
#[cfg(feature = "aggregator")]
pub mod roster;
#[cfg(feature = "aggregator")]
pub mod scheduler;
