//! `BatchPreparer` and `BatchIngester`: the two halves of the caller-LLM
//! round trip that turns cluster members into persona samples (spec.md
//! §3, §4.6, §4.7). Prepared batches carry calibration anchors and a
//! schema contract; ingestion folds a completed batch back into the
//! [`voicecast_core::model::PersonaRegistry`] under a coverage gate.

pub mod calibration;
pub mod ingest;
pub mod prepare;

pub use ingest::{ingest, parse_batch};
pub use prepare::{coverage_report, find_cluster, prepare_batch, CoverageStatus};
