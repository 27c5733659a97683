//! Shared data model, artefact paths, atomic persistence, and error types
//! for the voicecast pipeline crates.

pub mod atomic_io;
pub mod error;
pub mod ids;
pub mod model;
pub mod paths;
pub mod tone;

pub use error::PipelineError;
pub use ids::{ClusterId, MessageId};
pub use paths::DataPaths;
pub use tone::ToneVector;
