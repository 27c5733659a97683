pub mod cluster;
pub mod context;
pub mod filtered;
pub mod linkedin;
pub mod persona;
pub mod raw;
pub mod state;
pub mod validation;

pub use cluster::{Cluster, ClusterAlgorithm, ClusterRun};
pub use context::{Audience, MessageContext, RecipientType, Seniority, ThreadPosition, TimeOfDay};
pub use filtered::{EnrichedMessage, FilteredMessage, RejectionRecord};
pub use linkedin::{EditorialVoice, LinkedInExample, LinkedInPersona};
pub use persona::{
    BatchFile, ClusterCoverage, Persona, PersonaExample, PersonaRegistry, SampleAnalysis,
    StructuralAnalysis,
};
pub use raw::{RawEmail, RawLinkedInPost, RawMessage};
pub use state::{Phase, PhaseMeta, WorkflowState};
pub use validation::{
    SuggestionRecord, UserFeedback, ValidationPair, ValidationReport, ValidationResult,
};
