pub mod report;
pub mod research_state;
pub mod tone;

pub use report::{
    OutcomeStatus, PublishFormat, PublishFormats, PublishMetadata, PublishOutcome,
    ReportArtifact, ReportMetadata,
};
pub use research_state::{ReportHeaders, ResearchEntry, ResearchState};
pub use tone::Tone;
