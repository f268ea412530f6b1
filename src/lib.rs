pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod generator;
pub mod i18n;
pub mod llm;
pub mod progress;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, TaskConfig};
pub use errors::{ResearchError, Stage};
pub use generator::workflow::{ChiefEditor, RunOptions};
pub use progress::{ProgressEvent, ProgressReporter, ProgressSink};
pub use service::{EnvelopeStatus, ResearchEnvelope, ResearchService, SourcesEnvelope};
pub use types::{PublishOutcome, ResearchState, Tone};
pub use utils::CancellationToken;
