//! citescope science — Semantic Scholar lookups, bounded retry, ledger pipeline.

pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod retry;
pub mod sources;

pub use config::ScholarConfig;
pub use error::{Result, ScienceError};
pub use pipeline::{CitationPipeline, PaperOutcome, PipelineOptions, Politeness, RunReport, pending};
pub use retry::{Pause, RecordingPause, RetryDecision, RetryOutcome, RetryPolicy, TokioPause};
pub use sources::CitationLookup;
pub use sources::semantic_scholar::{S2PaperId, SemanticScholarSource};
