use async_trait::async_trait;
use citescope_core::CitationHistogram;

use crate::error::Result;

pub mod semantic_scholar;

use semantic_scholar::S2PaperId;

/// The two lookups the pipeline performs per paper.
///
/// `Ok(None)` means the lookup gave up (no hit, fatal status, or retries
/// exhausted) and has already been logged. `Err` is reserved for transport
/// faults, which abort the run.
#[async_trait]
pub trait CitationLookup: Send + Sync {
    async fn resolve_paper_id(&self, title: &str) -> Result<Option<S2PaperId>>;

    async fn fetch_histogram(&self, id: &S2PaperId) -> Result<Option<CitationHistogram>>;
}
