//! Ledger pipeline — resolve, fetch and append one row per new paper.
//!
//! Papers are handled strictly one after another in the order given. Titles
//! found in the [`KnownTitles`] snapshot are skipped without any lookup.

use std::sync::Arc;
use std::time::Duration;

use citescope_core::{
    AppConfig, CitationHistogram, KnownTitles, LedgerRow, LedgerWriter, PaperRecord, YearWindow,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::retry::{Pause, TokioPause};
use crate::sources::CitationLookup;

/// Pause for `pause` before the paper at every multiple of `every`
/// (0-indexed, skipped papers included). `every == 0` disables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Politeness {
    pub every: usize,
    pub pause: Duration,
}

impl Politeness {
    fn due(&self, index: usize) -> bool {
        self.every > 0 && index % self.every == 0
    }
}

impl Default for Politeness {
    fn default() -> Self {
        Self {
            every: 100,
            pause: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub window: YearWindow,
    pub politeness: Politeness,
}

impl PipelineOptions {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            window: config.year_window(),
            politeness: Politeness {
                every: config.run.politeness_every,
                pause: config.politeness_pause(),
            },
        }
    }
}

/// What happened to a single paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperOutcome {
    Recorded,
    /// No paper id; all citation columns project to 0.
    Unresolved,
    /// Paper id found but citations unavailable; citation columns are empty.
    FetchFailed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub scanned: usize,
    pub skipped: usize,
    pub appended: usize,
    pub unresolved: usize,
    pub fetch_failed: usize,
    pub politeness_pauses: usize,
    /// Citations counted under years with no ledger column.
    pub citations_outside_window: u64,
}

impl RunReport {
    fn record(&mut self, outcome: PaperOutcome) {
        self.appended += 1;
        match outcome {
            PaperOutcome::Recorded => {}
            PaperOutcome::Unresolved => self.unresolved += 1,
            PaperOutcome::FetchFailed => self.fetch_failed += 1,
        }
    }
}

pub struct CitationPipeline<L> {
    lookup: L,
    options: PipelineOptions,
    pause: Arc<dyn Pause>,
}

impl<L: CitationLookup> CitationPipeline<L> {
    pub fn new(lookup: L, options: PipelineOptions) -> Self {
        Self::with_pause(lookup, options, Arc::new(TokioPause))
    }

    pub fn with_pause(lookup: L, options: PipelineOptions, pause: Arc<dyn Pause>) -> Self {
        Self {
            lookup,
            options,
            pause,
        }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Process `papers` in order, appending a row for each one not in `known`.
    ///
    /// A transport fault aborts the run; rows already appended stay on disk.
    pub async fn run(
        &self,
        papers: &[PaperRecord],
        known: &KnownTitles,
        ledger: &mut LedgerWriter,
    ) -> Result<RunReport> {
        let total = papers.len();
        let mut report = RunReport {
            scanned: total,
            ..Default::default()
        };

        for (index, paper) in papers.iter().enumerate() {
            if self.options.politeness.due(index) {
                self.pause.pause(self.options.politeness.pause).await;
                report.politeness_pauses += 1;
            }

            if known.contains(&paper.title) {
                debug!(title = %paper.title, "already in ledger, skipping");
                report.skipped += 1;
                continue;
            }

            info!(position = index + 1, total, title = %paper.title, "processing paper");
            let (row, outcome, outside) = self.process(paper).await?;
            ledger.append(&row)?;
            report.record(outcome);
            report.citations_outside_window += u64::from(outside);
        }

        info!(
            scanned = report.scanned,
            skipped = report.skipped,
            appended = report.appended,
            unresolved = report.unresolved,
            fetch_failed = report.fetch_failed,
            "run finished"
        );
        Ok(report)
    }

    /// Resolve and fetch one paper; returns its row, outcome, and the number of
    /// citations that fell outside the year window.
    pub async fn process(&self, paper: &PaperRecord) -> Result<(LedgerRow, PaperOutcome, u32)> {
        let window = &self.options.window;

        let Some(id) = self.lookup.resolve_paper_id(&paper.title).await? else {
            let row = LedgerRow::new(paper, &CitationHistogram::default(), window);
            return Ok((row, PaperOutcome::Unresolved, 0));
        };

        let resolved = paper.clone().with_paper_id(Some(id.as_str().to_string()));
        let (histogram, outcome) = match self.lookup.fetch_histogram(&id).await? {
            Some(histogram) => (histogram, PaperOutcome::Recorded),
            None => (CitationHistogram::unknown(window), PaperOutcome::FetchFailed),
        };

        let outside = histogram.outside(window);
        if outside > 0 {
            warn!(
                title = %paper.title,
                paper_id = %id,
                outside,
                "citations outside the year window are not recorded"
            );
        }

        Ok((LedgerRow::new(&resolved, &histogram, window), outcome, outside))
    }
}

/// Papers that would be processed by [`CitationPipeline::run`].
pub fn pending<'a>(papers: &'a [PaperRecord], known: &KnownTitles) -> Vec<&'a PaperRecord> {
    papers
        .iter()
        .filter(|paper| !known.contains(&paper.title))
        .collect()
}
