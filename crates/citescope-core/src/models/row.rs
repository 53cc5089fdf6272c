use super::{CitationHistogram, PaperRecord, YearWindow};

/// One ledger line: paper fields followed by citation counts in window order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub title: String,
    pub venue: String,
    pub year: String,
    pub path: String,
    pub paper_id: Option<String>,
    pub citations: Vec<Option<u32>>,
}

impl LedgerRow {
    pub fn new(paper: &PaperRecord, histogram: &CitationHistogram, window: &YearWindow) -> Self {
        Self {
            title: paper.title.clone(),
            venue: paper.venue.clone(),
            year: paper.year.clone(),
            path: paper.path.to_string_lossy().into_owned(),
            paper_id: paper.paper_id.clone(),
            citations: histogram.project(window),
        }
    }

    /// CSV fields; `None` becomes an empty cell.
    pub fn to_record(&self) -> Vec<String> {
        let mut record = vec![
            self.title.clone(),
            self.venue.clone(),
            self.year.clone(),
            self.path.clone(),
            self.paper_id.clone().unwrap_or_default(),
        ];
        record.extend(
            self.citations
                .iter()
                .map(|count| count.map(|c| c.to_string()).unwrap_or_default()),
        );
        record
    }
}
