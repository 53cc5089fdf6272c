use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A paper found in the local corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: String,
    pub venue: String,
    /// Last four characters of the venue directory name.
    pub year: String,
    pub path: PathBuf,
    pub paper_id: Option<String>,
}

impl PaperRecord {
    pub fn new(title: impl Into<String>, venue_dir: &str, path: impl Into<PathBuf>) -> Self {
        let (venue, year) = split_venue_dir(venue_dir);
        Self {
            title: title.into(),
            venue,
            year,
            path: path.into(),
            paper_id: None,
        }
    }

    pub fn with_paper_id(mut self, paper_id: Option<String>) -> Self {
        self.paper_id = paper_id;
        self
    }
}

/// Split a `<venue><yyyy>` directory name into venue code and year.
///
/// Names of four characters or fewer yield an empty venue and the whole name as year.
pub fn split_venue_dir(name: &str) -> (String, String) {
    let chars: Vec<char> = name.chars().collect();
    let cut = chars.len().saturating_sub(4);
    let venue = chars[..cut].iter().collect();
    let year = chars[cut..].iter().collect();
    (venue, year)
}
