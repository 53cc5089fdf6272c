//! Append-only CSV ledger.
//!
//! Rows are written once and never rewritten. The set of titles already present
//! is read once at startup into [`KnownTitles`] and is not refreshed while
//! appending, so two runs against the same file must not overlap.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Writer, WriterBuilder};
use tracing::{debug, info};

use crate::config::TitleMatch;
use crate::error::{CitescopeError, Result};
use crate::models::{LedgerRow, YearWindow};

const TITLE_COLUMN: &str = "title";

/// Column names: paper fields, then one `citations_<year>` per window year.
pub fn ledger_header(window: &YearWindow) -> Vec<String> {
    let mut header = vec![
        TITLE_COLUMN.to_string(),
        "venue_published".to_string(),
        "year_published".to_string(),
        "pdf_path".to_string(),
        "semanticscholar_id".to_string(),
    ];
    header.extend(window.iter().map(|year| format!("citations_{year}")));
    header
}

// ─── KnownTitles ──────────────────────────────────────────────────────────────

/// Snapshot of titles recorded in the ledger.
#[derive(Debug, Clone, Default)]
pub struct KnownTitles {
    titles: Vec<String>,
    exact: HashSet<String>,
    mode: TitleMatch,
}

impl KnownTitles {
    pub fn new<I>(titles: I, mode: TitleMatch) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let titles: Vec<String> = titles.into_iter().collect();
        let exact = titles.iter().cloned().collect();
        Self {
            titles,
            exact,
            mode,
        }
    }

    /// In [`TitleMatch::Substring`] mode this is true when any recorded title
    /// contains `title`, so "Deep" is reported present once "Deep Sets" is
    /// recorded.
    pub fn contains(&self, title: &str) -> bool {
        match self.mode {
            TitleMatch::Substring => self.titles.iter().any(|known| known.contains(title)),
            TitleMatch::Exact => self.exact.contains(title),
        }
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

/// Read the `title` column of an existing ledger. A missing file yields no titles.
pub fn read_known_titles(path: &Path, mode: TitleMatch) -> Result<KnownTitles> {
    if !path.exists() {
        debug!(path = %path.display(), "ledger not found, starting empty");
        return Ok(KnownTitles::new(Vec::new(), mode));
    }

    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Ok(KnownTitles::new(Vec::new(), mode));
    }
    let title_idx = headers
        .iter()
        .position(|h| h.trim() == TITLE_COLUMN)
        .ok_or_else(|| {
            CitescopeError::LedgerFormat(format!(
                "{} has no '{TITLE_COLUMN}' column",
                path.display()
            ))
        })?;

    let mut titles = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(title) = record.get(title_idx) {
            titles.push(title.to_string());
        }
    }

    info!(path = %path.display(), titles = titles.len(), "loaded ledger snapshot");
    Ok(KnownTitles::new(titles, mode))
}

// ─── LedgerWriter ─────────────────────────────────────────────────────────────

/// Holds the ledger open in append mode for the life of a run.
pub struct LedgerWriter {
    path: PathBuf,
    writer: Writer<File>,
    columns: usize,
    appended: usize,
}

impl LedgerWriter {
    /// Open `path` for appending, writing the header first if the file has no
    /// records yet (missing, empty, or blank lines only).
    ///
    /// An existing header must have the column count implied by `window`.
    pub fn open(path: &Path, window: &YearWindow) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let header = ledger_header(window);
        let has_records = path.exists() && check_existing_header(path, &header)?;

        let file = if has_records {
            let mut file = OpenOptions::new().read(true).append(true).open(path)?;
            if !ends_with_newline(&mut file)? {
                debug!(path = %path.display(), "terminating last ledger line");
                file.write_all(b"\n")?;
            }
            file
        } else {
            File::create(path)?
        };

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if !has_records {
            writer.write_record(&header)?;
            writer.flush()?;
            info!(path = %path.display(), "created ledger");
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            columns: header.len(),
            appended: 0,
        })
    }

    /// Write one row and flush it to disk.
    pub fn append(&mut self, row: &LedgerRow) -> Result<()> {
        let record = row.to_record();
        if record.len() != self.columns {
            return Err(CitescopeError::LedgerFormat(format!(
                "row for '{}' has {} fields, ledger has {} columns",
                row.title,
                record.len(),
                self.columns
            )));
        }
        self.writer.write_record(&record)?;
        self.writer.flush()?;
        self.appended += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended through this writer.
    pub fn appended(&self) -> usize {
        self.appended
    }
}

/// `Ok(false)` when the file holds no records at all.
fn check_existing_header(path: &Path, expected: &[String]) -> Result<bool> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let Some(first) = reader.records().next() else {
        return Ok(false);
    };
    let first = first?;
    if first.len() != expected.len() || first.get(0) != Some(TITLE_COLUMN) {
        return Err(CitescopeError::LedgerFormat(format!(
            "{} header has {} column(s) starting with '{}', expected {}",
            path.display(),
            first.len(),
            first.get(0).unwrap_or_default(),
            expected.len()
        )));
    }
    Ok(true)
}

fn ends_with_newline(file: &mut File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CitationHistogram, PaperRecord};
    use tempfile::TempDir;

    fn row(title: &str, histogram: &CitationHistogram) -> LedgerRow {
        let paper = PaperRecord::new(title, "ICML2020", format!("pdfs/ICML2020/{title}.pdf"));
        LedgerRow::new(&paper, histogram, &YearWindow::default())
    }

    #[test]
    fn header_has_year_columns_newest_first() {
        let header = ledger_header(&YearWindow::default());
        assert_eq!(header.len(), 17);
        assert_eq!(header[4], "semanticscholar_id");
        assert_eq!(header[5], "citations_2024");
        assert_eq!(header[16], "citations_2013");
    }

    #[test]
    fn substring_mode_skips_titles_contained_in_recorded_ones() {
        let known = KnownTitles::new(
            vec!["Deep Sets".to_string(), "Neural ODEs".to_string()],
            TitleMatch::Substring,
        );

        assert!(known.contains("Deep Sets"));
        assert!(known.contains("Deep"));
        assert!(!known.contains("Deep Sets Revisited"));
    }

    #[test]
    fn exact_mode_requires_equality() {
        let known = KnownTitles::new(vec!["Deep Sets".to_string()], TitleMatch::Exact);

        assert!(known.contains("Deep Sets"));
        assert!(!known.contains("Deep"));
    }

    #[test]
    fn missing_ledger_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let known =
            read_known_titles(&dir.path().join("none.csv"), TitleMatch::Substring).unwrap();
        assert!(known.is_empty());
    }

    #[test]
    fn open_creates_header_then_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("ledger.csv");
        let window = YearWindow::default();

        {
            let mut writer = LedgerWriter::open(&path, &window).unwrap();
            writer
                .append(&row("Deep Sets", &CitationHistogram::from_years([Some(2020)])))
                .unwrap();
            assert_eq!(writer.appended(), 1);
        }
        {
            let mut writer = LedgerWriter::open(&path, &window).unwrap();
            writer
                .append(&row("Neural ODEs", &CitationHistogram::unknown(&window)))
                .unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("title,venue_published,year_published"));
        assert!(lines[1].starts_with("Deep Sets,ICML,2020,"));
        assert!(lines[1].ends_with(",0,0,0,0,1,0,0,0,0,0,0,0"));
        assert!(lines[2].ends_with(",,,,,,,,,,,,"));

        let known = read_known_titles(&path, TitleMatch::Exact).unwrap();
        assert_eq!(known.len(), 2);
        assert!(known.contains("Neural ODEs"));
    }

    #[test]
    fn titles_with_commas_survive_quoting() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        let window = YearWindow::default();

        let mut writer = LedgerWriter::open(&path, &window).unwrap();
        writer
            .append(&row("Sets, Graphs, and Groups", &CitationHistogram::default()))
            .unwrap();
        drop(writer);

        let known = read_known_titles(&path, TitleMatch::Exact).unwrap();
        assert!(known.contains("Sets, Graphs, and Groups"));
    }

    #[test]
    fn mismatched_header_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        fs::write(&path, "title,venue_published\nA,B\n").unwrap();

        let err = LedgerWriter::open(&path, &YearWindow::default()).err().unwrap();
        assert!(matches!(err, CitescopeError::LedgerFormat(_)));
    }

    #[test]
    fn ledger_without_title_column_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        fs::write(&path, "name,venue\nA,B\n").unwrap();

        let err = read_known_titles(&path, TitleMatch::Substring).unwrap_err();
        assert!(matches!(err, CitescopeError::LedgerFormat(_)));
    }

    #[test]
    fn blank_ledger_gets_header_before_first_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        fs::write(&path, "\n").unwrap();
        let window = YearWindow::default();

        {
            let mut writer = LedgerWriter::open(&path, &window).unwrap();
            writer
                .append(&row("Deep Sets", &CitationHistogram::default()))
                .unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("title,venue_published,year_published"));
        assert_eq!(contents.lines().count(), 2);

        let known = read_known_titles(&path, TitleMatch::Exact).unwrap();
        assert!(known.contains("Deep Sets"));
        assert!(LedgerWriter::open(&path, &window).is_ok());
    }

    #[test]
    fn unterminated_last_line_is_not_joined_with_next_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        let window = YearWindow::default();
        let mut existing = ledger_header(&window).join(",");
        existing.push_str("\nDeep Sets,ICML,2020,pdfs/ICML2020/Deep Sets.pdf,abc");
        existing.push_str(&",0".repeat(12));
        fs::write(&path, &existing).unwrap();

        {
            let mut writer = LedgerWriter::open(&path, &window).unwrap();
            writer
                .append(&row("Neural ODEs", &CitationHistogram::default()))
                .unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with(",abc,0,0,0,0,0,0,0,0,0,0,0,0"));
        assert!(lines[2].starts_with("Neural ODEs,"));

        let known = read_known_titles(&path, TitleMatch::Exact).unwrap();
        assert_eq!(known.len(), 2);
    }

    #[test]
    fn header_error_names_the_offending_first_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        let mut header = ledger_header(&YearWindow::default());
        header[0] = "name".to_string();
        fs::write(&path, format!("{}\n", header.join(","))).unwrap();

        let err = LedgerWriter::open(&path, &YearWindow::default()).err().unwrap();
        assert!(err.to_string().contains("starting with 'name'"));
    }
}
