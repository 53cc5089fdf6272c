//! Per-year citation counts.
//!
//! Two cases must stay distinguishable until the histogram is projected onto a
//! [`YearWindow`]:
//!
//! * a *counted* histogram, where a year with no entry means zero citations, and
//! * an *unknown* histogram, where every window year is explicitly `None`.
//!
//! [`CitationHistogram::project`] applies the default-on-missing policy: an
//! absent year becomes `Some(0)` while an explicit `None` stays `None`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::YearWindow;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationHistogram {
    counts: BTreeMap<i32, Option<u32>>,
    /// Citations reported without a publication year.
    undated: u32,
}

impl CitationHistogram {
    /// Count one occurrence per citation under its reported year.
    ///
    /// Years outside any window are kept; they simply never surface in a
    /// projection.
    pub fn from_years<I>(years: I) -> Self
    where
        I: IntoIterator<Item = Option<i32>>,
    {
        let mut histogram = Self::default();
        for year in years {
            match year {
                Some(year) => {
                    let slot = histogram.counts.entry(year).or_insert(Some(0));
                    *slot = Some(slot.unwrap_or(0) + 1);
                }
                None => histogram.undated += 1,
            }
        }
        histogram
    }

    /// Every year of `window` mapped to "no data".
    pub fn unknown(window: &YearWindow) -> Self {
        Self {
            counts: window.iter().map(|year| (year, None)).collect(),
            undated: 0,
        }
    }

    /// `None` when the year has no entry, `Some(None)` when it is explicitly unknown.
    pub fn get(&self, year: i32) -> Option<Option<u32>> {
        self.counts.get(&year).copied()
    }

    pub fn undated(&self) -> u32 {
        self.undated
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty() && self.undated == 0
    }

    /// True when at least one year is explicitly unknown.
    pub fn has_unknown(&self) -> bool {
        self.counts.values().any(Option::is_none)
    }

    /// Total citations counted under years outside `window`.
    pub fn outside(&self, window: &YearWindow) -> u32 {
        self.counts
            .iter()
            .filter(|(year, _)| !window.contains(**year))
            .filter_map(|(_, count)| *count)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, Option<u32>)> + '_ {
        self.counts.iter().map(|(year, count)| (*year, *count))
    }

    /// Values in window order; missing years default to `Some(0)`.
    pub fn project(&self, window: &YearWindow) -> Vec<Option<u32>> {
        window
            .iter()
            .map(|year| self.get(year).unwrap_or(Some(0)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_citations_per_year() {
        let histogram = CitationHistogram::from_years([Some(2020), Some(2020), Some(2019)]);

        assert_eq!(histogram.get(2020), Some(Some(2)));
        assert_eq!(histogram.get(2019), Some(Some(1)));
        assert_eq!(histogram.get(2021), None);
        assert_eq!(histogram.iter().count(), 2);
    }

    #[test]
    fn projection_defaults_missing_years_to_zero() {
        let window = YearWindow::default();
        let histogram = CitationHistogram::from_years([Some(2020), Some(2020), Some(2019)]);

        let projected = histogram.project(&window);

        assert_eq!(projected.len(), 12);
        assert_eq!(projected[4], Some(2)); // 2020
        assert_eq!(projected[5], Some(1)); // 2019
        assert_eq!(projected.iter().filter(|v| **v == Some(0)).count(), 10);
    }

    #[test]
    fn unknown_histogram_projects_to_null() {
        let window = YearWindow::default();
        let histogram = CitationHistogram::unknown(&window);

        for year in window.iter() {
            assert_eq!(histogram.get(year), Some(None));
        }
        assert!(histogram.has_unknown());
        assert!(histogram.project(&window).iter().all(Option::is_none));
    }

    #[test]
    fn out_of_window_and_undated_are_kept_but_not_projected() {
        let window = YearWindow::default();
        let histogram =
            CitationHistogram::from_years([Some(1999), Some(2030), None, None, Some(2024)]);

        assert_eq!(histogram.get(1999), Some(Some(1)));
        assert_eq!(histogram.undated(), 2);
        assert_eq!(histogram.outside(&window), 2);
        assert_eq!(histogram.project(&window).iter().flatten().sum::<u32>(), 1);
    }

    #[test]
    fn empty_histogram_projects_to_zeros() {
        let window = YearWindow::default();
        let histogram = CitationHistogram::default();

        assert!(histogram.is_empty());
        assert!(histogram.project(&window).iter().all(|v| *v == Some(0)));
    }
}
