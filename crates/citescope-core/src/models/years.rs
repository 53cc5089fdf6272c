use serde::{Deserialize, Serialize};

/// Fixed, contiguous range of publication years, newest first.
///
/// This is the column order of the ledger: `newest, newest - 1, ...`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWindow {
    years: Vec<i32>,
}

impl YearWindow {
    pub fn new(newest: i32, count: usize) -> Self {
        let years = (0..count).map(|offset| newest - offset as i32).collect();
        Self { years }
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn contains(&self, year: i32) -> bool {
        self.years.contains(&year)
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.iter().copied()
    }
}

impl Default for YearWindow {
    fn default() -> Self {
        Self::new(2024, 12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_2024_down_to_2013() {
        let window = YearWindow::default();
        assert_eq!(window.len(), 12);
        assert_eq!(
            window.years(),
            &[2024, 2023, 2022, 2021, 2020, 2019, 2018, 2017, 2016, 2015, 2014, 2013]
        );
        assert!(window.contains(2013));
        assert!(!window.contains(2012));
    }
}
