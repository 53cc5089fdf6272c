pub mod histogram;
pub mod paper;
pub mod row;
pub mod years;

pub use histogram::CitationHistogram;
pub use paper::PaperRecord;
pub use row::LedgerRow;
pub use years::YearWindow;
