pub mod ledger;
pub mod scan;
