pub mod chemistry;
pub mod composition;
pub mod domain;
pub mod error;
pub mod spatial;
pub mod units;
