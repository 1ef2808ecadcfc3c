pub mod report;
pub mod scenarios;
