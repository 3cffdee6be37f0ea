//! Aggregate reporting over the ledger
//!
//! Reports take a validated [`ReportFilter`] and produce a [`ReportTable`];
//! rendering the table is left to the caller.

pub mod dimension;
pub mod dump;
pub mod filter;
pub mod reports;
pub mod table;

pub use dimension::Dimension;
pub use dump::{dump_tables, write_dump};
pub use filter::{DateRange, FilterParams, ReportFilter};
pub use reports::{attendance_table, locations_table, Aggregator};
pub use table::{Cell, Column, ReportTable};
