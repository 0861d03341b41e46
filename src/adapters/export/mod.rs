//! Export adapters. Tables to CSV files.

pub mod csv_export;

pub use csv_export::CsvExporter;
