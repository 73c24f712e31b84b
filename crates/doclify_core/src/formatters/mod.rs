//! Machine-readable output formatters.

mod sarif;

pub use sarif::generate_sarif;
