//! Content availability checks for annexed files.
//!
//! An archived item can be unknown, known only by reference (an annex link
//! whose object is not present locally), or present with its bytes.

pub mod error;
pub mod oracle;
pub mod scan;

pub use error::ContentError;
pub use oracle::{ContentOracle, ContentProbe, ContentStatus, LocalProbe};
pub use scan::{scan, ScanReport};
