//! Web discovery and acquisition.
//!
//! - Page source trait and WebDriver-backed implementation (`browser`)
//! - HTML to plain text extraction (`extract`)
//! - Single page fetch into a [`SourceDocument`](sift_common::SourceDocument) (`fetch`)
//! - Search result page scraping (`search`)
//! - Concurrent collection of the top results (`collect`)

pub mod browser;
pub mod collect;
pub mod extract;
pub mod fetch;
pub mod search;

pub use browser::{DriverPageSource, PageSource};
pub use collect::{Collection, DocumentCollector, ResultCollector};
pub use fetch::{FetchFailure, PageFetcher};
pub use search::{SearchEngine, SerpSearch};
