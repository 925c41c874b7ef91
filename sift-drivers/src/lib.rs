//! Driver layer for browser automation.
//!
//! This crate owns the WebDriver sessions used to render search results and
//! result pages. Sessions are opened once, pooled for the process lifetime,
//! and closed together on shutdown.
//!
//! - [`sift_browser::driver::SiftDriver`]: pooled `fantoccini` sessions
//! - [`sift_browser::page::SiftPage`]: one leased session with DOM helpers
//! - [`sift_browser::launch`]: Chrome launch arguments and capabilities
pub mod sift_browser;
