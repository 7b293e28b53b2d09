//! Click analytics
//!
//! Every successful redirect can be recorded as a `ClickEvent`. Events are
//! kept in a bounded per-link window next to running referrer, country and
//! browser counts. Recording happens under the same lock as the click
//! counter, so analytics never drift from the link they belong to.

pub mod browser;
pub mod models;

pub use browser::classify_browser;
pub use models::{ClickEvent, ClickStats, Visit};
