//! Run counters for the monitor.
//!
//! Recorded through the `metrics` facade; without an installed recorder
//! (the default for a one-shot run) these are no-ops.

use metrics::{counter, gauge};

pub const PAGES_FETCHED_TOTAL: &str = "twofa_monitor_pages_fetched_total";
pub const FLAGGED_MEMBERS: &str = "twofa_monitor_flagged_members";
pub const EMAILS_TOTAL: &str = "twofa_monitor_emails_total";

/// Record one successfully decoded member page.
pub fn record_page_fetch() {
    counter!(PAGES_FETCHED_TOTAL).increment(1);
}

/// Record the size of a completed audit.
pub fn record_flagged_members(count: usize) {
    gauge!(FLAGGED_MEMBERS).set(count as f64);
}

/// Record one delivery attempt; `status` is `sent` or `failed`.
pub fn record_email(status: &'static str) {
    counter!(EMAILS_TOTAL, "status" => status).increment(1);
}
