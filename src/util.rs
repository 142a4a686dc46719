// src/util.rs

//! Small shared helpers

use chrono::Local;

/// Timestamp used in snapshot labels, registry entries, and log file names.
pub fn now_stamp() -> String {
    Local::now().format("%Y%m%d-%H%M%S").to_string()
}
