//! Transaction UID generation
//!
//! Layout: `<root>.<device type>.<device serial>.<process id>.<YYYYMMDD>.<HHMMSS>.<counter>`.
//! The counter wraps, so UIDs are distinguishing on a best-effort basis only and
//! carry no randomness. Components are printed as plain integers, which drops
//! the leading zero of early-morning times to keep the UID valid.

use std::sync::atomic::{AtomicU16, Ordering};

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use tracing::warn;

/// Longest UID allowed by PS3.5
pub const MAX_UID_LENGTH: usize = 64;

#[derive(Debug)]
pub struct TransactionUidGenerator {
    root: String,
    device_type: u16,
    device_serial: u32,
    process_id: u32,
    counter: AtomicU16,
}

impl TransactionUidGenerator {
    pub fn new(root: impl Into<String>, device_type: u16, device_serial: u32) -> Self {
        Self {
            root: root.into(),
            device_type,
            device_serial,
            process_id: std::process::id(),
            counter: AtomicU16::new(1),
        }
    }

    /// Generate the next transaction UID using the local clock
    pub fn next_uid(&self) -> String {
        self.next_uid_at(&Local::now())
    }

    pub fn next_uid_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> String {
        let counter = self.counter.fetch_add(1, Ordering::Relaxed);
        let date = now.year() as u32 * 10_000 + now.month() * 100 + now.day();
        let time = now.hour() * 10_000 + now.minute() * 100 + now.second();

        let uid = format!(
            "{}.{}.{}.{}.{}.{}.{}",
            self.root, self.device_type, self.device_serial, self.process_id, date, time, counter
        );
        if uid.len() > MAX_UID_LENGTH {
            warn!(
                "Transaction UID {} is {} characters long, peers may reject it",
                uid,
                uid.len()
            );
        }
        uid
    }
}
