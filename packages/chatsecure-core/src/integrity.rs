//! # Message Integrity
//!
//! Tamper-evident SHA-256 binding of a stored message to its parties and
//! timestamp.
//!
//! ```text
//! hash = hex( SHA-256( body ‖ sender ‖ receiver ‖ isoformat(timestamp) ) )
//! ```
//!
//! Fields are concatenated in exactly this order with no delimiter. Hashes
//! already stored alongside messages were computed this way, so neither the
//! order nor the timestamp format may change.

use std::fmt;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The fields a message hash binds together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageBinding<'a> {
    /// Stored message body (the envelope text for encrypted messages)
    pub body: &'a str,
    /// Sender identifier
    pub sender: &'a str,
    /// Receiver or group identifier
    pub receiver: &'a str,
    /// Message timestamp
    pub timestamp: NaiveDateTime,
}

impl<'a> MessageBinding<'a> {
    /// Bind a message to its parties and timestamp
    pub fn new(body: &'a str, sender: &'a str, receiver: &'a str, timestamp: NaiveDateTime) -> Self {
        Self {
            body,
            sender,
            receiver,
            timestamp,
        }
    }

    /// The exact text that gets hashed
    pub fn canonical(&self) -> String {
        let ts = isoformat(&self.timestamp);
        let mut out = String::with_capacity(
            self.body.len() + self.sender.len() + self.receiver.len() + ts.len(),
        );
        out.push_str(self.body);
        out.push_str(self.sender);
        out.push_str(self.receiver);
        out.push_str(&ts);
        out
    }
}

/// Format a timestamp as `YYYY-MM-DDTHH:MM:SS[.ffffff]`
///
/// Microseconds are appended only when non-zero; sub-microsecond precision
/// is dropped.
pub fn isoformat(timestamp: &NaiveDateTime) -> String {
    let micros = (timestamp.nanosecond() % 1_000_000_000) / 1_000;
    let base = timestamp.format("%Y-%m-%dT%H:%M:%S");

    if micros == 0 {
        base.to_string()
    } else {
        format!("{}.{:06}", base, micros)
    }
}

/// SHA-256 of arbitrary text, hex encoded
pub fn hash_str(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}

/// Check text against a stored hash
pub fn verify_str(data: &str, expected_hash: &str) -> bool {
    hash_str(data) == expected_hash
}

/// Hash a message binding
pub fn hash(binding: &MessageBinding<'_>) -> String {
    hash_str(&binding.canonical())
}

/// Recompute a binding's hash and compare it with the stored one
pub fn verify(binding: &MessageBinding<'_>, expected_hash: &str) -> bool {
    hash(binding) == expected_hash
}

// ============================================================================
// BATCH VERIFICATION
// ============================================================================

/// A message row as handed over by the persistence layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Stored body (envelope text)
    pub message: String,
    /// Sender identifier
    pub sender: String,
    /// Receiver or group identifier
    pub receiver: String,
    /// Message timestamp
    pub timestamp: NaiveDateTime,
    /// Hash stored with the row
    pub hash: String,
}

impl StoredMessage {
    /// Borrow this row as a hash binding
    pub fn binding(&self) -> MessageBinding<'_> {
        MessageBinding::new(&self.message, &self.sender, &self.receiver, self.timestamp)
    }

    /// Check the row against its stored hash
    pub fn verify(&self) -> bool {
        verify(&self.binding(), &self.hash)
    }
}

/// Aggregate outcome of [`verify_batch`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Rows checked
    pub total: usize,
    /// Rows whose hash did not match
    pub failed: usize,
}

impl VerificationReport {
    /// True when every row matched
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.all_passed() {
            write!(f, "Hashes verified for {} items.", self.total)
        } else {
            write!(f, "Hashing failed for {}/{} items.", self.failed, self.total)
        }
    }
}

/// Verify a collection of stored rows
///
/// Every row is checked once; there is no retry and no early exit.
pub fn verify_batch<'a, I>(messages: I) -> VerificationReport
where
    I: IntoIterator<Item = &'a StoredMessage>,
{
    let report = messages
        .into_iter()
        .fold(VerificationReport::default(), |mut report, message| {
            report.total += 1;
            if !message.verify() {
                report.failed += 1;
            }
            report
        });

    if !report.all_passed() {
        tracing::warn!(
            failed = report.failed,
            total = report.total,
            "Stored message hash mismatch"
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(micro: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_micro_opt(14, 5, 7, micro)
            .unwrap()
    }

    fn stored(body: &str) -> StoredMessage {
        let timestamp = ts(0);
        StoredMessage {
            message: body.to_string(),
            sender: "alice".into(),
            receiver: "bob".into(),
            timestamp,
            hash: hash(&MessageBinding::new(body, "alice", "bob", timestamp)),
        }
    }

    #[test]
    fn test_isoformat() {
        assert_eq!(isoformat(&ts(0)), "2024-03-09T14:05:07");
        assert_eq!(isoformat(&ts(1)), "2024-03-09T14:05:07.000001");
        assert_eq!(isoformat(&ts(123_456)), "2024-03-09T14:05:07.123456");
    }

    #[test]
    fn test_known_vector() {
        // sha256("abc")
        assert_eq!(
            hash_str("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_concatenation_order() {
        let binding = MessageBinding::new("hi", "alice", "bob", ts(0));

        assert_eq!(binding.canonical(), "hialicebob2024-03-09T14:05:07");
        assert_eq!(hash(&binding), hash_str("hialicebob2024-03-09T14:05:07"));
    }

    #[test]
    fn test_deterministic_and_sensitive() {
        let base = MessageBinding::new("hi", "alice", "bob", ts(0));
        let h = hash(&base);

        assert_eq!(h, hash(&base));
        assert!(verify(&base, &h));
        assert_ne!(h, hash(&MessageBinding { body: "hi!", ..base }));
        assert_ne!(h, hash(&MessageBinding { sender: "alicf", ..base }));
        assert_ne!(h, hash(&MessageBinding { receiver: "bod", ..base }));
        assert_ne!(h, hash(&MessageBinding { timestamp: ts(1), ..base }));
    }

    #[test]
    fn test_verify_str() {
        let h = hash_str("payload");
        assert!(verify_str("payload", &h));
        assert!(!verify_str("payload", "deadbeef"));
    }

    #[test]
    fn test_batch_all_pass() {
        let rows = vec![stored("one"), stored("two"), stored("three")];
        let report = verify_batch(&rows);

        assert!(report.all_passed());
        assert_eq!(report.to_string(), "Hashes verified for 3 items.");
    }

    #[test]
    fn test_batch_reports_failures() {
        let mut rows = vec![stored("one"), stored("two"), stored("three")];
        rows[1].message.push('!');

        let report = verify_batch(&rows);
        assert_eq!(report, VerificationReport { total: 3, failed: 1 });
        assert_eq!(report.to_string(), "Hashing failed for 1/3 items.");
    }

    #[test]
    fn test_empty_batch() {
        let report = verify_batch(&Vec::<StoredMessage>::new());
        assert_eq!(report.total, 0);
        assert!(report.all_passed());
    }
}
