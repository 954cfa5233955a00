//! Human-facing booking references and payment transaction ids.
//!
//! Both are uppercase alphanumeric tokens built from a millisecond timestamp, a
//! per-process sequence and a random suffix. The prefixes differ so the two can
//! never be confused: `BK...` for bookings, `TXN...` for transactions.

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

pub const BOOKING_REFERENCE_PREFIX: &str = "BK";
pub const TRANSACTION_ID_PREFIX: &str = "TXN";

const RANDOM_SUFFIX_LEN: usize = 8;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

pub fn generate_booking_reference() -> String {
    generate(BOOKING_REFERENCE_PREFIX)
}

pub fn generate_transaction_id() -> String {
    generate(TRANSACTION_ID_PREFIX)
}

fn generate(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed) % (36 * 36);
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect();

    format!("{}{}{:0>2}{}", prefix, base36(millis), base36(seq), suffix)
}

fn base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_prefixes_are_distinct() {
        let reference = generate_booking_reference();
        let txn = generate_transaction_id();

        assert!(reference.starts_with("BK"));
        assert!(txn.starts_with("TXN"));
        assert!(reference.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(txn.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_references_do_not_collide() {
        let refs: HashSet<String> = (0..5000).map(|_| generate_booking_reference()).collect();
        assert_eq!(refs.len(), 5000);
    }

    #[test]
    fn test_base36() {
        assert_eq!(base36(0), "0");
        assert_eq!(base36(35), "Z");
        assert_eq!(base36(36), "10");
    }
}
