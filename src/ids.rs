// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document ids and parcel tracking numbers.

use crate::error::AppError;
use crate::time_utils::compact_date;
use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};

/// Fixed prefix of every tracking id.
pub const TRACKING_ID_PREFIX: &str = "PRCL";

const DOCUMENT_ID_BYTES: usize = 16;
const TRACKING_SUFFIX_BYTES: usize = 3;

fn random_bytes<const N: usize>() -> Result<[u8; N], AppError> {
    let mut bytes = [0u8; N];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("system RNG failure")))?;
    Ok(bytes)
}

/// New random document id (32 lowercase hex characters).
pub fn new_document_id() -> Result<String, AppError> {
    Ok(hex::encode(random_bytes::<DOCUMENT_ID_BYTES>()?))
}

/// New tracking id of the form `PRCL-YYYYMMDD-XXXXXX`.
///
/// Uniqueness is probabilistic: 24 random bits per creation day.
pub fn new_tracking_id(created_at: DateTime<Utc>) -> Result<String, AppError> {
    let suffix = hex::encode_upper(random_bytes::<TRACKING_SUFFIX_BYTES>()?);
    Ok(format!(
        "{}-{}-{}",
        TRACKING_ID_PREFIX,
        compact_date(created_at),
        suffix
    ))
}

/// Whether `value` has the shape produced by [`new_tracking_id`].
pub fn is_tracking_id(value: &str) -> bool {
    let mut parts = value.split('-');
    let (Some(prefix), Some(date), Some(suffix), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    prefix == TRACKING_ID_PREFIX
        && date.len() == 8
        && date.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == TRACKING_SUFFIX_BYTES * 2
        && suffix
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn tracking_id_has_expected_shape() {
        let date = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let id = new_tracking_id(date).unwrap();

        assert!(id.starts_with("PRCL-20261016-"), "got {id}");
        assert!(is_tracking_id(&id), "got {id}");
    }

    #[test]
    fn is_tracking_id_rejects_malformed() {
        assert!(!is_tracking_id("PRCL-20261016-abcdef"));
        assert!(!is_tracking_id("PRCL-2026101-ABCDEF"));
        assert!(!is_tracking_id("PKG-20261016-ABCDEF"));
        assert!(!is_tracking_id("PRCL-20261016-ABCDEF-00"));
    }

    #[test]
    fn document_ids_are_distinct_hex() {
        let a = new_document_id().unwrap();
        let b = new_document_id().unwrap();
        assert_eq!(a.len(), 32);
        assert!(a.bytes().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
