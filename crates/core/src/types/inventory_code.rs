//! Sequential, human-readable inventory codes (`RACIN0001`, `RACIN0002`, ...).

use chrono::{DateTime, Utc};

use super::InventoryId;

/// Prefix shared by every inventory code.
pub const INVENTORY_PREFIX: &str = "RACIN";

/// Width of the zero-padded numeric suffix.
pub const INVENTORY_SUFFIX_WIDTH: usize = 4;

/// Parse the numeric suffix of an inventory code.
///
/// Returns `None` for anything that is not the prefix followed by ASCII digits.
#[must_use]
pub fn parse_inventory_sequence(code: &str) -> Option<u64> {
    let digits = code.strip_prefix(INVENTORY_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Format an inventory code for a sequence number.
///
/// Sequences beyond the padded width simply grow wider (`RACIN10000`).
#[must_use]
pub fn format_inventory_code(sequence: u64) -> InventoryId {
    InventoryId::new(format!(
        "{INVENTORY_PREFIX}{sequence:0width$}",
        width = INVENTORY_SUFFIX_WIDTH
    ))
}

/// Fallback code used when no sequential code can be derived.
#[must_use]
pub fn fallback_inventory_code(now: DateTime<Utc>) -> InventoryId {
    InventoryId::new(format!("{INVENTORY_PREFIX}-T{}", now.timestamp_millis()))
}

/// Code to assign next, given every existing code.
///
/// The highest sequence is compared numerically, so `RACIN10000` follows
/// `RACIN9999` even though it sorts lower as a string. When codes exist but
/// none is sequential, or the sequence is exhausted, the timestamp fallback
/// is used. Returns the code and whether the fallback was used.
#[must_use]
pub fn next_inventory_code<'a>(
    existing: impl IntoIterator<Item = &'a str>,
    now: DateTime<Utc>,
) -> (InventoryId, bool) {
    let mut any = false;
    let mut highest: Option<u64> = None;
    for code in existing {
        any = true;
        if let Some(seq) = parse_inventory_sequence(code) {
            highest = highest.max(Some(seq));
        }
    }

    match highest {
        None if !any => (format_inventory_code(1), false),
        Some(seq) => seq.checked_add(1).map_or_else(
            || (fallback_inventory_code(now), true),
            |next| (format_inventory_code(next), false),
        ),
        None => (fallback_inventory_code(now), true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
    }

    #[test]
    fn test_first_code() {
        let (code, fallback) = next_inventory_code([], now());
        assert_eq!(code.as_str(), "RACIN0001");
        assert!(!fallback);
    }

    #[test]
    fn test_increments_highest() {
        let (code, _) = next_inventory_code(["RACIN0001"], now());
        assert_eq!(code.as_str(), "RACIN0002");

        let (code, _) = next_inventory_code(["RACIN0007", "RACIN0099", "RACIN0010"], now());
        assert_eq!(code.as_str(), "RACIN0100");
    }

    #[test]
    fn test_highest_is_numeric_past_padding() {
        let (code, _) = next_inventory_code(["RACIN9999"], now());
        assert_eq!(code.as_str(), "RACIN10000");

        // String order would pick RACIN9999 and hand out RACIN10000 twice.
        let (code, fallback) = next_inventory_code(["RACIN10000", "RACIN9999"], now());
        assert_eq!(code.as_str(), "RACIN10001");
        assert!(!fallback);
    }

    #[test]
    fn test_non_sequential_codes_are_ignored_when_sequential_exist() {
        let (code, fallback) =
            next_inventory_code(["legacy-42", "RACIN-T1600000000000", "RACIN0003"], now());
        assert_eq!(code.as_str(), "RACIN0004");
        assert!(!fallback);
    }

    #[test]
    fn test_unparseable_falls_back_to_timestamp() {
        let (code, fallback) = next_inventory_code(["CAM-001"], now());
        assert!(fallback);
        assert_eq!(code.as_str(), "RACIN-T1700000000000");
    }

    #[test]
    fn test_exhausted_sequence_falls_back_instead_of_overflowing() {
        let highest = format!("RACIN{}", u64::MAX);
        let (code, fallback) = next_inventory_code([highest.as_str()], now());
        assert!(fallback);
        assert_eq!(code.as_str(), "RACIN-T1700000000000");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_inventory_sequence("RACIN"), None);
        assert_eq!(parse_inventory_sequence("RACIN12a"), None);
        assert_eq!(parse_inventory_sequence("racin0001"), None);
        assert_eq!(parse_inventory_sequence("RACIN0042"), Some(42));
    }
}
