//! Small diff helpers used when comparing planned and remote values.
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime};

mod tags;
pub use tags::*;


/// How a timestamp is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeLayout {
    /// eg. `2024-04-19T23:00:13.000Z`
    Rfc3339,
    /// A `chrono` format string. Without an offset in the format the time
    /// is read as UTC.
    Format(&'static str),
}

impl TimeLayout {
    /// Nanoseconds since the Unix epoch, or `None` if `s` does not follow
    /// this layout.
    fn parse_nanos(&self, s: &str) -> Option<i128> {
        let (secs, nanos) = match self {
            TimeLayout::Rfc3339 => {
                let t = DateTime::parse_from_rfc3339(s).ok()?;
                (t.timestamp(), t.timestamp_subsec_nanos())
            }
            TimeLayout::Format(fmt) => match DateTime::parse_from_str(s, fmt) {
                Ok(t) => (t.timestamp(), t.timestamp_subsec_nanos()),
                Err(_) => {
                    let t = NaiveDateTime::parse_from_str(s, fmt).ok()?.and_utc();
                    (t.timestamp(), t.timestamp_subsec_nanos())
                }
            },
        };
        Some(secs as i128 * NANOS_PER_SEC + nanos as i128)
    }
}

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Seconds from 0001-01-01T00:00:00Z to the Unix epoch. Rounding is done
/// relative to year one.
const YEAR_ONE_TO_UNIX_SECS: i128 = 62_135_596_800;

/// Round `nanos` (since the Unix epoch) to the nearest multiple of
/// `interval`. Halfway values round up. A zero interval leaves the value
/// unchanged.
pub fn round_nanos(nanos: i128, interval: std::time::Duration) -> i128 {
    let d = interval.as_nanos() as i128;
    if d <= 0 {
        return nanos;
    }
    let since_year_one = nanos + YEAR_ONE_TO_UNIX_SECS * NANOS_PER_SEC;
    let r = since_year_one.rem_euclid(d);
    if r + r < d {
        nanos - r
    } else {
        nanos + (d - r)
    }
}

/// Returns a diff suppressor that treats two timestamps as equal when they
/// round to the same instant at `interval`.
///
/// The returned function takes the attribute key, the old value and the new
/// value. Values that do not parse are never equivalent.
pub fn suppress_equivalent_rounded_time(
    layout: TimeLayout,
    interval: std::time::Duration,
) -> impl Fn(&str, &str, &str) -> bool {
    move |key: &str, old: &str, new: &str| {
        let (Some(old), Some(new)) = (layout.parse_nanos(old), layout.parse_nanos(new)) else {
            log::trace!("{key}: not a timestamp, not suppressing");
            return false;
        };
        round_nanos(old, interval) == round_nanos(new, interval)
    }
}

/// The result of [`diff_string_maps`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StringMapDiff {
    /// Entries of the new map that are missing from the old one or differ.
    pub create: BTreeMap<String, String>,
    /// Entries of the old map that are missing from the new one or differ.
    pub remove: BTreeMap<String, String>,
    /// Entries equal in both.
    pub unchanged: BTreeMap<String, String>,
}

/// Compare two string maps.
///
/// A key whose value changed shows up in both `create` (new value) and
/// `remove` (old value).
pub fn diff_string_maps(
    old: &BTreeMap<String, String>,
    new: &BTreeMap<String, String>,
) -> StringMapDiff {
    let mut diff = StringMapDiff {
        create: new.clone(),
        ..Default::default()
    };
    for (k, v) in old.iter() {
        if diff.create.get(k) == Some(v) {
            diff.create.remove(k);
            diff.unchanged.insert(k.clone(), v.clone());
        } else {
            diff.remove.insert(k.clone(), v.clone());
        }
    }
    diff
}
