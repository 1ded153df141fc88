//! Clock helpers and interval algebra.
//!
//! All intra-day scheduling runs on minutes since midnight. Parsing and
//! formatting of `HH:MM` strings lives here, along with the `TimeRange`
//! operations (overlap, clamp, merge, subtract) the availability builder
//! is made of.

use serde::{Deserialize, Serialize};

/// Parse an `HH:MM` string into minutes since midnight.
///
/// Returns `None` for anything that is not a two-field 24h clock time.
pub fn parse_hhmm(s: &str) -> Option<u32> {
    let mut parts = s.trim().splitn(2, ':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = parts.next()?.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(hour * 60 + minute)
}

/// Format minutes since midnight as `HH:MM`.
pub fn format_hhmm(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// A half-open interval of minutes since midnight: `[start_min, end_min)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_min: u32,
    pub end_min: u32,
}

impl TimeRange {
    /// Create a range. Returns `None` when the range would be empty.
    pub fn new(start_min: u32, end_min: u32) -> Option<Self> {
        if end_min <= start_min {
            return None;
        }
        Some(Self { start_min, end_min })
    }

    /// Parse a range from `"HH:MM-HH:MM"`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().splitn(2, '-');
        let start = parse_hhmm(parts.next()?)?;
        let end = parse_hhmm(parts.next()?)?;
        Self::new(start, end)
    }

    pub fn duration_min(&self) -> u32 {
        self.end_min - self.start_min
    }

    pub fn contains(&self, minute: u32) -> bool {
        minute >= self.start_min && minute < self.end_min
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start_min < other.end_min && other.start_min < self.end_min
    }

    /// Intersect with a window. `None` when nothing remains.
    pub fn clamp_to(&self, window: &TimeRange) -> Option<Self> {
        Self::new(
            self.start_min.max(window.start_min),
            self.end_min.min(window.end_min),
        )
    }
}

/// Sort ranges by start and merge the ones that touch or overlap.
pub fn merge_ranges(mut ranges: Vec<TimeRange>) -> Vec<TimeRange> {
    ranges.sort_by_key(|r| (r.start_min, r.end_min));
    let mut merged: Vec<TimeRange> = Vec::with_capacity(ranges.len());
    for r in ranges {
        match merged.last_mut() {
            Some(last) if r.start_min <= last.end_min => {
                last.end_min = last.end_min.max(r.end_min);
            }
            _ => merged.push(r),
        }
    }
    merged
}

/// Subtract a set of busy ranges from a window, yielding the ordered free
/// intervals. `busy` must already be merged and sorted.
pub fn subtract_ranges(window: &TimeRange, busy: &[TimeRange]) -> Vec<TimeRange> {
    let mut free = Vec::new();
    let mut cursor = window.start_min;
    for b in busy {
        if b.end_min <= cursor {
            continue;
        }
        if b.start_min >= window.end_min {
            break;
        }
        if b.start_min > cursor {
            if let Some(r) = TimeRange::new(cursor, b.start_min.min(window.end_min)) {
                free.push(r);
            }
        }
        cursor = cursor.max(b.end_min);
    }
    if cursor < window.end_min {
        if let Some(r) = TimeRange::new(cursor, window.end_min) {
            free.push(r);
        }
    }
    free
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_format_round_trip() {
        assert_eq!(parse_hhmm("09:00"), Some(540));
        assert_eq!(parse_hhmm("00:00"), Some(0));
        assert_eq!(parse_hhmm("23:59"), Some(1439));
        assert_eq!(format_hhmm(540), "09:00");
        assert_eq!(format_hhmm(1439), "23:59");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("12:60"), None);
        assert_eq!(parse_hhmm("noon"), None);
        assert_eq!(parse_hhmm(""), None);
        assert_eq!(parse_hhmm("9"), None);
    }

    #[test]
    fn range_parse() {
        let r = TimeRange::parse("13:00-14:00").unwrap();
        assert_eq!(r.start_min, 780);
        assert_eq!(r.end_min, 840);
        assert_eq!(r.duration_min(), 60);
        assert!(TimeRange::parse("14:00-13:00").is_none());
        assert!(TimeRange::parse("13:00").is_none());
    }

    #[test]
    fn merge_overlapping() {
        let merged = merge_ranges(vec![
            TimeRange::new(600, 660).unwrap(),
            TimeRange::new(640, 700).unwrap(),
            TimeRange::new(800, 860).unwrap(),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], TimeRange::new(600, 700).unwrap());
        assert_eq!(merged[1], TimeRange::new(800, 860).unwrap());
    }

    #[test]
    fn subtract_produces_ordered_free_intervals() {
        let window = TimeRange::new(540, 1320).unwrap(); // 09:00-22:00
        let busy = vec![TimeRange::new(780, 840).unwrap()]; // 13:00-14:00
        let free = subtract_ranges(&window, &busy);
        assert_eq!(free.len(), 2);
        assert_eq!(free[0], TimeRange::new(540, 780).unwrap());
        assert_eq!(free[1], TimeRange::new(840, 1320).unwrap());
    }

    #[test]
    fn subtract_busy_covering_window() {
        let window = TimeRange::new(540, 600).unwrap();
        let busy = vec![TimeRange::new(500, 700).unwrap()];
        assert!(subtract_ranges(&window, &busy).is_empty());
    }
}
