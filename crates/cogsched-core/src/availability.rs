//! Availability builder.
//!
//! Turns the scheduling window, the profile's fixed commitments, and the
//! preferred break windows into an ordered list of free intervals. The
//! busy intervals are carried forward so the scheduler can interleave them
//! verbatim into the output plan.

use crate::clock::{parse_hhmm, subtract_ranges, TimeRange};
use crate::error::ScheduleError;

/// Why a fixed segment exists on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedKind {
    /// Lecture, meeting, or other immovable commitment.
    Commitment,
    /// Break window the user asked for.
    PreferredBreak,
}

/// A busy interval the engine must never schedule over.
#[derive(Debug, Clone)]
pub struct FixedSegment {
    pub label: String,
    pub range: TimeRange,
    pub kind: FixedKind,
}

/// The day's shape after subtracting busy time.
#[derive(Debug, Clone)]
pub struct Availability {
    pub window: TimeRange,
    /// Ordered, non-overlapping free intervals.
    pub free: Vec<TimeRange>,
    /// Ordered fixed segments (commitments and preferred breaks), merged.
    pub fixed: Vec<FixedSegment>,
}

impl Availability {
    pub fn free_minutes(&self) -> u32 {
        self.free.iter().map(TimeRange::duration_min).sum()
    }
}

/// Parse one commitment string: `"HH:MM-HH:MM label"`, label optional.
fn parse_commitment(raw: &str) -> Option<(TimeRange, String)> {
    let trimmed = raw.trim();
    let (time_part, label) = match trimmed.split_once(' ') {
        Some((time, rest)) => (time, rest.trim()),
        None => (trimmed, ""),
    };
    let range = TimeRange::parse(time_part)?;
    let label = if label.is_empty() { "Commitment" } else { label };
    Some((range, label.to_string()))
}

/// Build the availability for a scheduling window.
///
/// Commitments and preferred breaks are normalized (parsed, clamped to the
/// window, overlaps merged with the last label winning) then subtracted.
/// Strings that do not parse are ignored; intervals entirely outside the
/// window are dropped.
pub fn build_availability(
    available_from: &str,
    available_to: &str,
    commitments: &[String],
    break_preferences: &[String],
) -> Result<Availability, ScheduleError> {
    let start = parse_hhmm(available_from).ok_or_else(|| {
        ScheduleError::InvalidWindow(format!(
            "available_from is not a valid HH:MM time: {available_from:?}"
        ))
    })?;
    let end = parse_hhmm(available_to).ok_or_else(|| {
        ScheduleError::InvalidWindow(format!(
            "available_to is not a valid HH:MM time: {available_to:?}"
        ))
    })?;
    let window = TimeRange::new(start, end).ok_or_else(|| {
        ScheduleError::InvalidWindow(format!(
            "available_from ({available_from}) must be before available_to ({available_to})"
        ))
    })?;

    let mut fixed: Vec<FixedSegment> = Vec::new();
    for raw in commitments {
        if let Some((range, label)) = parse_commitment(raw) {
            if let Some(clamped) = range.clamp_to(&window) {
                fixed.push(FixedSegment {
                    label,
                    range: clamped,
                    kind: FixedKind::Commitment,
                });
            }
        }
    }
    for raw in break_preferences {
        if let Some(range) = TimeRange::parse(raw) {
            if let Some(clamped) = range.clamp_to(&window) {
                fixed.push(FixedSegment {
                    label: "Break".to_string(),
                    range: clamped,
                    kind: FixedKind::PreferredBreak,
                });
            }
        }
    }

    let fixed = merge_fixed(fixed);
    let busy: Vec<TimeRange> = fixed.iter().map(|f| f.range).collect();
    let free = subtract_ranges(&window, &busy);
    if free.is_empty() {
        return Err(ScheduleError::NoFreeTime);
    }

    Ok(Availability { window, free, fixed })
}

/// Merge overlapping fixed segments. The later entry's label and kind win
/// for display; a commitment absorbs any preferred break it overlaps.
fn merge_fixed(mut segments: Vec<FixedSegment>) -> Vec<FixedSegment> {
    segments.sort_by_key(|s| (s.range.start_min, s.range.end_min));
    let mut merged: Vec<FixedSegment> = Vec::with_capacity(segments.len());
    for seg in segments {
        match merged.last_mut() {
            Some(last) if seg.range.start_min <= last.range.end_min => {
                last.range.end_min = last.range.end_min.max(seg.range.end_min);
                // last label wins, commitments take precedence over breaks
                if seg.kind == FixedKind::Commitment || last.kind != FixedKind::Commitment {
                    last.label = seg.label;
                }
                if seg.kind == FixedKind::Commitment {
                    last.kind = FixedKind::Commitment;
                }
            }
            _ => merged.push(seg),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn simple_window_no_busy() {
        let a = build_availability("09:00", "22:00", &[], &[]).unwrap();
        assert_eq!(a.free.len(), 1);
        assert_eq!(a.free[0].start_min, 540);
        assert_eq!(a.free[0].end_min, 1320);
        assert_eq!(a.free_minutes(), 780);
    }

    #[test]
    fn inverted_window_is_invalid() {
        let err = build_availability("22:00", "09:00", &[], &[]).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidWindow(_)));
        let err = build_availability("09:00", "09:00", &[], &[]).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidWindow(_)));
    }

    #[test]
    fn malformed_window_time_is_invalid() {
        let err = build_availability("morning", "22:00", &[], &[]).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidWindow(_)));
    }

    #[test]
    fn commitments_and_breaks_are_subtracted() {
        let a = build_availability(
            "09:00",
            "14:00",
            &strings(&["10:00-11:00 Lecture"]),
            &strings(&["12:00-12:30"]),
        )
        .unwrap();
        assert_eq!(a.free.len(), 3);
        assert_eq!(a.fixed.len(), 2);
        assert_eq!(a.fixed[0].label, "Lecture");
        assert_eq!(a.fixed[0].kind, FixedKind::Commitment);
        assert_eq!(a.fixed[1].kind, FixedKind::PreferredBreak);
        assert_eq!(a.free_minutes(), 5 * 60 - 60 - 30);
    }

    #[test]
    fn commitment_outside_window_is_ignored() {
        let a = build_availability(
            "09:00",
            "14:00",
            &strings(&["15:00-16:00 Late seminar"]),
            &[],
        )
        .unwrap();
        assert!(a.fixed.is_empty());
        assert_eq!(a.free.len(), 1);
    }

    #[test]
    fn overlapping_commitments_merge_last_label_wins() {
        let a = build_availability(
            "09:00",
            "14:00",
            &strings(&["10:00-11:00 Algebra", "10:30-11:30 Lab"]),
            &[],
        )
        .unwrap();
        assert_eq!(a.fixed.len(), 1);
        assert_eq!(a.fixed[0].label, "Lab");
        assert_eq!(a.fixed[0].range, TimeRange::new(600, 690).unwrap());
    }

    #[test]
    fn unlabeled_commitment_gets_default_label() {
        let a =
            build_availability("09:00", "14:00", &strings(&["10:00-10:30"]), &[]).unwrap();
        assert_eq!(a.fixed[0].label, "Commitment");
    }

    #[test]
    fn fully_booked_window_is_no_free_time() {
        let err = build_availability(
            "09:00",
            "11:00",
            &strings(&["09:00-10:00 A", "10:00-11:00 B"]),
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::NoFreeTime));
    }

    #[test]
    fn garbage_commitment_strings_are_skipped() {
        let a = build_availability(
            "09:00",
            "14:00",
            &strings(&["not a time", "25:00-26:00 Impossible"]),
            &[],
        )
        .unwrap();
        assert!(a.fixed.is_empty());
    }
}
