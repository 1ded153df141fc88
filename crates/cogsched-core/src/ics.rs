//! ICS export.
//!
//! Renders a produced plan as an iCalendar document: one `VEVENT` per
//! non-break block, DTSTART/DTEND as local times on the plan's date,
//! SUMMARY from the title and DESCRIPTION carrying the explanation plus
//! the load/energy/fatigue estimates.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::scheduler::Block;

/// Escape text for an ICS property value.
fn escape_ics(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}

/// `HH:MM` → `HHMM00` for a floating local DTSTART/DTEND.
fn ics_time(hhmm: &str) -> String {
    format!("{}00", hhmm.replace(':', ""))
}

/// Render a plan's blocks as an ICS document.
pub fn plan_to_ics(blocks: &[Block], date: NaiveDate, generated_at: DateTime<Utc>) -> String {
    let day = date.format("%Y%m%d");
    let stamp = generated_at.format("%Y%m%dT%H%M%SZ");

    let mut s = String::new();
    s.push_str("BEGIN:VCALENDAR\r\n");
    s.push_str("VERSION:2.0\r\n");
    s.push_str("PRODID:-//CogScheduler//EN\r\n");
    s.push_str("CALSCALE:GREGORIAN\r\n");
    s.push_str("METHOD:PUBLISH\r\n");
    s.push_str(&format!(
        "X-WR-CALNAME:CogScheduler - {}\r\n",
        date.format("%b %d")
    ));

    for block in blocks.iter().filter(|b| !b.is_break) {
        let description = format!(
            "{}\nCognitive Load: {:.1}/10\nEnergy: {:.0}%\nFatigue: {:.0}%",
            block.explanation,
            block.cognitive_load,
            block.energy_at_start * 100.0,
            block.fatigue_at_start * 100.0,
        );
        s.push_str("BEGIN:VEVENT\r\n");
        s.push_str(&format!("UID:{}\r\n", Uuid::new_v4()));
        s.push_str(&format!("DTSTAMP:{stamp}\r\n"));
        s.push_str(&format!("DTSTART:{day}T{}\r\n", ics_time(&block.start_time)));
        s.push_str(&format!("DTEND:{day}T{}\r\n", ics_time(&block.end_time)));
        s.push_str(&format!("SUMMARY:{}\r\n", escape_ics(&block.task_title)));
        s.push_str(&format!("DESCRIPTION:{}\r\n", escape_ics(&description)));
        s.push_str("STATUS:CONFIRMED\r\n");
        s.push_str("END:VEVENT\r\n");
    }

    s.push_str("END:VCALENDAR\r\n");
    s
}
