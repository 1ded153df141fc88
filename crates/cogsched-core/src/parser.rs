//! Free-text task extraction.
//!
//! The production parser is an injected capability (an LLM behind the RPC
//! layer). `TaskParser` is the seam; `RegexTaskParser` is the offline
//! fallback: it splits the message into clauses, pulls out "N hours/min"
//! durations, and guesses a category from keyword overlap.

use regex::Regex;

use crate::error::ParseError;
use crate::task::Task;

/// Seam for task extraction backends.
pub trait TaskParser {
    fn parse(&self, message: &str) -> Result<Vec<Task>, ParseError>;
}

/// Regex-based fallback parser.
pub struct RegexTaskParser {
    duration: Regex,
}

impl Default for RegexTaskParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexTaskParser {
    pub fn new() -> Self {
        Self {
            duration: Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*(hours?|hrs?|h|minutes?|mins?|m)\b")
                .expect("duration regex is valid"),
        }
    }

    /// Duration in minutes mentioned in a clause, if any.
    fn extract_duration(&self, clause: &str) -> Option<i64> {
        let caps = self.duration.captures(clause)?;
        let amount: f64 = caps[1].parse().ok()?;
        let unit = caps[2].to_lowercase();
        let minutes = if unit.starts_with('h') {
            amount * 60.0
        } else {
            amount
        };
        Some(minutes.round() as i64)
    }

    fn clean_title(&self, clause: &str) -> String {
        let without_duration = self.duration.replace_all(clause, "");
        let cleaned = without_duration
            .trim()
            .trim_start_matches(|c: char| !c.is_alphanumeric())
            .trim_end_matches(|c: char| !c.is_alphanumeric() && c != ')');
        let mut words: Vec<&str> = cleaned.split_whitespace().collect();
        // drop a leading filler preposition left over from "study X for 2 hours"
        while matches!(
            words.last().map(|w| w.to_lowercase()),
            Some(ref w) if w == "for" || w == "about"
        ) {
            words.pop();
        }
        words.join(" ")
    }

    fn guess_category(clause: &str) -> &'static str {
        let lower = clause.to_lowercase();
        let table: [(&str, &[&str]); 6] = [
            ("math", &["math", "calculus", "algebra", "statistics", "proof"]),
            (
                "programming",
                &["code", "coding", "program", "debug", "rust", "python", "assignment"],
            ),
            ("science", &["physics", "chemistry", "chem", "biology", "lab"]),
            ("writing", &["write", "essay", "report", "paper", "draft"]),
            ("reading", &["read", "reading", "chapter", "textbook"]),
            ("review", &["review", "revise", "flashcard", "recap"]),
        ];
        for (category, keywords) in table {
            if keywords.iter().any(|k| lower.contains(k)) {
                return category;
            }
        }
        "general"
    }
}

impl TaskParser for RegexTaskParser {
    fn parse(&self, message: &str) -> Result<Vec<Task>, ParseError> {
        let mut tasks = Vec::new();
        for clause in message
            .split(|c| c == ',' || c == ';' || c == '.')
            .flat_map(|c| c.split(" and "))
            .flat_map(|c| c.split(" then "))
        {
            let title = self.clean_title(clause);
            if title.is_empty() || title.split_whitespace().count() > 12 {
                continue;
            }
            let duration = self.extract_duration(clause);
            let mut task = Task::new(title, Self::guess_category(clause));
            if let Some(minutes) = duration {
                task.duration_minutes = minutes;
            }
            tasks.push(task);
        }
        if tasks.is_empty() {
            return Err(ParseError::NoTasks);
        }
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_and_duration() {
        let parser = RegexTaskParser::new();
        let tasks = parser.parse("study calculus for 2 hours").unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "study calculus");
        assert_eq!(tasks[0].duration_minutes, 120);
        assert_eq!(tasks[0].category, "math");
    }

    #[test]
    fn splits_on_and() {
        let parser = RegexTaskParser::new();
        let tasks = parser
            .parse("finish the ML assignment for 90 min and read chapter 4 for 30 min")
            .unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].duration_minutes, 90);
        assert_eq!(tasks[0].category, "programming");
        assert_eq!(tasks[1].duration_minutes, 30);
        assert_eq!(tasks[1].category, "reading");
    }

    #[test]
    fn missing_duration_defaults_to_an_hour() {
        let parser = RegexTaskParser::new();
        let tasks = parser.parse("revise chemistry notes").unwrap();
        assert_eq!(tasks[0].duration_minutes, 60);
    }

    #[test]
    fn empty_message_is_an_error() {
        let parser = RegexTaskParser::new();
        assert!(matches!(parser.parse("   "), Err(ParseError::NoTasks)));
    }

    #[test]
    fn unknown_topic_falls_back_to_general() {
        let parser = RegexTaskParser::new();
        let tasks = parser.parse("practice guitar for 45 min").unwrap();
        assert_eq!(tasks[0].category, "general");
    }
}
