//! Line-oriented log parser.
//!
//! Accepted line shape, tokens separated by whitespace:
//!
//! ```text
//! TIMESTAMP LEVEL [SOURCE] MESSAGE
//! ```
//!
//! `TIMESTAMP` is either a single RFC 3339 / ISO token (`2024-01-01T10:00:00Z`)
//! or a date and a time token (`2024-01-01 10:00:00`, optionally with `.fff`
//! or `,fff` fractions). Naive timestamps are taken as UTC. `SOURCE` is only
//! read when [`SourceFrom::Line`] is configured.

use crate::{error::ServiceError, models::log::new_log_entry::NewLogEntry};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::str::FromStr;

/// Where an entry's `source` comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceFrom {
    /// A token after the level on every line.
    Line,
    /// The name of the uploaded file.
    #[default]
    Filename,
}

impl FromStr for SourceFrom {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(Self::Line),
            "filename" => Ok(Self::Filename),
            other => Err(format!("expected 'line' or 'filename', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParserConfig {
    pub source_from: SourceFrom,
}

/// Entries parsed from one file plus the number of rejected lines.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub entries: Vec<NewLogEntry>,
    pub skipped: usize,
}

/// Decode raw upload bytes as UTF-8, dropping a leading byte order mark.
pub fn decode(raw: &[u8]) -> Result<&str, ServiceError> {
    let text = std::str::from_utf8(raw)?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogParser {
    config: ParserConfig,
}

impl LogParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> ParserConfig {
        self.config
    }

    /// Parse every non-blank line of `content`. Malformed lines are counted,
    /// never fatal. `fallback_source` is used in [`SourceFrom::Filename`] mode.
    pub fn parse(&self, content: &str, fallback_source: &str) -> ParseOutcome {
        let mut out = ParseOutcome::default();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match self.parse_line(line, fallback_source) {
                Some(entry) => out.entries.push(entry),
                None => out.skipped += 1,
            }
        }
        out
    }

    /// Parse a single line; `None` when it is not a well-formed record.
    pub fn parse_line(&self, line: &str, fallback_source: &str) -> Option<NewLogEntry> {
        let (timestamp, rest) = parse_timestamp(line.trim())?;
        let (level, rest) = next_token(rest)?;
        let level = strip_decorations(level);
        if level.is_empty() {
            return None;
        }
        let (source, rest) = match self.config.source_from {
            SourceFrom::Line => {
                let (source, rest) = next_token(rest)?;
                (strip_decorations(source), rest)
            }
            SourceFrom::Filename => (fallback_source, rest),
        };
        if source.is_empty() {
            return None;
        }
        let message = rest.trim();
        if message.is_empty() {
            return None;
        }
        Some(NewLogEntry {
            timestamp,
            level: level.to_string(),
            source: source.to_string(),
            message: message.to_string(),
        })
    }
}

/// Split off the first whitespace-delimited token; the remainder has its
/// leading whitespace removed.
fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(i) => Some((&s[..i], s[i..].trim_start())),
        None => Some((s, "")),
    }
}

fn strip_decorations(token: &str) -> &str {
    token
        .trim_end_matches(':')
        .trim_matches(['[', ']'])
}

fn parse_timestamp(line: &str) -> Option<(DateTime<Utc>, &str)> {
    let (first, rest) = next_token(line)?;
    if first.contains('T') {
        if let Ok(ts) = DateTime::parse_from_rfc3339(first) {
            return Some((ts.with_timezone(&Utc), rest));
        }
        let naive = NaiveDateTime::parse_from_str(first, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
        return Some((naive.and_utc(), rest));
    }
    let (time, rest) = next_token(rest)?;
    let joined = format!("{first} {}", time.replacen(',', ".", 1));
    let naive = NaiveDateTime::parse_from_str(&joined, "%Y-%m-%d %H:%M:%S%.f").ok()?;
    Some((naive.and_utc(), rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn filename_parser() -> LogParser {
        LogParser::new(ParserConfig {
            source_from: SourceFrom::Filename,
        })
    }

    fn line_parser() -> LogParser {
        LogParser::new(ParserConfig {
            source_from: SourceFrom::Line,
        })
    }

    #[test]
    fn parses_basic_line_with_filename_source() {
        let e = filename_parser()
            .parse_line("2024-01-01 10:00:00 ERROR boom", "app.log")
            .unwrap();
        assert_eq!(e.timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
        assert_eq!(e.level, "ERROR");
        assert_eq!(e.source, "app.log");
        assert_eq!(e.message, "boom");
    }

    #[test]
    fn accepts_python_logging_fraction_and_brackets() {
        let e = filename_parser()
            .parse_line("2024-03-05 08:15:30,250 [warn] disk  almost full", "x.log")
            .unwrap();
        assert_eq!(e.level, "warn");
        assert_eq!(e.message, "disk  almost full");
        assert_eq!(e.timestamp.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn accepts_rfc3339_single_token() {
        let e = filename_parser()
            .parse_line("2024-01-01T12:00:00+02:00 INFO: started", "x.log")
            .unwrap();
        assert_eq!(e.timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
        assert_eq!(e.level, "INFO");
        assert_eq!(e.message, "started");

        let e = filename_parser()
            .parse_line("2024-01-01T12:00:00.5 DEBUG tick", "x.log")
            .unwrap();
        assert_eq!(e.timestamp.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn line_mode_reads_source_token() {
        let e = line_parser()
            .parse_line("2024-01-01 10:00:00 INFO [db-pool] connection opened", "ignored.log")
            .unwrap();
        assert_eq!(e.source, "db-pool");
        assert_eq!(e.message, "connection opened");
    }

    #[test]
    fn line_mode_requires_message_after_source() {
        assert!(
            line_parser()
                .parse_line("2024-01-01 10:00:00 INFO api", "x.log")
                .is_none()
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        let p = filename_parser();
        assert!(p.parse_line("not a log line", "x.log").is_none());
        assert!(p.parse_line("2024-13-01 10:00:00 INFO bad month", "x.log").is_none());
        assert!(p.parse_line("2024-01-01 10:00:00 INFO", "x.log").is_none());
        assert!(p.parse_line("2024-01-01 10:00:00 [] empty level", "x.log").is_none());
        assert!(p.parse_line("2024-01-01", "x.log").is_none());
    }

    #[test]
    fn counts_skipped_and_ignores_blank_lines() {
        let content = "2024-01-01 10:00:00 ERROR boom\n\nnot a log line\r\n   \n2024-01-01 11:00:00 INFO ok\n";
        let out = filename_parser().parse(content, "app.log");
        assert_eq!(out.entries.len(), 2);
        assert_eq!(out.skipped, 1);
        assert_eq!(out.entries[0].message, "boom");
        assert_eq!(out.entries[1].message, "ok");
    }

    #[test]
    fn entries_plus_skipped_equals_nonblank_lines() {
        let content = [
            "2024-01-02 00:00:00 INFO a",
            "garbage",
            "2024-01-01 23:59:59 WARN b",
            "",
            "2024-01-01 23:59:59",
            "2024-02-30 10:00:00 INFO impossible date",
            "2024-01-03T01:02:03Z TRACE c",
        ]
        .join("\n");
        let nonblank = content.lines().filter(|l| !l.trim().is_empty()).count();
        let out = filename_parser().parse(&content, "f.log");
        assert_eq!(out.entries.len() + out.skipped, nonblank);
        assert_eq!(out.entries.len(), 3);
        // input order is preserved, not timestamp order
        assert_eq!(out.entries[0].message, "a");
        assert_eq!(out.entries[1].message, "b");
    }

    #[test]
    fn decode_strips_bom_and_rejects_binary() {
        assert_eq!(decode("\u{feff}hello".as_bytes()).unwrap(), "hello");
        assert!(matches!(decode(&[0xc3, 0x28]), Err(ServiceError::Decode(_))));
    }

    #[test]
    fn source_from_parses_case_insensitively() {
        assert_eq!("LINE".parse::<SourceFrom>().unwrap(), SourceFrom::Line);
        assert_eq!(" filename ".parse::<SourceFrom>().unwrap(), SourceFrom::Filename);
        assert!("header".parse::<SourceFrom>().is_err());
    }
}
