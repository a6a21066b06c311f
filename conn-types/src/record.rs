// Copyright (c) James Kassemi, SC, US. All rights reserved.

/// Timestamps whose magnitude exceeds this are taken to be milliseconds.
const MS_TIMESTAMP_THRESHOLD: f64 = 999_999_999_999.0;

/// One parsed connection-log line. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Seconds since the Unix epoch; may carry a fractional part.
    pub timestamp: f64,
    pub from_host: String,
    pub to_host: String,
}

/// Why a line failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// Not exactly three whitespace-delimited fields.
    FieldCount,
    /// First field did not parse as a nonnegative number.
    Timestamp,
    /// A host field did not fully match `[0-9a-z]+`.
    Host,
}

/// A rejected line, carried as data so callers can log or count it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLine {
    pub reason: InvalidReason,
}

/// Result of parsing one line. Replaces sentinel tuples: an invalid line can
/// never be mistaken for a zero-timestamp record.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed(Record),
    Invalid(InvalidLine),
}

impl ParseOutcome {
    fn invalid(reason: InvalidReason) -> Self {
        ParseOutcome::Invalid(InvalidLine { reason })
    }

    pub fn record(self) -> Option<Record> {
        match self {
            ParseOutcome::Parsed(record) => Some(record),
            ParseOutcome::Invalid(_) => None,
        }
    }
}

/// Rigid parser for `timestamp from-host to-host` lines.
///
/// Tokenizes on runs of whitespace (leading/trailing ignored) and lowercases
/// the line before validation. Timestamps above the millisecond threshold are
/// normalized to seconds.
#[derive(Debug, Default)]
pub struct LineParser;

impl LineParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, line: &str) -> ParseOutcome {
        let line = line.to_ascii_lowercase();
        let mut fields = line.split_whitespace();
        let (ts_field, from_field, to_field) =
            match (fields.next(), fields.next(), fields.next(), fields.next()) {
                (Some(ts), Some(from), Some(to), None) => (ts, from, to),
                _ => return ParseOutcome::invalid(InvalidReason::FieldCount),
            };

        let timestamp = match parse_timestamp(ts_field) {
            Some(ts) => ts,
            None => return ParseOutcome::invalid(InvalidReason::Timestamp),
        };
        if !is_valid_host(from_field) || !is_valid_host(to_field) {
            return ParseOutcome::invalid(InvalidReason::Host);
        }

        ParseOutcome::Parsed(Record {
            timestamp,
            from_host: from_field.to_string(),
            to_host: to_field.to_string(),
        })
    }
}

fn parse_timestamp(field: &str) -> Option<f64> {
    let value: f64 = field.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    if value > MS_TIMESTAMP_THRESHOLD {
        Some(value / 1000.0)
    } else {
        Some(value)
    }
}

/// Hosts must fully match `[0-9a-z]+` (the line is already lowercased).
pub fn is_valid_host(host: &str) -> bool {
    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> Record {
        LineParser::new()
            .parse(line)
            .record()
            .unwrap_or_else(|| panic!("expected valid line: {line:?}"))
    }

    fn reason(line: &str) -> InvalidReason {
        match LineParser::new().parse(line) {
            ParseOutcome::Invalid(invalid) => invalid.reason,
            ParseOutcome::Parsed(record) => panic!("expected invalid line, got {record:?}"),
        }
    }

    #[test]
    fn accepts_plain_lines() {
        let record = parsed("1565293595 a b");
        assert_eq!(record.timestamp, 1_565_293_595.0);
        assert_eq!(record.from_host, "a");
        assert_eq!(record.to_host, "b");
    }

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(parsed("1565293593 A b").from_host, "a");
        assert_eq!(parsed("  1565293593   A b  ").from_host, "a");
        assert_eq!(parsed("  1565293593 1 b  ").from_host, "1");
    }

    #[test]
    fn normalizes_millisecond_timestamps() {
        // explicit fractional seconds
        assert_eq!(parsed("1565293593.123 1 b").timestamp, 1_565_293_593.123);
        // implicit milliseconds
        assert_eq!(parsed("1565293593123 1 b").timestamp, 1_565_293_593.123);
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(reason(""), InvalidReason::FieldCount);
        assert_eq!(reason("          "), InvalidReason::FieldCount);
        assert_eq!(reason("1565293593 b c d"), InvalidReason::FieldCount);
        assert_eq!(reason("a b c"), InvalidReason::Timestamp);
        assert_eq!(reason("1b c d"), InvalidReason::Timestamp);
        assert_eq!(reason("-5 a b"), InvalidReason::Timestamp);
        assert_eq!(reason("1565293593 a b.example"), InvalidReason::Host);
        assert_eq!(reason("1565293593 a_b c"), InvalidReason::Host);
    }
}
