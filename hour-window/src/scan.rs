use std::io::BufRead;

use conn_types::{LineParser, ParseOutcome, ScanConfig};
use log::debug;

use crate::{bloom::BloomSet, error::ScanError};

/// Whether the scanner wants more input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Continue,
    /// The watermark passed `time_end + max_log_late_seconds`; no later
    /// record can land inside the range, so scanning stopped early.
    Done,
}

/// Single-pass bounded-range query: every first-seen source host that
/// connected to the target destination within `[time_init, time_end)`.
///
/// State survives across sources, so a multi-file sequence is scanned as one
/// continuous stream. Results are emitted incrementally, as found.
pub struct RangeScanner {
    config: ScanConfig,
    parser: LineParser,
    seen: BloomSet,
    max_seen: Option<f64>,
}

impl RangeScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            parser: LineParser::new(),
            seen: BloomSet::new(),
            max_seen: None,
        }
    }

    /// The timestamp the time-indexed seek should position just before.
    pub fn seek_target(&self) -> i64 {
        self.config.time_init.floor() as i64 - self.config.max_log_late_seconds
    }

    pub fn scan<R: BufRead>(
        &mut self,
        reader: R,
        sink: &mut dyn FnMut(&str),
    ) -> Result<ScanStatus, ScanError> {
        let horizon = self.config.time_end + self.config.max_log_late_seconds as f64;
        for line in reader.lines() {
            let line = line?;
            let record = match self.parser.parse(&line) {
                ParseOutcome::Parsed(record) => record,
                ParseOutcome::Invalid(invalid) => {
                    debug!("dropping invalid line ({:?}): {line:?}", invalid.reason);
                    continue;
                }
            };
            let max_seen = match self.max_seen {
                Some(seen) => seen.max(record.timestamp),
                None => record.timestamp,
            };
            self.max_seen = Some(max_seen);
            if max_seen >= horizon {
                return Ok(ScanStatus::Done);
            }
            let in_range = self.config.time_init <= record.timestamp
                && record.timestamp < self.config.time_end;
            if in_range
                && record.to_host == self.config.to_host
                && self.seen.add(&record.from_host)?
            {
                sink(&record.from_host);
            }
        }
        Ok(ScanStatus::Continue)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use conn_types::DEFAULT_MAX_LOG_LATE_SECONDS;

    use super::*;

    fn config(to: &str, init: f64, end: f64, late: i64) -> ScanConfig {
        ScanConfig {
            to_host: to.to_string(),
            time_init: init,
            time_end: end,
            max_log_late_seconds: late,
            fast_seek: false,
        }
    }

    fn run(config: ScanConfig, input: &str) -> (Vec<String>, ScanStatus) {
        let mut scanner = RangeScanner::new(config);
        let mut found = Vec::new();
        let status = scanner
            .scan(Cursor::new(input), &mut |host| found.push(host.to_string()))
            .unwrap();
        (found, status)
    }

    #[test]
    fn collects_first_seen_sources_in_range() {
        let input = "1576815793 quark garak\n\
                     1576815795 brunt quark\n\
                     1576815811 lilac garak\n";
        let (found, status) = run(
            config(
                "garak",
                1_567_000_000.0,
                1_580_000_000.0,
                DEFAULT_MAX_LOG_LATE_SECONDS,
            ),
            input,
        );
        assert_eq!(found, vec!["quark", "lilac"]);
        assert_eq!(status, ScanStatus::Continue);
    }

    #[test]
    fn stops_early_once_no_late_record_can_qualify() {
        const T0: i64 = 1_551_466_800;
        // time_end = T0+5, lateness 4: the scan must stop once it has seen
        // a timestamp at or past T0+9.
        let input = format!(
            "{} a y\n{} b z\n{} c y\n{} d x\n{} d y\n{} e z\n{} f y\n",
            T0 + 2, // in range
            T0 + 3,
            T0 + 5, // at time_end, excluded (noninclusive)
            T0 + 8, // advances max seen, still under the horizon
            T0 + 4, // late but within tolerance, still counted
            T0 + 9, // hits the horizon: early stop
            T0 + 4, // never reached
        );
        let (found, status) = run(config("y", T0 as f64, (T0 + 5) as f64, 4), &input);
        assert_eq!(found, vec!["a", "d"]);
        assert_eq!(status, ScanStatus::Done);
    }

    #[test]
    fn dedups_repeat_sources() {
        let input = "100 a b\n101 a b\n102 a b\n";
        let (found, _) = run(config("b", 0.0, 1_000.0, 0), input);
        assert_eq!(found, vec!["a"]);
    }

    #[test]
    fn state_spans_multiple_sources() {
        let mut scanner = RangeScanner::new(config("b", 0.0, 1_000.0, 0));
        let mut found = Vec::new();
        let mut sink = |host: &str| found.push(host.to_string());
        scanner.scan(Cursor::new("100 a b\n"), &mut sink).unwrap();
        scanner
            .scan(Cursor::new("101 a b\n102 c b\n"), &mut sink)
            .unwrap();
        assert_eq!(found, vec!["a", "c"]);
    }
}
