use std::{fs, path::Path};

use tracing::{debug, warn};

use super::{Lane, TimedEvent, TimestampStream};
use crate::error::{EngineError, ErrorKind};

/// A parsed key log plus every entry that had to be skipped.
#[derive(Debug, Clone, Default)]
pub struct KeyLog {
    pub stream: TimestampStream,
    pub skipped: Vec<EngineError>,
}

pub fn load_key_log_from_path(path: impl AsRef<Path>) -> Result<KeyLog, EngineError> {
    let path = path.as_ref();
    let src = fs::read_to_string(path).map_err(|e| {
        EngineError::new(ErrorKind::Io, format!("failed to read key log: {e}"))
            .with_file(path.display().to_string())
    })?;
    let mut log = parse_key_log(&src);
    for err in &mut log.skipped {
        err.file = Some(path.display().to_string());
    }
    Ok(log)
}

/// Parses `timestamp,key` rows. `key` is a lane id or a comma-joined chord,
/// optionally quoted. A leading header row is ignored.
pub fn parse_key_log(src: &str) -> KeyLog {
    let mut events = Vec::new();
    let mut skipped = Vec::new();
    let mut last_timestamp = f64::NEG_INFINITY;

    for (idx, raw) in src.lines().enumerate() {
        let line_no = idx + 1;
        let row = raw.trim();
        if row.is_empty() {
            continue;
        }

        let (ts_field, key_field) = match row.split_once(',') {
            Some((ts, keys)) => (ts.trim(), keys.trim()),
            None => (row, ""),
        };

        if events.is_empty() && skipped.is_empty() && ts_field.eq_ignore_ascii_case("timestamp") {
            continue;
        }

        let timestamp = match ts_field.parse::<f64>() {
            Ok(v) if v.is_finite() => round_millis(v),
            _ => {
                let err = EngineError::data(format!("malformed timestamp {ts_field:?}"))
                    .with_line(line_no);
                warn!("{err}");
                skipped.push(err);
                continue;
            }
        };

        let keys = parse_keys(key_field, timestamp, line_no, &mut skipped);

        if timestamp < last_timestamp {
            warn!(
                line = line_no,
                "key log row at {timestamp:.3}s precedes {last_timestamp:.3}s; keeping file order"
            );
        }
        last_timestamp = last_timestamp.max(timestamp);
        events.push(TimedEvent::new(timestamp, keys));
    }

    debug!(events = events.len(), skipped = skipped.len(), "key log parsed");
    KeyLog {
        stream: TimestampStream::new(events),
        skipped,
    }
}

fn parse_keys(
    field: &str,
    timestamp: f64,
    line_no: usize,
    skipped: &mut Vec<EngineError>,
) -> Vec<Lane> {
    let unquoted = field.trim_matches('"');
    let mut keys = Vec::new();
    for token in unquoted.split(',') {
        match Lane::from_key(token) {
            Some(lane) => keys.push(lane),
            None => {
                let err = EngineError::data(format!("unknown lane id {:?}", token.trim()))
                    .with_timestamp(timestamp)
                    .with_line(line_no);
                warn!("{err}");
                skipped.push(err);
            }
        }
    }
    keys
}

fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}
