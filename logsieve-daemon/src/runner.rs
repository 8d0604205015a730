//! Event stream filtering.
//!
//! Each input line is a JSON-encoded `LogEvent`. Accepted events are written
//! to the output byte-for-byte; denied events are dropped. Lines that do not
//! parse as an event, including lines that are not valid UTF-8, are passed
//! through so that a broken producer never loses data.

use anyhow::Result;
use metrics::counter;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use logsieve_core::metrics as m;
use logsieve_core::pipeline::EventFilter;
use logsieve_core::types::{Decision, LogEvent};

/// Per-run stream statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamStats {
    /// Lines parsed as log events
    pub events: u64,
    /// Events written to the output
    pub accepted: u64,
    /// Events dropped by the filter
    pub denied: u64,
    /// Non-event lines passed through unchanged
    pub malformed: u64,
}

/// Filter `reader` into `writer` until end of input.
///
/// Blank lines are skipped. The writer is flushed after every written line.
/// A final line without a trailing newline is still processed.
///
/// # Errors
///
/// Returns an error only when reading input or writing output fails.
pub async fn run_stream<R, W>(
    filter: &dyn EventFilter,
    mut reader: R,
    mut writer: W,
) -> Result<StreamStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut stats = StreamStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = trim_line_ending(&buf);
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let pass = match serde_json::from_slice::<LogEvent>(line) {
            Ok(event) => {
                stats.events += 1;
                counter!(m::DAEMON_EVENTS_READ_TOTAL).increment(1);
                match filter.decide(&event) {
                    Decision::Accept => {
                        stats.accepted += 1;
                        true
                    }
                    Decision::Deny => {
                        stats.denied += 1;
                        false
                    }
                }
            }
            Err(e) => {
                stats.malformed += 1;
                counter!(m::DAEMON_MALFORMED_LINES_TOTAL).increment(1);
                tracing::debug!(error = %e, "input line is not a log event, passing through");
                true
            }
        };

        if pass {
            writer.write_all(line).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }

    writer.flush().await?;

    tracing::info!(
        events = stats.events,
        accepted = stats.accepted,
        denied = stats.denied,
        malformed = stats.malformed,
        filter = filter.name(),
        "input stream finished"
    );

    Ok(stats)
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
