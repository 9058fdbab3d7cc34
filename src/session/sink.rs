use std::io::Write;

use crate::session::*;

/// Appends every finalized group as one JSON object per line.
///
/// Write errors do not interrupt the session: the first one is kept and returned by `finish`.
pub struct JsonLinesSink<W: Write> {
    out: W,
    path: String,
    lines: usize,
    error: Option<std::io::Error>,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W, path: &str) -> JsonLinesSink<W> {
        JsonLinesSink {
            out,
            path: path.to_string(),
            lines: 0,
            error: None,
        }
    }

    /// Flushes the output and returns the number of lines written.
    pub fn finish(mut self) -> SessionResult<usize> {
        if let Some(e) = self.error.take() {
            return Err(e).context(WritingFileSnafu { path: self.path });
        }
        self.out
            .flush()
            .context(WritingFileSnafu { path: self.path })?;
        Ok(self.lines)
    }
}

impl<W: Write> ScoreSink for JsonLinesSink<W> {
    fn group_finalized(&mut self, stats: &GroupStats) {
        if self.error.is_some() {
            return;
        }
        match writeln!(self.out, "{}", group_to_json(stats)) {
            Ok(()) => self.lines += 1,
            Err(e) => {
                warn!(
                    "Could not save the scores of {} group {}: {}",
                    stats.round,
                    stats.group + 1,
                    e
                );
                self.error = Some(e);
            }
        }
    }
}
