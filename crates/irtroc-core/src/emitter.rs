//! Datapoint sink.
//!
//! Each datapoint is written as one `actual,predicted` line and kept in
//! memory, so the persisted stream and the returned collection always hold
//! the same points in the same order.

use std::io::{self, BufRead, Write};

use anyhow::Context;

use crate::error::EvalError;
use crate::model::Datapoint;

/// Writes datapoints to `W` and accumulates them.
pub struct DatapointEmitter<W: Write> {
    writer: W,
    datapoints: Vec<Datapoint>,
}

impl<W: Write> DatapointEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            datapoints: Vec::new(),
        }
    }

    /// Write one datapoint. It is only recorded once the write succeeded.
    pub fn emit(&mut self, point: Datapoint) -> io::Result<()> {
        writeln!(self.writer, "{point}")?;
        self.datapoints.push(point);
        Ok(())
    }

    /// Datapoints emitted so far.
    pub fn datapoints(&self) -> &[Datapoint] {
        &self.datapoints
    }

    /// Flush the sink and hand back the writer and every datapoint.
    pub fn finish(mut self) -> io::Result<(W, Vec<Datapoint>)> {
        self.writer.flush()?;
        Ok((self.writer, self.datapoints))
    }
}

/// Parse a datapoint stream previously written by [`DatapointEmitter`].
pub fn read_datapoints<R: BufRead>(reader: R) -> anyhow::Result<Vec<Datapoint>> {
    let mut points = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let point = parse_datapoint(line).with_context(|| format!("line {}", i + 1))?;
        points.push(point);
    }
    Ok(points)
}

fn parse_datapoint(line: &str) -> Result<Datapoint, EvalError> {
    let malformed = |reason: String| EvalError::MalformedRecord { reason };

    let (actual, predicted) = line
        .split_once(',')
        .ok_or_else(|| malformed(format!("expected 'actual,predicted', got '{line}'")))?;
    let actual = match actual {
        "0" => 0,
        "1" => 1,
        other => return Err(malformed(format!("actual must be 0 or 1, got '{other}'"))),
    };
    let predicted: f64 = predicted
        .parse()
        .map_err(|_| malformed(format!("predicted '{predicted}' is not a number")))?;
    Ok(Datapoint { actual, predicted })
}
