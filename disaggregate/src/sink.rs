use std::io::Write;

use anyhow::{Context, Result};

use crate::record::{TripRecord, HEADER};

/// Every record starts on a new line, so a file can be appended to by a later run without
/// tracking whether the last write ended with a newline.
const RECORD_SEPARATOR: &str = "\r\n";

/// Appends serialized trips to an output stream, in exactly the order they're written.
pub struct TripWriter<W: Write> {
    out: W,
    trips_written: usize,
}

impl<W: Write> TripWriter<W> {
    /// Starts a fresh output, writing the header.
    pub fn new(mut out: W) -> Result<TripWriter<W>> {
        out.write_all(HEADER.as_bytes())
            .context("writing the trip header")?;
        Ok(TripWriter {
            out,
            trips_written: 0,
        })
    }

    /// Continues an output that already has a header.
    pub fn appending(out: W) -> TripWriter<W> {
        TripWriter {
            out,
            trips_written: 0,
        }
    }

    pub fn write(&mut self, trip: &TripRecord) -> Result<()> {
        write!(self.out, "{}{}", RECORD_SEPARATOR, trip.to_csv_line())
            .context("writing a trip")?;
        self.trips_written += 1;
        Ok(())
    }

    /// How many trips this writer has written, not counting anything already in the output.
    pub fn trips_written(&self) -> usize {
        self.trips_written
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush().context("flushing trips")?;
        Ok(self.out)
    }
}
