use std::io::BufWriter;
use std::path::Path;

use anyhow::Result;

use disaggregate::{SentinelCounts, TripWriter};
use dtautil::Timer;

/// Opens the trip file. A file left by an earlier run (like the other half of a broad and
/// detailed pair) is appended to without repeating the header.
pub fn open(path: &str) -> Result<TripWriter<BufWriter<fs_err::File>>> {
    info!("Trip file being written to {}", path);
    if Path::new(path).is_file() {
        info!("{} already exists. New trips will be appended.", path);
        let file = fs_err::OpenOptions::new().append(true).open(path)?;
        Ok(TripWriter::appending(BufWriter::new(file)))
    } else {
        info!("{} doesn't exist yet. Creating it.", path);
        let file = fs_err::File::create(path)?;
        TripWriter::new(BufWriter::new(file))
    }
}

/// Flushes the trip file, then reports what the run wrote and every lookup that failed.
pub fn finish(
    timer: &mut Timer,
    out: TripWriter<BufWriter<fs_err::File>>,
    sentinels: &SentinelCounts,
) -> Result<()> {
    let trips = out.trips_written();
    out.finish()?;
    timer.count("Trips written", trips);
    for line in sentinels.describe() {
        timer.warn(line);
    }
    Ok(())
}
