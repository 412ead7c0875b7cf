//! Single-consumer aggregators persisting failure and stats records

use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use crossbeam_channel::Receiver;

use crate::queue::Message;
use crate::records::{FailureRecord, StatsRecord};

fn csv_err(e: csv::Error) -> io::Error {
    io::Error::other(e)
}

/// Failure sink loop: append one `(id, label, error)` row per record.
///
/// The log is opened in append mode so successive runs accumulate
/// history without truncation; it is the single source of truth for the
/// known-failed lookups of future runs. Each row is flushed immediately
/// so a crash loses at most the record in flight.
pub fn failure_sink(rx: Receiver<Message<FailureRecord>>, path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut writer = csv::Writer::from_writer(file);
    let mut rows = 0usize;

    loop {
        match rx.recv() {
            Ok(Message::Record(record)) => {
                writer
                    .write_record([&record.id, &record.label, &record.error])
                    .map_err(csv_err)?;
                writer.flush()?;
                rows += 1;
            }
            // Disconnection means the pool was dropped without an orderly
            // stop; treat it like the sentinel after flushing.
            Ok(Message::Done) | Err(_) => break,
        }
    }

    writer.flush()?;
    if rows > 0 {
        log::info!("recorded {} failed items in {}", rows, path.display());
    }
    Ok(())
}

/// Stats sink loop: one row per record until the sentinel. The table is
/// opened in append mode — one invocation drives a pool per subset (and
/// per category) against the same path, and each pool's rows must
/// survive the next pool's start. The header is written only when the
/// file is new or empty. Never read back by the pipeline.
pub fn stats_sink(rx: Receiver<Message<StatsRecord>>, path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let write_header = file.metadata()?.len() == 0;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(write_header)
        .from_writer(file);

    loop {
        match rx.recv() {
            Ok(Message::Record(record)) => {
                writer.serialize(&record).map_err(csv_err)?;
                writer.flush()?;
            }
            Ok(Message::Done) | Err(_) => break,
        }
    }

    writer.flush()?;
    Ok(())
}
