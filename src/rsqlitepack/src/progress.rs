//! Per-input progress lines. Accumulated rather than printed eagerly: teardown deletes the whole
//! archive on any failure, so printing a line for an input that might still be rolled back would
//! mislead the operator about what actually landed on disk.

use std::path::PathBuf;

struct Entry {
    path: PathBuf,
    compressed_size: u64,
    uncompressed_size: u64,
}

#[derive(Default)]
pub struct Progress {
    entries: Vec<Entry>,
}

impl Progress {
    pub fn new() -> Progress {
        Progress::default()
    }

    pub fn record(&mut self, path: PathBuf, compressed_size: u64, uncompressed_size: u64) {
        self.entries.push(Entry {
            path,
            compressed_size,
            uncompressed_size,
        });
    }

    /// Writes one ratio line per input followed by a summary line, to `stderr`.
    pub fn report(&self, writer: &mut impl std::io::Write) -> std::io::Result<()> {
        let mut total_compressed = 0u64;
        let mut total_uncompressed = 0u64;

        for entry in &self.entries {
            let ratio = ratio(entry.compressed_size, entry.uncompressed_size);
            writeln!(writer, "{:.4} {}", ratio, entry.path.display())?;
            total_compressed += entry.compressed_size;
            total_uncompressed += entry.uncompressed_size;
        }

        writeln!(
            writer,
            "{} inputs, {:.4} overall ratio",
            self.entries.len(),
            ratio(total_compressed, total_uncompressed)
        )
    }
}

fn ratio(compressed: u64, uncompressed: u64) -> f64 {
    if uncompressed == 0 {
        0.0
    } else {
        compressed as f64 / uncompressed as f64
    }
}
