//! Sequences the pipeline's phases and guarantees a deterministic, reverse-order teardown on any
//! failure: end compression if initialized, roll back if a transaction is open, close the
//! connection if open, close the archive file if still open, and remove the archive file if it
//! was created.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::compress::CompressorDriver;
use crate::config;
use crate::db::Gateway;
use crate::error::{PackError, PackResult};
use crate::progress::Progress;
use crate::registry::{self, RegisteredInput};
use crate::zip::Assembler;

pub struct PackOutcome {
    pub progress: Progress,
}

/// Runs the full `allocate_state -> ... -> close_archive` pipeline for one invocation. On any
/// error, deletes the archive if this call created it and returns the error; the caller is not
/// responsible for cleanup.
pub fn pack(archive_path: &Path, input_paths: &[PathBuf]) -> PackResult<PackOutcome> {
    let inputs = registry::register(input_paths)?;
    registry::check_output_collision(archive_path, &inputs)?;

    let mut archive_created = false;
    let result = run(archive_path, &inputs, &mut archive_created);

    if result.is_err() && archive_created {
        debug!(path = %archive_path.display(), "removing partial archive after failure");
        let _ = std::fs::remove_file(archive_path);
    }

    result
}

fn run(
    archive_path: &Path,
    inputs: &[RegisteredInput],
    archive_created: &mut bool,
) -> PackResult<PackOutcome> {
    debug!("opening in-memory gateway connection");
    let mut gateway = Gateway::open(config::busy_timeout()?)?;

    for input in inputs {
        debug!(alias = %input.alias, path = %input.path.display(), "attaching input");
        gateway.attach(input)?;
    }

    let archive_file =
        File::create(archive_path).map_err(|e| PackError::filesystem(archive_path, e))?;
    *archive_created = true;

    // Scoped so the guard's borrow of `gateway` ends here, letting `gateway.close()` below take
    // it by value. The guard still rolls back on any early return out of this block.
    let packed = (|| -> PackResult<(Assembler, Progress)> {
        let teardown = TeardownGuard {
            gateway: &mut gateway,
        };

        teardown.gateway.begin()?;
        info!("began shared read transaction across {} input(s)", inputs.len());

        let mut assembler = Assembler::new(archive_file);
        let mut driver = CompressorDriver::new();
        let mut progress = Progress::new();

        for input in inputs {
            let metadata = teardown.gateway.metadata(&input.alias)?;
            debug!(
                alias = %input.alias,
                page_size = metadata.page_size,
                page_count = metadata.page_count,
                journal_mode = %metadata.journal_mode,
                "resolved input metadata"
            );

            let (uncompressed_size, compressed_size) =
                assembler.pack_input(input, &*teardown.gateway, &metadata, &mut driver)?;
            progress.record(input.path.clone(), compressed_size, uncompressed_size);
        }

        teardown.gateway.rollback()?;
        Ok((assembler, progress))
    })();

    let (assembler, progress) = packed?;

    debug!("closing gateway connection");
    gateway.close()?;

    assembler.finish()?;

    Ok(PackOutcome { progress })
}

/// Rolls back the shared transaction when dropped, whether or not the closure above already did
/// so explicitly on the success path — `Gateway::rollback` is idempotent, so this is a correctness
/// net for the early-return error paths rather than a second real rollback.
struct TeardownGuard<'a> {
    gateway: &'a mut Gateway,
}

impl Drop for TeardownGuard<'_> {
    fn drop(&mut self) {
        let _ = self.gateway.rollback();
    }
}
