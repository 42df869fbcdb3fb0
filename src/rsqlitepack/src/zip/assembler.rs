//! Orchestrates per-input local-header reservation, the page compression loop, CRC accumulation,
//! local-header back-patch, central-directory emission, and end-of-central-directory with Zip64
//! variant selection.

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};

use crate::compress::CompressorDriver;
use crate::db::{resolve_mtime, Gateway, InputMetadata};
use crate::dos_time;
use crate::error::{PackError, PackResult};
use crate::registry::RegisteredInput;
use crate::zip::records::{
    build_central_entry, build_end_of_central_directory, build_local_header,
    build_zip64_end_and_locator, CentralEntryFields, LocalHeaderFields,
};

/// Everything the central-directory phase needs about one already-packed input. Kept in memory
/// from the per-input pass until the directory phase, matching `central_entry`/`central_extra` in
/// the data model.
struct PendingMember {
    path: Vec<u8>,
    local_offset: u64,
    needed_version: u16,
    mod_time: u16,
    mod_date: u16,
    crc: u32,
    uncompressed_size: u64,
    compressed_size: u64,
    external_attribs: u32,
}

/// Pessimistic upper bound on compressed size: a stored deflate block costs at most 5 bytes of
/// overhead per 65535-byte chunk (RFC 1951), applied across a whole input's page stream.
fn pessimistic_compressed_size(page_size: u32, page_count: u64) -> u64 {
    let overhead_per_page = (page_size as u64 + 65534) / 65535 * 5;
    page_count * (page_size as u64 + overhead_per_page)
}

pub struct Assembler {
    archive: File,
    members: Vec<PendingMember>,
}

impl Assembler {
    pub fn new(archive: File) -> Assembler {
        Assembler {
            archive,
            members: Vec::new(),
        }
    }

    /// Packs one input: reserves its local header, streams its pages through the compressor,
    /// back-patches the header, and stashes its (not yet written) central-directory fields.
    /// Returns `(uncompressed_size, compressed_size)` for the caller's progress report.
    pub fn pack_input(
        &mut self,
        input: &RegisteredInput,
        gateway: &Gateway,
        metadata: &InputMetadata,
        driver: &mut CompressorDriver,
    ) -> PackResult<(u64, u64)> {
        let uncompressed_size = metadata.page_size as u64 * metadata.page_count;
        let pessimistic_compressed = pessimistic_compressed_size(metadata.page_size, metadata.page_count);

        let local_uses_zip64 =
            uncompressed_size > u32::MAX as u64 || pessimistic_compressed > u32::MAX as u64;
        let needed_version = if local_uses_zip64 { 45 } else { 20 };

        let path_bytes = path_bytes(&input.path);
        let local_offset = self.archive.stream_position()?;
        let reserved_len = 30 + path_bytes.len() as u64 + if local_uses_zip64 { 20 } else { 0 };

        let payload_start = local_offset + reserved_len;
        self.archive.seek(SeekFrom::Start(payload_start))?;

        let mut hasher = crc32fast::Hasher::new();
        let mut compressed_size = 0u64;
        let mut index = 0u64;
        let last_index = metadata.page_count.saturating_sub(1);

        let archive = &mut self.archive;
        let seen = gateway.stream_pages(&input.alias, metadata.page_size, |page| {
            hasher.update(page);
            let is_last = index == last_index;
            compressed_size += driver.feed_page(page, is_last, archive)?;
            index += 1;
            Ok(())
        })?;

        if seen != metadata.page_count {
            return Err(PackError::Inconsistent(format!(
                "{}: expected {} pages, streamed {}",
                input.path.display(),
                metadata.page_count,
                seen
            )));
        }

        driver.reset();
        let payload_end = self.archive.stream_position()?;
        debug_assert_eq!(payload_end - payload_start, compressed_size);

        let mtime = resolve_mtime(&input.path, &metadata.journal_mode)?;
        let (mod_date, mod_time) = dos_time::pack_system_time(mtime);
        let crc = hasher.finalize();

        let header = build_local_header(&LocalHeaderFields {
            needed_version,
            mod_time,
            mod_date,
            crc,
            uncompressed_size,
            compressed_size,
            use_zip64: local_uses_zip64,
            path: &path_bytes,
        });
        debug_assert_eq!(header.len() as u64, reserved_len);

        self.archive.seek(SeekFrom::Start(local_offset))?;
        self.archive.write_all(&header)?;
        self.archive.seek(SeekFrom::Start(payload_end))?;

        self.members.push(PendingMember {
            path: path_bytes,
            local_offset,
            needed_version,
            mod_time,
            mod_date,
            crc,
            uncompressed_size,
            compressed_size,
            external_attribs: (input.mode_bits as u32) << 16,
        });

        Ok((uncompressed_size, compressed_size))
    }

    /// Writes the central directory followed by the end-of-central-directory trailer (with its
    /// Zip64 variant when needed), then flushes the archive to disk.
    pub fn finish(mut self) -> PackResult<()> {
        let cd_offset = self.archive.stream_position()?;
        let entry_count = self.members.len() as u64;

        for member in &self.members {
            let entry = build_central_entry(&CentralEntryFields {
                needed_version: member.needed_version,
                mod_time: member.mod_time,
                mod_date: member.mod_date,
                crc: member.crc,
                uncompressed_size: member.uncompressed_size,
                compressed_size: member.compressed_size,
                local_offset: member.local_offset,
                external_attribs: member.external_attribs,
                path: &member.path,
            });
            self.archive.write_all(&entry)?;
        }

        let cd_end = self.archive.stream_position()?;
        let cd_size = cd_end - cd_offset;

        let needs_zip64_end =
            entry_count > 0xFFFF || cd_offset > u32::MAX as u64 || cd_size > u32::MAX as u64;

        if needs_zip64_end {
            let zip64_end_offset = cd_end;
            let block = build_zip64_end_and_locator(entry_count, cd_size, cd_offset, zip64_end_offset);
            self.archive.write_all(&block)?;
        }

        let eocd = build_end_of_central_directory(entry_count, cd_size, cd_offset);
        self.archive.write_all(&eocd)?;
        self.archive.flush()?;
        Ok(())
    }
}

fn path_bytes(path: &std::path::Path) -> Vec<u8> {
    path.as_os_str().as_encoded_bytes().to_vec()
}
