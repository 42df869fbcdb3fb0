//! The fixed on-disk record layouts of the ZIP format: local file header, central directory
//! entry, classic end-of-central-directory, and their Zip64 extensions. Every signature is the
//! literal 4-byte constant the format assigns to that record kind.

use crate::binio::ByteSink;

pub const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x0403_4b50; // "PK\x03\x04"
pub const CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0201_4b50; // "PK\x01\x02"
pub const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0605_4b50; // "PK\x05\x06"
pub const ZIP64_END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0606_4b50; // "PK\x06\x06"
pub const ZIP64_LOCATOR_SIGNATURE: u32 = 0x0706_4b50; // "PK\x06\x07"

/// The ext_id SQLite/Info-ZIP assign to the Zip64 extended-information extra field.
pub const ZIP64_EXTRA_ID: u16 = 0x0001;

pub const DEFLATE_METHOD: u16 = 8;
/// General-purpose flag bit 1: maximum-compression hint for method 8.
pub const MAX_COMPRESSION_FLAG: u16 = 0x0002;
/// `creator_version`'s high byte: host system `3` is Unix.
pub const UNIX_HOST_SYSTEM: u16 = 3 << 8;

pub struct LocalHeaderFields<'a> {
    pub needed_version: u16,
    pub mod_time: u16,
    pub mod_date: u16,
    pub crc: u32,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
    pub use_zip64: bool,
    pub path: &'a [u8],
}

/// Builds the local file header (`30 + path_len` bytes, plus 20 more when `use_zip64` is set).
/// Written after compression, back-patched over the region reserved at `local_offset`.
pub fn build_local_header(fields: &LocalHeaderFields) -> Vec<u8> {
    let mut buf = Vec::with_capacity(30 + fields.path.len() + 20);
    buf.put_u32(LOCAL_FILE_HEADER_SIGNATURE);
    buf.put_u16(fields.needed_version);
    buf.put_u16(MAX_COMPRESSION_FLAG);
    buf.put_u16(DEFLATE_METHOD);
    buf.put_u16(fields.mod_time);
    buf.put_u16(fields.mod_date);
    buf.put_u32(fields.crc);

    if fields.use_zip64 {
        buf.put_u32(0xFFFF_FFFF);
        buf.put_u32(0xFFFF_FFFF);
    } else {
        buf.put_u32(fields.uncompressed_size as u32);
        buf.put_u32(fields.compressed_size as u32);
    }

    buf.put_u16(fields.path.len() as u16);
    buf.put_u16(if fields.use_zip64 { 20 } else { 0 });
    buf.put_bytes(fields.path);

    if fields.use_zip64 {
        buf.put_u16(ZIP64_EXTRA_ID);
        buf.put_u16(16);
        buf.put_u64(fields.uncompressed_size);
        buf.put_u64(fields.compressed_size);
    }

    buf
}

pub struct CentralEntryFields<'a> {
    pub needed_version: u16,
    pub mod_time: u16,
    pub mod_date: u16,
    pub crc: u32,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
    pub local_offset: u64,
    pub external_attribs: u32,
    pub path: &'a [u8],
}

/// Builds one central-directory record plus its trailing path bytes and Zip64 extra, if any.
/// A field is promoted into the extra (in header order: size, compressed size, local offset)
/// exactly when it is `>= 0xFFFFFFFF`, using greater-or-equal so the sentinel value itself is
/// never left ambiguous inline.
pub fn build_central_entry(fields: &CentralEntryFields) -> Vec<u8> {
    const SENTINEL: u64 = 0xFFFF_FFFF;

    let size_overflows = fields.uncompressed_size >= SENTINEL;
    let compressed_overflows = fields.compressed_size >= SENTINEL;
    let offset_overflows = fields.local_offset >= SENTINEL;

    let mut extra = Vec::new();
    if size_overflows {
        extra.put_u64(fields.uncompressed_size);
    }
    if compressed_overflows {
        extra.put_u64(fields.compressed_size);
    }
    if offset_overflows {
        extra.put_u64(fields.local_offset);
    }

    let mut buf = Vec::with_capacity(46 + fields.path.len() + extra.len() + 4);
    buf.put_u32(CENTRAL_DIRECTORY_SIGNATURE);
    buf.put_u16(fields.needed_version | UNIX_HOST_SYSTEM);
    buf.put_u16(fields.needed_version);
    buf.put_u16(MAX_COMPRESSION_FLAG);
    buf.put_u16(DEFLATE_METHOD);
    buf.put_u16(fields.mod_time);
    buf.put_u16(fields.mod_date);
    buf.put_u32(fields.crc);
    buf.put_u32(if size_overflows {
        0xFFFF_FFFF
    } else {
        fields.uncompressed_size as u32
    });
    buf.put_u32(if compressed_overflows {
        0xFFFF_FFFF
    } else {
        fields.compressed_size as u32
    });
    buf.put_u16(fields.path.len() as u16);
    buf.put_u16(if extra.is_empty() { 0 } else { extra.len() as u16 + 4 });
    buf.put_u16(0); // comment_len
    buf.put_u16(0); // first_diskno
    buf.put_u16(0); // internal_attribs
    buf.put_u32(fields.external_attribs);
    buf.put_u32(if offset_overflows {
        0xFFFF_FFFF
    } else {
        fields.local_offset as u32
    });
    buf.put_bytes(fields.path);

    if !extra.is_empty() {
        buf.put_u16(ZIP64_EXTRA_ID);
        buf.put_u16(extra.len() as u16);
        buf.put_bytes(&extra);
    }

    buf
}

/// The Zip64 end-of-central-directory record plus its locator, emitted only when any of the
/// entry count, directory offset, or directory size exceeds the classic record's 32-bit (or
/// 16-bit entry count) limits.
pub fn build_zip64_end_and_locator(
    entry_count: u64,
    cd_size: u64,
    cd_offset: u64,
    zip64_end_offset: u64,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(56 + 20);

    buf.put_u32(ZIP64_END_OF_CENTRAL_DIRECTORY_SIGNATURE);
    buf.put_u64(44); // size of this record following this field
    buf.put_u16(45); // version made by
    buf.put_u16(45); // version needed to extract
    buf.put_u32(0); // this disk number
    buf.put_u32(0); // disk with start of central directory
    buf.put_u64(entry_count); // entries on this disk
    buf.put_u64(entry_count); // total entries
    buf.put_u64(cd_size);
    buf.put_u64(cd_offset);

    buf.put_u32(ZIP64_LOCATOR_SIGNATURE);
    buf.put_u32(0); // disk with the zip64 end record
    buf.put_u64(zip64_end_offset);
    buf.put_u32(1); // total number of disks

    buf
}

/// The classic end-of-central-directory record. Carries `0xFFFF`/`0xFFFFFFFF` sentinels for
/// whichever fields the Zip64 record (if present) already carries in full.
pub fn build_end_of_central_directory(entry_count: u64, cd_size: u64, cd_offset: u64) -> Vec<u8> {
    let needs_zip64_counts = entry_count > 0xFFFF;
    let needs_zip64_size = cd_size > 0xFFFF_FFFF;
    let needs_zip64_offset = cd_offset > 0xFFFF_FFFF;

    let entries_field: u16 = if needs_zip64_counts { 0xFFFF } else { entry_count as u16 };

    let mut buf = Vec::with_capacity(22);
    buf.put_u32(END_OF_CENTRAL_DIRECTORY_SIGNATURE);
    buf.put_u16(0); // this disk number
    buf.put_u16(0); // disk with start of central directory
    buf.put_u16(entries_field); // entries on this disk
    buf.put_u16(entries_field); // total entries
    buf.put_u32(if needs_zip64_size { 0xFFFF_FFFF } else { cd_size as u32 });
    buf.put_u32(if needs_zip64_offset {
        0xFFFF_FFFF
    } else {
        cd_offset as u32
    });
    buf.put_u16(0); // comment length
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_header_without_zip64_is_30_bytes_plus_path() {
        let fields = LocalHeaderFields {
            needed_version: 20,
            mod_time: 0,
            mod_date: 0,
            crc: 0xdead_beef,
            uncompressed_size: 16384,
            compressed_size: 1000,
            use_zip64: false,
            path: b"db.sqlite",
        };
        let header = build_local_header(&fields);
        assert_eq!(header.len(), 30 + 9);
        assert_eq!(&header[0..4], &LOCAL_FILE_HEADER_SIGNATURE.to_le_bytes());
        assert_eq!(u16::from_le_bytes(header[26..28].try_into().unwrap()), 9);
        assert_eq!(u16::from_le_bytes(header[28..30].try_into().unwrap()), 0);
    }

    #[test]
    fn local_header_with_zip64_appends_extra() {
        let fields = LocalHeaderFields {
            needed_version: 45,
            mod_time: 0,
            mod_date: 0,
            crc: 0,
            uncompressed_size: 5 * 1024 * 1024 * 1024,
            compressed_size: 1 * 1024 * 1024 * 1024,
            use_zip64: true,
            path: b"big.db",
        };
        let header = build_local_header(&fields);
        assert_eq!(header.len(), 30 + 6 + 20);
        assert_eq!(&header[22..26], &0xFFFF_FFFFu32.to_le_bytes());
        assert_eq!(&header[26..30], &0xFFFF_FFFFu32.to_le_bytes());
    }

    #[test]
    fn central_entry_promotes_only_overflowing_fields() {
        let fields = CentralEntryFields {
            needed_version: 45,
            mod_time: 0,
            mod_date: 0,
            crc: 0,
            uncompressed_size: 100,
            compressed_size: 50,
            local_offset: 0x1_0000_0000,
            external_attribs: 0,
            path: b"x",
        };
        let entry = build_central_entry(&fields);
        // extra_len should cover exactly one 64-bit field (the offset) plus the 4-byte header.
        let extra_len = u16::from_le_bytes(entry[30..32].try_into().unwrap());
        assert_eq!(extra_len, 8 + 4);
    }

    #[test]
    fn end_of_central_directory_uses_sentinels_past_16_bit_count() {
        let eocd = build_end_of_central_directory(100_000, 10, 20);
        let count = u16::from_le_bytes(eocd[8..10].try_into().unwrap());
        assert_eq!(count, 0xFFFF);
    }
}
