//! Little-endian integer packing shared by every fixed-layout archive record.
//!
//! `put_u16`/`put_u32`/`put_u64` push bytes onto a growable `Vec<u8>` via
//! `byteorder::WriteBytesExt`, which is how every on-disk record in this crate (local header,
//! central entry, end-of-central-directory, Zip64 extensions) gets built up before a single write
//! to the archive file.

use byteorder::{LittleEndian, WriteBytesExt};

pub trait ByteSink {
    fn put_u8(&mut self, value: u8);
    fn put_u16(&mut self, value: u16);
    fn put_u32(&mut self, value: u32);
    fn put_u64(&mut self, value: u64);
    fn put_bytes(&mut self, bytes: &[u8]);
}

impl ByteSink for Vec<u8> {
    fn put_u8(&mut self, value: u8) {
        self.write_u8(value).expect("writes to Vec<u8> never fail");
    }

    fn put_u16(&mut self, value: u16) {
        self.write_u16::<LittleEndian>(value).expect("writes to Vec<u8> never fail");
    }

    fn put_u32(&mut self, value: u32) {
        self.write_u32::<LittleEndian>(value).expect("writes to Vec<u8> never fail");
    }

    fn put_u64(&mut self, value: u64) {
        self.write_u64::<LittleEndian>(value).expect("writes to Vec<u8> never fail");
    }

    fn put_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}
