//! Wraps the streaming deflate compressor: one small driver, fed one page at a time, writing its
//! output directly through rather than buffering a whole input's worth of payload.

use flate2::{Compress, Compression, FlushCompress, Status};
use std::io::Write;

use crate::error::{PackError, PackResult};

/// Bound on a single deflate call's worst-case output growth for one page, per RFC 1951's
/// guarantee that a stored block costs at most 5 bytes of overhead per 65535-byte chunk.
fn output_headroom(page_size: u32) -> usize {
    let chunks = (page_size as u64 + 65534) / 65535;
    (chunks * 5) as usize + 64
}

pub struct CompressorDriver {
    compress: Compress,
    scratch: Vec<u8>,
}

/// Largest page size the gateway accepts; the driver sizes its scratch buffer for this once so
/// the same compressor instance can be reused, and reset, across inputs whose page sizes differ.
const MAX_PAGE_SIZE: u32 = 65536;

impl CompressorDriver {
    /// Maximum compression level, raw deflate stream (no zlib wrapper) so the archive payload is
    /// exactly what method 8 expects with no extra header/trailer bytes.
    pub fn new() -> CompressorDriver {
        CompressorDriver {
            compress: Compress::new(Compression::best(), false),
            scratch: vec![0u8; MAX_PAGE_SIZE as usize + output_headroom(MAX_PAGE_SIZE)],
        }
    }

    /// Feeds one page through the compressor and writes every emitted byte to `sink`. Uses
    /// block-boundary flush (`FlushCompress::Sync`) for every page but the last, and
    /// stream-finish flush (`FlushCompress::Finish`) for the last page of an input, which also
    /// emits the deflate trailer. Returns the number of bytes written.
    pub fn feed_page(&mut self, page: &[u8], is_last: bool, sink: &mut impl Write) -> PackResult<u64> {
        let flush = if is_last {
            FlushCompress::Finish
        } else {
            FlushCompress::Sync
        };

        let mut input = page;
        let mut written = 0u64;

        loop {
            let before_in = self.compress.total_in();
            let before_out = self.compress.total_out();

            let status = self
                .compress
                .compress(input, &mut self.scratch, flush)
                .map_err(|e| PackError::Compression(e.to_string()))?;

            let consumed = (self.compress.total_in() - before_in) as usize;
            let produced = (self.compress.total_out() - before_out) as usize;

            if produced > 0 {
                sink.write_all(&self.scratch[..produced])?;
                written += produced as u64;
            }
            input = &input[consumed..];

            match status {
                Status::Ok | Status::BufError if input.is_empty() && !is_last => break,
                Status::Ok | Status::BufError if input.is_empty() && is_last => {
                    // Finish keeps demanding calls until it reports StreamEnd even with no more
                    // input; an empty slice is a legal zero-length input to drain the trailer.
                    continue;
                }
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => continue,
            }
        }

        Ok(written)
    }

    /// Resets the stream so the next input starts fresh, matching the per-input lifecycle: one
    /// compressor instance, reused across inputs, reset between them.
    pub fn reset(&mut self) {
        self.compress.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compresses_single_page_input() {
        let page = vec![0xAB; 4096];
        let mut driver = CompressorDriver::new();
        let mut out = Vec::new();
        let written = driver.feed_page(&page, true, &mut out).unwrap();
        assert_eq!(written as usize, out.len());
        assert!(!out.is_empty());

        // Decompresses back to the original page via raw inflate.
        let mut decompress = flate2::Decompress::new(false);
        let mut restored = vec![0u8; 4096];
        decompress
            .decompress(&out, &mut restored, flate2::FlushDecompress::Finish)
            .unwrap();
        assert_eq!(restored, page);
    }

    #[test]
    fn resets_between_inputs() {
        let mut driver = CompressorDriver::new();
        let mut out = Vec::new();
        driver.feed_page(&[1u8; 64], true, &mut out).unwrap();
        driver.reset();
        out.clear();
        let written = driver.feed_page(&[2u8; 64], true, &mut out).unwrap();
        assert_eq!(written as usize, out.len());
    }
}
