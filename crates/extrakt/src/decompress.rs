//! Transparent decompression of archive byte streams.
//!
//! The leading bytes of the stream are sniffed for gzip or zlib framing.
//! Recognized layers are inflated and the result sniffed again, so a
//! doubly compressed tarball still comes out as plain tar. Anything
//! unrecognized is passed through untouched.

use std::io::{self, BufRead, BufReader, Read};

use flate2::bufread::{MultiGzDecoder, ZlibDecoder};

/// Upper bound on nested compression layers that will be unwrapped.
pub const MAX_LAYERS: usize = 3;

const BUFFER_SIZE: usize = 64 * 1024;

/// Compression framing detected at the start of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Plain,
    Gzip,
    Zlib,
}

impl Compression {
    /// Classify a stream by its first bytes.
    pub fn sniff(header: &[u8]) -> Self {
        match header {
            [0x1f, 0x8b, ..] => Self::Gzip,
            [0x78, 0x01 | 0x9c | 0xda, ..] => Self::Zlib,
            _ => Self::Plain,
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Gzip => write!(f, "gzip"),
            Self::Zlib => write!(f, "zlib"),
        }
    }
}

/// A reader that yields the plain tar bytes of a possibly compressed source.
///
/// Remembers whether any read through it has failed, so callers can tell a
/// stream error apart from a consumer that rejected well-formed bytes.
pub struct Decompressed {
    inner: Box<dyn BufRead + Send>,
    layers: Vec<Compression>,
    failed: bool,
}

impl Decompressed {
    /// Wrap `source`, unwrapping up to [`MAX_LAYERS`] compression layers.
    ///
    /// Fails if sniffing a layer fails, which for any layer past the first
    /// means the decoder rejected its input.
    pub fn new<R: Read + Send + 'static>(source: R) -> io::Result<Self> {
        let mut inner: Box<dyn BufRead + Send> =
            Box::new(BufReader::with_capacity(BUFFER_SIZE, source));
        let mut layers = Vec::new();

        while layers.len() < MAX_LAYERS {
            let compression = Compression::sniff(inner.fill_buf()?);
            inner = match compression {
                Compression::Plain => break,
                Compression::Gzip => {
                    Box::new(BufReader::with_capacity(BUFFER_SIZE, MultiGzDecoder::new(inner)))
                }
                Compression::Zlib => {
                    Box::new(BufReader::with_capacity(BUFFER_SIZE, ZlibDecoder::new(inner)))
                }
            };
            layers.push(compression);
        }

        Ok(Self {
            inner,
            layers,
            failed: false,
        })
    }

    /// Compression layers unwrapped, outermost first. Empty for plain tar.
    pub fn layers(&self) -> &[Compression] {
        &self.layers
    }

    pub fn is_compressed(&self) -> bool {
        !self.layers.is_empty()
    }

    /// Returns true if a read through this stream has returned an error.
    pub fn has_failed(&self) -> bool {
        self.failed
    }
}

impl Read for Decompressed {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).inspect_err(|_| self.failed = true)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::{GzEncoder, ZlibEncoder};

    use super::*;

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    fn zlib(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    fn read_all(mut reader: Decompressed) -> Vec<u8> {
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn sniff_recognizes_framing() {
        assert_eq!(Compression::sniff(&[0x1f, 0x8b, 0x08]), Compression::Gzip);
        assert_eq!(Compression::sniff(&[0x78, 0x9c]), Compression::Zlib);
        assert_eq!(Compression::sniff(&[0x78, 0x01]), Compression::Zlib);
        assert_eq!(Compression::sniff(&[0x78, 0xda]), Compression::Zlib);
        assert_eq!(Compression::sniff(b"package.json"), Compression::Plain);
        assert_eq!(Compression::sniff(&[0x1f]), Compression::Plain);
        assert_eq!(Compression::sniff(&[]), Compression::Plain);
    }

    #[test]
    fn plain_bytes_pass_through_unchanged() {
        let data = b"not compressed at all".to_vec();
        let reader = Decompressed::new(io::Cursor::new(data.clone())).unwrap();
        assert!(!reader.is_compressed());
        assert_eq!(read_all(reader), data);
    }

    #[test]
    fn gzip_is_inflated() {
        let reader = Decompressed::new(io::Cursor::new(gzip(b"hello tar"))).unwrap();
        assert_eq!(reader.layers(), &[Compression::Gzip]);
        assert_eq!(read_all(reader), b"hello tar");
    }

    #[test]
    fn zlib_is_inflated() {
        let reader = Decompressed::new(io::Cursor::new(zlib(b"hello tar"))).unwrap();
        assert_eq!(reader.layers(), &[Compression::Zlib]);
        assert_eq!(read_all(reader), b"hello tar");
    }

    #[test]
    fn nested_layers_are_unwrapped() {
        let data = gzip(&gzip(b"twice"));
        let reader = Decompressed::new(io::Cursor::new(data)).unwrap();
        assert_eq!(reader.layers(), &[Compression::Gzip, Compression::Gzip]);
        assert_eq!(read_all(reader), b"twice");
    }

    #[test]
    fn unwrapping_stops_at_max_layers() {
        let mut data = b"deep".to_vec();
        for _ in 0..MAX_LAYERS + 1 {
            data = gzip(&data);
        }
        let reader = Decompressed::new(io::Cursor::new(data)).unwrap();
        assert_eq!(reader.layers().len(), MAX_LAYERS);
        // One gzip layer is left in the output.
        assert_eq!(Compression::sniff(&read_all(reader)), Compression::Gzip);
    }

    #[test]
    fn corrupt_gzip_marks_stream_failed() {
        let mut data = gzip(&vec![b'x'; 4096]);
        let len = data.len();
        for byte in &mut data[10..len - 8] {
            *byte = 0xff;
        }

        match Decompressed::new(io::Cursor::new(data)) {
            // Sniffing the inner layer already hit the corruption.
            Err(_) => {}
            Ok(mut reader) => {
                let mut out = Vec::new();
                assert!(reader.read_to_end(&mut out).is_err());
                assert!(reader.has_failed());
            }
        }
    }
}
