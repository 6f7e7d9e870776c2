use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sequential reader over a TFRecord file.
///
/// On-disk layout of one record (all integers little-endian):
///   [0..8]    length          (u64)
///   [8..12]   masked crc32c of the length bytes
///   [12..12+length] data
///   [..+4]    masked crc32c of data
///
/// Yields one raw record per iteration, in file order. The file handle is
/// owned by the reader and released when it is dropped, whether or not the
/// sequence was consumed to the end.
pub struct RecordReader<R = BufReader<File>> {
    inner: R,
    index: u64,
    done: bool,
}

const LENGTH_SIZE: usize = 8;
const CRC_SIZE: usize = 4;
const MASK_DELTA: u32 = 0xa282_ead8;

impl RecordReader {
    /// Open a record file. Fails with [`OpenError::SourceNotFound`] before
    /// any reading if the path does not exist.
    pub fn open(path: &Path) -> Result<Self, OpenError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => OpenError::SourceNotFound(path.to_path_buf()),
            _ => OpenError::Unreadable(path.to_path_buf(), e),
        })?;
        debug!(path = %path.display(), "opened record source");
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            index: 0,
            done: false,
        }
    }

    fn read_record(&mut self) -> Result<Option<Vec<u8>>, RecordError> {
        let mut header = [0u8; LENGTH_SIZE + CRC_SIZE];
        let got = read_full(&mut self.inner, &mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < header.len() {
            return Err(RecordError::Truncated {
                index: self.index,
                got,
                expected: header.len(),
            });
        }

        let (len_bytes, len_crc) = header.split_at(LENGTH_SIZE);
        let expected_crc = u32::from_le_bytes([len_crc[0], len_crc[1], len_crc[2], len_crc[3]]);
        if masked_crc32c(len_bytes) != expected_crc {
            return Err(RecordError::ChecksumMismatch {
                index: self.index,
                part: "length",
            });
        }
        let mut len_arr = [0u8; LENGTH_SIZE];
        len_arr.copy_from_slice(len_bytes);
        let len = u64::from_le_bytes(len_arr);

        // take() keeps a corrupt length from forcing a huge allocation up front.
        let mut data = Vec::new();
        (&mut self.inner).take(len).read_to_end(&mut data)?;
        if (data.len() as u64) < len {
            return Err(RecordError::Truncated {
                index: self.index,
                got: data.len(),
                expected: len as usize,
            });
        }

        let mut footer = [0u8; CRC_SIZE];
        let got = read_full(&mut self.inner, &mut footer)?;
        if got < CRC_SIZE {
            return Err(RecordError::Truncated {
                index: self.index,
                got,
                expected: CRC_SIZE,
            });
        }
        if masked_crc32c(&data) != u32::from_le_bytes(footer) {
            return Err(RecordError::ChecksumMismatch {
                index: self.index,
                part: "data",
            });
        }

        self.index += 1;
        Ok(Some(data))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Vec<u8>, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(data)) => Some(Ok(data)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Writes records in the same framing [`RecordReader`] consumes.
pub struct RecordWriter<W: Write = BufWriter<File>> {
    inner: W,
}

impl RecordWriter {
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write_record(&mut self, data: &[u8]) -> io::Result<()> {
        let len = (data.len() as u64).to_le_bytes();
        self.inner.write_all(&len)?;
        self.inner.write_all(&masked_crc32c(&len).to_le_bytes())?;
        self.inner.write_all(data)?;
        self.inner.write_all(&masked_crc32c(data).to_le_bytes())?;
        Ok(())
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Like `read_exact`, but reports how many bytes were available instead of
/// failing on a short read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// CRC-32C (Castagnoli), reflected polynomial. Table built at compile time so
// no checksum crate is needed.
const CRC32C_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0x82f6_3b78
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

pub fn crc32c(data: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &b in data {
        crc = CRC32C_TABLE[((crc ^ b as u32) & 0xff) as usize] ^ (crc >> 8);
    }
    !crc
}

pub fn masked_crc32c(data: &[u8]) -> u32 {
    let crc = crc32c(data);
    ((crc >> 15) | (crc << 17)).wrapping_add(MASK_DELTA)
}

/// Failure to open a record source. Nothing has been read yet.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("record source {} does not exist", .0.display())]
    SourceNotFound(PathBuf),
    #[error("failed to open record source {}: {}", .0.display(), .1)]
    Unreadable(PathBuf, io::Error),
}

/// Failure while reading records from an open source.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record {index} truncated: got {got} bytes, expected {expected}")]
    Truncated {
        index: u64,
        got: usize,
        expected: usize,
    },
    #[error("record {index} {part} checksum mismatch")]
    ChecksumMismatch { index: u64, part: &'static str },
    #[error("failed to read record: {0}")]
    Io(#[from] io::Error),
}
