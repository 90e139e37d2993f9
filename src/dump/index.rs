use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};

use crate::error::Result;
use crate::record::Kind;
use crate::Error;

/// Encoded width of one index entry: timestamp, offset, kind.
pub const ENTRY_SIZE: u64 = 17;

/// Location and write time of one record in the paired log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Nanoseconds since the unix epoch.
    pub timestamp: u64,
    /// Byte offset of the payload in the log file.
    pub offset: u64,
    pub kind: Kind,
}

impl IndexEntry {
    pub fn encode(&self) -> [u8; ENTRY_SIZE as usize] {
        let mut buf = [0u8; ENTRY_SIZE as usize];
        BigEndian::write_u64(&mut buf[..8], self.timestamp);
        BigEndian::write_u64(&mut buf[8..16], self.offset);
        buf[16] = self.kind.as_u8();
        buf
    }
}

impl TryFrom<&[u8]> for IndexEntry {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < ENTRY_SIZE as usize {
            return Err(Error::IndexCorruption(format!(
                "index entry needs {} bytes, got {}",
                ENTRY_SIZE,
                bytes.len()
            )));
        }
        let mut reader = bytes;
        let timestamp = reader
            .read_u64::<BigEndian>()
            .map_err(|e| Error::ReadError("index timestamp", e))?;
        let offset = reader
            .read_u64::<BigEndian>()
            .map_err(|e| Error::ReadError("index offset", e))?;
        let kind = reader
            .read_u8()
            .map_err(|e| Error::ReadError("index kind", e))?;

        Ok(IndexEntry {
            timestamp,
            offset,
            kind: Kind::try_from(kind)?,
        })
    }
}

/// Fixed-width array of [`IndexEntry`] on disk. No header, no footer, no checksum.
#[derive(Debug)]
pub struct IndexFile {
    file: File,
    path: PathBuf,
}

impl IndexFile {
    /// Opens an existing index for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self { file, path })
    }

    /// Creates an empty index, truncating any existing file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::options()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        Ok(Self { file, path })
    }

    /// Opens (or creates) an index for appending after its current entries.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::options()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn byte_len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Number of complete entries.
    pub fn len(&self) -> Result<u64> {
        Ok(self.byte_len()? / ENTRY_SIZE)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Bytes after the last complete entry. Non-zero means a torn append or a
    /// file that is not an index; scans still stop cleanly before them.
    pub fn trailing_bytes(&self) -> Result<u64> {
        Ok(self.byte_len()? % ENTRY_SIZE)
    }

    /// Reads the entry at `position`. A short read, including reading past the
    /// end, yields `None`; that is the end-of-log signal for scans.
    pub fn read_at(&self, position: u64) -> Result<Option<IndexEntry>> {
        // Slots past the end, including ones whose byte offset overflows
        let start = match position.checked_mul(ENTRY_SIZE) {
            Some(start) if start < self.byte_len()? => start,
            _ => return Ok(None),
        };
        let mut buf = [0u8; ENTRY_SIZE as usize];
        let mut file = &self.file;
        file.seek(SeekFrom::Start(start))?;

        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => return Ok(None),
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::ReadError("index entry", e)),
            }
        }
        IndexEntry::try_from(&buf[..]).map(Some)
    }

    /// Appends one entry at the logical end of the file, that is at
    /// `len() * ENTRY_SIZE`. A torn trailing entry gets overwritten.
    pub fn append(&mut self, entry: &IndexEntry) -> Result<()> {
        let end = self.len()? * ENTRY_SIZE;
        self.file.seek(SeekFrom::Start(end))?;
        self.file
            .write_all(&entry.encode())
            .map_err(|e| Error::WriteError("index entry", e))
    }

    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn entry(timestamp: u64, offset: u64, kind: Kind) -> IndexEntry {
        IndexEntry {
            timestamp,
            offset,
            kind,
        }
    }

    #[test]
    fn test_entry_layout() {
        let e = entry(0x0102030405060708, 0x1112131415161718, Kind::TrieNodes);
        let bytes = e.encode();
        assert_eq!(
            bytes,
            [
                0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x11, 0x12, 0x13, 0x14, 0x15,
                0x16, 0x17, 0x18, 0x03
            ]
        );

        assert_eq!(IndexEntry::try_from(&bytes[..]).unwrap(), e);
    }

    #[test]
    fn test_entry_decoding_errors() {
        let short = [0u8; 16];
        assert!(matches!(
            IndexEntry::try_from(&short[..]),
            Err(Error::IndexCorruption(_))
        ));

        let mut bad_kind = entry(1, 2, Kind::AccountRange).encode();
        bad_kind[16] = 9;
        assert!(matches!(
            IndexEntry::try_from(&bad_kind[..]),
            Err(Error::UnknownKind(9))
        ));
    }

    #[test]
    fn test_append_and_read_at() {
        let temp = NamedTempFile::new().unwrap();
        let mut index = IndexFile::create(temp.path()).unwrap();
        assert_eq!(index.len().unwrap(), 0);
        assert_eq!(index.read_at(0).unwrap(), None);

        let entries = [
            entry(10, 0, Kind::AccountRange),
            entry(20, 100, Kind::ByteCodes),
            entry(30, 250, Kind::StorageRanges),
        ];
        for e in &entries {
            index.append(e).unwrap();
        }

        assert_eq!(index.len().unwrap(), 3);
        // Random access in any order
        assert_eq!(index.read_at(2).unwrap(), Some(entries[2]));
        assert_eq!(index.read_at(0).unwrap(), Some(entries[0]));
        assert_eq!(index.read_at(1).unwrap(), Some(entries[1]));
        assert_eq!(index.read_at(3).unwrap(), None);
        assert_eq!(index.read_at(1000).unwrap(), None);
        assert_eq!(index.read_at(u64::MAX / ENTRY_SIZE).unwrap(), None);
        assert_eq!(index.read_at(u64::MAX).unwrap(), None);
    }

    #[test]
    fn test_partial_trailing_entry_is_end_of_log() {
        let temp = NamedTempFile::new().unwrap();
        {
            let mut index = IndexFile::create(temp.path()).unwrap();
            index.append(&entry(1, 0, Kind::TrieNodes)).unwrap();
        }
        // Simulate a torn append
        {
            let mut file = File::options().append(true).open(temp.path()).unwrap();
            file.write_all(&[0xff; 5]).unwrap();
        }

        let index = IndexFile::open(temp.path()).unwrap();
        assert_eq!(index.len().unwrap(), 1);
        assert_eq!(index.trailing_bytes().unwrap(), 5);
        assert!(index.read_at(0).unwrap().is_some());
        assert_eq!(index.read_at(1).unwrap(), None);
    }

    #[test]
    fn test_open_append_continues_after_existing_entries() {
        let temp = NamedTempFile::new().unwrap();
        {
            let mut index = IndexFile::create(temp.path()).unwrap();
            index.append(&entry(1, 0, Kind::ByteCodes)).unwrap();
        }
        let mut index = IndexFile::open_append(temp.path()).unwrap();
        index.append(&entry(2, 7, Kind::ByteCodes)).unwrap();

        assert_eq!(index.len().unwrap(), 2);
        assert_eq!(index.read_at(1).unwrap(), Some(entry(2, 7, Kind::ByteCodes)));
    }
}
