use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::encoding::{self, EncodingError};
use crate::error::Result;
use crate::record::{Kind, Record};
use crate::Error;

/// Raw concatenation of encoded payloads, addressed by offsets kept in the
/// paired index file.
#[derive(Debug)]
pub struct LogFile {
    file: File,
    path: PathBuf,
    /// Length of the file as far as this handle knows; the next append lands here.
    end: u64,
}

impl LogFile {
    /// Opens an existing log for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let end = file.metadata()?.len();
        Ok(Self { file, path, end })
    }

    /// Creates an empty log, truncating any existing file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::options()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        Ok(Self { file, path, end: 0 })
    }

    /// Opens (or creates) a log for appending after its current contents.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::options()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;
        let end = file.metadata()?.len();
        Ok(Self { file, path, end })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current length in bytes.
    pub fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Appends `bytes` and returns the offset they were written at.
    pub fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        let offset = self.end;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file
            .write_all(bytes)
            .map_err(|e| Error::WriteError("log payload", e))?;
        self.end += bytes.len() as u64;
        Ok(offset)
    }

    /// Reads exactly `len` bytes starting at `offset`.
    pub fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf)
            .map_err(|e| Error::ReadError("log payload", e))?;
        Ok(buf)
    }

    /// Decodes the single record of `kind` whose payload starts at `offset`.
    pub fn read_record(&self, offset: u64, kind: Kind) -> Result<Record> {
        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset))?;
        encoding::decode_from(BufReader::new(file), kind).map_err(|e| decode_error(kind, offset, e))
    }

    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}

pub(crate) fn decode_error(kind: Kind, offset: u64, e: EncodingError) -> Error {
    Error::Decode {
        kind,
        offset,
        reason: e.to_string(),
    }
}
