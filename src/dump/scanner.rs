use std::path::Path;

use super::data::LogFile;
use super::index::{IndexEntry, IndexFile};
use crate::error::Result;
use crate::record::Record;

/// One decoded record together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Scanned {
    pub position: u64,
    pub entry: IndexEntry,
    pub record: Record,
}

/// Read side of a log/index pair.
///
/// Records are addressed by position in the index. [`Scanner::iter`] walks
/// them in append order; [`Scanner::read`] jumps to any position.
#[derive(Debug)]
pub struct Scanner {
    log: LogFile,
    index: IndexFile,
}

impl Scanner {
    pub fn open(log_path: impl AsRef<Path>, index_path: impl AsRef<Path>) -> Result<Self> {
        let log = LogFile::open(log_path)?;
        let index = IndexFile::open(index_path)?;
        Ok(Self { log, index })
    }

    pub fn index(&self) -> &IndexFile {
        &self.index
    }

    /// Number of entries in the index.
    pub fn len(&self) -> Result<u64> {
        self.index.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.index.is_empty()
    }

    /// Decodes the record at `position`, or `None` past the end of the log.
    pub fn read(&self, position: u64) -> Result<Option<Scanned>> {
        let Some(entry) = self.index.read_at(position)? else {
            return Ok(None);
        };
        let record = self.log.read_record(entry.offset, entry.kind)?;
        Ok(Some(Scanned {
            position,
            entry,
            record,
        }))
    }

    /// Scans every record from the start.
    pub fn iter(&self) -> ScanIterator<'_> {
        self.iter_from(0)
    }

    /// Scans from `position` to the end of the log.
    pub fn iter_from(&self, position: u64) -> ScanIterator<'_> {
        ScanIterator {
            scanner: self,
            position,
            done: false,
        }
    }

    pub fn into_iter_from(self, position: u64) -> IntoScanIterator {
        IntoScanIterator {
            scanner: self,
            position,
            done: false,
        }
    }
}

/// Forward scan over a borrowed [`Scanner`]. Ends at the first short index
/// read; stops for good after yielding an error.
pub struct ScanIterator<'a> {
    scanner: &'a Scanner,
    position: u64,
    done: bool,
}

impl ScanIterator<'_> {
    /// Position of the next record to be read.
    pub fn position(&self) -> u64 {
        self.position
    }
}

fn advance(scanner: &Scanner, position: &mut u64, done: &mut bool) -> Option<Result<Scanned>> {
    if *done {
        return None;
    }
    match scanner.read(*position) {
        Ok(Some(scanned)) => {
            *position += 1;
            Some(Ok(scanned))
        }
        Ok(None) => {
            *done = true;
            None
        }
        Err(e) => {
            *done = true;
            Some(Err(e))
        }
    }
}

impl Iterator for ScanIterator<'_> {
    type Item = Result<Scanned>;

    fn next(&mut self) -> Option<Self::Item> {
        advance(self.scanner, &mut self.position, &mut self.done)
    }
}

/// Forward scan that owns its [`Scanner`], for moving onto another thread.
pub struct IntoScanIterator {
    scanner: Scanner,
    position: u64,
    done: bool,
}

impl Iterator for IntoScanIterator {
    type Item = Result<Scanned>;

    fn next(&mut self) -> Option<Self::Item> {
        advance(&self.scanner, &mut self.position, &mut self.done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::Writer;
    use crate::record::{Blob, TrieNodesPacket};
    use crate::Error;
    use std::fs::File;
    use std::io::{Seek, SeekFrom, Write};
    use tempfile::TempDir;

    fn node(id: u64) -> Record {
        TrieNodesPacket {
            id,
            nodes: vec![Blob(vec![id as u8; (id as usize % 5) + 1])],
        }
        .into()
    }

    fn build(dir: &TempDir, n: u64) -> (std::path::PathBuf, std::path::PathBuf) {
        let log_path = dir.path().join("snap.dump");
        let index_path = dir.path().join("snap.index");
        let mut writer = Writer::create(&log_path, &index_path).unwrap();
        for id in 0..n {
            writer.write(&node(id)).unwrap();
        }
        writer.finish().unwrap();
        (log_path, index_path)
    }

    #[test]
    fn test_scan_yields_exactly_n_records() {
        for n in [0u64, 1, 2, 7] {
            let dir = TempDir::new().unwrap();
            let (log_path, index_path) = build(&dir, n);
            let scanner = Scanner::open(&log_path, &index_path).unwrap();

            let scanned: Vec<_> = scanner.iter().collect::<Result<_>>().unwrap();
            assert_eq!(scanned.len() as u64, n);
            for (i, s) in scanned.iter().enumerate() {
                assert_eq!(s.position, i as u64);
                assert_eq!(s.record, node(i as u64));
            }
        }
    }

    #[test]
    fn test_iter_from_and_random_reads() {
        let dir = TempDir::new().unwrap();
        let (log_path, index_path) = build(&dir, 5);
        let scanner = Scanner::open(&log_path, &index_path).unwrap();

        let ids: Vec<u64> = scanner
            .iter_from(3)
            .map(|s| s.unwrap().record.id())
            .collect();
        assert_eq!(ids, vec![3, 4]);

        assert_eq!(scanner.read(1).unwrap().unwrap().record, node(1));
        assert_eq!(scanner.read(0).unwrap().unwrap().record, node(0));
        assert!(scanner.read(5).unwrap().is_none());
        assert_eq!(scanner.iter_from(9).count(), 0);
        assert!(scanner.read(u64::MAX).unwrap().is_none());
        assert_eq!(scanner.iter_from(u64::MAX).count(), 0);
    }

    #[test]
    fn test_owned_iterator() {
        let dir = TempDir::new().unwrap();
        let (log_path, index_path) = build(&dir, 3);
        let scanner = Scanner::open(&log_path, &index_path).unwrap();

        let handle = std::thread::spawn(move || scanner.into_iter_from(0).count());
        assert_eq!(handle.join().unwrap(), 3);
    }

    #[test]
    fn test_corrupt_payload_aborts_scan() {
        let dir = TempDir::new().unwrap();
        let (log_path, index_path) = build(&dir, 3);

        // Point the second entry far past the end of the log
        {
            let mut index = File::options().write(true).open(&index_path).unwrap();
            index.seek(SeekFrom::Start(17 + 8)).unwrap();
            index.write_all(&1_000_000u64.to_be_bytes()).unwrap();
        }

        let scanner = Scanner::open(&log_path, &index_path).unwrap();
        let mut iter = scanner.iter();
        assert!(iter.next().unwrap().is_ok());
        assert!(matches!(iter.next(), Some(Err(Error::Decode { .. }))));
        assert!(iter.next().is_none(), "scan must stop after an error");
    }
}
