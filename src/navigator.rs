//! Cursor over a dump for interactive viewing.

use std::fmt;
use std::path::PathBuf;

use crate::dump::{IndexEntry, Scanner};
use crate::encoding::format;
use crate::error::Result;
use crate::export::Exporter;
use crate::locate::locate;
use crate::time::format_timestamp;
use crate::Error;

/// What the viewer shows for one position.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    StartOfLog,
    EndOfLog,
    Record {
        position: u64,
        entry: IndexEntry,
        summary: String,
    },
}

impl View {
    pub fn is_boundary(&self) -> bool {
        !matches!(self, View::Record { .. })
    }

    /// Title line for the row: the entry's write time.
    pub fn title(&self) -> Option<String> {
        match self {
            View::Record { entry, .. } => Some(format_timestamp(entry.timestamp)),
            _ => None,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::StartOfLog => write!(f, "Reached start of dump..."),
            View::EndOfLog => write!(f, "Reached end of dump..."),
            View::Record { summary, .. } => write!(f, "{summary}"),
        }
    }
}

/// A position in a dump plus the operations to move it and look around it.
///
/// The entry count is fixed when the navigator is built; call
/// [`Navigator::refresh`] to pick up records appended since.
#[derive(Debug)]
pub struct Navigator {
    scanner: Scanner,
    position: u64,
    len: u64,
    precedes_log: bool,
}

impl Navigator {
    /// Starts at the first record. Empty dumps are rejected.
    pub fn new(scanner: Scanner) -> Result<Self> {
        let len = scanner.len()?;
        if len == 0 {
            return Err(Error::InvalidInput("dump has no records".to_string()));
        }
        Ok(Self {
            scanner,
            position: 0,
            len,
            precedes_log: false,
        })
    }

    /// Starts at the last record written at or before `timestamp`.
    ///
    /// When every record is newer than `timestamp` the cursor sits on the
    /// first record and [`Navigator::precedes_log`] is true; that record is
    /// not a match.
    pub fn locate(scanner: Scanner, timestamp: u64) -> Result<Self> {
        let mut navigator = Self::new(scanner)?;
        navigator.position = locate(navigator.scanner.index(), timestamp)?;
        if navigator.position == 0 {
            let first = navigator.scanner.index().read_at(0)?.ok_or_else(|| {
                Error::IndexCorruption("index shrank below its first entry".to_string())
            })?;
            navigator.precedes_log = first.timestamp > timestamp;
        }
        tracing::debug!(
            timestamp,
            position = navigator.position,
            len = navigator.len,
            precedes_log = navigator.precedes_log,
            "Located record"
        );
        Ok(navigator)
    }

    /// Whether the located time is earlier than every record in the dump.
    pub fn precedes_log(&self) -> bool {
        self.precedes_log
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn refresh(&mut self) -> Result<u64> {
        self.len = self.scanner.len()?;
        Ok(self.len)
    }

    /// Moves one record back, stopping at the first.
    pub fn up(&mut self) -> u64 {
        self.position = self.position.saturating_sub(1);
        self.position
    }

    /// Moves one record forward, stopping at the last.
    pub fn down(&mut self) -> u64 {
        if self.position + 1 < self.len {
            self.position += 1;
        }
        self.position
    }

    /// Jumps to `position`, which must name an existing record.
    pub fn seek(&mut self, position: u64) -> Result<()> {
        if position >= self.len {
            return Err(Error::InvalidInput(format!(
                "position {position} is outside the dump (0..{})",
                self.len
            )));
        }
        self.position = position;
        Ok(())
    }

    /// Describes any position, including ones just outside the dump.
    pub fn describe(&self, position: i64) -> Result<View> {
        if position < 0 {
            return Ok(View::StartOfLog);
        }
        let position = position as u64;
        if position >= self.len {
            return Ok(View::EndOfLog);
        }
        match self.scanner.read(position)? {
            Some(scanned) => Ok(View::Record {
                position,
                entry: scanned.entry,
                summary: format::summary(position, &scanned.record),
            }),
            None => Ok(View::EndOfLog),
        }
    }

    pub fn current(&self) -> Result<View> {
        self.describe(self.position as i64)
    }

    /// Views of the positions within `radius` of the cursor. Rows outside
    /// the dump collapse into a single boundary row on each side.
    pub fn window(&self, radius: usize) -> Result<Vec<View>> {
        let center = self.position as i64;
        let radius = i64::try_from(radius).unwrap_or(i64::MAX);
        let last = i64::try_from(self.len).unwrap_or(i64::MAX);
        let first = center.saturating_sub(radius).max(-1);
        let end = center.saturating_add(radius).min(last);
        (first..=end)
            .map(|position| self.describe(position))
            .collect()
    }

    /// Hands the record at the cursor to `exporter`.
    pub fn export<E: Exporter>(&self, exporter: &mut E) -> Result<Option<PathBuf>> {
        self.export_at(self.position as i64, exporter)
    }

    /// Hands the record at `position` to `exporter`; positions outside the
    /// dump export nothing.
    pub fn export_at<E: Exporter>(&self, position: i64, exporter: &mut E) -> Result<Option<PathBuf>> {
        if position < 0 || position as u64 >= self.len {
            return Ok(None);
        }
        let Some(scanned) = self.scanner.read(position as u64)? else {
            return Ok(None);
        };
        exporter
            .export(scanned.position, &scanned.entry, &scanned.record)
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::Writer;
    use crate::record::{Blob, ByteCodesPacket, Record};
    use tempfile::TempDir;

    struct Collect(Vec<(u64, Record)>);

    impl Exporter for Collect {
        fn export(&mut self, position: u64, _: &IndexEntry, record: &Record) -> Result<PathBuf> {
            self.0.push((position, record.clone()));
            Ok(PathBuf::from(format!("/dev/null/{position}")))
        }
    }

    fn open(dir: &TempDir, timestamps: &[u64]) -> Scanner {
        let log = dir.path().join("snap.dump");
        let index = dir.path().join("snap.index");
        let mut writer = Writer::create(&log, &index).unwrap();
        for (i, ts) in timestamps.iter().enumerate() {
            let record: Record = ByteCodesPacket {
                id: i as u64,
                codes: vec![Blob(vec![i as u8])],
            }
            .into();
            writer.write_at(&record, *ts).unwrap();
        }
        writer.finish().unwrap();
        Scanner::open(&log, &index).unwrap()
    }

    #[test]
    fn test_empty_dump_rejected() {
        let dir = TempDir::new().unwrap();
        let scanner = open(&dir, &[]);
        assert!(Navigator::locate(scanner, 5).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_locate_then_move() {
        let dir = TempDir::new().unwrap();
        let mut nav = Navigator::locate(open(&dir, &[10, 20, 30, 40]), 25).unwrap();
        assert_eq!(nav.position(), 1);
        assert_eq!(nav.down(), 2);
        assert_eq!(nav.down(), 3);
        assert_eq!(nav.up(), 2);

        match nav.current().unwrap() {
            View::Record {
                position, entry, ..
            } => {
                assert_eq!(position, 2);
                assert_eq!(entry.timestamp, 30);
            }
            other => panic!("expected a record, got {other:?}"),
        }
    }

    #[test]
    fn test_boundaries() {
        let dir = TempDir::new().unwrap();
        let mut nav = Navigator::new(open(&dir, &[1, 2, 3])).unwrap();

        assert_eq!(nav.up(), 0);
        assert_eq!(nav.up(), 0);
        let window = nav.window(1).unwrap();
        assert_eq!(window[0], View::StartOfLog);
        assert!(!window[1].is_boundary());
        assert_eq!(window[0].to_string(), "Reached start of dump...");

        nav.seek(2).unwrap();
        assert_eq!(nav.down(), 2);
        let window = nav.window(2).unwrap();
        assert_eq!(window.len(), 4);
        assert_eq!(window[3], View::EndOfLog);
        assert_eq!(window[3].to_string(), "Reached end of dump...");
        assert!(window[3].title().is_none());
    }

    #[test]
    fn test_window_with_huge_radius() {
        let dir = TempDir::new().unwrap();
        let mut nav = Navigator::new(open(&dir, &[1, 2, 3])).unwrap();
        nav.down();

        let window = nav.window(usize::MAX).unwrap();
        assert_eq!(window.len(), 5);
        assert_eq!(window[0], View::StartOfLog);
        assert_eq!(window[4], View::EndOfLog);
        assert_eq!(nav.window(i64::MAX as usize).unwrap(), window);
    }

    #[test]
    fn test_locate_before_first_record() {
        let dir = TempDir::new().unwrap();
        let nav = Navigator::locate(open(&dir, &[1000, 2000]), 5).unwrap();
        assert_eq!(nav.position(), 0);
        assert!(nav.precedes_log());

        let nav = Navigator::locate(open(&dir, &[1000, 2000]), 1000).unwrap();
        assert_eq!(nav.position(), 0);
        assert!(!nav.precedes_log());

        let nav = Navigator::new(open(&dir, &[1000])).unwrap();
        assert!(!nav.precedes_log());
    }

    #[test]
    fn test_seek_outside_is_invalid_input() {
        let dir = TempDir::new().unwrap();
        let mut nav = Navigator::new(open(&dir, &[1, 2])).unwrap();
        assert!(nav.seek(2).unwrap_err().is_invalid_input());
        assert_eq!(nav.position(), 0);
    }

    #[test]
    fn test_export() {
        let dir = TempDir::new().unwrap();
        let mut nav = Navigator::new(open(&dir, &[1, 2, 3])).unwrap();
        nav.down();

        let mut sink = Collect(Vec::new());
        assert!(nav.export(&mut sink).unwrap().is_some());
        assert_eq!(nav.export_at(-1, &mut sink).unwrap(), None);
        assert_eq!(nav.export_at(3, &mut sink).unwrap(), None);

        assert_eq!(sink.0.len(), 1);
        assert_eq!(sink.0[0].0, 1);
        assert_eq!(sink.0[0].1.id(), 1);
    }

    #[test]
    fn test_refresh_picks_up_appends() {
        let dir = TempDir::new().unwrap();
        let mut nav = Navigator::new(open(&dir, &[1])).unwrap();
        assert_eq!(nav.down(), 0);

        let mut writer =
            Writer::resume(dir.path().join("snap.dump"), dir.path().join("snap.index")).unwrap();
        writer
            .write_at(
                &ByteCodesPacket {
                    id: 9,
                    codes: vec![],
                }
                .into(),
                2,
            )
            .unwrap();
        writer.finish().unwrap();

        assert_eq!(nav.refresh().unwrap(), 2);
        assert_eq!(nav.down(), 1);
    }
}
