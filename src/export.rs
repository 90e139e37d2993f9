use std::io::Write;
use std::path::PathBuf;

use crate::dump::IndexEntry;
use crate::error::Result;
use crate::record::Record;
use crate::Error;

/// Receives a decoded record the user asked to take out of the dump.
pub trait Exporter {
    fn export(&mut self, position: u64, entry: &IndexEntry, record: &Record) -> Result<PathBuf>;
}

/// Writes records as pretty-printed JSON files that outlive the process.
#[derive(Debug, Clone, Default)]
pub struct JsonExporter {
    dir: Option<PathBuf>,
}

impl JsonExporter {
    /// Exports into `dir`, or the system temp directory when `None`.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }
}

impl Exporter for JsonExporter {
    fn export(&mut self, position: u64, entry: &IndexEntry, record: &Record) -> Result<PathBuf> {
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| Error::Encode(entry.kind, e.to_string()))?;

        let prefix = format!("snapdump-{position}-");
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(".json");
        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(&json)
            .map_err(|e| Error::WriteError("export file", e))?;

        let (_, path) = file
            .keep()
            .map_err(|e| Error::WriteError("export file", e.error))?;
        tracing::info!(position, path = %path.display(), "Record exported");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Blob, Kind, TrieNodesPacket};
    use tempfile::TempDir;

    #[test]
    fn test_json_export_persists() {
        let dir = TempDir::new().unwrap();
        let record: Record = TrieNodesPacket {
            id: 5,
            nodes: vec![Blob(vec![0xc0, 0x80])],
        }
        .into();
        let entry = IndexEntry {
            timestamp: 1,
            offset: 0,
            kind: Kind::TrieNodes,
        };

        let mut exporter = JsonExporter::new(Some(dir.path().to_path_buf()));
        let path = exporter.export(3, &entry, &record).unwrap();
        assert!(path.starts_with(dir.path()));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"TrieNodes\""));
        assert!(text.contains("0xc080"));
        let back: Record = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }
}
