//! Timestamp lookup over an index file.

use crate::dump::IndexFile;
use crate::error::Result;
use crate::Error;

/// Finds the position of the last entry whose timestamp is `<= target`.
///
/// Requires non-decreasing timestamps; on other indexes the result is
/// meaningless. When `target` precedes every entry the result is `0`, which
/// callers must not mistake for a match. An empty index is an error.
pub fn locate(index: &IndexFile, target: u64) -> Result<u64> {
    let len = index.len()?;
    if len == 0 {
        return Err(Error::InvalidInput("cannot locate in an empty index".to_string()));
    }
    search(len, target, |position| {
        index
            .read_at(position)?
            .map(|entry| entry.timestamp)
            .ok_or_else(|| {
                Error::IndexCorruption(format!("index shrank below position {position}"))
            })
    })
}

/// Binary search over `len` positions keyed by `timestamp_at`.
///
/// Keeps `start` on an entry `<= target` (or 0) and `end` one past the last
/// candidate, until they are adjacent.
pub fn search<F>(len: u64, target: u64, mut timestamp_at: F) -> Result<u64>
where
    F: FnMut(u64) -> Result<u64>,
{
    let mut start = 0u64;
    let mut end = len;
    while end - start > 1 {
        let mid = start + (end - start) / 2;
        if timestamp_at(mid)? > target {
            end = mid;
        } else {
            start = mid;
        }
    }
    Ok(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::IndexEntry;
    use crate::record::Kind;
    use tempfile::NamedTempFile;

    fn search_slice(timestamps: &[u64], target: u64) -> u64 {
        search(timestamps.len() as u64, target, |i| Ok(timestamps[i as usize])).unwrap()
    }

    /// Largest i with T[i] <= t, computed the slow way.
    fn expected(timestamps: &[u64], target: u64) -> u64 {
        timestamps
            .iter()
            .rposition(|&t| t <= target)
            .unwrap_or(0) as u64
    }

    #[test]
    fn test_search_matches_linear_scan() {
        let sequences: Vec<Vec<u64>> = vec![
            vec![5],
            vec![1, 2],
            vec![10, 20, 30, 40, 50],
            vec![1, 1, 1, 2, 2, 3, 3, 3, 3],
            vec![0, 100, 100, 100, 200, 300, 300],
            (0..257).map(|i| i * 3).collect(),
        ];
        for timestamps in &sequences {
            let first = timestamps[0];
            let last = *timestamps.last().unwrap();
            for target in first..=last {
                assert_eq!(
                    search_slice(timestamps, target),
                    expected(timestamps, target),
                    "timestamps {timestamps:?}, target {target}"
                );
            }
        }
    }

    #[test]
    fn test_search_edges() {
        let timestamps = [10, 20, 30];
        // Before the first entry degenerates to 0
        assert_eq!(search_slice(&timestamps, 0), 0);
        // After the last entry lands on the last one
        assert_eq!(search_slice(&timestamps, 1000), 2);
        assert_eq!(search_slice(&timestamps, 30), 2);
    }

    #[test]
    fn test_single_entry_is_not_probed() {
        let mut probes = 0;
        let pos = search(1, 5, |_| {
            probes += 1;
            Ok(0)
        })
        .unwrap();
        assert_eq!(pos, 0);
        assert_eq!(probes, 0);
    }

    #[test]
    fn test_locate_on_index_file() {
        let temp = NamedTempFile::new().unwrap();
        let mut index = IndexFile::create(temp.path()).unwrap();
        assert!(locate(&index, 0).unwrap_err().is_invalid_input());

        for (i, ts) in [100u64, 200, 200, 300].iter().enumerate() {
            index
                .append(&IndexEntry {
                    timestamp: *ts,
                    offset: i as u64 * 10,
                    kind: Kind::ByteCodes,
                })
                .unwrap();
        }

        assert_eq!(locate(&index, 100).unwrap(), 0);
        assert_eq!(locate(&index, 250).unwrap(), 2);
        assert_eq!(locate(&index, 300).unwrap(), 3);
        assert_eq!(locate(&index, 50).unwrap(), 0);
    }
}
