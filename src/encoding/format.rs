//! Human-readable renderings of records and raw bytes.

use itertools::Itertools as _;

use crate::record::Record;

/// Formats raw bytes as `0x`-prefixed hex, eliding the middle of long values.
pub fn bytes(bytes: &[u8], max: usize) -> String {
    if bytes.len() <= max || max < 2 {
        return format!("0x{}", hex::encode(bytes));
    }
    let head = max / 2;
    let tail = max - head;
    format!(
        "0x{}..{} ({} bytes)",
        hex::encode(&bytes[..head]),
        hex::encode(&bytes[bytes.len() - tail..]),
        bytes.len()
    )
}

/// One-paragraph summary of a record, as shown by the viewer.
pub fn summary(position: u64, record: &Record) -> String {
    let lines = match record {
        Record::AccountRange(p) => vec![
            format!("#{position}) Account Range Packet  (req #{}):", p.id),
            format!("  - {} hashes", p.accounts.len()),
            format!("  - {} accounts", p.accounts.len()),
            format!("  - {} proofs", p.proof.len()),
        ],
        Record::StorageRanges(p) => vec![
            format!("#{position}) Storage Ranges Packet (req #{}):", p.id),
            format!("  - {} hashset", p.slots.len()),
            format!("  - {} slotset", p.slots.iter().map(Vec::len).sum::<usize>()),
            format!("  - {} proofs", p.proof.len()),
        ],
        Record::ByteCodes(p) => vec![
            format!("#{position}) Byte Codes Packet     (req #{}):", p.id),
            format!("  - {} bytecodes", p.codes.len()),
        ],
        Record::TrieNodes(p) => vec![
            format!("#{position}) Trie Nodes Packet     (req #{}):", p.id),
            format!("  - {} trienodes", p.nodes.len()),
        ],
    };
    lines.into_iter().join("\n")
}
