//! Clustal (`clustal_num`) multiple-alignment text parsing.
//!
//! The format is line-oriented: a banner block, then one or more alignment
//! blocks separated by blank-line runs. Each block row is either
//! `<owner> <gapped-sequence> [residue count]` or a conservation row that
//! starts with spaces, its symbols beginning at a fixed column. Rows of the
//! same owner concatenate across blocks to rebuild the full aligned string.

use log::warn;
use regex::Regex;
use rustc_hash::FxHashMap;

/// Column at which conservation symbols start on a consensus row.
pub const CONSENSUS_OFFSET: usize = 14;

/// A reassembled multiple-sequence alignment: per-owner gapped strings in
/// first-appearance order, plus the conservation row (possibly empty).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClustalAlignment {
    pub header: String,
    sequences: Vec<(String, String)>,
    pub consensus: String,
}

impl ClustalAlignment {
    /// Parse alignment text byte-for-byte as received from the aligner.
    ///
    /// A row with fewer than two whitespace-separated fields is dropped with
    /// a warning; it never discards other rows or blocks.
    pub fn parse(text: &str) -> Self {
        let block_sep = Regex::new(r"\n{2,3}").unwrap();
        let mut blocks = block_sep.split(text);
        let header = blocks.next().unwrap_or("").trim().to_string();

        let mut sequences: Vec<(String, String)> = Vec::new();
        let mut index: FxHashMap<String, usize> = FxHashMap::default();
        let mut consensus = String::new();
        for block in blocks {
            for line in block.split('\n') {
                if line.is_empty() {
                    continue;
                }
                if line.starts_with(' ') {
                    consensus.push_str(line.get(CONSENSUS_OFFSET..).unwrap_or(""));
                    continue;
                }
                let mut fields = line.split_whitespace();
                let (owner, gapped) = match (fields.next(), fields.next()) {
                    (Some(owner), Some(gapped)) => (owner, gapped),
                    _ => {
                        warn!("skipping malformed alignment row: {:?}", line);
                        continue;
                    }
                };
                match index.get(owner) {
                    Some(&at) => sequences[at].1.push_str(gapped),
                    None => {
                        index.insert(owner.to_string(), sequences.len());
                        sequences.push((owner.to_string(), gapped.to_string()));
                    }
                }
            }
        }
        ClustalAlignment {
            header,
            sequences,
            consensus,
        }
    }

    /// Owner/gapped-sequence pairs in first-appearance order.
    pub fn sequences(&self) -> &[(String, String)] {
        &self.sequences
    }

    pub fn gapped(&self, owner: &str) -> Option<&str> {
        self.sequences
            .iter()
            .find(|(acc, _)| acc == owner)
            .map(|(_, seq)| seq.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}
