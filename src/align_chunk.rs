//! Display chunking of a parsed multiple-sequence alignment.
//!
//! Each owner's gapped string is chunked with the shared sequence walk, its
//! peptides matched in true (gap-free) coordinates, then the per-owner line
//! lists are transposed into column groups so corresponding lines of every
//! owner render as parallel rows. The conservation row is chunked as plain
//! text and always sorts last, carrying an empty owner id.

use crate::chunk::{self, PeptideLookup, Run};
use crate::clustal::ClustalAlignment;
use serde::Serialize;
use std::cmp::Ordering;

/// One owner's slice of a column group: its display line at that group
/// index (empty placeholder when the owner's alignment has already ended),
/// the cumulative count of non-gap characters emitted for the owner up to
/// and including this line, and whether the owner is a real sequence rather
/// than the conservation pseudo-row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowSlice {
    pub acc_num: String,
    pub runs: Vec<Run>,
    pub display_end: usize,
    pub is_sequence: bool,
}

/// The chunked alignment: the aligner's banner plus position-synchronized
/// column groups, one [`RowSlice`] per owner per group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignmentView {
    pub header: String,
    pub groups: Vec<Vec<RowSlice>>,
}

struct ChunkedRow {
    acc_num: String,
    lines: Vec<chunk::Line>,
    is_sequence: bool,
}

/// Chunk `aln` at `width` display columns per line.
///
/// `peptides` supplies located spans per owner; owners the lookup knows
/// nothing about simply get plain rows, and peptides of owners absent from
/// the alignment are never requested. `order` is the caller's owner
/// ordering (see [`crate::accession::isoform_order`]); the conservation row
/// is ordered last regardless. Width must be > 0 (caller precondition).
pub fn chunk_alignment<L, F>(
    aln: &ClustalAlignment,
    peptides: &L,
    width: usize,
    mut order: F,
) -> AlignmentView
where
    L: PeptideLookup + ?Sized,
    F: FnMut(&str, &str) -> Ordering,
{
    debug_assert!(width > 0, "display width must be positive");
    let mut owners: Vec<&(String, String)> = aln.sequences().iter().collect();
    owners.sort_by(|a, b| order(&a.0, &b.0));

    let mut rows: Vec<ChunkedRow> = owners
        .into_iter()
        .map(|(acc_num, gapped)| {
            let spans = peptides.located_spans(acc_num);
            ChunkedRow {
                acc_num: acc_num.clone(),
                lines: chunk::chunk_sequence(gapped, &spans, width),
                is_sequence: true,
            }
        })
        .collect();
    if !aln.consensus.is_empty() {
        rows.push(ChunkedRow {
            acc_num: String::new(),
            lines: chunk::chunk_sequence(&aln.consensus, &[], width),
            is_sequence: false,
        });
    }

    let group_count = rows.iter().map(|row| row.lines.len()).max().unwrap_or(0);
    let mut display_ends = vec![0usize; rows.len()];
    let mut groups = Vec::with_capacity(group_count);
    for line_idx in 0..group_count {
        let mut group = Vec::with_capacity(rows.len());
        for (row_idx, row) in rows.iter().enumerate() {
            let runs = row.lines.get(line_idx).cloned().unwrap_or_default();
            display_ends[row_idx] += runs.iter().map(Run::residues).sum::<usize>();
            group.push(RowSlice {
                acc_num: row.acc_num.clone(),
                runs,
                display_end: display_ends[row_idx],
                is_sequence: row.is_sequence,
            });
        }
        groups.push(group);
    }
    AlignmentView {
        header: aln.header.clone(),
        groups,
    }
}
