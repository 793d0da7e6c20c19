//! Mass-spectrometry peptide records.

use crate::chunk::Span;
use serde::{Deserialize, Serialize};

/// Location value for a peptide that has not been found in its owner's
/// stored sequence (no sequence registered, or not a substring of it).
pub const NOT_LOCATED: i64 = -1;

/// A peptide fragment observed by mass spectrometry, attributed to the
/// protein with accession `prot`. `location` is the 0-based offset of the
/// peptide within the owner's ungapped sequence, or [`NOT_LOCATED`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peptide {
    pub prot: String,
    pub location: i64,
    pub sequence: String,
}

impl Peptide {
    pub fn new(prot: impl Into<String>, sequence: impl Into<String>) -> Self {
        Peptide {
            prot: prot.into(),
            location: NOT_LOCATED,
            sequence: sequence.into(),
        }
    }

    /// Recompute `location` by substring search against the owner's current
    /// sequence. Poisoned when the peptide does not occur in it.
    pub fn locate_in(&mut self, owner_sequence: &str) {
        self.location = match owner_sequence.find(&self.sequence) {
            Some(at) => at as i64,
            None => NOT_LOCATED,
        };
    }

    pub fn is_located(&self) -> bool {
        self.location >= 0
    }

    /// The peptide as a chunker span. Only valid for located peptides.
    pub fn span(&self) -> Span {
        debug_assert!(self.is_located());
        Span::new(self.location as usize, self.sequence.chars().count())
    }
}
