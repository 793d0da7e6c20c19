//! Protein/peptide/alignment store with binary persistence.
//!
//! Keeps the browsing data in memory: protein sequences keyed by accession,
//! undirected isoform links, peptide records, and raw alignment texts keyed
//! by their comma-joined accession list. Saving a protein re-locates every
//! peptide attributed to it, so peptide offsets always reflect the current
//! stored sequence.

use crate::accession::{is_primary, isoform_order};
use crate::chunk::{PeptideLookup, Span};
use crate::peptide::Peptide;
use log::info;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const STORE_MAGIC: &[u8; 4] = b"ISOP";
const STORE_VERSION: u8 = 1;

/// A stored multiple-sequence alignment, keyed by the comma-joined list of
/// the accessions it aligns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alignment {
    pub prots: String,
    pub alignment: String,
}

impl Alignment {
    pub fn accessions(&self) -> impl Iterator<Item = &str> {
        self.prots.split(',')
    }
}

/// Summary row for the protein index listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProteinSummary {
    pub acc_num: String,
    pub seq_len: usize,
    pub n_peptides: usize,
    pub n_isoforms: usize,
    pub has_alignment: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Store {
    proteins: FxHashMap<String, String>,
    isoform_links: Vec<(String, String)>,
    peptides: Vec<Peptide>,
    alignments: Vec<Alignment>,
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    /// Insert or replace a protein sequence, then re-locate every peptide
    /// attributed to the accession against the new sequence.
    pub fn add_protein(&mut self, acc_num: &str, sequence: &str) {
        self.proteins
            .insert(acc_num.to_string(), sequence.to_string());
        for pep in self.peptides.iter_mut().filter(|p| p.prot == acc_num) {
            pep.locate_in(sequence);
        }
    }

    /// Remove a protein and every isoform link that references it. Peptide
    /// records stay, poisoned until the protein returns.
    pub fn remove_protein(&mut self, acc_num: &str) {
        self.proteins.remove(acc_num);
        self.isoform_links
            .retain(|(a, b)| a != acc_num && b != acc_num);
        for pep in self.peptides.iter_mut().filter(|p| p.prot == acc_num) {
            pep.location = crate::peptide::NOT_LOCATED;
        }
    }

    pub fn sequence_of(&self, acc_num: &str) -> Option<&str> {
        self.proteins.get(acc_num).map(String::as_str)
    }

    pub fn contains_protein(&self, acc_num: &str) -> bool {
        self.proteins.contains_key(acc_num)
    }

    /// Record that two accessions are isoforms of the same protein.
    pub fn link_isoforms(&mut self, a: &str, b: &str) {
        let link = (a.to_string(), b.to_string());
        let mirrored = (link.1.clone(), link.0.clone());
        if !self.isoform_links.contains(&link) && !self.isoform_links.contains(&mirrored) {
            self.isoform_links.push(link);
        }
    }

    /// All accessions in the isoform family of `acc_num`, excluding itself,
    /// in isoform order. Links are undirected, so any family member finds
    /// the whole family.
    pub fn isoforms_of(&self, acc_num: &str) -> Vec<String> {
        let mut family = vec![acc_num.to_string()];
        let mut at = 0;
        while at < family.len() {
            let current = family[at].clone();
            for (a, b) in &self.isoform_links {
                let other = if *a == current {
                    b
                } else if *b == current {
                    a
                } else {
                    continue;
                };
                if !family.contains(other) {
                    family.push(other.clone());
                }
            }
            at += 1;
        }
        family.retain(|acc| acc != acc_num);
        family.sort_by(|a, b| isoform_order(a, b));
        family
    }

    /// Append a peptide record, locating it against the stored owner
    /// sequence when present.
    pub fn add_peptide(&mut self, mut pep: Peptide) {
        if let Some(seq) = self.proteins.get(&pep.prot) {
            pep.locate_in(seq);
        }
        self.peptides.push(pep);
    }

    /// Peptides of an accession, ascending by location.
    pub fn peptides_for(&self, acc_num: &str) -> Vec<&Peptide> {
        let mut peps: Vec<&Peptide> = self
            .peptides
            .iter()
            .filter(|p| p.prot == acc_num)
            .collect();
        peps.sort_by_key(|p| p.location);
        peps
    }

    /// Peptides whose owner accession contains `fragment`, ordered by
    /// (owner, location).
    pub fn peptides_like(&self, fragment: &str) -> Vec<&Peptide> {
        let mut peps: Vec<&Peptide> = self
            .peptides
            .iter()
            .filter(|p| p.prot.contains(fragment))
            .collect();
        peps.sort_by(|a, b| a.prot.cmp(&b.prot).then(a.location.cmp(&b.location)));
        peps
    }

    pub fn all_peptides(&self) -> Vec<&Peptide> {
        self.peptides_like("")
    }

    pub fn add_alignment(&mut self, prots: &str, alignment: &str) {
        self.alignments.retain(|a| a.prots != prots);
        self.alignments.push(Alignment {
            prots: prots.to_string(),
            alignment: alignment.to_string(),
        });
    }

    pub fn alignment(&self, prots: &str) -> Option<&Alignment> {
        self.alignments.iter().find(|a| a.prots == prots)
    }

    /// Alignments that include `acc_num` among their aligned accessions.
    pub fn alignments_for(&self, acc_num: &str) -> Vec<&Alignment> {
        self.alignments
            .iter()
            .filter(|a| a.accessions().any(|acc| acc == acc_num))
            .collect()
    }

    /// Index rows for the primary isoforms, in isoform order.
    pub fn summaries(&self) -> Vec<ProteinSummary> {
        let mut rows: Vec<ProteinSummary> = self
            .proteins
            .iter()
            .filter(|(acc, _)| is_primary(acc))
            .map(|(acc, seq)| ProteinSummary {
                acc_num: acc.clone(),
                seq_len: seq.chars().count(),
                n_peptides: self.peptides_for(acc).len(),
                n_isoforms: self.isoforms_of(acc).len() + 1,
                has_alignment: !self.alignments_for(acc).is_empty(),
            })
            .collect();
        rows.sort_by(|a, b| isoform_order(&a.acc_num, &b.acc_num));
        rows
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(STORE_MAGIC)?;
        writer.write_all(&[STORE_VERSION])?;
        let data = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| std::io::Error::other(format!("Failed to encode store: {e:?}")))?;
        writer.write_all(&data)?;
        info!(
            "Saved store to {}: {} proteins, {} peptides, {} alignments",
            path.display(),
            self.proteins.len(),
            self.peptides.len(),
            self.alignments.len()
        );
        Ok(())
    }

    pub fn load(path: &Path) -> std::io::Result<Store> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut header = [0u8; 5];
        reader.read_exact(&mut header)?;
        if &header[0..4] != STORE_MAGIC {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("'{}' is not an isopep store", path.display()),
            ));
        }
        if header[4] != STORE_VERSION {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Unsupported store version {}", header[4]),
            ));
        }
        bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard()).map_err(
            |e| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("Failed to decode store: {e:?}"),
                )
            },
        )
    }
}

impl PeptideLookup for Store {
    /// Located spans only, ascending by start; poisoned peptides never
    /// reach the chunker.
    fn located_spans(&self, owner: &str) -> Vec<Span> {
        let mut spans: Vec<Span> = self
            .peptides
            .iter()
            .filter(|p| p.prot == owner && p.is_located())
            .map(Peptide::span)
            .collect();
        spans.sort_by_key(|s| s.start);
        spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peptide::NOT_LOCATED;

    fn bluten_store() -> Store {
        let mut store = Store::new();
        store.add_protein("BLUTEN", "MAWGKPRLFVCGTIK");
        store.add_protein("BLUTEN-2", "MVTGKPRLTIK");
        store.add_protein("BLUTEN-3", "CGTIR");
        store.link_isoforms("BLUTEN", "BLUTEN-2");
        store.link_isoforms("BLUTEN", "BLUTEN-3");
        store.add_peptide(Peptide::new("BLUTEN", "MAW"));
        store.add_peptide(Peptide::new("BLUTEN", "RLFVCG"));
        store.add_peptide(Peptide::new("BLUTEN", "GTI"));
        store.add_peptide(Peptide::new("BLUTEN-2", "PRLT"));
        store.add_alignment(
            "BLUTEN,BLUTEN-2,BLUTEN-3",
            "CLUSTAL O(1.2.4) multiple sequence alignment\n\nBLUTEN        MAWGKPRLFVCGTIK",
        );
        store
    }

    #[test]
    fn test_peptides_located_on_insert() {
        let store = bluten_store();
        let locations: Vec<i64> = store
            .peptides_for("BLUTEN")
            .iter()
            .map(|p| p.location)
            .collect();
        assert_eq!(locations, vec![0, 6, 11]);
        assert_eq!(store.located_spans("BLUTEN-2"), vec![Span::new(5, 4)]);
    }

    #[test]
    fn test_add_protein_relocates_existing_peptides() {
        let mut store = Store::new();
        store.add_peptide(Peptide::new("FOOBAR", "ARKL"));
        assert_eq!(store.peptides_for("FOOBAR")[0].location, NOT_LOCATED);
        store.add_protein("FOOBAR", "FOOBARKL");
        assert_eq!(store.peptides_for("FOOBAR")[0].location, 4);
    }

    #[test]
    fn test_isoform_family_is_symmetric() {
        let store = bluten_store();
        assert_eq!(store.isoforms_of("BLUTEN"), vec!["BLUTEN-2", "BLUTEN-3"]);
        assert_eq!(store.isoforms_of("BLUTEN-2"), vec!["BLUTEN", "BLUTEN-3"]);
        assert_eq!(store.isoforms_of("BLUTEN-3"), vec!["BLUTEN", "BLUTEN-2"]);
    }

    #[test]
    fn test_remove_protein_cascades_links() {
        let mut store = bluten_store();
        store.remove_protein("BLUTEN");
        assert!(store.isoforms_of("BLUTEN-2").is_empty());
        assert!(store.isoforms_of("BLUTEN-3").is_empty());
    }

    #[test]
    fn test_alignments_for_matches_member_accessions() {
        let store = bluten_store();
        assert_eq!(store.alignments_for("BLUTEN-3").len(), 1);
        assert_eq!(store.alignments_for("BLUTEN-4").len(), 0);
    }

    #[test]
    fn test_summaries_cover_primaries_only() {
        let store = bluten_store();
        let rows = store.summaries();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].acc_num, "BLUTEN");
        assert_eq!(rows[0].seq_len, 15);
        assert_eq!(rows[0].n_peptides, 3);
        assert_eq!(rows[0].n_isoforms, 3);
        assert!(rows[0].has_alignment);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let store = bluten_store();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bluten.db");
        store.save(&path).unwrap();
        let loaded = Store::load(&path).unwrap();
        assert_eq!(loaded.sequence_of("BLUTEN"), Some("MAWGKPRLFVCGTIK"));
        assert_eq!(loaded.peptides_for("BLUTEN").len(), 3);
        assert_eq!(loaded.isoforms_of("BLUTEN-3").len(), 2);
        assert_eq!(loaded.alignments_for("BLUTEN").len(), 1);
    }

    #[test]
    fn test_load_rejects_foreign_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_store.db");
        std::fs::write(&path, b"CLUSTAL O").unwrap();
        assert!(Store::load(&path).is_err());
    }
}
