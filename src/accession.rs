//! UniProt-style accession number handling.
//!
//! Accessions identify a protein or one of its isoforms; isoform variants
//! carry a `-N` suffix (`P56856-2`). The primary isoform is written without
//! a suffix, although UniProt sometimes reports it as `-1`.

use regex::Regex;
use std::cmp::Ordering;

/// Strict accession check: 6-10 uppercase alphanumerics, optionally followed
/// by an isoform suffix.
pub fn is_acc_num(s: &str) -> bool {
    let re = Regex::new(r"^[A-Z0-9]{6,10}(-[0-9]+)?$").unwrap();
    re.is_match(s)
}

/// Loose pattern accepted for substring filters over accessions.
pub fn is_acc_num_pattern(s: &str) -> bool {
    let re = Regex::new(r"^[A-Z0-9-]{1,10}$").unwrap();
    re.is_match(s)
}

/// Base accession with any isoform suffix removed.
pub fn base_acc_num(acc: &str) -> &str {
    match acc.find('-') {
        Some(dash) => &acc[..dash],
        None => acc,
    }
}

/// Normalize an accession: the primary isoform may be written with a
/// redundant `-1` suffix, which is stripped.
pub fn normalize_acc_num(acc: &str) -> &str {
    acc.strip_suffix("-1").unwrap_or(acc)
}

/// True for a primary-isoform accession (no variant suffix).
pub fn is_primary(acc: &str) -> bool {
    !acc.contains('-')
}

/// Display order for isoform accessions: natural ordering, so the primary
/// accession sorts before its variants and `X-2` before `X-11`.
pub fn isoform_order(a: &str, b: &str) -> Ordering {
    natord::compare(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_acc_num() {
        assert!(is_acc_num("P56856"));
        assert!(is_acc_num("P56856-2"));
        assert!(is_acc_num("A0A024R1R8"));
        assert!(!is_acc_num("p56856"));
        assert!(!is_acc_num("P568"));
        assert!(!is_acc_num("P56856-"));
        assert!(!is_acc_num(""));
    }

    #[test]
    fn test_normalize_and_base() {
        assert_eq!(normalize_acc_num("P56856-1"), "P56856");
        assert_eq!(normalize_acc_num("P56856-2"), "P56856-2");
        assert_eq!(base_acc_num("P56856-11"), "P56856");
        assert_eq!(base_acc_num("P56856"), "P56856");
    }

    #[test]
    fn test_isoform_order_is_natural() {
        let mut accs = vec!["BLUTEN-11", "BLUTEN-2", "BLUTEN", "BLUTEN-3"];
        accs.sort_by(|a, b| isoform_order(a, b));
        assert_eq!(accs, vec!["BLUTEN", "BLUTEN-2", "BLUTEN-3", "BLUTEN-11"]);
    }
}
