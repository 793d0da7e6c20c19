//! UniProt REST client.
//!
//! Fetches protein entries by accession and walks the entry JSON for the
//! sequence and the isoform accession list. JSON navigation is kept in pure
//! functions so it can be tested against fixtures; only the fetch wrappers
//! touch the network.

use crate::accession::normalize_acc_num;
use log::{debug, info};
use serde_json::Value;
use std::time::Duration;

const BASE_QUERY: &str = "https://rest.uniprot.org/uniprotkb/search?query=accession%3D";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub enum FetchErr {
    Http(reqwest::Error),
    NoResults(String),
    MissingField(&'static str),
}

impl std::fmt::Display for FetchErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchErr::Http(e) => write!(f, "UniProt request failed: {}", e),
            FetchErr::NoResults(acc) => {
                write!(f, "UniProt returned no entry for accession '{}'", acc)
            }
            FetchErr::MissingField(field) => {
                write!(f, "UniProt entry is missing expected field '{}'", field)
            }
        }
    }
}

impl std::error::Error for FetchErr {}

impl From<reqwest::Error> for FetchErr {
    fn from(err: reqwest::Error) -> Self {
        FetchErr::Http(err)
    }
}

pub fn client() -> Result<reqwest::blocking::Client, FetchErr> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

/// Fetch the entry list for one accession. The search endpoint returns a
/// `results` array; the first element is the entry.
pub fn fetch_entry(
    client: &reqwest::blocking::Client,
    acc_num: &str,
) -> Result<Value, FetchErr> {
    debug!("querying UniProt for {}", acc_num);
    let body: Value = client
        .get(format!("{}{}", BASE_QUERY, acc_num))
        .send()?
        .error_for_status()?
        .json()?;
    match body.get("results").and_then(Value::as_array) {
        Some(results) if !results.is_empty() => Ok(results[0].clone()),
        _ => Err(FetchErr::NoResults(acc_num.to_string())),
    }
}

/// The entry's sequence string (`sequence.value`).
pub fn sequence_of(entry: &Value) -> Result<String, FetchErr> {
    entry
        .pointer("/sequence/value")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(FetchErr::MissingField("sequence.value"))
}

/// All isoform accessions named by the entry's comments, sorted, with the
/// primary's redundant `-1` suffix stripped.
pub fn isoform_ids(entry: &Value) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let comments = entry
        .get("comments")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    for comment in comments {
        let isoforms = comment
            .get("isoforms")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for isoform in isoforms {
            let ids = isoform
                .get("isoformIds")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            for id in ids.iter().filter_map(Value::as_str) {
                let id = normalize_acc_num(id).to_string();
                if !out.contains(&id) {
                    out.push(id);
                }
            }
        }
    }
    out.sort();
    out
}

/// Fetch a protein and every distinct isoform of it.
///
/// Returns `(accession, sequence)` pairs, primary first. Isoforms whose
/// sequence equals the primary's are dropped, as are isoforms whose entries
/// cannot be fetched (the family is still useful without them).
pub fn fetch_family(
    client: &reqwest::blocking::Client,
    acc_num: &str,
) -> Result<Vec<(String, String)>, FetchErr> {
    let acc_num = normalize_acc_num(acc_num);
    let primary = fetch_entry(client, acc_num)?;
    let primary_seq = sequence_of(&primary)?;
    let mut family = vec![(acc_num.to_string(), primary_seq.clone())];
    for iso_id in isoform_ids(&primary) {
        if iso_id == acc_num {
            continue;
        }
        let entry = match fetch_entry(client, &iso_id) {
            Ok(entry) => entry,
            Err(e) => {
                info!("skipping isoform {}: {}", iso_id, e);
                continue;
            }
        };
        let seq = match sequence_of(&entry) {
            Ok(seq) => seq,
            Err(e) => {
                info!("skipping isoform {}: {}", iso_id, e);
                continue;
            }
        };
        if seq == primary_seq {
            continue;
        }
        family.push((iso_id, seq));
    }
    Ok(family)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry_fixture() -> Value {
        json!({
            "primaryAccession": "P56856",
            "sequence": { "value": "MAWGKPRLFVCGTIK", "length": 15 },
            "comments": [
                { "commentType": "FUNCTION" },
                {
                    "commentType": "ALTERNATIVE PRODUCTS",
                    "isoforms": [
                        { "isoformIds": ["P56856-1"] },
                        { "isoformIds": ["P56856-2"] }
                    ]
                }
            ]
        })
    }

    #[test]
    fn test_sequence_of() {
        assert_eq!(sequence_of(&entry_fixture()).unwrap(), "MAWGKPRLFVCGTIK");
    }

    #[test]
    fn test_sequence_of_missing() {
        assert!(sequence_of(&json!({ "primaryAccession": "X" })).is_err());
    }

    #[test]
    fn test_isoform_ids_strips_primary_suffix() {
        assert_eq!(isoform_ids(&entry_fixture()), vec!["P56856", "P56856-2"]);
    }

    #[test]
    fn test_isoform_ids_without_comments() {
        assert!(isoform_ids(&json!({ "primaryAccession": "X" })).is_empty());
    }
}
