//! Peptide CSV import/export.
//!
//! Column layout is `uniprot_id,location,sequence`. Export writes whatever
//! peptide selection the caller made; import reads records whose locations
//! are recomputed once the owning protein is stored.

use crate::peptide::{Peptide, NOT_LOCATED};
use std::io::{Read, Write};

#[derive(Debug)]
pub enum CsvErr {
    Csv(csv::Error),
    MissingColumn(&'static str),
    BadLocation(String),
}

impl std::fmt::Display for CsvErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CsvErr::Csv(e) => write!(f, "CSV error: {}", e),
            CsvErr::MissingColumn(col) => write!(f, "CSV record is missing column '{}'", col),
            CsvErr::BadLocation(v) => write!(f, "CSV location '{}' is not an integer", v),
        }
    }
}

impl std::error::Error for CsvErr {}

impl From<csv::Error> for CsvErr {
    fn from(err: csv::Error) -> Self {
        CsvErr::Csv(err)
    }
}

pub fn export_peptides<'a, W, I>(peptides: I, writer: W) -> Result<(), CsvErr>
where
    W: Write,
    I: IntoIterator<Item = &'a Peptide>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["uniprot_id", "location", "sequence"])?;
    for pep in peptides {
        wtr.write_record([
            pep.prot.as_str(),
            &pep.location.to_string(),
            pep.sequence.as_str(),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Read peptide records. A missing or empty location column poisons the
/// location; it is recomputed against the stored owner sequence on insert.
pub fn import_peptides<R: Read>(reader: R) -> Result<Vec<Peptide>, CsvErr> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let col = |name: &'static str| -> Result<usize, CsvErr> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(CsvErr::MissingColumn(name))
    };
    let prot_col = col("uniprot_id")?;
    let seq_col = col("sequence")?;
    let loc_col = headers.iter().position(|h| h == "location");

    let mut peptides = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let prot = record
            .get(prot_col)
            .ok_or(CsvErr::MissingColumn("uniprot_id"))?;
        let sequence = record.get(seq_col).ok_or(CsvErr::MissingColumn("sequence"))?;
        let location = match loc_col.and_then(|c| record.get(c)) {
            None | Some("") => NOT_LOCATED,
            Some(v) => v
                .parse::<i64>()
                .map_err(|_| CsvErr::BadLocation(v.to_string()))?,
        };
        peptides.push(Peptide {
            prot: prot.to_string(),
            location,
            sequence: sequence.to_string(),
        });
    }
    Ok(peptides)
}
