// lib.rs
pub mod accession;
pub mod align_chunk;
pub mod chunk;
pub mod clustal;
pub mod clustalo;
pub mod csv_io;
pub mod fasta;
pub mod peptide;
pub mod store;
pub mod uniprot;
