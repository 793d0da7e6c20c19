use clap::Parser;
use isopep::accession::{is_acc_num, is_acc_num_pattern, isoform_order, normalize_acc_num};
use isopep::align_chunk::chunk_alignment;
use isopep::chunk::{annotate_ends, chunk_sequence, PeptideLookup};
use isopep::clustal::ClustalAlignment;
use isopep::clustalo::request_multi_alignment;
use isopep::csv_io::{export_peptides, import_peptides};
use isopep::peptide::Peptide;
use isopep::store::Store;
use isopep::uniprot;
use log::{info, warn};
use serde_json::json;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Common options shared between all commands
#[derive(Parser, Debug)]
struct CommonOpts {
    /// Path to the store file.
    #[clap(short = 'd', long, value_parser, default_value = "isopep.db")]
    database: PathBuf,

    /// Verbosity level (0 = error, 1 = info, 2 = debug)
    #[clap(short, long, default_value = "0")]
    verbose: u8,
}

/// Command-line tool for browsing proteins, isoforms and their
/// mass-spectrometry peptides.
#[derive(Parser, Debug)]
#[command(author, version, about, disable_help_subcommand = true)]
enum Args {
    /// Fetch a protein and its isoforms from UniProt, request their multiple
    /// alignment, and store everything
    Fetch {
        #[clap(flatten)]
        common: CommonOpts,

        /// UniProt accession number
        acc_num: String,

        /// Contact e-mail required by the EBI alignment service
        #[clap(short, long)]
        email: String,

        /// Store the family without requesting an alignment
        #[clap(long, action)]
        skip_alignment: bool,
    },
    /// Request (or re-request) a multiple alignment for a stored family
    Align {
        #[clap(flatten)]
        common: CommonOpts,

        /// UniProt accession number of any family member
        acc_num: String,

        /// Contact e-mail required by the EBI alignment service
        #[clap(short, long)]
        email: String,
    },
    /// Print the peptide-highlighted chunked sequence view of a protein
    Protein {
        #[clap(flatten)]
        common: CommonOpts,

        /// UniProt accession number
        acc_num: String,

        /// Display characters per wrapped line
        #[clap(short, long, value_parser, default_value_t = 120)]
        width: usize,

        /// Emit the flat protein report instead of the chunked view
        #[clap(long, action)]
        report: bool,
    },
    /// Print the chunked view of a stored multiple alignment
    Alignment {
        #[clap(flatten)]
        common: CommonOpts,

        /// Comma-joined accession list keying the alignment
        prots: String,

        /// Display characters per wrapped line
        #[clap(short, long, value_parser, default_value_t = 60)]
        width: usize,

        /// Emit the raw alignment text as received from the aligner
        #[clap(long, action)]
        raw: bool,
    },
    /// Summarize the stored primary isoforms
    List {
        #[clap(flatten)]
        common: CommonOpts,

        /// Sort key: alpha, len, npeps, iso or align; prefix with '-' to reverse
        #[clap(short, long, default_value = "alpha")]
        order_by: String,
    },
    /// Export peptides as CSV
    ExportPeptides {
        #[clap(flatten)]
        common: CommonOpts,

        /// Only peptides of this exact accession
        #[clap(long)]
        acc_num: Option<String>,

        /// Only peptides whose accession contains this fragment
        #[clap(long)]
        acc_num_like: Option<String>,

        /// Output file (stdout when omitted)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Import peptides from CSV
    ImportPeptides {
        #[clap(flatten)]
        common: CommonOpts,

        /// Input CSV with columns uniprot_id,location,sequence
        input: PathBuf,
    },
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    match args {
        Args::Fetch {
            common,
            acc_num,
            email,
            skip_alignment,
        } => {
            init_logger(&common);
            let acc_num = checked_acc_num(&acc_num)?;
            let mut store = open_store(&common.database)?;
            let client = uniprot::client().map_err(io::Error::other)?;
            let family = uniprot::fetch_family(&client, &acc_num).map_err(io::Error::other)?;
            for (iso, seq) in &family {
                store.add_protein(iso, seq);
            }
            for (iso, _) in family.iter().skip(1) {
                store.link_isoforms(&acc_num, iso);
            }
            info!("stored {} isoform(s) of {}", family.len(), acc_num);
            if family.len() < 2 {
                warn!(
                    "UniProt lists only one isoform of {}; nothing to align",
                    acc_num
                );
            } else if !skip_alignment {
                let prot_list = family_key(&family);
                match request_multi_alignment(&client, &family, &email) {
                    Ok(alignment) => store.add_alignment(&prot_list, &alignment),
                    Err(e) => warn!("alignment unavailable for {}: {}", prot_list, e),
                }
            }
            store.save(&common.database)?;
        }
        Args::Align {
            common,
            acc_num,
            email,
        } => {
            init_logger(&common);
            let acc_num = checked_acc_num(&acc_num)?;
            let mut store = open_store(&common.database)?;
            let mut family = vec![acc_num.clone()];
            family.extend(store.isoforms_of(&acc_num));
            if family.len() < 2 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no stored isoforms to align against", acc_num),
                ));
            }
            let mut seqs = Vec::with_capacity(family.len());
            for acc in &family {
                let seq = store.sequence_of(acc).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("No stored sequence for {}", acc),
                    )
                })?;
                seqs.push((acc.clone(), seq.to_string()));
            }
            let client = uniprot::client().map_err(io::Error::other)?;
            let alignment =
                request_multi_alignment(&client, &seqs, &email).map_err(io::Error::other)?;
            store.add_alignment(&family.join(","), &alignment);
            store.save(&common.database)?;
        }
        Args::Protein {
            common,
            acc_num,
            width,
            report,
        } => {
            init_logger(&common);
            check_width(width)?;
            let acc_num = checked_acc_num(&acc_num)?;
            let store = open_store(&common.database)?;
            let sequence = store
                .sequence_of(&acc_num)
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("No stored protein with accession {}", acc_num),
                    )
                })?
                .to_string();
            let peptides: Vec<&Peptide> = store.peptides_for(&acc_num);
            let isoforms = store.isoforms_of(&acc_num);
            let alignments: Vec<&str> = store
                .alignments_for(&acc_num)
                .iter()
                .map(|a| a.prots.as_str())
                .collect();
            let out = if report {
                json!({
                    "UniProt ID": acc_num,
                    "sequence": sequence,
                    "Isoform UniProt IDs": isoforms,
                    "isoform alignments": alignments,
                    "mass spec peptides": peptides,
                })
            } else {
                let spans = store.located_spans(&acc_num);
                json!({
                    "acc_num": acc_num,
                    "seq_len": sequence.chars().count(),
                    "chunks": annotate_ends(chunk_sequence(&sequence, &spans, width)),
                    "peptides": peptides,
                    "isoforms": isoforms,
                    "alignments": alignments,
                })
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Args::Alignment {
            common,
            prots,
            width,
            raw,
        } => {
            init_logger(&common);
            check_width(width)?;
            let store = open_store(&common.database)?;
            let alignment = store.alignment(&prots).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("No stored alignment for '{}'", prots),
                )
            })?;
            if raw {
                println!("{}", alignment.alignment);
            } else {
                let parsed = ClustalAlignment::parse(&alignment.alignment);
                let view = chunk_alignment(&parsed, &store, width, isoform_order);
                println!("{}", serde_json::to_string_pretty(&view)?);
            }
        }
        Args::List { common, order_by } => {
            init_logger(&common);
            let store = open_store(&common.database)?;
            let mut rows = store.summaries();
            let (key, reverse) = match order_by.strip_prefix('-') {
                Some(rest) => (rest, true),
                None => (order_by.as_str(), false),
            };
            match key {
                "len" => rows.sort_by_key(|r| r.seq_len),
                "npeps" => rows.sort_by_key(|r| r.n_peptides),
                "iso" => rows.sort_by_key(|r| r.n_isoforms),
                "align" => rows.sort_by_key(|r| r.has_alignment),
                // accession order unless the user says otherwise
                _ => {}
            }
            if reverse {
                rows.reverse();
            }
            println!("acc_num\tseq_len\tnpeps\tisoforms\thas_alignment");
            for row in rows {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    row.acc_num,
                    row.seq_len,
                    row.n_peptides,
                    row.n_isoforms,
                    if row.has_alignment { "Yes" } else { "No" }
                );
            }
        }
        Args::ExportPeptides {
            common,
            acc_num,
            acc_num_like,
            output,
        } => {
            init_logger(&common);
            let store = open_store(&common.database)?;
            let peptides: Vec<&Peptide> = match (&acc_num, &acc_num_like) {
                (Some(acc), _) => {
                    let acc = checked_acc_num(acc)?;
                    let peps = store.peptides_for(&acc);
                    if peps.is_empty() && store.contains_protein(&acc) {
                        warn!("protein {} is stored but has no associated peptides", acc);
                    }
                    peps
                }
                (None, Some(like)) => {
                    if !is_acc_num_pattern(like) {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidInput,
                            format!("Invalid accession number pattern '{}'", like),
                        ));
                    }
                    store.peptides_like(like)
                }
                (None, None) => store.all_peptides(),
            };
            match output {
                Some(path) => {
                    export_peptides(peptides, File::create(&path)?).map_err(io::Error::other)?
                }
                None => {
                    let stdout = io::stdout();
                    export_peptides(peptides, stdout.lock()).map_err(io::Error::other)?;
                }
            }
        }
        Args::ImportPeptides { common, input } => {
            init_logger(&common);
            let mut store = open_store(&common.database)?;
            let peptides = import_peptides(File::open(&input)?).map_err(io::Error::other)?;
            let count = peptides.len();
            for pep in peptides {
                store.add_peptide(pep);
            }
            info!("imported {} peptide(s) from {}", count, input.display());
            store.save(&common.database)?;
        }
    }

    Ok(())
}

fn init_logger(common: &CommonOpts) {
    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match common.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();
}

fn open_store(path: &Path) -> io::Result<Store> {
    if path.exists() {
        Store::load(path)
    } else {
        Ok(Store::new())
    }
}

fn checked_acc_num(acc_num: &str) -> io::Result<String> {
    // the primary isoform may carry a '-1' suffix, but it is the same
    // protein and would only split the store key space
    let acc_num = normalize_acc_num(acc_num);
    if !is_acc_num(acc_num) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' is not a valid accession number", acc_num),
        ));
    }
    Ok(acc_num.to_string())
}

fn check_width(width: usize) -> io::Result<()> {
    if width == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Display width must be positive",
        ));
    }
    Ok(())
}

fn family_key(family: &[(String, String)]) -> String {
    family
        .iter()
        .map(|(acc, _)| acc.as_str())
        .collect::<Vec<&str>>()
        .join(",")
}
