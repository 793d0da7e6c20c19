//! FASTA formatting for alignment job submission.

const FASTA_LINE_WIDTH: usize = 60;

/// Render `(accession, sequence)` pairs as FASTA, accessions sorted
/// ASCIIbetically (so `X-11` sorts before `X-2`, matching the order the
/// aligner echoes back) and sequences wrapped at 60 columns.
pub fn to_fasta(seqs: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = seqs.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let mut fasta = String::new();
    for (acc_num, seq) in sorted {
        fasta.push('>');
        fasta.push_str(acc_num);
        fasta.push('\n');
        let chars: Vec<char> = seq.chars().collect();
        for line in chars.chunks(FASTA_LINE_WIDTH) {
            fasta.extend(line);
            fasta.push('\n');
        }
    }
    fasta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_at_sixty() {
        let seq = "M".repeat(130);
        let fasta = to_fasta(&[("P00001".to_string(), seq)]);
        let lines: Vec<&str> = fasta.lines().collect();
        assert_eq!(lines[0], ">P00001");
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[2].len(), 60);
        assert_eq!(lines[3].len(), 10);
    }

    #[test]
    fn test_asciibetical_order() {
        let fasta = to_fasta(&[
            ("BLAH-2".to_string(), "AA".to_string()),
            ("BLAH-11".to_string(), "CC".to_string()),
        ]);
        let headers: Vec<&str> = fasta.lines().filter(|l| l.starts_with('>')).collect();
        assert_eq!(headers, vec![">BLAH-11", ">BLAH-2"]);
    }
}
