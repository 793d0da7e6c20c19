//! Fixed-width display chunking of peptide-annotated sequences.
//!
//! Splits a sequence into display lines of `width` characters, each line a
//! list of runs tagged as peptide or plain. The walk is a two-state region
//! machine (plain / peptide) with two independent flush triggers: the width
//! boundary, which also breaks the line, and the region boundary, which
//! switches between plain and peptide runs. Gap characters (`-`) occupy a
//! display column but do not advance the true (gap-free) coordinate used to
//! match peptide intervals, so the same walk serves both flat sequences and
//! rows of a gapped alignment.

use serde::{Deserialize, Serialize};

/// Gap character in aligned sequences.
pub const GAP: char = '-';

/// A contiguous styled span of characters within one display line.
///
/// `loc` and `occurrence` are present only on peptide runs. `loc` is the
/// peptide's start in true (gap-free) coordinates and is shared by every run
/// of that peptide; `occurrence` is the run's ordinal among them: 0 for the
/// first, incremented each time a line break splits the peptide. The pair
/// `(owner, loc, occurrence)` is therefore stable enough to key rendered
/// elements across a whole page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    pub is_peptide: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurrence: Option<usize>,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Run {
            text: text.into(),
            is_peptide: false,
            loc: None,
            occurrence: None,
        }
    }

    pub fn peptide(text: impl Into<String>, loc: usize, occurrence: usize) -> Self {
        Run {
            text: text.into(),
            is_peptide: true,
            loc: Some(loc),
            occurrence: Some(occurrence),
        }
    }

    /// Number of non-gap characters in this run.
    pub fn residues(&self) -> usize {
        self.text.chars().filter(|&c| c != GAP).count()
    }
}

/// One wrapped display line: runs whose texts concatenate to exactly `width`
/// characters, except for the final line of a sequence.
pub type Line = Vec<Run>;

/// A located peptide interval in true (gap-free) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub fn new(start: usize, len: usize) -> Self {
        Span { start, len }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Supplies located peptide spans per owner sequence.
///
/// Implementations must return spans sorted ascending by start, pairwise
/// non-overlapping, with unlocated (poison) peptides already filtered out.
/// The chunker never special-cases a bad span; that contract sits here.
pub trait PeptideLookup {
    fn located_spans(&self, owner: &str) -> Vec<Span>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Plain { until: usize },
    Peptide { span: Span, fragment: usize },
}

struct Walker<'a> {
    spans: &'a [Span],
    next_span: usize,
    region: Region,
    acc: String,
    line: Line,
    lines: Vec<Line>,
}

impl<'a> Walker<'a> {
    fn new(spans: &'a [Span]) -> Self {
        let until = spans.first().map_or(usize::MAX, |s| s.start);
        Walker {
            spans,
            next_span: 0,
            region: Region::Plain { until },
            acc: String::new(),
            line: Line::new(),
            lines: Vec::new(),
        }
    }

    /// Shared flush action: turn the accumulator into a run of the current
    /// region and append it to the current line.
    fn flush_run(&mut self) {
        let text = std::mem::take(&mut self.acc);
        let run = match self.region {
            Region::Plain { .. } => Run::plain(text),
            Region::Peptide { span, fragment } => Run::peptide(text, span.start, fragment),
        };
        self.line.push(run);
    }

    /// Width trigger: flush, close the line, and mark a peptide continuation
    /// so the next run of the same peptide carries the next occurrence.
    fn break_line(&mut self) {
        self.flush_run();
        if let Region::Peptide { fragment, .. } = &mut self.region {
            *fragment += 1;
        }
        self.lines.push(std::mem::take(&mut self.line));
    }

    /// Region trigger, checked at each true coordinate before the character
    /// is consumed. Abutting peptides are a third transition: the ending
    /// peptide flushes and the next one is entered directly, with no empty
    /// plain run between them.
    fn boundary(&mut self, loc: usize) {
        match self.region {
            Region::Plain { until } if loc == until => {
                self.flush_run();
                let span = self.spans[self.next_span];
                self.next_span += 1;
                self.region = Region::Peptide { span, fragment: 0 };
            }
            Region::Peptide { span, .. } if loc == span.end() => {
                self.flush_run();
                match self.spans.get(self.next_span) {
                    Some(&next) if next.start == loc => {
                        self.next_span += 1;
                        self.region = Region::Peptide {
                            span: next,
                            fragment: 0,
                        };
                    }
                    Some(&next) => self.region = Region::Plain { until: next.start },
                    None => self.region = Region::Plain { until: usize::MAX },
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line> {
        self.flush_run();
        self.lines.push(self.line);
        self.lines
    }
}

/// Chunk `sequence` into display lines of `width` characters.
///
/// `spans` locates the sequence's known peptides in true coordinates (see
/// [`PeptideLookup`] for the required ordering). The sequence may contain
/// gap characters; they are emitted into the current run but skipped when
/// advancing the true coordinate.
///
/// Width must be > 0 (caller precondition). An empty sequence yields no
/// lines; zero peptides yield fixed-width slices of single plain runs.
pub fn chunk_sequence(sequence: &str, spans: &[Span], width: usize) -> Vec<Line> {
    debug_assert!(width > 0, "display width must be positive");
    if sequence.is_empty() {
        return Vec::new();
    }
    if spans.is_empty() {
        return chunk_unannotated(sequence, width);
    }
    let mut walker = Walker::new(spans);
    let mut loc = 0usize;
    for (col, ch) in sequence.chars().enumerate() {
        if col > 0 && col % width == 0 {
            walker.break_line();
        }
        if ch == GAP {
            walker.acc.push(ch);
            continue;
        }
        walker.boundary(loc);
        walker.acc.push(ch);
        loc += 1;
    }
    walker.finish()
}

/// Fixed-width slicing for sequences with no peptide annotations, including
/// the consensus row of an alignment. One plain run per line.
fn chunk_unannotated(sequence: &str, width: usize) -> Vec<Line> {
    let chars: Vec<char> = sequence.chars().collect();
    chars
        .chunks(width)
        .map(|piece| vec![Run::plain(piece.iter().collect::<String>())])
        .collect()
}

/// A display line annotated with the cumulative character count up to and
/// including it, for margin numbering in the rendered view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedLine {
    pub runs: Line,
    pub end: usize,
}

pub fn annotate_ends(lines: Vec<Line>) -> Vec<AnnotatedLine> {
    let mut end = 0usize;
    lines
        .into_iter()
        .map(|runs| {
            end += runs.iter().map(|r| r.text.chars().count()).sum::<usize>();
            AnnotatedLine { runs, end }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concat(lines: &[Line]) -> String {
        lines
            .iter()
            .flat_map(|line| line.iter())
            .map(|run| run.text.as_str())
            .collect()
    }

    #[test]
    fn test_bluten_scenario() {
        // Three peptides on a 15-residue sequence, wrapped at 9.
        let spans = [Span::new(0, 3), Span::new(6, 6), Span::new(11, 3)];
        let lines = chunk_sequence("MAWGKPRLFVCGTIK", &spans, 9);
        assert_eq!(
            lines,
            vec![
                vec![
                    Run::plain(""),
                    Run::peptide("MAW", 0, 0),
                    Run::plain("GKP"),
                    Run::peptide("RLF", 6, 0),
                ],
                vec![
                    Run::peptide("VCG", 6, 1),
                    Run::peptide("TI", 11, 0),
                    Run::plain("K"),
                ],
            ]
        );
    }

    #[test]
    fn test_round_trip_and_line_widths() {
        let seq = "MAWGKPRLFVCGTIKMAWGKPRLFVCGTIK";
        let spans = [Span::new(2, 5), Span::new(9, 4), Span::new(20, 8)];
        let lines = chunk_sequence(seq, &spans, 7);
        assert_eq!(concat(&lines), seq);
        for line in &lines[..lines.len() - 1] {
            let len: usize = line.iter().map(|r| r.text.len()).sum();
            assert_eq!(len, 7);
        }
        let last: usize = lines.last().unwrap().iter().map(|r| r.text.len()).sum();
        assert!(last <= 7 && last > 0);
    }

    #[test]
    fn test_wrap_split_peptide_is_two_runs() {
        // Peptide covering 4..12 spans the wrap at 8.
        let lines = chunk_sequence("ABCDEFGHIJKLMNOP", &[Span::new(4, 8)], 8);
        let pep_runs: Vec<&Run> = lines
            .iter()
            .flat_map(|l| l.iter())
            .filter(|r| r.is_peptide)
            .collect();
        assert_eq!(pep_runs.len(), 2);
        assert_eq!(pep_runs[0].text, "EFGH");
        assert_eq!(pep_runs[0].occurrence, Some(0));
        assert_eq!(pep_runs[1].text, "IJKL");
        assert_eq!(pep_runs[1].occurrence, Some(1));
        assert_eq!(pep_runs[0].loc, pep_runs[1].loc);
    }

    #[test]
    fn test_peptide_split_twice_counts_fragments() {
        // Peptide covering 1..13 crosses two wraps at width 5.
        let lines = chunk_sequence("ABCDEFGHIJKLMN", &[Span::new(1, 12)], 5);
        let occurrences: Vec<usize> = lines
            .iter()
            .flat_map(|l| l.iter())
            .filter(|r| r.is_peptide)
            .map(|r| r.occurrence.unwrap())
            .collect();
        assert_eq!(occurrences, vec![0, 1, 2]);
    }

    #[test]
    fn test_abutting_peptides() {
        // Second peptide starts exactly where the first ends: no empty
        // plain run between the two.
        let spans = [Span::new(1, 3), Span::new(4, 2)];
        let lines = chunk_sequence("XAAABBY", &spans, 60);
        assert_eq!(
            lines,
            vec![vec![
                Run::plain("X"),
                Run::peptide("AAA", 1, 0),
                Run::peptide("BB", 4, 0),
                Run::plain("Y"),
            ]]
        );
    }

    #[test]
    fn test_peptide_at_final_position_no_phantom_line() {
        // Peptide ends at the last residue of a width-multiple sequence.
        let lines = chunk_sequence("ABCDEFGHIJ", &[Span::new(7, 3)], 5);
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            vec![Run::plain("FG"), Run::peptide("HIJ", 7, 0)]
        );
    }

    #[test]
    fn test_zero_peptides_fixed_slicing() {
        let lines = chunk_sequence("ABCDEFGHIJK", &[], 4);
        assert_eq!(
            lines,
            vec![
                vec![Run::plain("ABCD")],
                vec![Run::plain("EFGH")],
                vec![Run::plain("IJK")],
            ]
        );
    }

    #[test]
    fn test_empty_sequence() {
        assert!(chunk_sequence("", &[], 10).is_empty());
        assert!(chunk_sequence("", &[Span::new(0, 3)], 10).is_empty());
    }

    #[test]
    fn test_gaps_preserve_display_width_but_not_location() {
        // BLUTEN-2 aligned row: peptide PRLT at true coordinates 5..9.
        let lines = chunk_sequence("MVTGKPRL----TIK", &[Span::new(5, 4)], 9);
        assert_eq!(
            lines,
            vec![
                vec![Run::plain("MVTGK"), Run::peptide("PRL-", 5, 0)],
                vec![Run::peptide("---T", 5, 1), Run::plain("IK")],
            ]
        );
    }

    #[test]
    fn test_idempotent_rechunk() {
        let seq = "MAWGKPRLFVCGTIK";
        let spans = [Span::new(0, 3), Span::new(6, 6), Span::new(11, 3)];
        let first = chunk_sequence(seq, &spans, 9);
        let rebuilt = concat(&first);
        assert_eq!(chunk_sequence(&rebuilt, &spans, 9), first);
    }

    #[test]
    fn test_annotate_ends() {
        let lines = chunk_sequence("ABCDEFGHIJK", &[], 4);
        let annotated = annotate_ends(lines);
        let ends: Vec<usize> = annotated.iter().map(|l| l.end).collect();
        assert_eq!(ends, vec![4, 8, 11]);
    }
}
