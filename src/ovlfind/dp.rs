//! Approximate matcher based on unit edit distance.
//!
//! A single dynamic-programming pass aligns `u` against `v` with free leading
//! gaps on both reads. Every cell keeps its edit distance together with the
//! position the alignment started from, so that after the pass:
//! - the last row describes alignments that end at the end of `u`
//! - the last column describes alignments that end at the end of `v`
//!
//! Containments and suffix-prefix matches are read off those two vectors.
//! Only one column of the matrix is alive at any time: memory is O(m + n).
//!
//! Ties between equally cheap predecessors prefer deletion, then insertion,
//! then replacement. The start position kept in a cell depends on that order,
//! so at a nonzero error rate swapping `u` and `v` does not always swap the
//! verdict and overlaps. At rate 0 the matcher agrees with the exact ones in
//! both directions.

use super::{check_inputs, Containment, Overlap, OverlapError, OverlapMode};

/// Edit distance of an alignment and the matrix cell it started from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DpCell {
    edist: usize,
    start_i: usize,
    start_j: usize,
}

impl DpCell {
    fn starts_u(&self) -> bool {
        self.start_i == 0
    }

    fn starts_v(&self) -> bool {
        self.start_j == 0
    }
}

/// Reusable DP buffers, one per worker thread
#[derive(Debug, Default, Clone)]
pub struct DpScratch {
    /// last row: alignments ending at the end of `u`, indexed by position in `v`
    row: Vec<DpCell>,
    /// last column: alignments ending at the end of `v`, indexed by position in `u`
    col: Vec<DpCell>,
}

impl DpScratch {
    pub fn new() -> Self {
        Self::default()
    }

    fn run(&mut self, u: &[u8], v: &[u8]) {
        let (m, n) = (u.len(), v.len());
        self.col.clear();
        self.col.extend((0..=m).map(|i| DpCell { edist: 0, start_i: i, start_j: 0 }));
        self.row.clear();
        self.row.reserve(n + 1);
        self.row.push(self.col[m]);

        let col = &mut self.col;
        for (j, &vc) in v.iter().enumerate().map(|(j, c)| (j + 1, c)) {
            col[0].start_j = j;
            // value col[i - 1] held before column j overwrote it
            let mut diagonal = DpCell { edist: 0, start_i: 0, start_j: j - 1 };
            for i in 1..=m {
                let left = col[i];
                let cost_i = left.edist + 1;
                let cost_d = col[i - 1].edist + 1;
                let cost_r = diagonal.edist + usize::from(u[i - 1] != vc);
                col[i] = if cost_r < cost_i && cost_r < cost_d {
                    DpCell { edist: cost_r, ..diagonal }
                } else if cost_i < cost_d {
                    DpCell { edist: cost_i, ..left }
                } else {
                    DpCell { edist: cost_d, ..col[i - 1] }
                };
                diagonal = left;
            }
            self.row.push(col[m]);
        }
    }

    fn containment(&self, max_edist: usize) -> Containment {
        let within = |cell: &&DpCell| cell.edist <= max_edist;
        let full = self.row[self.row.len() - 1];
        if full.edist <= max_edist && full.starts_u() && full.starts_v() {
            Containment::Equal
        } else if self.col.iter().filter(within).any(|c| c.starts_v()) {
            Containment::SecondInFirst
        } else if self.row.iter().filter(within).any(|c| c.starts_u()) {
            Containment::FirstInSecond
        } else {
            Containment::Neither
        }
    }

    /// suffix of u, prefix of v[..j], scanning j downward from `from`
    fn u_suffix_spms<F>(
        &self,
        m: usize,
        from: usize,
        max_edist: usize,
        min_length: usize,
        submaximal: bool,
        on_match: &mut F,
    ) where
        F: FnMut(Overlap),
    {
        for j in (min_length..=from).rev() {
            let cell = self.row[j];
            if cell.edist <= max_edist && cell.starts_v() {
                let suffix_len = m - cell.start_i;
                if suffix_len >= min_length {
                    on_match(Overlap {
                        length_on_u: suffix_len,
                        length_on_v: j,
                        unit_edist: cell.edist,
                        u_suffix: true,
                    });
                }
                if !submaximal {
                    break;
                }
            }
        }
    }

    /// suffix of v, prefix of u[..i], scanning i downward from the end of u
    fn v_suffix_spms<F>(
        &self,
        n: usize,
        max_edist: usize,
        min_length: usize,
        submaximal: bool,
        on_match: &mut F,
    ) where
        F: FnMut(Overlap),
    {
        for i in (min_length..self.col.len()).rev() {
            let cell = self.col[i];
            if cell.edist <= max_edist && cell.starts_u() {
                let suffix_len = n - cell.start_j;
                if suffix_len >= min_length {
                    on_match(Overlap {
                        length_on_u: i,
                        length_on_v: suffix_len,
                        unit_edist: cell.edist,
                        u_suffix: false,
                    });
                }
                if !submaximal {
                    break;
                }
            }
        }
    }
}

/// Compare `u` with `v` (or with itself when `v` is `None`) allowing up to
/// `floor(max_error_rate * max(|u|, |v|))` unit edits per match.
pub fn find<F>(
    u: &[u8],
    v: Option<&[u8]>,
    max_error_rate: f64,
    mode: OverlapMode,
    min_length: usize,
    find_submaximal: bool,
    on_match: F,
) -> Result<Containment, OverlapError>
where
    F: FnMut(Overlap),
{
    find_with_scratch(
        &mut DpScratch::new(),
        u,
        v,
        max_error_rate,
        mode,
        min_length,
        find_submaximal,
        on_match,
    )
}

/// [`find`] reusing caller-owned buffers
#[allow(clippy::too_many_arguments)]
pub fn find_with_scratch<F>(
    scratch: &mut DpScratch,
    u: &[u8],
    v: Option<&[u8]>,
    max_error_rate: f64,
    mode: OverlapMode,
    min_length: usize,
    find_submaximal: bool,
    mut on_match: F,
) -> Result<Containment, OverlapError>
where
    F: FnMut(Overlap),
{
    check_inputs(u, v, mode)?;
    if !(0.0..=1.0).contains(&max_error_rate) {
        return Err(OverlapError::InvalidErrorRate(max_error_rate));
    }
    let self_comparison = v.is_none();
    let v = v.unwrap_or(u);
    let (m, n) = (u.len(), v.len());
    let max_edist = (max_error_rate * m.max(n) as f64).floor() as usize;
    scratch.run(u, v);

    let mut verdict = Containment::initial(self_comparison, mode);
    if mode.finds_containments() && !self_comparison {
        verdict = scratch.containment(max_edist);
    }

    let report = match mode {
        OverlapMode::Spm | OverlapMode::All => true,
        OverlapMode::ProperSpm => verdict == Containment::Neither,
        OverlapMode::Cnt => false,
    };
    if report {
        let min_length = min_length.max(1);
        if self_comparison {
            scratch.u_suffix_spms(m, m - 1, max_edist, min_length, find_submaximal, &mut on_match);
        } else {
            scratch.u_suffix_spms(m, n, max_edist, min_length, find_submaximal, &mut on_match);
            scratch.v_suffix_spms(n, max_edist, min_length, find_submaximal, &mut on_match);
        }
    }
    Ok(verdict)
}
