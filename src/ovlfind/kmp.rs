//! Exact matcher accelerated by Knuth-Morris-Pratt failure tables.
//!
//! Same verdicts and overlaps as [`super::brute_force`], but every search runs
//! the matching automaton of one read over a window of the other. The failure
//! table of a read is computed once with [`FailureTable::new`] and reused for
//! every comparison the read takes part in.

use super::{check_inputs, exact_containment, Containment, Overlap, OverlapError, OverlapMode};

/// Value type of a failure table entry
pub type KmpValue = u32;

/// Longest sequence a failure table can describe
pub const KMP_MAX: usize = KmpValue::MAX as usize;

/// Per-position length of the longest proper prefix that is also a suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureTable {
    pi: Vec<KmpValue>,
}

impl FailureTable {
    /// Prefix-function construction, O(length)
    pub fn new(seq: &[u8]) -> Result<Self, OverlapError> {
        if seq.len() > KMP_MAX {
            return Err(OverlapError::FailureTableCapacity {
                len: seq.len(),
                max: KMP_MAX,
            });
        }
        let mut pi = vec![0 as KmpValue; seq.len()];
        let mut k = 0usize;
        for q in 1..seq.len() {
            while k > 0 && seq[k] != seq[q] {
                k = pi[k - 1] as usize;
            }
            if seq[k] == seq[q] {
                k += 1;
            }
            pi[q] = k as KmpValue;
        }
        Ok(Self { pi })
    }

    pub fn len(&self) -> usize {
        self.pi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pi.is_empty()
    }

    pub fn as_slice(&self) -> &[KmpValue] {
        &self.pi
    }

    #[inline]
    fn fallback(&self, q: usize) -> usize {
        self.pi[q - 1] as usize
    }

    fn check_covers(&self, seq: &[u8]) -> Result<(), OverlapError> {
        if self.pi.len() != seq.len() {
            return Err(OverlapError::FailureTableMismatch {
                table: self.pi.len(),
                sequence: seq.len(),
            });
        }
        Ok(())
    }
}

/// Length of the longest prefix of `pattern` that is a suffix of `text`.
/// `text` must not be longer than `pattern`.
fn longest_prefix_match(text: &[u8], pattern: &[u8], table: &FailureTable) -> usize {
    debug_assert!(text.len() <= pattern.len());
    let mut q = 0;
    for &c in text {
        while q > 0 && c != pattern[q] {
            q = table.fallback(q);
        }
        if c == pattern[q] {
            q += 1;
        }
    }
    q
}

/// `true` if `pattern` occurs in the longer `text`
fn contained(pattern: &[u8], table: &FailureTable, text: &[u8]) -> bool {
    debug_assert!(pattern.len() < text.len());
    let mut q = 0;
    for &c in text {
        while q > 0 && pattern[q] != c {
            q = table.fallback(q);
        }
        if pattern[q] == c {
            q += 1;
        }
        if q == pattern.len() {
            return true;
        }
    }
    false
}

/// Report suffixes of `a` equal to prefixes of `b`, longest first.
///
/// The maximal match needs one automaton run over the last
/// `min(|a|, |b|)` symbols of `a`; each non-maximal match needs one more run
/// over a window one symbol shorter than the previous match.
#[allow(clippy::too_many_arguments)]
fn find_spms<F>(
    a: &[u8],
    b: &[u8],
    b_table: &FailureTable,
    min_length: usize,
    find_nonmaximal: bool,
    self_comparison: bool,
    u_suffix: bool,
    on_match: &mut F,
) where
    F: FnMut(Overlap),
{
    let min_length = min_length.max(1);
    let mut window = a.len().min(b.len());
    if self_comparison {
        window -= 1;
    }
    let mut q = longest_prefix_match(&a[a.len() - window..], b, b_table);
    if q >= min_length {
        on_match(Overlap::exact(q, u_suffix));
    }
    if find_nonmaximal {
        // each run finds a strictly shorter match
        while q > min_length {
            q = longest_prefix_match(&a[a.len() - q + 1..], b, b_table);
            if q >= min_length {
                on_match(Overlap::exact(q, u_suffix));
            }
        }
    }
}

/// Compare `u` with `v` (or with itself when `v` is `None`), each read
/// accompanied by its failure table.
pub fn find<F>(
    u: &[u8],
    u_table: &FailureTable,
    v: Option<(&[u8], &FailureTable)>,
    mode: OverlapMode,
    min_length: usize,
    find_nonmaximal: bool,
    mut on_match: F,
) -> Result<Containment, OverlapError>
where
    F: FnMut(Overlap),
{
    check_inputs(u, v.map(|(seq, _)| seq), mode)?;
    u_table.check_covers(u)?;
    let mut verdict = Containment::initial(v.is_none(), mode);

    match v {
        None => {
            if mode.finds_overlaps() {
                find_spms(u, u, u_table, min_length, find_nonmaximal, true, true, &mut on_match);
            }
        }
        Some((v, v_table)) => {
            v_table.check_covers(v)?;
            if mode.finds_containments() {
                verdict = exact_containment(u, v, |shorter, longer, shorter_is_u| {
                    let table = if shorter_is_u { u_table } else { v_table };
                    contained(shorter, table, longer)
                });
                if mode == OverlapMode::ProperSpm && verdict != Containment::Neither {
                    return Ok(verdict);
                }
            }
            if mode.finds_overlaps() {
                find_spms(u, v, v_table, min_length, find_nonmaximal, false, true, &mut on_match);
                find_spms(v, u, u_table, min_length, find_nonmaximal, false, false, &mut on_match);
            }
        }
    }
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(
        u: &str,
        v: &str,
        mode: OverlapMode,
        min_length: usize,
        find_nonmaximal: bool,
    ) -> (Containment, Vec<Overlap>) {
        let u_table = FailureTable::new(u.as_bytes()).unwrap();
        let v_table = FailureTable::new(v.as_bytes()).unwrap();
        let mut found = Vec::new();
        let verdict = find(
            u.as_bytes(),
            &u_table,
            Some((v.as_bytes(), &v_table)),
            mode,
            min_length,
            find_nonmaximal,
            |ovl| found.push(ovl),
        )
        .unwrap();
        (verdict, found)
    }

    #[test]
    fn test_failure_table() {
        let table = FailureTable::new(b"ababababca").unwrap();
        assert_eq!(table.as_slice(), &[0, 0, 1, 2, 3, 4, 5, 6, 0, 1]);
        assert!(FailureTable::new(b"").unwrap().is_empty());
    }

    #[test]
    fn test_overlaps_in_both_directions() {
        let (verdict, found) = run("aacgcacctg", "acctgatttc", OverlapMode::ProperSpm, 1, false);
        assert_eq!(verdict, Containment::Neither);
        assert_eq!(found, vec![Overlap::exact(5, true)]);

        let (verdict, found) = run("atccgtgacgtg", "aagaagaatccg", OverlapMode::All, 1, false);
        assert_eq!(verdict, Containment::Neither);
        assert_eq!(found, vec![Overlap::exact(5, false)]);

        let (verdict, found) = run("aac", "tgc", OverlapMode::ProperSpm, 1, false);
        assert_eq!(verdict, Containment::Neither);
        assert!(found.is_empty());
    }

    #[test]
    fn test_containments() {
        let (verdict, found) = run("acagc", "gtacagc", OverlapMode::All, 1, false);
        assert_eq!(verdict, Containment::FirstInSecond);
        assert_eq!(found, vec![Overlap::exact(5, false)]);

        let (verdict, found) = run("gtacagc", "acagc", OverlapMode::ProperSpm, 1, false);
        assert_eq!(verdict, Containment::SecondInFirst);
        assert!(found.is_empty());

        let (verdict, found) = run("ctatacagg", "ctat", OverlapMode::Spm, 1, false);
        assert_eq!(verdict, Containment::Off);
        assert_eq!(found, vec![Overlap::exact(4, false)]);

        let (verdict, found) = run("acagc", "acagc", OverlapMode::ProperSpm, 1, false);
        assert_eq!(verdict, Containment::Equal);
        assert!(found.is_empty());
    }

    #[test]
    fn test_find_nonmaximal() {
        let (_, found) = run("aacagtagtagt", "agtagtagttaa", OverlapMode::Spm, 1, false);
        assert_eq!(found, vec![Overlap::exact(9, true), Overlap::exact(2, false)]);

        let (_, found) = run("aacagtagtagt", "agtagtagttaa", OverlapMode::Spm, 1, true);
        assert_eq!(found.len(), 5);

        let (_, found) = run("aggaccagtagt", "agtagttactac", OverlapMode::Spm, 4, true);
        assert_eq!(found, vec![Overlap::exact(6, true)]);
    }

    #[test]
    fn test_self_comparison() {
        let table = FailureTable::new(b"agtagtagt").unwrap();
        let mut found = Vec::new();
        let verdict = find(b"agtagtagt", &table, None, OverlapMode::Spm, 1, true, |o| found.push(o))
            .unwrap();
        assert_eq!(verdict, Containment::Off);
        let lengths: Vec<usize> = found.iter().map(|o| o.length_on_u).collect();
        assert_eq!(lengths, vec![6, 3]);
    }

    #[test]
    fn test_table_must_cover_sequence() {
        let short = FailureTable::new(b"acg").unwrap();
        let result = find(b"acgt", &short, None, OverlapMode::Spm, 1, false, |_| {});
        assert!(matches!(
            result,
            Err(OverlapError::FailureTableMismatch { table: 3, sequence: 4 })
        ));
    }
}
