//! Pairwise overlap and containment detection between two reads.
//!
//! Three interchangeable matchers share one contract:
//! - [`brute_force`]: direct comparison, O(n·m)
//! - [`kmp`]: automaton-accelerated exact matching using per-read failure tables
//! - [`dp`]: edit-distance matching under a maximum error rate, O(m+n) memory
//!
//! Every matcher returns a [`Containment`] verdict and reports suffix-prefix
//! matches through a caller-supplied callback. Passing `None` as the second
//! read requests a self-comparison of the first read against itself.

pub mod brute_force;
pub mod dp;
pub mod kmp;

use std::fmt;
use std::str::FromStr;

/// Which relations a comparison looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlapMode {
    /// Suffix-prefix matches only; the verdict stays [`Containment::Off`]
    Spm,
    /// Containments only
    Cnt,
    /// Containments and suffix-prefix matches
    All,
    /// Suffix-prefix matches, skipped when either read contains the other
    ProperSpm,
}

impl OverlapMode {
    pub fn finds_containments(self) -> bool {
        !matches!(self, OverlapMode::Spm)
    }

    pub fn finds_overlaps(self) -> bool {
        !matches!(self, OverlapMode::Cnt)
    }

    /// Only `spm` and `all` are meaningful when a read is compared to itself
    pub fn allows_self_comparison(self) -> bool {
        matches!(self, OverlapMode::Spm | OverlapMode::All)
    }
}

impl fmt::Display for OverlapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OverlapMode::Spm => "spm",
            OverlapMode::Cnt => "cnt",
            OverlapMode::All => "all",
            OverlapMode::ProperSpm => "proper_spm",
        };
        f.write_str(name)
    }
}

impl FromStr for OverlapMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spm" => Ok(OverlapMode::Spm),
            "cnt" => Ok(OverlapMode::Cnt),
            "all" => Ok(OverlapMode::All),
            "proper_spm" => Ok(OverlapMode::ProperSpm),
            other => Err(format!("unknown overlap mode: {}", other)),
        }
    }
}

/// Containment verdict for one ordered pair `(u, v)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Containment {
    /// Containment was not evaluated
    Off,
    /// `u` and `v` are (approximately) equal
    Equal,
    /// `u` is contained in `v`
    FirstInSecond,
    /// `v` is contained in `u`
    SecondInFirst,
    /// Neither read contains the other
    Neither,
}

impl Containment {
    /// Verdict before any search: a self-comparison in `all` mode is trivially equal
    pub(crate) fn initial(self_comparison: bool, mode: OverlapMode) -> Self {
        if self_comparison && mode == OverlapMode::All {
            Containment::Equal
        } else {
            Containment::Off
        }
    }

    /// The same verdict seen from `(v, u)`
    pub fn swapped(self) -> Self {
        match self {
            Containment::FirstInSecond => Containment::SecondInFirst,
            Containment::SecondInFirst => Containment::FirstInSecond,
            other => other,
        }
    }
}

/// One suffix-prefix match between `u` and `v`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Overlap {
    pub length_on_u: usize,
    pub length_on_v: usize,
    /// Unit edit distance of the match, always 0 for the exact matchers
    pub unit_edist: usize,
    /// `true` if a suffix of `u` matches a prefix of `v`,
    /// `false` if a suffix of `v` matches a prefix of `u`
    pub u_suffix: bool,
}

impl Overlap {
    pub(crate) fn exact(length: usize, u_suffix: bool) -> Self {
        Self {
            length_on_u: length,
            length_on_v: length,
            unit_edist: 0,
            u_suffix,
        }
    }

    /// The same match seen from `(v, u)`
    pub fn swapped(self) -> Self {
        Self {
            length_on_u: self.length_on_v,
            length_on_v: self.length_on_u,
            unit_edist: self.unit_edist,
            u_suffix: !self.u_suffix,
        }
    }
}

/// Contract violations reported by the matchers and the pairwise driver
#[derive(thiserror::Error, Debug)]
pub enum OverlapError {
    #[error("sequence {0} is empty")]
    EmptySequence(&'static str),
    #[error("mode {0} is not valid for a self-comparison")]
    InvalidSelfComparisonMode(OverlapMode),
    #[error("mode {0} is not valid for an all-pairs sweep")]
    InvalidSweepMode(OverlapMode),
    #[error("maximum error rate {0} is outside [0, 1]")]
    InvalidErrorRate(f64),
    #[error("sequence length {len} exceeds the failure table capacity of {max}")]
    FailureTableCapacity { len: usize, max: usize },
    #[error("failure table covers {table} symbols but the sequence has {sequence}")]
    FailureTableMismatch { table: usize, sequence: usize },
    #[error("no failure table cached for read {0}")]
    MissingFailureTable(usize),
    #[error("reverse complement search needs an even number of sequences, found {0}")]
    OddCollection(usize),
    #[error("containment set covers {have} reads but the sweep needs {need}")]
    ContainmentSetTooSmall { have: usize, need: usize },
    #[error("containment filter needs mode cnt or all, or a supplied containment set")]
    ContainmentFilterUnavailable,
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Shared precondition check of all three matchers
pub(crate) fn check_inputs(
    u: &[u8],
    v: Option<&[u8]>,
    mode: OverlapMode,
) -> Result<(), OverlapError> {
    if u.is_empty() {
        return Err(OverlapError::EmptySequence("u"));
    }
    match v {
        Some(v) if v.is_empty() => Err(OverlapError::EmptySequence("v")),
        None if !mode.allows_self_comparison() => {
            Err(OverlapError::InvalidSelfComparisonMode(mode))
        }
        _ => Ok(()),
    }
}

/// Containment verdict of two distinct exact sequences, given a substring test
/// `contains(shorter, longer)`
pub(crate) fn exact_containment<F>(u: &[u8], v: &[u8], contains: F) -> Containment
where
    F: FnOnce(&[u8], &[u8], bool) -> bool,
{
    use std::cmp::Ordering;

    let found = |hit: bool, verdict: Containment| if hit { verdict } else { Containment::Neither };
    match u.len().cmp(&v.len()) {
        Ordering::Equal => found(u == v, Containment::Equal),
        Ordering::Less => found(contains(u, v, true), Containment::FirstInSecond),
        Ordering::Greater => found(contains(v, u, false), Containment::SecondInFirst),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trips_through_names() {
        for mode in [
            OverlapMode::Spm,
            OverlapMode::Cnt,
            OverlapMode::All,
            OverlapMode::ProperSpm,
        ] {
            assert_eq!(mode.to_string().parse::<OverlapMode>(), Ok(mode));
        }
        assert!("both".parse::<OverlapMode>().is_err());
    }

    #[test]
    fn test_check_inputs() {
        assert!(check_inputs(b"acgt", Some(&b"ac"[..]), OverlapMode::Cnt).is_ok());
        assert!(check_inputs(b"acgt", None, OverlapMode::Spm).is_ok());
        assert!(matches!(
            check_inputs(b"", Some(&b"ac"[..]), OverlapMode::Spm),
            Err(OverlapError::EmptySequence("u"))
        ));
        assert!(matches!(
            check_inputs(b"ac", Some(&b""[..]), OverlapMode::Spm),
            Err(OverlapError::EmptySequence("v"))
        ));
        assert!(matches!(
            check_inputs(b"ac", None, OverlapMode::ProperSpm),
            Err(OverlapError::InvalidSelfComparisonMode(OverlapMode::ProperSpm))
        ));
    }

    #[test]
    fn test_swapped_verdicts() {
        assert_eq!(Containment::FirstInSecond.swapped(), Containment::SecondInFirst);
        assert_eq!(Containment::Equal.swapped(), Containment::Equal);
        let ovl = Overlap { length_on_u: 4, length_on_v: 5, unit_edist: 1, u_suffix: true };
        assert_eq!(ovl.swapped().swapped(), ovl);
        assert!(!ovl.swapped().u_suffix);
    }
}
