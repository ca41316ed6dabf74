//! All-pairs overlap sweep over a read collection.
//!
//! Every pair `(i, j)` with `i <= j` of direct reads is compared once with the
//! selected matcher, and once more against the reverse complement of `j` when
//! both strands are searched. Containment verdicts are folded into a shared
//! [`ContainmentSet`]; with the containment filter enabled, reads already
//! known to be contained are pruned from the rest of the sweep.

pub mod containment;
pub mod progress;

pub use containment::ContainmentSet;
pub use progress::{NoProgress, ProgressCounter, ProgressSink};

use std::borrow::Cow;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info};

use crate::io::SequenceCollection;
use crate::ovlfind::dp::{self, DpScratch};
use crate::ovlfind::kmp::{self, FailureTable};
use crate::ovlfind::{brute_force, Containment, Overlap, OverlapError, OverlapMode};

/// One suffix-prefix match between two oriented reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Spm {
    pub suffix_read: usize,
    pub prefix_read: usize,
    pub suffix_length: usize,
    pub prefix_length: usize,
    pub unit_edist: usize,
    pub suffix_direct: bool,
    pub prefix_direct: bool,
}

/// Matcher used for every pair of a sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backend {
    BruteForce,
    Kmp,
    EditDistance { max_error_rate: f64 },
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::BruteForce => "brute-force",
            Backend::Kmp => "kmp",
            Backend::EditDistance { .. } => "edit-distance",
        }
    }
}

/// Parameters of one sweep
#[derive(Debug, Clone)]
pub struct PairwiseConfig {
    /// `spm`, `cnt` or `all`
    pub mode: OverlapMode,
    /// Shortest overlap reported
    pub min_length: usize,
    /// Report every match, not only the longest per direction
    pub find_nonmaximal: bool,
    /// The second half of the collection holds the reverse complements
    pub reverse_complements: bool,
    /// Skip reads already known to be contained
    pub containment_filter: bool,
    /// Worker threads of [`par_find_all_pairs`] (0 = one per core)
    pub threads: usize,
}

impl Default for PairwiseConfig {
    fn default() -> Self {
        Self {
            mode: OverlapMode::Spm,
            min_length: 1,
            find_nonmaximal: false,
            reverse_complements: true,
            containment_filter: false,
            threads: 1,
        }
    }
}

/// Counters collected during a sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// `(i, j)` pairs handed to the matcher
    pub compared_pairs: usize,
    /// Outer iterations cut short because read `i` was contained
    pub abandoned_rows: usize,
    /// Inner pairs skipped because read `j` was contained
    pub skipped_pairs: usize,
    /// Reads newly marked as contained
    pub marked_reads: usize,
}

impl SweepStats {
    pub fn merge(self, other: Self) -> Self {
        Self {
            compared_pairs: self.compared_pairs + other.compared_pairs,
            abandoned_rows: self.abandoned_rows + other.abandoned_rows,
            skipped_pairs: self.skipped_pairs + other.skipped_pairs,
            marked_reads: self.marked_reads + other.marked_reads,
        }
    }
}

#[derive(Debug)]
pub struct SweepResult {
    /// Present when the mode tracks containments or a set was supplied.
    /// A supplied set is extended in place and copied here.
    pub containment: Option<ContainmentSet>,
    /// Number of direct reads
    pub nofreads: usize,
    pub stats: SweepStats,
}

struct ReadRef<'a> {
    seq: Cow<'a, [u8]>,
    seqnum: usize,
    direct: bool,
}

struct KmpTables {
    direct: Vec<FailureTable>,
    reverse: Vec<FailureTable>,
}

impl KmpTables {
    fn build<C>(
        collection: &C,
        nofreads: usize,
        reverse_complements: bool,
    ) -> Result<Self, OverlapError>
    where
        C: SequenceCollection + ?Sized,
    {
        let direct = (0..nofreads)
            .into_par_iter()
            .map(|i| FailureTable::new(&collection.extract(i)))
            .collect::<Result<Vec<_>, _>>()?;
        let reverse = if reverse_complements {
            (0..nofreads)
                .into_par_iter()
                .map(|i| FailureTable::new(&collection.extract_reverse_complement(i)))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };
        Ok(Self { direct, reverse })
    }

    fn get(&self, read: &ReadRef) -> Result<&FailureTable, OverlapError> {
        let tables = if read.direct { &self.direct } else { &self.reverse };
        tables
            .get(read.seqnum)
            .ok_or(OverlapError::MissingFailureTable(read.seqnum))
    }
}

fn spm_for(u: &ReadRef, v: &ReadRef, ovl: Overlap) -> Spm {
    let (suffix, prefix, ovl) = if ovl.u_suffix { (u, v, ovl) } else { (v, u, ovl.swapped()) };
    Spm {
        suffix_read: suffix.seqnum,
        prefix_read: prefix.seqnum,
        suffix_length: ovl.length_on_u,
        prefix_length: ovl.length_on_v,
        unit_edist: ovl.unit_edist,
        suffix_direct: suffix.direct,
        prefix_direct: prefix.direct,
    }
}

struct Sweep<'a, C: ?Sized> {
    collection: &'a C,
    backend: Backend,
    /// mode handed to the matcher, after the `all` + filter downgrade
    mode: OverlapMode,
    min_length: usize,
    find_nonmaximal: bool,
    reverse_complements: bool,
    filter: bool,
    marking: bool,
    nofreads: usize,
    containment: Option<Cow<'a, ContainmentSet>>,
    tables: Option<KmpTables>,
    progress: &'a dyn ProgressSink,
}

impl<'a, C> Sweep<'a, C>
where
    C: SequenceCollection + ?Sized,
{
    fn new(
        collection: &'a C,
        backend: Backend,
        config: &PairwiseConfig,
        containment_in: Option<&'a ContainmentSet>,
        progress: &'a dyn ProgressSink,
    ) -> Result<Self, OverlapError> {
        let mode = config.mode;
        if !matches!(mode, OverlapMode::Spm | OverlapMode::Cnt | OverlapMode::All) {
            return Err(OverlapError::InvalidSweepMode(mode));
        }
        if let Backend::EditDistance { max_error_rate } = backend {
            if !(0.0..=1.0).contains(&max_error_rate) {
                return Err(OverlapError::InvalidErrorRate(max_error_rate));
            }
        }
        let total = collection.count();
        let nofreads = if config.reverse_complements {
            if total % 2 != 0 {
                return Err(OverlapError::OddCollection(total));
            }
            total / 2
        } else {
            total
        };
        if config.containment_filter && mode == OverlapMode::Spm && containment_in.is_none() {
            return Err(OverlapError::ContainmentFilterUnavailable);
        }
        let marking = mode.finds_containments();
        let containment = match containment_in {
            Some(set) if set.len() < nofreads => {
                return Err(OverlapError::ContainmentSetTooSmall {
                    have: set.len(),
                    need: nofreads,
                });
            }
            Some(set) => Some(Cow::Borrowed(set)),
            None if marking => Some(Cow::Owned(ContainmentSet::new(nofreads))),
            None => None,
        };
        let pair_mode = if mode == OverlapMode::All && config.containment_filter {
            debug!("Containment filter active: reporting only proper overlaps");
            OverlapMode::ProperSpm
        } else {
            mode
        };
        let tables = match backend {
            Backend::Kmp => {
                Some(KmpTables::build(collection, nofreads, config.reverse_complements)?)
            }
            _ => None,
        };

        Ok(Self {
            collection,
            backend,
            mode: pair_mode,
            min_length: config.min_length,
            find_nonmaximal: config.find_nonmaximal,
            reverse_complements: config.reverse_complements,
            filter: config.containment_filter,
            marking,
            nofreads,
            containment,
            tables,
            progress,
        })
    }

    fn direct(&self, index: usize) -> ReadRef<'a> {
        ReadRef { seq: self.collection.extract(index), seqnum: index, direct: true }
    }

    fn reverse(&self, index: usize) -> ReadRef<'a> {
        ReadRef {
            seq: self.collection.extract_reverse_complement(index),
            seqnum: index,
            direct: false,
        }
    }

    fn compare<F>(
        &self,
        scratch: &mut DpScratch,
        u: &ReadRef,
        v: &ReadRef,
        on_spm: &mut F,
    ) -> Result<Containment, OverlapError>
    where
        F: FnMut(Spm),
    {
        let self_comparison = u.seqnum == v.seqnum && v.direct;
        if self_comparison && !self.mode.allows_self_comparison() {
            return Ok(Containment::Equal);
        }
        let other: Option<&[u8]> = if self_comparison { None } else { Some(&*v.seq) };
        let report = |ovl: Overlap| on_spm(spm_for(u, v, ovl));

        match self.backend {
            Backend::BruteForce => brute_force::find(
                &u.seq,
                other,
                self.mode,
                self.min_length,
                self.find_nonmaximal,
                report,
            ),
            Backend::Kmp => {
                let tables = self
                    .tables
                    .as_ref()
                    .ok_or(OverlapError::MissingFailureTable(u.seqnum))?;
                let other = match other {
                    Some(seq) => Some((seq, tables.get(v)?)),
                    None => None,
                };
                kmp::find(
                    &u.seq,
                    tables.get(u)?,
                    other,
                    self.mode,
                    self.min_length,
                    self.find_nonmaximal,
                    report,
                )
            }
            Backend::EditDistance { max_error_rate } => dp::find_with_scratch(
                scratch,
                &u.seq,
                other,
                max_error_rate,
                self.mode,
                self.min_length,
                self.find_nonmaximal,
                report,
            ),
        }
    }

    /// First-in-second marks `i`, second-in-first marks `j`, and of two equal
    /// reads the lower-numbered one survives
    fn record(&self, i: usize, j: usize, verdict: Containment, stats: &mut SweepStats) {
        if !self.marking {
            return;
        }
        let Some(set) = &self.containment else {
            return;
        };
        let contained = match verdict {
            Containment::FirstInSecond => i,
            Containment::SecondInFirst => j,
            Containment::Equal if i != j => j,
            _ => return,
        };
        if set.mark(contained) {
            stats.marked_reads += 1;
        }
    }

    fn sweep_row<F>(
        &self,
        i: usize,
        scratch: &mut DpScratch,
        on_spm: &mut F,
    ) -> Result<SweepStats, OverlapError>
    where
        F: FnMut(Spm),
    {
        let mut stats = SweepStats::default();
        let filter = if self.filter { self.containment.as_ref() } else { None };
        let u = self.direct(i);
        for j in i..self.nofreads {
            if let Some(set) = filter {
                if set.contains(i) {
                    stats.abandoned_rows += 1;
                    break;
                }
                if set.contains(j) {
                    stats.skipped_pairs += 1;
                    continue;
                }
            }
            let verdict = self.compare(scratch, &u, &self.direct(j), on_spm)?;
            self.record(i, j, verdict, &mut stats);
            if self.reverse_complements {
                let verdict = self.compare(scratch, &u, &self.reverse(j), on_spm)?;
                self.record(i, j, verdict, &mut stats);
            }
            stats.compared_pairs += 1;
            self.progress.inc(1);
        }
        Ok(stats)
    }

    fn start(&self, config: &PairwiseConfig, threads: usize) {
        let n = self.nofreads as u64;
        self.progress.set_length(n * n.saturating_sub(1) / 2);
        info!(
            "Comparing {} reads ({}), mode {}, backend {}, {} thread(s)",
            self.nofreads,
            if self.reverse_complements { "both strands" } else { "single strand" },
            config.mode,
            self.backend.name(),
            threads
        );
    }

    fn finish(self, stats: SweepStats) -> SweepResult {
        self.progress.finish();
        info!(
            "Sweep done: {} pairs compared, {} rows abandoned, {} pairs skipped, {} contained",
            stats.compared_pairs,
            stats.abandoned_rows,
            stats.skipped_pairs,
            self.containment.as_ref().map_or(0, |set| set.count())
        );
        SweepResult {
            containment: self.containment.map(Cow::into_owned),
            nofreads: self.nofreads,
            stats,
        }
    }
}

/// Run the sweep on the calling thread.
///
/// `on_spm` receives every match in sweep order. A supplied
/// `containment_in` is used as a lower bound and extended in place. The
/// first matcher error aborts the sweep; marks made up to that point stay
/// in the supplied set.
pub fn find_all_pairs<C, F>(
    collection: &C,
    backend: Backend,
    config: &PairwiseConfig,
    containment_in: Option<&ContainmentSet>,
    progress: &dyn ProgressSink,
    mut on_spm: F,
) -> Result<SweepResult, OverlapError>
where
    C: SequenceCollection + ?Sized,
    F: FnMut(Spm),
{
    let sweep = Sweep::new(collection, backend, config, containment_in, progress)?;
    sweep.start(config, 1);
    let mut scratch = DpScratch::new();
    let mut stats = SweepStats::default();
    for i in 0..sweep.nofreads {
        stats = stats.merge(sweep.sweep_row(i, &mut scratch, &mut on_spm)?);
    }
    Ok(sweep.finish(stats))
}

/// Run the outer loop over `i` on a dedicated thread pool of
/// `config.threads` workers.
///
/// Matches arrive in no particular order across pairs. Which pairs are
/// pruned depends on when marks from other rows become visible.
pub fn par_find_all_pairs<C, F>(
    collection: &C,
    backend: Backend,
    config: &PairwiseConfig,
    containment_in: Option<&ContainmentSet>,
    progress: &dyn ProgressSink,
    on_spm: F,
) -> Result<SweepResult, OverlapError>
where
    C: SequenceCollection + ?Sized,
    F: Fn(Spm) + Sync,
{
    let pool = ThreadPoolBuilder::new().num_threads(config.threads).build()?;
    let sweep = Sweep::new(collection, backend, config, containment_in, progress)?;
    sweep.start(config, pool.current_num_threads());
    let stats = pool.install(|| {
        (0..sweep.nofreads)
            .into_par_iter()
            .map_init(DpScratch::new, |scratch, i| {
                sweep.sweep_row(i, scratch, &mut |spm| on_spm(spm))
            })
            .try_reduce(SweepStats::default, |a, b| Ok(a.merge(b)))
    })?;
    Ok(sweep.finish(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ReadSet;

    fn sweep(reads: &[&str], backend: Backend, config: &PairwiseConfig) -> (SweepResult, Vec<Spm>) {
        let set = ReadSet::from_strs(reads, config.reverse_complements);
        let mut spms = Vec::new();
        let result =
            find_all_pairs(&set, backend, config, None, &NoProgress, |spm| spms.push(spm)).unwrap();
        (result, spms)
    }

    #[test]
    fn test_overlap_roles() {
        let config = PairwiseConfig { reverse_complements: false, ..Default::default() };
        let (result, spms) = sweep(&["aacgcacctg", "acctgatttc"], Backend::BruteForce, &config);
        assert_eq!(result.nofreads, 2);
        assert!(result.containment.is_none());
        assert_eq!(
            spms,
            vec![Spm {
                suffix_read: 0,
                prefix_read: 1,
                suffix_length: 5,
                prefix_length: 5,
                unit_edist: 0,
                suffix_direct: true,
                prefix_direct: true,
            }]
        );
    }

    #[test]
    fn test_equal_reads_keep_lower_number() {
        let config = PairwiseConfig {
            mode: OverlapMode::Cnt,
            reverse_complements: false,
            ..Default::default()
        };
        let (result, spms) = sweep(&["acagc", "acagc", "gtacagc"], Backend::Kmp, &config);
        assert!(spms.is_empty());
        let set = result.containment.unwrap();
        assert_eq!(set.marked().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(result.stats.marked_reads, 2);
    }

    #[test]
    fn test_self_comparison_in_cnt_mode_is_not_a_containment() {
        let config = PairwiseConfig {
            mode: OverlapMode::Cnt,
            reverse_complements: false,
            ..Default::default()
        };
        let (result, _) = sweep(&["acgtt"], Backend::EditDistance { max_error_rate: 0.0 }, &config);
        assert_eq!(result.containment.unwrap().count(), 0);
        assert_eq!(result.stats.compared_pairs, 1);
    }

    #[test]
    fn test_rejects_invalid_sweeps() {
        let set = ReadSet::from_strs(&["acgt", "ttg", "ca"], false);
        let run = |config: &PairwiseConfig, containment_in: Option<&ContainmentSet>| {
            find_all_pairs(&set, Backend::BruteForce, config, containment_in, &NoProgress, |_| {})
        };

        let proper = PairwiseConfig {
            mode: OverlapMode::ProperSpm,
            reverse_complements: false,
            ..Default::default()
        };
        assert!(matches!(run(&proper, None), Err(OverlapError::InvalidSweepMode(_))));

        let both_strands = PairwiseConfig::default();
        assert!(matches!(run(&both_strands, None), Err(OverlapError::OddCollection(3))));

        let filter = PairwiseConfig {
            containment_filter: true,
            reverse_complements: false,
            ..Default::default()
        };
        assert!(matches!(run(&filter, None), Err(OverlapError::ContainmentFilterUnavailable)));
        assert!(run(&filter, Some(&ContainmentSet::new(3))).is_ok());

        let cnt = PairwiseConfig {
            mode: OverlapMode::Cnt,
            reverse_complements: false,
            ..Default::default()
        };
        assert!(matches!(
            run(&cnt, Some(&ContainmentSet::new(2))),
            Err(OverlapError::ContainmentSetTooSmall { have: 2, need: 3 })
        ));
    }

    #[test]
    fn test_stats_merge() {
        let a =
            SweepStats { compared_pairs: 3, abandoned_rows: 1, skipped_pairs: 0, marked_reads: 2 };
        let b =
            SweepStats { compared_pairs: 1, abandoned_rows: 0, skipped_pairs: 4, marked_reads: 0 };
        assert_eq!(
            a.merge(b),
            SweepStats { compared_pairs: 4, abandoned_rows: 1, skipped_pairs: 4, marked_reads: 2 }
        );
    }
}
