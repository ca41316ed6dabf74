//! Read overlap and containment detection for overlap-graph assembly.
//!
//! - [`ovlfind`]: pairwise matchers (brute force, KMP, edit distance)
//! - [`pairwise`]: the all-pairs sweep with containment pruning
//! - [`io`]: read collections, FASTA input and SPM list formats

pub mod io;
pub mod ovlfind;
pub mod pairwise;

pub use ovlfind::{Containment, Overlap, OverlapError, OverlapMode};
pub use pairwise::{
    find_all_pairs, par_find_all_pairs, Backend, ContainmentSet, PairwiseConfig, Spm, SweepResult,
    SweepStats,
};
