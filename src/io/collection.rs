// src/io/collection.rs
use std::borrow::Cow;

use bio::alphabets::dna;

/// Indexed access to the reads of one sweep.
///
/// When reverse complements are searched, the collection holds `2n` entries:
/// the direct reads at `0..n` and their reverse complements mirrored at
/// `n..2n`, so that read `i`'s reverse complement sits at `count() - i - 1`.
pub trait SequenceCollection: Sync {
    fn count(&self) -> usize;

    fn length(&self, index: usize) -> usize;

    fn extract(&self, index: usize) -> Cow<'_, [u8]>;

    fn extract_reverse_complement(&self, index: usize) -> Cow<'_, [u8]> {
        self.extract(self.count() - index - 1)
    }
}

/// In-memory read collection
#[derive(Debug, Clone, Default)]
pub struct ReadSet {
    reads: Vec<Vec<u8>>,
}

impl ReadSet {
    /// Direct reads only
    pub fn new(reads: Vec<Vec<u8>>) -> Self {
        Self { reads }
    }

    /// Direct reads followed by their reverse complements in mirrored order
    pub fn with_reverse_complements(mut reads: Vec<Vec<u8>>) -> Self {
        let complements: Vec<Vec<u8>> = reads.iter().rev().map(|r| dna::revcomp(r)).collect();
        reads.extend(complements);
        Self { reads }
    }

    pub fn from_strs<S: AsRef<str>>(reads: &[S], reverse_complements: bool) -> Self {
        let reads = reads.iter().map(|s| s.as_ref().as_bytes().to_vec()).collect();
        if reverse_complements {
            Self::with_reverse_complements(reads)
        } else {
            Self::new(reads)
        }
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.reads.get(index).map(Vec::as_slice)
    }

    pub fn total_length(&self) -> usize {
        self.reads.iter().map(Vec::len).sum()
    }
}

impl SequenceCollection for ReadSet {
    fn count(&self) -> usize {
        self.reads.len()
    }

    fn length(&self, index: usize) -> usize {
        self.reads[index].len()
    }

    fn extract(&self, index: usize) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.reads[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_complements_are_mirrored() {
        let set = ReadSet::from_strs(&["aacg", "ttga"], true);
        assert_eq!(set.count(), 4);
        assert_eq!(&*set.extract(2), b"tcaa");
        assert_eq!(&*set.extract(3), b"cgtt");
        assert_eq!(&*set.extract_reverse_complement(0), b"cgtt");
        assert_eq!(&*set.extract_reverse_complement(1), b"tcaa");
        assert_eq!(set.length(3), 4);
    }

    #[test]
    fn test_direct_only() {
        let set = ReadSet::from_strs(&["ACGT", "GG"], false);
        assert_eq!(set.count(), 2);
        assert_eq!(set.total_length(), 6);
        assert_eq!(set.get(1), Some(&b"GG"[..]));
        assert!(set.get(2).is_none());
    }
}
