//! Bit-per-read record of contained reads, shared by all workers of a sweep.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

const WORD_BITS: usize = 64;

/// Grows monotonically: bits are set with `fetch_or` and never cleared
pub struct ContainmentSet {
    words: Vec<AtomicU64>,
    reads: usize,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    reads: usize,
    words: Vec<u64>,
}

impl ContainmentSet {
    pub fn new(reads: usize) -> Self {
        let words = (0..reads.div_ceil(WORD_BITS)).map(|_| AtomicU64::new(0)).collect();
        Self { words, reads }
    }

    /// Number of reads the set covers
    pub fn len(&self) -> usize {
        self.reads
    }

    pub fn is_empty(&self) -> bool {
        self.reads == 0
    }

    pub fn contains(&self, read: usize) -> bool {
        let (word, bit) = (read / WORD_BITS, read % WORD_BITS);
        self.words[word].load(Ordering::Relaxed) & (1 << bit) != 0
    }

    /// Mark `read` as contained; returns `true` if it was not marked before
    pub fn mark(&self, read: usize) -> bool {
        let (word, bit) = (read / WORD_BITS, read % WORD_BITS);
        let previous = self.words[word].fetch_or(1 << bit, Ordering::Relaxed);
        previous & (1 << bit) == 0
    }

    pub fn count(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }

    /// Marked reads in increasing order
    pub fn marked(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.reads).filter(move |&read| self.contains(read))
    }

    pub fn save(&self, path: &str) -> io::Result<()> {
        let snapshot = Snapshot {
            reads: self.reads,
            words: self.words.iter().map(|w| w.load(Ordering::Relaxed)).collect(),
        };
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &snapshot)?;
        Ok(())
    }

    pub fn load(path: &str) -> io::Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: Snapshot = serde_json::from_reader(reader)?;
        if snapshot.words.len() != snapshot.reads.div_ceil(WORD_BITS) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "containment set of {} reads cannot hold {} words",
                    snapshot.reads,
                    snapshot.words.len()
                ),
            ));
        }
        let tail = snapshot.reads % WORD_BITS;
        if let Some(&last) = snapshot.words.last() {
            if tail != 0 && last >> tail != 0 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "containment set marks reads beyond its length",
                ));
            }
        }
        Ok(Self {
            words: snapshot.words.into_iter().map(AtomicU64::new).collect(),
            reads: snapshot.reads,
        })
    }
}

impl Clone for ContainmentSet {
    fn clone(&self) -> Self {
        Self {
            words: self
                .words
                .iter()
                .map(|w| AtomicU64::new(w.load(Ordering::Relaxed)))
                .collect(),
            reads: self.reads,
        }
    }
}

impl std::fmt::Debug for ContainmentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainmentSet")
            .field("reads", &self.reads)
            .field("marked", &self.marked().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_mark_is_monotone() {
        let set = ContainmentSet::new(130);
        assert_eq!(set.len(), 130);
        assert!(set.mark(3));
        assert!(!set.mark(3));
        assert!(set.mark(129));
        assert!(set.contains(3));
        assert!(set.contains(129));
        assert!(!set.contains(64));
        assert_eq!(set.count(), 2);
        assert_eq!(set.marked().collect::<Vec<_>>(), vec![3, 129]);
    }

    #[test]
    fn test_save_and_load() {
        let set = ContainmentSet::new(70);
        set.mark(0);
        set.mark(65);
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        set.save(path).unwrap();

        let loaded = ContainmentSet::load(path).unwrap();
        assert_eq!(loaded.len(), 70);
        assert_eq!(loaded.marked().collect::<Vec<_>>(), vec![0, 65]);
    }

    #[test]
    fn test_load_rejects_inconsistent_sets() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        std::fs::write(path, r#"{"reads":70,"words":[0]}"#).unwrap();
        assert!(ContainmentSet::load(path).is_err());
        std::fs::write(path, r#"{"reads":3,"words":[8]}"#).unwrap();
        assert!(ContainmentSet::load(path).is_err());
    }

    #[test]
    fn test_clone_is_independent() {
        let set = ContainmentSet::new(4);
        set.mark(1);
        let copy = set.clone();
        set.mark(2);
        assert_eq!(copy.marked().collect::<Vec<_>>(), vec![1]);
    }
}
