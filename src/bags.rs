//! Word bags: sparse vocabulary id -> count vectors, one file per patent
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::errors::*;
use crate::farm::new_farm;
use crate::layout;
use crate::rows;
use crate::WordId;

/// Sorted by id, every count positive
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WordBag {
    entries: Vec<(WordId, u32)>,
}

impl WordBag {
    /// Count each id in a stream of ids
    pub fn from_ids<I: IntoIterator<Item=WordId>>(ids: I) -> WordBag {
        let mut counts = new_farm();
        for id in ids {
            *counts.entry(id).or_insert(0u32) += 1;
        }
        WordBag::from_pairs(counts)
    }

    /// Build from (id, count) pairs; repeated ids are summed and zero counts dropped
    pub fn from_pairs<I: IntoIterator<Item=(WordId, u32)>>(pairs: I) -> WordBag {
        let mut entries: Vec<(WordId, u32)> = pairs.into_iter().filter(|&(_, c)| c > 0).collect();
        entries.sort_unstable();
        entries.dedup_by(|later, earlier| {
            if later.0 == earlier.0 {
                earlier.1 += later.1;
                true
            } else {
                false
            }
        });
        WordBag { entries }
    }

    pub fn entries(&self) -> &[(WordId, u32)] {
        &self.entries
    }

    /// Number of distinct tokens
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of token occurrences
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|&(_, c)| u64::from(c)).sum()
    }

    pub fn get(&self, id: WordId) -> Option<u32> {
        self.entries.binary_search_by_key(&id, |&(i, _)| i)
            .ok()
            .map(|pos| self.entries[pos].1)
    }

    /// Keep only the ids `keep` approves of
    pub fn retain<F: FnMut(WordId) -> bool>(&mut self, mut keep: F) {
        self.entries.retain(|&(id, _)| keep(id));
    }

    /// Read a bag file: `id,count` rows, no header
    pub fn read<P: AsRef<Path>>(path: P) -> Result<WordBag> {
        let path = path.as_ref();
        let mut pairs = vec![];
        rows::for_each_row(path, false, |line, fields| {
            let id: WordId = rows::bounded_at(fields, 0, 1, path, line)?;
            let count: u32 = rows::bounded_at(fields, 1, 0, path, line)?;
            pairs.push((id, count));
            Ok(())
        })?;
        Ok(WordBag::from_pairs(pairs))
    }

    /// Read a bag if it exists. Not every patent yields a bag, so absence is not an error.
    pub fn read_if_exists<P: AsRef<Path>>(path: P) -> Result<Option<WordBag>> {
        match WordBag::read(path) {
            Ok(bag) => Ok(Some(bag)),
            Err(Error::IOError(ref err)) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Write the bag, going through a partial file so a half written bag is never mistaken for
    /// a finished one.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        layout::ensure_parent(path)?;
        let partial = layout::partial_path(path);
        {
            let mut out = BufWriter::new(File::create(&partial)?);
            for &(id, count) in &self.entries {
                writeln!(out, "{},{}", id, count)?;
            }
            out.flush()?;
        }
        fs::rename(&partial, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting() {
        let bag = WordBag::from_ids(vec![3, 1, 3, 2, 3]);
        assert_eq!(bag.entries(), &[(1, 1), (2, 1), (3, 3)]);
        assert_eq!(bag.len(), 3);
        assert_eq!(bag.total(), 5);
        assert_eq!(bag.get(3), Some(3));
        assert_eq!(bag.get(4), None);
    }

    #[test]
    fn pairs_are_merged() {
        let bag = WordBag::from_pairs(vec![(5, 2), (1, 1), (5, 3), (2, 0)]);
        assert_eq!(bag.entries(), &[(1, 1), (5, 5)]);
    }

    #[test]
    fn files() {
        let dir = ::tempfile::tempdir().unwrap();
        let path = dir.path().join("0900").join("9000001.csv");
        assert_eq!(WordBag::read_if_exists(&path).unwrap(), None);
        let bag = WordBag::from_pairs(vec![(1, 5), (2, 3)]);
        bag.write(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "1,5\n2,3\n");
        assert_eq!(WordBag::read_if_exists(&path).unwrap(), Some(bag));
        assert!(!layout::partial_path(&path).exists());
    }

    #[test]
    fn damaged_bags_are_errors() {
        let dir = ::tempfile::tempdir().unwrap();
        let path = dir.path().join("1.csv");
        fs::write(&path, "1,5\n\"x\",2\n").unwrap();
        assert!(WordBag::read_if_exists(&path).is_err());
    }
}
