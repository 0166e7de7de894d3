//! The cleaned per-year word tables
//!
//! One file per application year, `pnum,word_index,count` sorted by (pnum, word_index). The tables
//! can be large so they're written and read one patent at a time.
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::bags::WordBag;
use crate::errors::*;
use crate::layout;
use crate::rows;
use crate::{Pnum, WordId};

pub const HEADER: &str = "pnum,word_index,count";

/// Writes a table patent by patent, then moves it into place in one step.
///
/// A writer dropped before `finish` takes its partial file with it and leaves the old table alone.
pub struct AnnualWriter {
    out: BufWriter<File>,
    partial: PathBuf,
    path: PathBuf,
    last: Option<Pnum>,
    rows: usize,
    finished: bool,
}

impl AnnualWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<AnnualWriter> {
        let path = path.as_ref().to_path_buf();
        layout::ensure_parent(&path)?;
        let partial = layout::partial_path(&path);
        let mut out = BufWriter::new(File::create(&partial)?);
        writeln!(out, "{}", HEADER)?;
        Ok(AnnualWriter { out, partial, path, last: None, rows: 0, finished: false })
    }

    /// Append one patent's bag. Patents must come in increasing order.
    pub fn push(&mut self, pnum: Pnum, bag: &WordBag) -> Result<()> {
        if let Some(last) = self.last {
            if pnum <= last {
                return Err(Error::Other(format!(
                    "{} written after {} in {}", pnum, last, self.path.display())));
            }
        }
        for &(id, count) in bag.entries() {
            writeln!(self.out, "{},{},{}", pnum, id, count)?;
        }
        self.rows += bag.len();
        self.last = Some(pnum);
        Ok(())
    }

    /// Replace whatever table was there before; returns the number of rows written
    pub fn finish(mut self) -> Result<usize> {
        self.out.flush()?;
        fs::rename(&self.partial, &self.path)?;
        self.finished = true;
        Ok(self.rows)
    }
}

impl Drop for AnnualWriter {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        debug!("Abandoning {}", self.partial.display());
        if let Err(err) = fs::remove_file(&self.partial) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!("Couldn't remove {}: {}", self.partial.display(), err);
            }
        }
    }
}

/// Stream a table one patent at a time, in pnum order. Returns how many patents there were.
///
/// The table must exist: a year has to be cleaned before anything can be computed from it.
pub fn for_each_document<P, F>(path: P, mut visit: F) -> Result<usize>
    where P: AsRef<Path>, F: FnMut(Pnum, &WordBag) -> Result<()> {
    let path = path.as_ref();
    if let Err(err) = File::open(path) {
        if err.kind() == io::ErrorKind::NotFound {
            error!("No cleaned table at {}", path.display());
            return Err(Error::MissingFile("annual word table", Some(err)));
        }
        return Err(err.into());
    }

    let mut current: Option<Pnum> = None;
    let mut pairs: Vec<(WordId, u32)> = vec![];
    let mut documents = 0;
    rows::for_each_row(path, true, |line, fields| {
        let pnum: Pnum = rows::bounded_at(fields, 0, 0, path, line)?;
        let id: WordId = rows::bounded_at(fields, 1, 1, path, line)?;
        let count: u32 = rows::bounded_at(fields, 2, 1, path, line)?;
        match current {
            Some(last) if last == pnum => {}
            Some(last) if last > pnum => {
                return Err(Error::malformed(path, line, format!("{} comes after {}", pnum, last)));
            }
            Some(last) => {
                visit(last, &WordBag::from_pairs(pairs.drain(..)))?;
                documents += 1;
                current = Some(pnum);
            }
            None => current = Some(pnum),
        }
        pairs.push((id, count));
        Ok(())
    })?;
    if let Some(last) = current {
        visit(last, &WordBag::from_pairs(pairs.drain(..)))?;
        documents += 1;
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_stream() {
        let dir = ::tempfile::tempdir().unwrap();
        let path = dir.path().join("annual").join("2015.csv");
        let mut writer = AnnualWriter::create(&path).unwrap();
        writer.push(1, &WordBag::from_pairs(vec![(2, 3), (1, 5)])).unwrap();
        writer.push(2, &WordBag::default()).unwrap();
        writer.push(3, &WordBag::from_pairs(vec![(3, 4)])).unwrap();
        assert!(writer.push(3, &WordBag::default()).is_err());
        assert_eq!(writer.finish().unwrap(), 3);
        assert_eq!(fs::read_to_string(&path).unwrap(),
                   "pnum,word_index,count\n1,1,5\n1,2,3\n3,3,4\n");

        let mut seen = vec![];
        let n = for_each_document(&path, |pnum, bag| {
            seen.push((pnum, bag.entries().to_vec()));
            Ok(())
        }).unwrap();
        assert_eq!(n, 2);
        assert_eq!(seen, vec![(1, vec![(1, 5), (2, 3)]), (3, vec![(3, 4)])]);
    }

    #[test]
    fn empty_and_missing_tables() {
        let dir = ::tempfile::tempdir().unwrap();
        let path = dir.path().join("2016.csv");
        match for_each_document(&path, |_, _| Ok(())) {
            Err(Error::MissingFile(..)) => {}
            other => panic!("expected a missing file, got {:?}", other),
        }
        AnnualWriter::create(&path).unwrap().finish().unwrap();
        assert_eq!(for_each_document(&path, |_, _| Ok(())).unwrap(), 0);
    }

    #[test]
    fn abandoned_writers_leave_the_old_table() {
        let dir = ::tempfile::tempdir().unwrap();
        let path = dir.path().join("2018.csv");
        let mut writer = AnnualWriter::create(&path).unwrap();
        writer.push(1, &WordBag::from_pairs(vec![(1, 1)])).unwrap();
        writer.finish().unwrap();
        let old = fs::read_to_string(&path).unwrap();

        let mut writer = AnnualWriter::create(&path).unwrap();
        writer.push(5, &WordBag::from_pairs(vec![(2, 2)])).unwrap();
        assert!(writer.push(4, &WordBag::from_pairs(vec![(2, 2)])).is_err());
        drop(writer);
        assert!(!layout::partial_path(&path).exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), old);
    }

    #[test]
    fn out_of_range_rows_are_rejected() {
        let dir = ::tempfile::tempdir().unwrap();
        let path = dir.path().join("2019.csv");
        fs::write(&path, "pnum,word_index,count\n5,1,4294967296\n").unwrap();
        assert!(for_each_document(&path, |_, _| Ok(())).is_err());
        fs::write(&path, "pnum,word_index,count\n-5,1,1\n").unwrap();
        assert!(for_each_document(&path, |_, _| Ok(())).is_err());
        fs::write(&path, "pnum,word_index,count\n5,0,1\n").unwrap();
        assert!(for_each_document(&path, |_, _| Ok(())).is_err());
    }

    #[test]
    fn unsorted_tables_are_rejected() {
        let dir = ::tempfile::tempdir().unwrap();
        let path = dir.path().join("2017.csv");
        fs::write(&path, "pnum,word_index,count\n5,1,1\n4,1,1\n").unwrap();
        assert!(for_each_document(&path, |_, _| Ok(())).is_err());
    }
}
