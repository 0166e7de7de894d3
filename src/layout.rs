//! Where everything lives under the data directory
//!
//! All stages agree on paths through this one type so that a single `--data-dir` flag is enough
//! configuration for every binary.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::{Pnum, Year};

pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

/// The shard directory for a patent: first four digits of its eight digit representation.
///
/// 8,123,456 goes to 0812, 812,345 goes to 0081.
pub fn stem(pnum: Pnum) -> String {
    let padded = format!("{:08}", pnum);
    padded[..4].to_string()
}

impl Layout {
    pub fn new<P: Into<PathBuf>>(root: P) -> Layout {
        Layout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    //
    // Raw pages
    //
    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    /// Pages are grouped by the year they were downloaded, since that decides how to parse them.
    pub fn epoch_dir(&self, epoch: Year) -> PathBuf {
        self.raw_dir().join(format!("{:04}", epoch))
    }

    pub fn html_path(&self, epoch: Year, pnum: Pnum) -> PathBuf {
        self.epoch_dir(epoch).join(stem(pnum)).join(format!("{}.html", pnum))
    }

    /// Every epoch that has a directory, oldest first
    pub fn epochs(&self) -> io::Result<Vec<Year>> {
        let mut epochs = vec![];
        let dir = self.raw_dir();
        if !dir.is_dir() {
            return Ok(epochs);
        }
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.len() == 4 {
                if let Ok(year) = name.parse() {
                    epochs.push(year);
                }
            }
        }
        epochs.sort();
        Ok(epochs)
    }

    //
    // Word bags
    //
    pub fn bags_dir(&self) -> PathBuf {
        self.root.join("bags")
    }

    pub fn raw_bags_dir(&self) -> PathBuf {
        self.bags_dir().join("raw")
    }

    pub fn bag_path(&self, pnum: Pnum) -> PathBuf {
        self.raw_bags_dir().join(stem(pnum)).join(format!("{}.csv", pnum))
    }

    pub fn vocabulary_path(&self) -> PathBuf {
        self.bags_dir().join("vocabulary.csv")
    }

    pub fn failures_path(&self) -> PathBuf {
        self.bags_dir().join("failures.csv")
    }

    pub fn wordspace_dir(&self) -> PathBuf {
        self.bags_dir().join("wordspace")
    }

    pub fn stopwords_path(&self) -> PathBuf {
        self.wordspace_dir().join("stopwords.csv")
    }

    pub fn short_words_path(&self) -> PathBuf {
        self.wordspace_dir().join("short_words.csv")
    }

    pub fn annual_dir(&self) -> PathBuf {
        self.bags_dir().join("annual")
    }

    pub fn annual_path(&self, year: Year) -> PathBuf {
        self.annual_dir().join(format!("{}.csv", year))
    }

    //
    // Patent level information
    //
    pub fn meta_dir(&self) -> PathBuf {
        self.root.join("meta")
    }

    pub fn dates_path(&self) -> PathBuf {
        self.meta_dir().join("dates.csv")
    }

    pub fn categories_path(&self) -> PathBuf {
        self.meta_dir().join("categories.csv")
    }

    /// Shipped with the system, never regenerated
    pub fn ocr_artifacts_path(&self) -> PathBuf {
        self.root.join("inputs").join("ocr_artifacts.csv")
    }

    //
    // Outputs
    //
    pub fn out_dir(&self) -> PathBuf {
        self.root.join("out")
    }

    pub fn retech_path(&self) -> PathBuf {
        self.out_dir().join("retech.csv")
    }

    pub fn breadth_path(&self) -> PathBuf {
        self.out_dir().join("breadth.csv")
    }

    pub fn shipped_path(&self) -> PathBuf {
        self.out_dir().join("pattext.csv.gz")
    }
}

impl Default for Layout {
    fn default() -> Layout {
        Layout::new(DEFAULT_DATA_DIR)
    }
}

/// The backup generation of a table: `dates.csv` keeps its predecessor in `dates.prior.csv`
pub fn prior_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    match path.extension() {
        Some(ext) => path.with_file_name(format!("{}.prior.{}", stem, ext.to_string_lossy())),
        None => path.with_file_name(format!("{}.prior", stem)),
    }
}

/// Sibling path used to write a file before it atomically replaces `path`
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|s| s.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Make sure the directory holding `path` exists
pub fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

/// Move `fresh` over `current`, keeping whatever `current` was as the prior generation
pub fn rotate_into(fresh: &Path, current: &Path) -> io::Result<()> {
    if current.exists() {
        fs::rename(current, prior_path(current))?;
    }
    fs::rename(fresh, current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_are_zero_padded_prefixes() {
        assert_eq!(stem(8123456), "0812");
        assert_eq!(stem(18123456), "1812");
        assert_eq!(stem(812345), "0081");
        assert_eq!(stem(7), "0000");
    }

    #[test]
    fn paths_are_sharded() {
        let layout = Layout::new("/d");
        assert_eq!(layout.bag_path(9000001), PathBuf::from("/d/bags/raw/0900/9000001.csv"));
        assert_eq!(layout.html_path(2021, 9000001),
                   PathBuf::from("/d/raw/2021/0900/9000001.html"));
        assert_eq!(layout.annual_path(2015), PathBuf::from("/d/bags/annual/2015.csv"));
    }

    #[test]
    fn prior_and_partial_names() {
        assert_eq!(prior_path(Path::new("/d/meta/dates.csv")),
                   PathBuf::from("/d/meta/dates.prior.csv"));
        assert_eq!(partial_path(Path::new("/d/bags/annual/2015.csv")),
                   PathBuf::from("/d/bags/annual/2015.csv.partial"));
    }

    #[test]
    fn epochs_are_four_digit_directories() {
        let dir = ::tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        fs::create_dir_all(layout.epoch_dir(2021)).unwrap();
        fs::create_dir_all(layout.epoch_dir(2014)).unwrap();
        fs::create_dir_all(layout.raw_dir().join("scratch")).unwrap();
        assert_eq!(layout.epochs().unwrap(), vec![2014, 2021]);
    }

    #[test]
    fn rotation_keeps_one_backup() {
        let dir = ::tempfile::tempdir().unwrap();
        let current = dir.path().join("dates.csv");
        let fresh = dir.path().join("dates.csv.partial");
        fs::write(&current, "old").unwrap();
        fs::write(&fresh, "new").unwrap();
        rotate_into(&fresh, &current).unwrap();
        assert_eq!(fs::read_to_string(&current).unwrap(), "new");
        assert_eq!(fs::read_to_string(prior_path(&current)).unwrap(), "old");
        assert!(!fresh.exists());
    }
}
