//! Cleaning a year of word bags into one table
//!
//! Three kinds of words are dropped: words too short to mean anything, a fixed list of OCR junk,
//! and the year's stopwords. Stopwords are any word that appears in at least a quarter of the
//! year's patents, so they depend on every patent of the year and a year is always cleaned from
//! scratch.
//!
//! Memory stays bounded by reading the raw bags twice: once to count document frequencies one bag
//! at a time, then again in batches to filter and write.
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use crate::annual::AnnualWriter;
use crate::bags::WordBag;
use crate::errors::*;
use crate::farm::{new_farm, new_farm_set, FarmSet};
use crate::layout::{self, Layout};
use crate::metadata::DatesTable;
use crate::rows;
use crate::vocab::{Vocabulary, MIN_TOKEN_LEN};
use crate::{Pnum, WordId, Year};

pub const DEFAULT_STOPWORD_FRACTION: f64 = 0.25;
pub const DEFAULT_BATCH_SIZE: usize = 25_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanReport {
    pub year: Year,
    /// Patents of the year that had a raw bag
    pub documents: usize,
    pub stopwords: usize,
    pub rows: usize,
}

/// Word ids the OCR is known to invent. Shipped with the data, so it must be there.
pub fn load_ocr_artifacts<P: AsRef<Path>>(path: P) -> Result<FarmSet<WordId>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::MissingFile("OCR artifact list", None));
    }
    let mut ids = new_farm_set();
    rows::for_each_row(path, false, |line, fields| {
        ids.insert(rows::bounded_at::<WordId>(fields, 0, 1, path, line)?);
        Ok(())
    })?;
    Ok(ids)
}

/// Save the short word ids, `word_index` header, ascending
pub fn save_short_words<P: AsRef<Path>>(path: P, ids: &[WordId]) -> Result<()> {
    let path = path.as_ref();
    layout::ensure_parent(path)?;
    let partial = layout::partial_path(path);
    {
        let mut out = BufWriter::new(File::create(&partial)?);
        writeln!(out, "word_index")?;
        for id in ids {
            writeln!(out, "{}", id)?;
        }
        out.flush()?;
    }
    fs::rename(&partial, path)?;
    Ok(())
}

/// Every year's stopwords, `word_index,ayear`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopwordTable {
    by_year: BTreeMap<Year, Vec<WordId>>,
}

impl StopwordTable {
    /// Load the table; before the first clean there is none, which is fine
    pub fn load<P: AsRef<Path>>(path: P) -> Result<StopwordTable> {
        let path = path.as_ref();
        let mut table = StopwordTable::default();
        if !path.exists() {
            return Ok(table);
        }
        rows::for_each_row(path, true, |line, fields| {
            let id: WordId = rows::bounded_at(fields, 0, 1, path, line)?;
            let year: Year = rows::bounded_at(fields, 1, 0, path, line)?;
            table.by_year.entry(year).or_insert_with(Vec::new).push(id);
            Ok(())
        })?;
        for ids in table.by_year.values_mut() {
            ids.sort_unstable();
            ids.dedup();
        }
        Ok(table)
    }

    /// Replace one year's stopwords, leaving the others alone
    pub fn replace(&mut self, year: Year, mut ids: Vec<WordId>) {
        ids.sort_unstable();
        ids.dedup();
        self.by_year.insert(year, ids);
    }

    pub fn year(&self, year: Year) -> Option<&[WordId]> {
        self.by_year.get(&year).map(|ids| ids.as_slice())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        layout::ensure_parent(path)?;
        let partial = layout::partial_path(path);
        {
            let mut out = BufWriter::new(File::create(&partial)?);
            writeln!(out, "word_index,ayear")?;
            for (year, ids) in &self.by_year {
                for id in ids {
                    writeln!(out, "{},{}", id, year)?;
                }
            }
            out.flush()?;
        }
        fs::rename(&partial, path)?;
        Ok(())
    }
}

/// Ids whose document frequency reaches `fraction` of `documents`
pub fn stopwords_by_frequency<I>(frequencies: I, documents: usize, fraction: f64) -> Vec<WordId>
    where I: IntoIterator<Item=(WordId, usize)> {
    let threshold = fraction * documents as f64;
    let mut ids: Vec<WordId> = frequencies.into_iter()
        .filter(|&(_, df)| df > 0 && df as f64 >= threshold)
        .map(|(id, _)| id)
        .collect();
    ids.sort_unstable();
    ids
}

pub struct AnnualCleaner<'l> {
    layout: &'l Layout,
    short: FarmSet<WordId>,
    ocr: FarmSet<WordId>,
    stopwords: StopwordTable,
    pub stopword_fraction: f64,
    pub batch_size: usize,
}

impl<'l> AnnualCleaner<'l> {
    /// Get ready to clean: work out the short words from the vocabulary (saving them as we go),
    /// and load the OCR list and the stopwords of earlier cleans.
    pub fn open(layout: &'l Layout, vocab: &Vocabulary) -> Result<AnnualCleaner<'l>> {
        let short_ids = vocab.short_token_ids(MIN_TOKEN_LEN);
        save_short_words(layout.short_words_path(), &short_ids)?;
        let ocr = load_ocr_artifacts(layout.ocr_artifacts_path())?;
        info!("Dropping {} short words and {} OCR artifacts", short_ids.len(), ocr.len());
        Ok(AnnualCleaner {
            layout,
            short: short_ids.into_iter().collect(),
            ocr,
            stopwords: StopwordTable::load(layout.stopwords_path())?,
            stopword_fraction: DEFAULT_STOPWORD_FRACTION,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    pub fn stopwords(&self) -> &StopwordTable {
        &self.stopwords
    }

    /// Clean one year: find its stopwords, then write every patent's filtered bag to the year's
    /// table. `pnums` are the patents applied for in `year`; those without a bag are ignored.
    pub fn clean_year(&mut self, year: Year, pnums: &[Pnum]) -> Result<CleanReport> {
        let start = Instant::now();
        let mut pnums = pnums.to_vec();
        pnums.sort_unstable();
        pnums.dedup();

        // Pass 1: document frequencies
        let mut frequencies = new_farm();
        let mut documents = 0;
        for &pnum in &pnums {
            if let Some(bag) = WordBag::read_if_exists(self.layout.bag_path(pnum))? {
                for &(id, _) in bag.entries() {
                    *frequencies.entry(id).or_insert(0usize) += 1;
                }
                documents += 1;
            }
        }
        let stopwords = stopwords_by_frequency(frequencies, documents, self.stopword_fraction);
        info!("{}: {} patents with bags, {} stopwords", year, documents, stopwords.len());
        let year_stopwords: FarmSet<WordId> = stopwords.iter().cloned().collect();

        // Pass 2: filter in batches, in pnum order so the table comes out sorted
        let mut writer = AnnualWriter::create(self.layout.annual_path(year))?;
        for batch in pnums.chunks(self.batch_size.max(1)) {
            let mut cleaned = vec![];
            for &pnum in batch {
                if let Some(mut bag) = WordBag::read_if_exists(self.layout.bag_path(pnum))? {
                    bag.retain(|id| !self.short.contains(&id)
                        && !self.ocr.contains(&id)
                        && !year_stopwords.contains(&id));
                    cleaned.push((pnum, bag));
                }
            }
            cleaned.sort_by_key(|&(pnum, _)| pnum);
            for (pnum, bag) in &cleaned {
                writer.push(*pnum, bag)?;
            }
            debug!("{}: batch of {} written", year, cleaned.len());
        }
        let rows = writer.finish()?;

        let report = CleanReport { year, documents, stopwords: stopwords.len(), rows };
        self.stopwords.replace(year, stopwords);
        self.stopwords.save(self.layout.stopwords_path())?;
        info!("{}: cleaned table has {} rows ({}s)", year, rows, start.elapsed().as_secs());
        Ok(report)
    }

    /// Clean several years, taking each year's patents from the dates table
    pub fn clean_years(&mut self, dates: &DatesTable, years: &[Year]) -> Result<Vec<CleanReport>> {
        let mut reports = vec![];
        for &year in years {
            reports.push(self.clean_year(year, &dates.applied_in(year))?);
        }
        Ok(reports)
    }
}
