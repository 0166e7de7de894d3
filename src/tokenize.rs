//! Turning downloaded pages into word bags
//!
//! A `ParseSession` holds the vocabulary and failure log for a run. Every page it is asked about
//! turns into a word bag on disk (or doesn't), and the session periodically saves the vocabulary
//! so a crash loses at most one flush interval of ids. Bags written after the last save can be
//! found and removed with `recover`.
use std::fs;
use std::time::Instant;

use crate::bags::WordBag;
use crate::errors::*;
use crate::extract::{Era, Extractor};
use crate::failures::FailureLog;
use crate::layout::Layout;
use crate::vocab::Vocabulary;
use crate::{Pnum, Year};

pub const DEFAULT_FLUSH_EVERY: usize = 35_000;
pub const DEFAULT_PROGRESS_EVERY: usize = 5_000;

/// Lowercase ASCII words. Anything that isn't an ASCII letter separates words.
pub fn normalize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_ascii_alphabetic())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_ascii_lowercase())
        .collect()
}

/// What became of one patent
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A bag was written
    Parsed(WordBag),
    /// The page had none of the sections we look for
    Unparsed,
    /// No page, or the bag was already there
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseReport {
    pub parsed: usize,
    pub unparsed: usize,
    pub skipped: usize,
}

impl ParseReport {
    fn count(&mut self, outcome: &Outcome) {
        match *outcome {
            Outcome::Parsed(_) => self.parsed += 1,
            Outcome::Unparsed => self.unparsed += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }
}

pub struct ParseSession<'l> {
    layout: &'l Layout,
    extractor: Extractor,
    vocab: Vocabulary,
    failures: FailureLog,
    pub flush_every: usize,
    pub progress_every: usize,
    attempted: usize,
    start: Instant,
}

impl<'l> ParseSession<'l> {
    /// Start a session with the vocabulary and failure log saved under `layout`
    pub fn open(layout: &'l Layout) -> Result<ParseSession<'l>> {
        Ok(ParseSession {
            layout,
            extractor: Extractor::new()?,
            vocab: Vocabulary::load(layout.vocabulary_path())?,
            failures: FailureLog::load(layout.failures_path())?,
            flush_every: DEFAULT_FLUSH_EVERY,
            progress_every: DEFAULT_PROGRESS_EVERY,
            attempted: 0,
            start: Instant::now(),
        })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn failures(&self) -> &FailureLog {
        &self.failures
    }

    /// Parse the page of `pnum` downloaded in `epoch` into a bag, unless there's nothing to do
    pub fn extract(&mut self, pnum: Pnum, epoch: Year) -> Result<Outcome> {
        let page_path = self.layout.html_path(epoch, pnum);
        let bag_path = self.layout.bag_path(pnum);
        if !page_path.exists() || bag_path.exists() {
            return Ok(Outcome::Skipped);
        }
        let page = fs::read(&page_path)?;
        let extraction = self.extractor.extract(Era::for_epoch(epoch), &page);
        if let Some(codes) = extraction.failure_codes() {
            self.failures.record(pnum, codes);
        }
        if extraction.successes() == 0 {
            return Ok(Outcome::Unparsed);
        }

        let vocab = &mut self.vocab;
        let bag = WordBag::from_ids(
            normalize(&extraction.text()).iter().map(|token| vocab.lookup_or_insert(token)));
        bag.write(&bag_path)?;
        Ok(Outcome::Parsed(bag))
    }

    /// Save the vocabulary and the failure log
    pub fn flush(&self) -> Result<()> {
        self.vocab.save(self.layout.vocabulary_path())?;
        self.failures.save(self.layout.failures_path())?;
        Ok(())
    }

    /// Parse every (pnum, epoch) of one application year, flushing along the way and at the end
    pub fn run_year(&mut self, year: Year, jobs: &[(Pnum, Year)]) -> Result<ParseReport> {
        let mut report = ParseReport::default();
        info!("Parsing {} patents applied for in {}", jobs.len(), year);
        for &(pnum, epoch) in jobs {
            let outcome = self.extract(pnum, epoch)?;
            report.count(&outcome);
            self.attempted += 1;
            if self.progress_every > 0 && self.attempted % self.progress_every == 0 {
                info!("{} pages looked at, {} words known, {}s elapsed",
                      self.attempted, self.vocab.len(), self.start.elapsed().as_secs());
            }
            if self.flush_every > 0 && self.attempted % self.flush_every == 0 {
                self.flush()?;
            }
        }
        self.flush()?;
        info!("{}: {} parsed, {} without text, {} skipped", year, report.parsed, report.unparsed,
              report.skipped);
        Ok(report)
    }
}
