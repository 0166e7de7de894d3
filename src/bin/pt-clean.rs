//! Rebuild the cleaned annual tables from the raw word bags
//!
//! Every year in range is recleaned from scratch: new stopwords, new table.

// argument parsing
#[macro_use] extern crate clap;
// logging
#[macro_use] extern crate log;
extern crate env_logger;
// lastly, this library
extern crate pattext;

use pattext::clean::{AnnualCleaner, DEFAULT_BATCH_SIZE, DEFAULT_STOPWORD_FRACTION};
use pattext::errors::*;
use pattext::layout::{Layout, DEFAULT_DATA_DIR};
use pattext::metadata::DatesTable;
use pattext::vocab::Vocabulary;
use pattext::Year;

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    inner_main().expect("Could not recover. Exiting.");
}
pub fn inner_main() -> Result<()> {
    env_logger::init();
    let args = app_from_crate!()
        .arg_from_usage("<min-year> 'first application year'")
        .arg_from_usage("<max-year> 'last application year'")
        .arg_from_usage("--batch-size [N] 'patents filtered at once (default 25000)'")
        .arg_from_usage("--stopword-fraction [F] 'share of patents that makes a stopword (default 0.25)'")
        .arg_from_usage("--data-dir [DIR] 'where all the data lives (default data)'")
        .get_matches();
    let min_year = value_t!(args, "min-year", Year).unwrap_or_else(|e| e.exit());
    let max_year = value_t!(args, "max-year", Year).unwrap_or_else(|e| e.exit());
    let layout = Layout::new(args.value_of("data-dir").unwrap_or(DEFAULT_DATA_DIR));

    let dates = DatesTable::load(layout.dates_path())?;
    let vocab = Vocabulary::load(layout.vocabulary_path())?;
    let mut cleaner = AnnualCleaner::open(&layout, &vocab)?;
    cleaner.batch_size = if args.is_present("batch-size") {
        value_t!(args, "batch-size", usize).unwrap_or_else(|e| e.exit())
    } else { DEFAULT_BATCH_SIZE };
    cleaner.stopword_fraction = if args.is_present("stopword-fraction") {
        value_t!(args, "stopword-fraction", f64).unwrap_or_else(|e| e.exit())
    } else { DEFAULT_STOPWORD_FRACTION };

    let years: Vec<Year> = (min_year..=max_year).collect();
    for report in cleaner.clean_years(&dates, &years)? {
        info!("{}: {} patents, {} stopwords, {} rows",
              report.year, report.documents, report.stopwords, report.rows);
    }
    Ok(())
}
