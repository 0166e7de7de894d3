//! Bring the word bags of a range of application years up to date
//!
//! For each year: download what's missing, parse every page without a bag, and save the
//! vocabulary. Then reclean the years that gained bags. If this crashes, run `pt-recover` before
//! running it again.

// argument parsing
#[macro_use] extern crate clap;
// logging
#[macro_use] extern crate log;
extern crate env_logger;
// lastly, this library
extern crate pattext;

use std::time::Duration;

use pattext::acquire::{self, Fetch, GooglePatents, DEFAULT_WORKERS};
use pattext::errors::*;
use pattext::layout::{Layout, DEFAULT_DATA_DIR};
use pattext::metadata::DatesTable;
use pattext::plan::{self, UpdateSettings};
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
        .arg_from_usage("--offline 'only parse pages already downloaded'")
        .arg_from_usage("--force-clean 'reclean every year in range, even without new bags'")
        .arg_from_usage("--workers [N] 'simultaneous downloads (default 20)'")
        .arg_from_usage("--data-dir [DIR] 'where all the data lives (default data)'")
        .get_matches();
    let settings = UpdateSettings {
        min_year: value_t!(args, "min-year", Year).unwrap_or_else(|e| e.exit()),
        max_year: value_t!(args, "max-year", Year).unwrap_or_else(|e| e.exit()),
        epoch: acquire::current_epoch(),
        workers: if args.is_present("workers") {
            value_t!(args, "workers", usize).unwrap_or_else(|e| e.exit())
        } else { DEFAULT_WORKERS },
        force_clean: args.is_present("force-clean"),
    };
    let layout = Layout::new(args.value_of("data-dir").unwrap_or(DEFAULT_DATA_DIR));
    let dates = DatesTable::load(layout.dates_path())?;

    let fetcher = if args.is_present("offline") {
        None
    } else {
        Some(GooglePatents::new(Duration::from_secs(60))?)
    };
    let report = plan::update_bags(&layout, &dates, &settings,
                                   fetcher.as_ref().map(|f| f as &dyn Fetch))?;
    info!("Fetched {} pages, parsed {}, recleaned {} years",
          report.downloads.fetched, report.parsed.parsed, report.cleaned.len());
    Ok(())
}
