//! Download the pages of patents we don't have yet
//!
//! Finds every patent applied for in the given years that has neither a word bag nor a page in
//! any epoch, and fetches it into this year's epoch. Safe to interrupt and rerun.

// argument parsing
#[macro_use] extern crate clap;
// logging
#[macro_use] extern crate log;
extern crate env_logger;
// lastly, this library
extern crate pattext;

use std::time::Duration;

use pattext::acquire::{self, GooglePatents, DEFAULT_WORKERS};
use pattext::errors::*;
use pattext::layout::{Layout, DEFAULT_DATA_DIR};
use pattext::metadata::DatesTable;
use pattext::plan;
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
        .arg_from_usage("--workers [N] 'simultaneous downloads (default 20)'")
        .arg_from_usage("--timeout [SECONDS] 'give up on a page after this long (default 60)'")
        .arg_from_usage("--data-dir [DIR] 'where all the data lives (default data)'")
        .get_matches();
    let min_year = value_t!(args, "min-year", Year).unwrap_or_else(|e| e.exit());
    let max_year = value_t!(args, "max-year", Year).unwrap_or_else(|e| e.exit());
    let workers = if args.is_present("workers") {
        value_t!(args, "workers", usize).unwrap_or_else(|e| e.exit())
    } else { DEFAULT_WORKERS };
    let timeout = if args.is_present("timeout") {
        value_t!(args, "timeout", u64).unwrap_or_else(|e| e.exit())
    } else { 60 };
    let layout = Layout::new(args.value_of("data-dir").unwrap_or(DEFAULT_DATA_DIR));

    let dates = DatesTable::load(layout.dates_path())?;
    let plan = plan::plan(&layout, &dates, min_year, max_year)?;
    let wanted: Vec<_> = plan.to_download.values().flat_map(|v| v.iter().cloned()).collect();
    let epoch = acquire::current_epoch();
    let fetcher = GooglePatents::new(Duration::from_secs(timeout))?;
    info!("Downloading {} pages into epoch {} with {} workers", wanted.len(), epoch, workers);
    acquire::download(&fetcher, &layout, epoch, &wanted, workers)?;
    Ok(())
}
