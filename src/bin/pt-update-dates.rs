//! Merge newly granted patents into the dates table
//!
//! Takes the PatentsView style grant and application downloads (tab separated, with headers) and
//! fills in application and grant years for patents the table doesn't know yet. Years already in
//! the table are never changed. The old table is kept as `dates.prior.csv`.

// argument parsing
#[macro_use] extern crate clap;
// logging
#[macro_use] extern crate log;
extern crate env_logger;
// lastly, this library
extern crate pattext;

use pattext::acquire::current_epoch;
use pattext::errors::*;
use pattext::layout::{Layout, DEFAULT_DATA_DIR};
use pattext::metadata;
use pattext::Year;

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    inner_main().expect("Could not recover. Exiting.");
}
pub fn inner_main() -> Result<()> {
    env_logger::init();
    let args = app_from_crate!()
        .arg_from_usage("<grants> 'patent table: number, type, date (tab separated)'")
        .arg_from_usage("<applications> 'application table: patent_id, series_code, country, date'")
        .arg_from_usage("--min-year [YEAR] 'earliest grant year to take (default 1926)'")
        .arg_from_usage("--max-year [YEAR] 'latest grant year to take (default this year)'")
        .arg_from_usage("--data-dir [DIR] 'where all the data lives (default data)'")
        .get_matches();
    let min_year = if args.is_present("min-year") {
        value_t!(args, "min-year", Year).unwrap_or_else(|e| e.exit())
    } else { 1926 };
    let max_year = if args.is_present("max-year") {
        value_t!(args, "max-year", Year).unwrap_or_else(|e| e.exit())
    } else { current_epoch() };
    let layout = Layout::new(args.value_of("data-dir").unwrap_or(DEFAULT_DATA_DIR));

    let update = metadata::update_dates(
        layout.dates_path(),
        args.value_of("grants").unwrap(),
        args.value_of("applications").unwrap(),
        min_year, max_year)?;
    info!("{} grants read, {} without an application year, {} new patents, {} in total",
          update.grants, update.missing_ayear, update.added, update.total);
    Ok(())
}
