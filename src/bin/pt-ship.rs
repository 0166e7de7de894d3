//! Join RETech and Breadth with the patent dates and categories into one gzipped table

// argument parsing
#[macro_use] extern crate clap;
// logging
extern crate env_logger;
// lastly, this library
extern crate pattext;

use pattext::errors::*;
use pattext::layout::{Layout, DEFAULT_DATA_DIR};
use pattext::metadata::{CategoryTable, DatesTable};
use pattext::scores;
use pattext::ship;

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    inner_main().expect("Could not recover. Exiting.");
}
pub fn inner_main() -> Result<()> {
    env_logger::init();
    let args = app_from_crate!()
        .arg_from_usage("-o, --out [FILE] 'where to write (default out/pattext.csv.gz)'")
        .arg_from_usage("--data-dir [DIR] 'where all the data lives (default data)'")
        .get_matches();
    let layout = Layout::new(args.value_of("data-dir").unwrap_or(DEFAULT_DATA_DIR));
    let out = args.value_of("out").map(Into::into).unwrap_or_else(|| layout.shipped_path());

    let retech = scores::read_scores(layout.retech_path())?;
    let breadth = scores::read_scores(layout.breadth_path())?;
    let dates = DatesTable::load(layout.dates_path())?;
    let categories = CategoryTable::load(layout.categories_path())?;
    ship::ship(&retech, &breadth, &dates, &categories, out)?;
    Ok(())
}
