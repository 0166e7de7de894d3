//! Compute RETech for every patent applied for in a range of years
//!
//! The year before the range must be cleaned too; it only seeds the first year's comparison.

// argument parsing
#[macro_use] extern crate clap;
// logging
extern crate env_logger;
// lastly, this library
extern crate pattext;

use pattext::errors::*;
use pattext::layout::{Layout, DEFAULT_DATA_DIR};
use pattext::retech;
use pattext::scores;
use pattext::Year;

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    inner_main().expect("Could not recover. Exiting.");
}
pub fn inner_main() -> Result<()> {
    env_logger::init();
    let args = app_from_crate!()
        .arg_from_usage("<start> 'first application year to score'")
        .arg_from_usage("<end> 'last application year to score'")
        .arg_from_usage("-o, --out [FILE] 'where to write (default out/retech.csv)'")
        .arg_from_usage("--data-dir [DIR] 'where all the data lives (default data)'")
        .get_matches();
    let start = value_t!(args, "start", Year).unwrap_or_else(|e| e.exit());
    let end = value_t!(args, "end", Year).unwrap_or_else(|e| e.exit());
    let layout = Layout::new(args.value_of("data-dir").unwrap_or(DEFAULT_DATA_DIR));
    let out = args.value_of("out").map(Into::into).unwrap_or_else(|| layout.retech_path());

    let found = retech::compute_retech(&layout, start, end)?;
    scores::write_scores(out, "RETech", &found)?;
    Ok(())
}
