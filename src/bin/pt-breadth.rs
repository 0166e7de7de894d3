//! Compute Breadth for every patent applied for in a range of years

// argument parsing
#[macro_use] extern crate clap;
// logging
#[macro_use] extern crate log;
extern crate env_logger;
// lastly, this library
extern crate pattext;

use pattext::breadth::{self, Specialization};
use pattext::errors::*;
use pattext::layout::{Layout, DEFAULT_DATA_DIR};
use pattext::metadata::CategoryTable;
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
        .arg_from_usage("--ratio [R] 'how far the top category must lead (default 1.5)'")
        .arg_from_usage("--min-documents [N] 'patents needed to specialize a word (default 10)'")
        .arg_from_usage("-o, --out [FILE] 'where to write (default out/breadth.csv)'")
        .arg_from_usage("--data-dir [DIR] 'where all the data lives (default data)'")
        .get_matches();
    let start = value_t!(args, "start", Year).unwrap_or_else(|e| e.exit());
    let end = value_t!(args, "end", Year).unwrap_or_else(|e| e.exit());
    let mut rule = Specialization::default();
    if args.is_present("ratio") {
        rule.ratio = value_t!(args, "ratio", f64).unwrap_or_else(|e| e.exit());
    }
    if args.is_present("min-documents") {
        rule.min_documents = value_t!(args, "min-documents", u64).unwrap_or_else(|e| e.exit());
    }
    let layout = Layout::new(args.value_of("data-dir").unwrap_or(DEFAULT_DATA_DIR));
    let out = args.value_of("out").map(Into::into).unwrap_or_else(|| layout.breadth_path());

    let categories = CategoryTable::load(layout.categories_path())?.known();
    info!("{} patents have a category", categories.len());
    let found = breadth::compute_breadth_range(&layout, start, end, &categories, &rule)?;
    scores::write_scores(out, "Breadth", &found)?;
    Ok(())
}
