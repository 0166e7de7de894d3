//! Give new patents a one-digit technology category
//!
//! Reads the current CPC assignments (`patent_id, group_id, sequence`, tab separated) and bridges
//! each patent's first CPC group to the category most patents in that group already have.
//! Patents that already have a category keep it.

// argument parsing
#[macro_use] extern crate clap;
// logging
#[macro_use] extern crate log;
extern crate env_logger;
// lastly, this library
extern crate pattext;

use pattext::errors::*;
use pattext::layout::{Layout, DEFAULT_DATA_DIR};
use pattext::metadata;

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    inner_main().expect("Could not recover. Exiting.");
}
pub fn inner_main() -> Result<()> {
    env_logger::init();
    let args = app_from_crate!()
        .arg_from_usage("<cpc> 'CPC assignments: patent_id, group_id, sequence (tab separated)'")
        .arg_from_usage("--data-dir [DIR] 'where all the data lives (default data)'")
        .get_matches();
    let layout = Layout::new(args.value_of("data-dir").unwrap_or(DEFAULT_DATA_DIR));

    let filled = metadata::update_categories(layout.categories_path(), args.value_of("cpc").unwrap())?;
    info!("{} patents got a category", filled);
    Ok(())
}
