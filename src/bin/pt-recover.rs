//! Delete the raw word bags written after the vocabulary was last saved
//!
//! Run this after `pt-update-bags` dies partway. Those bags may use word ids that were never
//! saved; once they're gone the next update parses their pages again.

// argument parsing
#[macro_use] extern crate clap;
// logging
#[macro_use] extern crate log;
extern crate env_logger;
// dates on the command line
extern crate chrono;
// lastly, this library
extern crate pattext;

use std::time::SystemTime;

use chrono::{Local, NaiveDateTime, TimeZone};

use pattext::errors::*;
use pattext::layout::{Layout, DEFAULT_DATA_DIR};
use pattext::recover;

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    inner_main().expect("Could not recover. Exiting.");
}
pub fn inner_main() -> Result<()> {
    env_logger::init();
    let args = app_from_crate!()
        .arg_from_usage("--since [TIME] 'local time like \"2021-06-01 13:00:00\" (default: last vocabulary save)'")
        .arg_from_usage("--dry-run 'only list what would be deleted'")
        .arg_from_usage("--data-dir [DIR] 'where all the data lives (default data)'")
        .get_matches();
    let layout = Layout::new(args.value_of("data-dir").unwrap_or(DEFAULT_DATA_DIR));

    let cutoff: SystemTime = match args.value_of("since") {
        Some(text) => {
            let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .map_err(|err| Error::Other(format!("Can't read {:?} as a time: {}", text, err)))?;
            let local = Local.from_local_datetime(&naive).single()
                .ok_or_else(|| Error::Other(format!("{:?} is not a single local time", text)))?;
            local.into()
        }
        None => recover::vocabulary_saved_at(&layout)?,
    };

    let stale = recover::stale_bags(&layout, cutoff)?;
    if args.is_present("dry-run") {
        for path in &stale {
            println!("{}", path.display());
        }
        info!("{} bags would be removed", stale.len());
    } else {
        recover::remove(&stale)?;
    }
    Ok(())
}
