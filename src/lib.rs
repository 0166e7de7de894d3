//! Text based innovation metrics for US patents
//!
//! The pipeline downloads patent pages, turns them into word bags against a vocabulary that only
//! ever grows, cleans each application year into one table, and from those tables computes two
//! patent level metrics: RETech (does a patent use words that are catching on?) and Breadth (how
//! many technology areas do its specialized words come from?).
//!
//! Each stage has its own binary under `src/bin`; this library is what they share.

#[macro_use] extern crate log;

pub mod errors;
pub mod farm;
pub mod layout;
pub mod rows;
pub mod vocab;
pub mod bags;
pub mod failures;
pub mod metadata;
pub mod acquire;
pub mod extract;
pub mod tokenize;
pub mod annual;
pub mod clean;
pub mod scores;
pub mod retech;
pub mod breadth;
pub mod plan;
pub mod recover;
pub mod ship;

/// US patent number
pub type Pnum = u64;
/// A calendar year: application, grant, or the year a page was downloaded
pub type Year = i32;
/// Vocabulary id, starting at 1
pub type WordId = u32;
