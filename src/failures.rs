//! Which patents had fields we couldn't find in their pages
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::*;
use crate::layout;
use crate::rows;
use crate::Pnum;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FailureLog {
    codes: BTreeMap<Pnum, String>,
}

impl FailureLog {
    pub fn new() -> FailureLog {
        FailureLog::default()
    }

    /// Load `pnum,"codes"` rows. A missing log is an empty one.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<FailureLog> {
        let path = path.as_ref();
        let mut log = FailureLog::new();
        if !path.exists() {
            return Ok(log);
        }
        rows::for_each_row(path, false, |line, fields| {
            let pnum: Pnum = rows::bounded_at(fields, 0, 0, path, line)?;
            let codes = rows::text_at(fields, 1, path, line)?;
            log.codes.insert(pnum, codes.to_string());
            Ok(())
        })?;
        Ok(log)
    }

    /// Remember the latest failure codes for a patent
    pub fn record(&mut self, pnum: Pnum, codes: String) {
        self.codes.insert(pnum, codes);
    }

    pub fn get(&self, pnum: Pnum) -> Option<&str> {
        self.codes.get(&pnum).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        layout::ensure_parent(path)?;
        let partial = layout::partial_path(path);
        {
            let mut out = BufWriter::new(File::create(&partial)?);
            for (pnum, codes) in &self.codes {
                writeln!(out, "{},{}", pnum, rows::quote(codes))?;
            }
            out.flush()?;
        }
        ::std::fs::rename(&partial, path)?;
        Ok(())
    }
}
