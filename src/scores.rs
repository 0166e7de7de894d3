//! Patent level metric tables: `pnum,<metric>,ayear`
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::*;
use crate::layout;
use crate::rows;
use crate::{Pnum, Year};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub pnum: Pnum,
    pub value: f64,
    pub ayear: Year,
}

/// Write scores in the order given, under a `pnum,<metric>,ayear` header
pub fn write_scores<P: AsRef<Path>>(path: P, metric: &str, scores: &[Score]) -> Result<()> {
    let path = path.as_ref();
    layout::ensure_parent(path)?;
    let partial = layout::partial_path(path);
    {
        let mut out = BufWriter::new(File::create(&partial)?);
        writeln!(out, "pnum,{},ayear", metric)?;
        for score in scores {
            writeln!(out, "{},{},{}", score.pnum, score.value, score.ayear)?;
        }
        out.flush()?;
    }
    fs::rename(&partial, path)?;
    info!("Wrote {} {} scores to {}", scores.len(), metric, path.display());
    Ok(())
}

pub fn read_scores<P: AsRef<Path>>(path: P) -> Result<Vec<Score>> {
    let path = path.as_ref();
    let mut scores = vec![];
    rows::for_each_row(path, true, |line, fields| {
        scores.push(Score {
            pnum: rows::bounded_at(fields, 0, 0, path, line)?,
            value: rows::float_at(fields, 1, path, line)?,
            ayear: rows::bounded_at(fields, 2, 0, path, line)?,
        });
        Ok(())
    })?;
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_keep_their_order() {
        let dir = ::tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("breadth.csv");
        let scores = vec![
            Score { pnum: 9, value: 0.5, ayear: 2015 },
            Score { pnum: 3, value: -12.25, ayear: 2016 },
        ];
        write_scores(&path, "Breadth", &scores).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(),
                   "pnum,Breadth,ayear\n9,0.5,2015\n3,-12.25,2016\n");
        assert_eq!(read_scores(&path).unwrap(), scores);
    }
}
