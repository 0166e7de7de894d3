//! Bundling the metrics into one compressed table
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::errors::*;
use crate::layout;
use crate::metadata::{CategoryTable, DatesTable};
use crate::rows;
use crate::scores::Score;
use crate::{Pnum, Year};

pub const HEADER: &str = "pnum,RETech,ayear,Breadth,gyear,category";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShippedRow {
    pub retech: Option<f64>,
    pub ayear: Option<Year>,
    pub breadth: Option<f64>,
    pub gyear: Option<Year>,
    pub category: Option<u8>,
}

/// Every patent with either metric, joined with its dates and category
pub fn join(retech: &[Score], breadth: &[Score], dates: &DatesTable, categories: &CategoryTable)
    -> BTreeMap<Pnum, ShippedRow> {
    let mut joined: BTreeMap<Pnum, ShippedRow> = BTreeMap::new();
    for score in retech {
        let row = joined.entry(score.pnum).or_insert_with(Default::default);
        row.retech = Some(score.value);
        row.ayear = Some(score.ayear);
    }
    for score in breadth {
        joined.entry(score.pnum).or_insert_with(Default::default).breadth = Some(score.value);
    }
    for (&pnum, row) in joined.iter_mut() {
        let known = dates.get(pnum).unwrap_or_default();
        if row.ayear.is_none() {
            row.ayear = known.ayear;
        }
        row.gyear = known.gyear;
        row.category = categories.get(pnum);
    }
    joined
}

/// Write the joined table gzipped; returns the number of patents
pub fn ship<P: AsRef<Path>>(retech: &[Score], breadth: &[Score], dates: &DatesTable,
                            categories: &CategoryTable, out: P) -> Result<usize> {
    let out = out.as_ref();
    let joined = join(retech, breadth, dates, categories);
    layout::ensure_parent(out)?;
    let partial = layout::partial_path(out);
    {
        let mut gz = GzEncoder::new(BufWriter::new(File::create(&partial)?), Compression::default());
        writeln!(gz, "{}", HEADER)?;
        for (pnum, row) in &joined {
            write!(gz, "{},", pnum)?;
            rows::write_opt(&mut gz, row.retech)?;
            write!(gz, ",")?;
            rows::write_opt(&mut gz, row.ayear)?;
            write!(gz, ",")?;
            rows::write_opt(&mut gz, row.breadth)?;
            write!(gz, ",")?;
            rows::write_opt(&mut gz, row.gyear)?;
            write!(gz, ",")?;
            rows::write_opt(&mut gz, row.category)?;
            writeln!(gz)?;
        }
        gz.finish()?.flush()?;
    }
    ::std::fs::rename(&partial, out)?;
    info!("Shipped {} patents to {}", joined.len(), out.display());
    Ok(joined.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::PatentDates;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn outer_join_sorted_by_pnum() {
        let dir = ::tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("pattext.csv.gz");
        let retech = vec![
            Score { pnum: 30, value: 12.5, ayear: 2015 },
            Score { pnum: 10, value: -4.0, ayear: 2015 },
        ];
        let breadth = vec![
            Score { pnum: 10, value: 0.5, ayear: 2015 },
            Score { pnum: 20, value: 0.0, ayear: 2016 },
        ];
        let mut dates = DatesTable::new();
        dates.insert(10, PatentDates { ayear: Some(2015), gyear: Some(2018) });
        dates.insert(20, PatentDates { ayear: Some(2016), gyear: None });
        let mut categories = CategoryTable::new();
        categories.insert(10, Some(4));
        categories.insert(30, None);

        assert_eq!(ship(&retech, &breadth, &dates, &categories, &path).unwrap(), 3);
        let mut text = String::new();
        GzDecoder::new(File::open(&path).unwrap()).read_to_string(&mut text).unwrap();
        assert_eq!(text, "pnum,RETech,ayear,Breadth,gyear,category\n\
                          10,-4,2015,0.5,2018,4\n\
                          20,,2016,0,,\n\
                          30,12.5,2015,,,\n");
    }
}
