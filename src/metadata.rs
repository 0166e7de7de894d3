//! Patent level information: application/grant years and one-digit technology categories
//!
//! Both tables only ever grow. A year or category that is already known is never overwritten by
//! a later download, so numbers computed from earlier runs stay reproducible; only patents that
//! are missing a value pick one up. Every save keeps the previous table as the prior generation.
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::errors::*;
use crate::farm::{new_farm, FarmMap};
use crate::layout;
use crate::rows;
use crate::{Pnum, Year};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatentDates {
    pub ayear: Option<Year>,
    pub gyear: Option<Year>,
}

/// `pnum,ayear,gyear`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatesTable {
    rows: BTreeMap<Pnum, PatentDates>,
}

impl DatesTable {
    pub fn new() -> DatesTable {
        DatesTable::default()
    }

    /// Load the dates. Everything downstream depends on them so a missing table is fatal.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DatesTable> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::MissingFile("patent dates table", None));
        }
        let mut table = DatesTable::new();
        rows::for_each_row(path, true, |line, fields| {
            let pnum: Pnum = rows::bounded_at(fields, 0, 0, path, line)?;
            let ayear = year_at(fields, 1, path, line)?;
            let gyear = year_at(fields, 2, path, line)?;
            table.rows.insert(pnum, PatentDates { ayear, gyear });
            Ok(())
        })?;
        Ok(table)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        layout::ensure_parent(path)?;
        let partial = layout::partial_path(path);
        {
            let mut out = BufWriter::new(File::create(&partial)?);
            writeln!(out, "pnum,ayear,gyear")?;
            for (pnum, dates) in &self.rows {
                write!(out, "{},", pnum)?;
                rows::write_opt(&mut out, dates.ayear)?;
                write!(out, ",")?;
                rows::write_opt(&mut out, dates.gyear)?;
                writeln!(out)?;
            }
            out.flush()?;
        }
        layout::rotate_into(&partial, path)?;
        Ok(())
    }

    pub fn insert(&mut self, pnum: Pnum, dates: PatentDates) {
        self.rows.insert(pnum, dates);
    }

    pub fn get(&self, pnum: Pnum) -> Option<PatentDates> {
        self.rows.get(&pnum).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter<'t>(&'t self) -> impl Iterator<Item=(Pnum, PatentDates)> + 't {
        self.rows.iter().map(|(&pnum, &dates)| (pnum, dates))
    }

    /// Patents applied for in `year`, ascending
    pub fn applied_in(&self, year: Year) -> Vec<Pnum> {
        self.iter()
            .filter(|&(_, d)| d.ayear == Some(year))
            .map(|(pnum, _)| pnum)
            .collect()
    }

    /// Fill in what we don't know yet from `fresh`; what we do know stays as is
    pub fn merge_missing(&mut self, fresh: &DatesTable) -> usize {
        let mut added = 0;
        for (pnum, new) in fresh.iter() {
            let entry = self.rows.entry(pnum).or_insert_with(|| {
                added += 1;
                PatentDates::default()
            });
            if entry.ayear.is_none() {
                entry.ayear = new.ayear;
            }
            if entry.gyear.is_none() {
                entry.gyear = new.gyear;
            }
        }
        added
    }
}

/// An optional year column
fn year_at(fields: &[rows::Field], col: usize, path: &Path, line: usize) -> Result<Option<Year>> {
    match rows::opt_int_at(fields, col, path, line)? {
        Some(_) => rows::bounded_at(fields, col, 0, path, line).map(Some),
        None => Ok(None),
    }
}

//
// PatentsView style tab separated downloads
//

/// A column of a PatentsView download, by its current name and then the names older releases used
struct Column {
    names: &'static [&'static str],
    required: bool,
}

const fn required(names: &'static [&'static str]) -> Column {
    Column { names, required: true }
}

const fn optional(names: &'static [&'static str]) -> Column {
    Column { names, required: false }
}

/// `g_patent`, and `patent` before it
const GRANT_COLUMNS: [Column; 3] = [
    required(&["patent_id", "number"]),
    required(&["patent_type", "type"]),
    required(&["patent_date", "date"]),
];

/// `g_application`, and `application` before it. Only the older file has a country.
const APPLICATION_COLUMNS: [Column; 4] = [
    required(&["patent_id"]),
    required(&["series_code"]),
    required(&["filing_date", "date"]),
    optional(&["country"]),
];

/// `g_cpc_current`, and `cpc_current` before it
const CPC_COLUMNS: [Column; 3] = [
    required(&["patent_id"]),
    required(&["cpc_subclass", "group_id"]),
    required(&["cpc_sequence", "sequence"]),
];

/// Read a tab separated file with a header, handing `visit` the cells of `columns` in order.
///
/// A required column the header doesn't have is an error, so a renamed download can't quietly
/// read as empty.
fn for_each_tsv_row<P, F>(path: P, columns: &[Column], mut visit: F) -> Result<()>
    where P: AsRef<Path>, F: FnMut(&[Option<String>]) {
    let path = path.as_ref();
    let mut lines = BufReader::new(File::open(path)?).lines();
    let header: Vec<String> = match lines.next() {
        Some(line) => line?.split('\t').map(unquote).collect(),
        None => return Err(Error::malformed(path, 1, "no header")),
    };
    let mut positions = Vec::with_capacity(columns.len());
    for column in columns {
        let position = column.names.iter()
            .filter_map(|name| header.iter().position(|h| h == name))
            .next();
        if position.is_none() && column.required {
            return Err(Error::malformed(path, 1, format!("no {} column", column.names.join(" or "))));
        }
        positions.push(position);
    }

    let mut cells = Vec::with_capacity(columns.len());
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let raw: Vec<&str> = line.split('\t').collect();
        cells.clear();
        cells.extend(positions.iter().map(|p| p.and_then(|idx| raw.get(idx)).map(|cell| unquote(cell))));
        visit(&cells);
    }
    Ok(())
}

fn unquote(cell: &str) -> String {
    cell.trim().trim_matches('"').to_string()
}

/// The year of a `YYYY-MM-DD` date, if it is one
fn year_of(date: &str) -> Option<Year> {
    let mut parts = date.split('-');
    let year: Year = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    if date.len() >= 10 && (1..=12).contains(&month) && (1..=31).contains(&day) {
        Some(year)
    } else {
        None
    }
}

/// Utility grants, keeping grant years in `[min_year, max_year]`
pub fn read_grant_years<P: AsRef<Path>>(path: P, min_year: Year, max_year: Year)
    -> Result<FarmMap<Pnum, Year>> {
    let mut grants = new_farm();
    for_each_tsv_row(path, &GRANT_COLUMNS, |cells| {
        let pnum = cells[0].as_ref().and_then(|n| n.parse::<Pnum>().ok());
        let kind = cells[1].as_ref();
        let gyear = cells[2].as_ref().and_then(|d| year_of(d));
        if let (Some(pnum), Some(kind), Some(gyear)) = (pnum, kind, gyear) {
            if kind == "utility" && gyear >= min_year && gyear <= max_year {
                grants.insert(pnum, gyear);
            }
        }
    })?;
    Ok(grants)
}

/// Application years of applications with numeric series codes and patent ids and a real date.
/// Where the file has countries, only US applications count.
pub fn read_application_years<P: AsRef<Path>>(path: P) -> Result<FarmMap<Pnum, Year>> {
    let mut applications = new_farm();
    for_each_tsv_row(path, &APPLICATION_COLUMNS, |cells| {
        let pnum = cells[0].as_ref().and_then(|n| n.parse::<Pnum>().ok());
        let series_ok = cells[1].as_ref().map_or(false, |s| s.parse::<i64>().is_ok());
        let ayear = cells[2].as_ref().and_then(|d| year_of(d));
        let us = cells[3].as_ref().map_or(true, |c| c == "US");
        if let (Some(pnum), true, Some(ayear), true) = (pnum, series_ok, ayear, us) {
            applications.insert(pnum, ayear);
        }
    })?;
    Ok(applications)
}

/// What a dates update did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DatesUpdate {
    pub grants: usize,
    pub missing_ayear: usize,
    pub added: usize,
    pub total: usize,
}

/// Pair every new grant with its application year.
///
/// Grants missing from the application data still make it in, without an application year, and
/// the operator is warned.
pub fn join_new_years(grants: &FarmMap<Pnum, Year>, applications: &FarmMap<Pnum, Year>)
    -> (DatesTable, usize) {
    let mut fresh = DatesTable::new();
    let mut missing = 0;
    for (&pnum, &gyear) in grants {
        let ayear = applications.get(&pnum).cloned();
        if ayear.is_none() {
            missing += 1;
        }
        fresh.insert(pnum, PatentDates { ayear, gyear: Some(gyear) });
    }
    if missing > 0 {
        warn!("The new patent data might be missing some date info: {} of {} grants have no \
               application year", missing, grants.len());
    }
    (fresh, missing)
}

/// Merge newly downloaded grant and application years into the dates table on disk
pub fn update_dates<P, G, A>(dates_path: P, grants_tsv: G, applications_tsv: A,
                             min_year: Year, max_year: Year) -> Result<DatesUpdate>
    where P: AsRef<Path>, G: AsRef<Path>, A: AsRef<Path> {
    let dates_path = dates_path.as_ref();
    let grants = read_grant_years(grants_tsv, min_year, max_year)?;
    let applications = read_application_years(applications_tsv)?;
    info!("Read {} grants in [{}, {}] and {} applications",
          grants.len(), min_year, max_year, applications.len());
    let covered = grants.keys().filter(|p| applications.contains_key(p)).count();
    if covered != grants.len() {
        warn!("Some new grants aren't in the application year data ({} of {})",
              grants.len() - covered, grants.len());
    }
    let (fresh, missing_ayear) = join_new_years(&grants, &applications);

    let mut table = if dates_path.exists() {
        DatesTable::load(dates_path)?
    } else {
        warn!("No dates table at {}, starting a new one", dates_path.display());
        DatesTable::new()
    };
    let added = table.merge_missing(&fresh);
    let still_missing = table.iter().filter(|&(_, d)| d.ayear.is_none() || d.gyear.is_none()).count();
    if still_missing > 0 {
        warn!("{} patents still lack an application or grant year after the merge", still_missing);
    }
    table.save(dates_path)?;
    info!("Dates table now has {} patents ({} new)", table.len(), added);
    Ok(DatesUpdate { grants: grants.len(), missing_ayear, added, total: table.len() })
}

//
// Categories
//

/// `pnum,category`, the one-digit technology class (nullable)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTable {
    rows: BTreeMap<Pnum, Option<u8>>,
}

impl CategoryTable {
    pub fn new() -> CategoryTable {
        CategoryTable::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<CategoryTable> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::MissingFile("patent category table", None));
        }
        let mut table = CategoryTable::new();
        rows::for_each_row(path, true, |line, fields| {
            let pnum: Pnum = rows::bounded_at(fields, 0, 0, path, line)?;
            let category = match rows::opt_int_at(fields, 1, path, line)? {
                Some(c) if c >= 0 && c <= 9 => Some(c as u8),
                Some(c) => return Err(Error::malformed(path, line, format!("category {} is not one digit", c))),
                None => None,
            };
            table.rows.insert(pnum, category);
            Ok(())
        })?;
        Ok(table)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        layout::ensure_parent(path)?;
        let partial = layout::partial_path(path);
        {
            let mut out = BufWriter::new(File::create(&partial)?);
            writeln!(out, "pnum,category")?;
            for (pnum, category) in &self.rows {
                write!(out, "{},", pnum)?;
                rows::write_opt(&mut out, *category)?;
                writeln!(out)?;
            }
            out.flush()?;
        }
        layout::rotate_into(&partial, path)?;
        Ok(())
    }

    pub fn insert(&mut self, pnum: Pnum, category: Option<u8>) {
        self.rows.insert(pnum, category);
    }

    pub fn get(&self, pnum: Pnum) -> Option<u8> {
        self.rows.get(&pnum).cloned().and_then(|c| c)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Only the patents with a known category
    pub fn known(&self) -> FarmMap<Pnum, u8> {
        self.rows.iter()
            .filter_map(|(&pnum, &c)| c.map(|c| (pnum, c)))
            .collect()
    }
}

/// First CPC group (sequence 0) of each patent
pub fn read_primary_cpc<P: AsRef<Path>>(path: P) -> Result<FarmMap<Pnum, String>> {
    let mut cpc = new_farm();
    for_each_tsv_row(path, &CPC_COLUMNS, |cells| {
        let pnum = cells[0].as_ref().and_then(|n| n.parse::<Pnum>().ok());
        let first = cells[2].as_ref().map_or(false, |s| s == "0");
        if let (Some(pnum), Some(group), true) = (pnum, cells[1].as_ref(), first) {
            cpc.insert(pnum, group.clone());
        }
    })?;
    Ok(cpc)
}

/// For each CPC group, the category most often assigned to patents in it (ties go to the higher
/// code)
pub fn cpc_bridge(categories: &CategoryTable, cpc: &FarmMap<Pnum, String>) -> BTreeMap<String, u8> {
    let mut tallies: BTreeMap<&str, BTreeMap<u8, usize>> = BTreeMap::new();
    for (pnum, group) in cpc {
        if let Some(category) = categories.get(*pnum) {
            *tallies.entry(group.as_str()).or_insert_with(BTreeMap::new)
                .entry(category).or_insert(0) += 1;
        }
    }
    tallies.into_iter()
        .filter_map(|(group, counts)| {
            counts.into_iter()
                .max_by_key(|&(category, n)| (n, category))
                .map(|(category, _)| (group.to_string(), category))
        })
        .collect()
}

/// Give uncategorized patents the category their primary CPC group bridges to
pub fn update_categories<P, C>(categories_path: P, cpc_tsv: C) -> Result<usize>
    where P: AsRef<Path>, C: AsRef<Path> {
    let categories_path = categories_path.as_ref();
    let mut table = CategoryTable::load(categories_path)?;
    let cpc = read_primary_cpc(cpc_tsv)?;
    let bridge = cpc_bridge(&table, &cpc);
    info!("Bridged {} CPC groups to categories", bridge.len());
    let mut filled = 0;
    for (pnum, group) in &cpc {
        if table.get(*pnum).is_some() {
            continue;
        }
        if let Some(&category) = bridge.get(group) {
            table.insert(*pnum, Some(category));
            filled += 1;
        }
    }
    table.save(categories_path)?;
    info!("Filled {} categories, table has {} patents", filled, table.len());
    Ok(filled)
}
