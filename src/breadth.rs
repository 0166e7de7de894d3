//! Breadth: how many technology areas a patent's vocabulary reaches into
//!
//! A word is specialized in a category when that category uses it clearly more than any other:
//! at least half again as many occurrences and half again as many patents as the runner up, and
//! in at least ten patents. A patent's Breadth is one minus the Herfindahl index of its
//! specialized word occurrences across categories. A patent whose specialized words all point to
//! one category gets 0; spread evenly over many categories it approaches 1.
use crate::annual;
use crate::errors::*;
use crate::farm::{new_farm, FarmMap};
use crate::layout::Layout;
use crate::scores::Score;
use crate::{Pnum, WordId, Year};

/// Categories are one digit codes
pub const CATEGORIES: usize = 10;
pub const DEFAULT_SPECIALIZATION_RATIO: f64 = 1.5;
pub const DEFAULT_MIN_DOCUMENTS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Specialization {
    /// How far ahead of the runner up the top category must be, on both counts
    pub ratio: f64,
    /// How many patents of the top category must use the word
    pub min_documents: u64,
}

impl Default for Specialization {
    fn default() -> Specialization {
        Specialization {
            ratio: DEFAULT_SPECIALIZATION_RATIO,
            min_documents: DEFAULT_MIN_DOCUMENTS,
        }
    }
}

/// How much one category uses one word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Usage {
    pub documents: u64,
    pub occurrences: u64,
}

impl Specialization {
    /// The category a word is specialized in, given its usage in every category that uses it
    pub fn category(&self, usages: &[(u8, Usage)]) -> Option<u8> {
        let mut ranked = usages.to_vec();
        ranked.sort_by_key(|&(category, usage)| (usage.occurrences, usage.documents, category));
        let (top_category, top) = *ranked.last()?;
        if top.documents < self.min_documents {
            return None;
        }
        if ranked.len() >= 2 {
            let (_, second) = ranked[ranked.len() - 2];
            if (top.occurrences as f64) < self.ratio * second.occurrences as f64
                || (top.documents as f64) < self.ratio * second.documents as f64 {
                return None;
            }
        }
        Some(top_category)
    }
}

/// Every specialized word of a year and its category. Categories must be one digit.
pub fn specialized_words(layout: &Layout, year: Year, categories: &FarmMap<Pnum, u8>,
                         rule: &Specialization) -> Result<FarmMap<WordId, u8>> {
    let mut usage: FarmMap<WordId, [Usage; CATEGORIES]> = new_farm();
    annual::for_each_document(layout.annual_path(year), |pnum, bag| {
        if let Some(&category) = categories.get(&pnum) {
            if category as usize >= CATEGORIES {
                return Err(Error::Other(format!("{} has category {}, not a one digit code",
                                                pnum, category)));
            }
            for &(id, count) in bag.entries() {
                let slot = &mut usage.entry(id).or_insert_with(Default::default)[category as usize];
                slot.documents += 1;
                slot.occurrences += u64::from(count);
            }
        }
        Ok(())
    })?;

    let mut specialized = new_farm();
    for (id, per_category) in usage {
        let used: Vec<(u8, Usage)> = per_category.iter()
            .enumerate()
            .filter(|&(_, u)| u.documents > 0)
            .map(|(category, &u)| (category as u8, u))
            .collect();
        if let Some(category) = rule.category(&used) {
            specialized.insert(id, category);
        }
    }
    Ok(specialized)
}

/// One minus the Herfindahl index of per-category counts; `None` if there's nothing to count
pub fn dispersion(per_category: &[u64]) -> Option<f64> {
    let total: u64 = per_category.iter().sum();
    if total == 0 {
        return None;
    }
    let hhi: f64 = per_category.iter()
        .map(|&n| n as f64 / total as f64)
        .map(|share| share * share)
        .sum();
    Some(1.0 - hhi)
}

/// Breadth of every patent applied for in `year` that uses a specialized word
pub fn compute_breadth(layout: &Layout, year: Year, categories: &FarmMap<Pnum, u8>,
                       rule: &Specialization) -> Result<Vec<Score>> {
    let specialized = specialized_words(layout, year, categories, rule)?;
    info!("{}: {} specialized words", year, specialized.len());
    let mut scores = vec![];
    annual::for_each_document(layout.annual_path(year), |pnum, bag| {
        let mut per_category = [0u64; CATEGORIES];
        for &(id, count) in bag.entries() {
            if let Some(&category) = specialized.get(&id) {
                per_category[category as usize] += u64::from(count);
            }
        }
        if let Some(value) = dispersion(&per_category) {
            scores.push(Score { pnum, value, ayear: year });
        }
        Ok(())
    })?;
    info!("{}: Breadth for {} patents", year, scores.len());
    Ok(scores)
}

/// Breadth for each year of `start..=end`, one year after another
pub fn compute_breadth_range(layout: &Layout, start: Year, end: Year, categories: &FarmMap<Pnum, u8>,
                             rule: &Specialization) -> Result<Vec<Score>> {
    let mut scores = vec![];
    for year in start..=end {
        scores.extend(compute_breadth(layout, year, categories, rule)?);
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annual::AnnualWriter;
    use crate::bags::WordBag;

    fn usage(documents: u64, occurrences: u64) -> Usage {
        Usage { documents, occurrences }
    }

    #[test]
    fn clear_leaders_are_specialized() {
        let rule = Specialization::default();
        assert_eq!(rule.category(&[(1, usage(60, 600)), (2, usage(30, 200))]), Some(1));
        assert_eq!(rule.category(&[(2, usage(30, 200)), (1, usage(60, 600))]), Some(1));
        // Enough occurrences but not enough patents
        assert_eq!(rule.category(&[(1, usage(40, 600)), (2, usage(30, 200))]), None);
        assert_eq!(rule.category(&[(1, usage(45, 300)), (2, usage(30, 200))]), Some(1));
        // Alone in one category, only the patent count matters
        assert_eq!(rule.category(&[(4, usage(10, 10))]), Some(4));
        assert_eq!(rule.category(&[(4, usage(9, 900))]), None);
        assert_eq!(rule.category(&[]), None);
    }

    #[test]
    fn categories_past_nine_are_errors() {
        let dir = ::tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let mut writer = AnnualWriter::create(layout.annual_path(2011)).unwrap();
        writer.push(1, &WordBag::from_pairs(vec![(1, 2)])).unwrap();
        writer.push(2, &WordBag::from_pairs(vec![(1, 1)])).unwrap();
        writer.finish().unwrap();
        let mut categories = new_farm();
        categories.insert(1, 3);
        categories.insert(2, 12);
        let rule = Specialization::default();
        assert!(specialized_words(&layout, 2011, &categories, &rule).is_err());
        assert!(compute_breadth(&layout, 2011, &categories, &rule).is_err());
        categories.insert(2, 9);
        assert!(compute_breadth(&layout, 2011, &categories, &rule).is_ok());
    }

    #[test]
    fn dispersion_is_between_zero_and_one() {
        assert_eq!(dispersion(&[0, 0, 0]), None);
        assert_eq!(dispersion(&[0, 7, 0]), Some(0.0));
        assert_eq!(dispersion(&[5, 5]), Some(0.5));
        let d = dispersion(&[1, 2, 3, 4]).unwrap();
        assert!(d > 0.0 && d < 1.0);
    }

    #[test]
    fn breadth_of_a_year() {
        let dir = ::tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let mut categories = new_farm();
        let mut writer = AnnualWriter::create(layout.annual_path(2010)).unwrap();
        // Word 1 belongs to category 3, word 2 to category 5, word 9 is everywhere
        for pnum in 1..=12 {
            categories.insert(pnum, 3);
            writer.push(pnum, &WordBag::from_pairs(vec![(1, 2), (9, 1)])).unwrap();
        }
        for pnum in 13..=24 {
            categories.insert(pnum, 5);
            writer.push(pnum, &WordBag::from_pairs(vec![(2, 2), (9, 1)])).unwrap();
        }
        // No category of its own, but it still gets a Breadth from the words it uses
        writer.push(25, &WordBag::from_pairs(vec![(1, 3), (2, 1)])).unwrap();
        writer.push(26, &WordBag::from_pairs(vec![(9, 4)])).unwrap();
        writer.finish().unwrap();

        let rule = Specialization::default();
        let words = specialized_words(&layout, 2010, &categories, &rule).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words.get(&1), Some(&3));
        assert_eq!(words.get(&2), Some(&5));

        let scores = compute_breadth(&layout, 2010, &categories, &rule).unwrap();
        assert_eq!(scores.len(), 25);
        assert!(scores[..24].iter().all(|s| s.value == 0.0 && s.ayear == 2010));
        assert_eq!(scores[24].pnum, 25);
        assert!((scores[24].value - (1.0 - 0.75 * 0.75 - 0.25 * 0.25)).abs() < 1e-12);
    }
}
