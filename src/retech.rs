//! RETech: how much a patent leans on words that are catching on
//!
//! Each year's cleaned table gives a word distribution: every patent's counts are turned into
//! shares of that patent, the shares are summed over the year and the sum is scaled to 1. A word's
//! shift from one year to the next is `(z_t - z_t-1) / (z_t + z_t-1)`, which lies in [-1, 1]. A
//! patent's RETech is 100 times the average shift of the distinct words it uses, so every word
//! counts once no matter how often the patent repeats it.
use ndarray::{s, Array1, Zip};

use crate::annual;
use crate::bags::WordBag;
use crate::errors::*;
use crate::layout::Layout;
use crate::scores::Score;
use crate::Year;

/// A year's word distribution, indexed by word id. `None` when the year has no words at all.
pub fn year_distribution(layout: &Layout, year: Year) -> Result<Option<Array1<f64>>> {
    let mut shares: Vec<f64> = vec![];
    annual::for_each_document(layout.annual_path(year), |_pnum, bag| {
        let total = bag.total() as f64;
        if total == 0.0 {
            return Ok(());
        }
        for &(id, count) in bag.entries() {
            let id = id as usize;
            if shares.len() <= id {
                shares.resize(id + 1, 0.0);
            }
            shares[id] += f64::from(count) / total;
        }
        Ok(())
    })?;
    let mut z = Array1::from(shares);
    let sum = z.sum();
    if sum <= 0.0 {
        return Ok(None);
    }
    z /= sum;
    Ok(Some(z))
}

/// Zero-extend a distribution to `len` words
fn padded(z: &Array1<f64>, len: usize) -> Array1<f64> {
    let mut out = Array1::zeros(len);
    out.slice_mut(s![..z.len()]).assign(z);
    out
}

/// Per-word shift between two distributions. NaN for words neither year uses.
pub fn token_deltas(this_year: &Array1<f64>, last_year: &Array1<f64>) -> Array1<f64> {
    let len = this_year.len().max(last_year.len());
    let this_year = padded(this_year, len);
    let last_year = padded(last_year, len);
    let mut deltas = Array1::<f64>::zeros(len);
    Zip::from(&mut deltas)
        .and(&this_year)
        .and(&last_year)
        .for_each(|delta, &now, &then| {
            *delta = if now + then > 0.0 { (now - then) / (now + then) } else { ::std::f64::NAN };
        });
    deltas
}

/// 100 times the mean shift over the distinct words in `bag`
pub fn score(bag: &WordBag, deltas: &Array1<f64>) -> Option<f64> {
    if bag.is_empty() {
        return None;
    }
    let sum: f64 = bag.entries().iter()
        .map(|&(id, _)| deltas.get(id as usize).cloned().unwrap_or(::std::f64::NAN))
        .sum();
    Some(100.0 * sum / bag.len() as f64)
}

/// RETech for every patent applied for in `start..=end`, year by year and in pnum order within
/// a year. `start - 1` is read only to seed the first year's shift.
pub fn compute_retech(layout: &Layout, start: Year, end: Year) -> Result<Vec<Score>> {
    let mut scores = vec![];
    let mut last_year = year_distribution(layout, start - 1)?;
    for year in start..=end {
        let this_year = year_distribution(layout, year)?;
        match (&last_year, &this_year) {
            (&Some(ref then), &Some(ref now)) => {
                let deltas = token_deltas(now, then);
                let before = scores.len();
                annual::for_each_document(layout.annual_path(year), |pnum, bag| {
                    if let Some(value) = score(bag, &deltas) {
                        scores.push(Score { pnum, value, ayear: year });
                    }
                    Ok(())
                })?;
                info!("RETech for {} patents of {}", scores.len() - before, year);
            }
            (&None, _) => warn!("No words in {}, so nothing to compare {} against", year - 1, year),
            (_, &None) => warn!("No words in {}", year),
        }
        last_year = this_year;
    }
    Ok(scores)
}
