extern crate pattext;
extern crate tempfile;
extern crate flate2;

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Mutex;

use flate2::read::GzDecoder;

use pattext::acquire::Fetch;
use pattext::annual;
use pattext::bags::WordBag;
use pattext::breadth::{self, Specialization};
use pattext::clean::AnnualCleaner;
use pattext::errors::*;
use pattext::layout::Layout;
use pattext::metadata::{CategoryTable, DatesTable, PatentDates};
use pattext::plan::{self, UpdateSettings};
use pattext::retech;
use pattext::scores;
use pattext::ship;
use pattext::vocab::Vocabulary;
use pattext::{Pnum, WordId, Year};

fn put(path: PathBuf, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn dates_for(entries: &[(Pnum, Year)]) -> DatesTable {
    let mut dates = DatesTable::new();
    for &(pnum, ayear) in entries {
        dates.insert(pnum, PatentDates { ayear: Some(ayear), gyear: Some(ayear + 3) });
    }
    dates
}

fn cleaned_rows(layout: &Layout, year: Year) -> BTreeMap<Pnum, Vec<(WordId, u32)>> {
    let mut rows = BTreeMap::new();
    annual::for_each_document(layout.annual_path(year), |pnum, bag| {
        rows.insert(pnum, bag.entries().to_vec());
        Ok(())
    }).unwrap();
    rows
}

const SCENARIO: &[(Pnum, &[(WordId, u32)])] = &[
    (9000001, &[(1, 5), (2, 3)]),
    (9000002, &[(1, 2), (3, 4)]),
    (9000003, &[(2, 1), (3, 1)]),
];

/// The three scenario patents plus nine patents with words of their own. Without company, every
/// word of three patents is in a third of them and so a stopword.
fn scenario(layout: &Layout) -> DatesTable {
    put(layout.ocr_artifacts_path(), "");
    let mut entries = vec![];
    for &(pnum, pairs) in SCENARIO {
        WordBag::from_pairs(pairs.to_vec()).write(layout.bag_path(pnum)).unwrap();
        entries.push((pnum, 2015));
    }
    for i in 0..9 {
        let pnum = 9100001 + i as Pnum;
        WordBag::from_pairs(vec![(11 + i as WordId, 2)]).write(layout.bag_path(pnum)).unwrap();
        entries.push((pnum, 2015));
    }
    let dates = dates_for(&entries);
    dates.save(layout.dates_path()).unwrap();
    dates
}

#[test]
fn scenario_rows_survive_cleaning() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path());
    let dates = scenario(&layout);

    let mut cleaner = AnnualCleaner::open(&layout, &Vocabulary::new()).unwrap();
    let reports = cleaner.clean_years(&dates, &[2015]).unwrap();
    assert_eq!(reports[0].documents, 12);
    assert_eq!(reports[0].stopwords, 0);

    let rows = cleaned_rows(&layout, 2015);
    assert_eq!(rows.len(), 12);
    for &(pnum, pairs) in SCENARIO {
        assert_eq!(rows[&pnum], pairs.to_vec());
    }

    // Cleaning is a pure function of the raw bags
    let first = fs::read(layout.annual_path(2015)).unwrap();
    cleaner.clean_years(&dates, &[2015]).unwrap();
    assert_eq!(fs::read(layout.annual_path(2015)).unwrap(), first);
}

#[test]
fn scenario_retech_needs_a_defined_seed() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path());
    let mut dates = scenario(&layout);

    // An empty 2014: no distribution, so no scores, but no error either
    let mut cleaner = AnnualCleaner::open(&layout, &Vocabulary::new()).unwrap();
    cleaner.clean_years(&dates, &[2014, 2015]).unwrap();
    assert!(retech::compute_retech(&layout, 2015, 2015).unwrap().is_empty());

    // Once 2014 has words, every 2015 patent gets a score. Word 1 is in two of twelve patents,
    // rare enough to survive cleaning.
    for i in 0..12 {
        let pnum = 8000001 + i;
        let mut pairs = vec![(60 + i as WordId, 1)];
        if i < 2 {
            pairs.push((1, 1));
        }
        WordBag::from_pairs(pairs).write(layout.bag_path(pnum)).unwrap();
        dates.insert(pnum, PatentDates { ayear: Some(2014), gyear: Some(2016) });
    }
    cleaner.clean_years(&dates, &[2014]).unwrap();
    let scores = retech::compute_retech(&layout, 2015, 2015).unwrap();
    assert_eq!(scores.len(), 12);
    assert!(scores.windows(2).all(|w| w[0].pnum < w[1].pnum));
    assert!(scores.iter().all(|s| s.ayear == 2015 && s.value >= -100.0 && s.value <= 100.0));
    // Words 2 and 3 are new in 2015, word 1 was there before
    let by_pnum: BTreeMap<Pnum, f64> = scores.iter().map(|s| (s.pnum, s.value)).collect();
    assert!((by_pnum[&9000003] - 100.0).abs() < 1e-9);
    assert!(by_pnum[&9000001] < 100.0);
    assert!((by_pnum[&9100001] - 100.0).abs() < 1e-9);

    let path = layout.retech_path();
    scores::write_scores(&path, "RETech", &scores).unwrap();
    assert!(fs::read_to_string(&path).unwrap().starts_with("pnum,RETech,ayear\n9000001,"));
}

const GROUPS: &[&str] = &["alpha", "bravo", "charlie", "delta", "echo"];

/// Digits as letters, so every patent has a word of its own: 120 is "bca"
fn spelled(pnum: Pnum) -> String {
    pnum.to_string().bytes().map(|d| (b'a' + d - b'0') as char).collect()
}

fn group(pnum: Pnum) -> usize {
    (pnum / 2 % 5) as usize
}

/// Serves a page for every even pnum, nothing for odd ones
struct EvenPages {
    asked: Mutex<usize>,
}

impl Fetch for EvenPages {
    fn fetch(&self, pnum: Pnum) -> Result<Option<Vec<u8>>> {
        *self.asked.lock().unwrap() += 1;
        if pnum % 2 == 1 {
            return Ok(None);
        }
        Ok(Some(format!("<html><body><section itemprop=\"description\">\
                         <div class=\"description\"><p>{} word{} patent {}</p></div>\
                         </section></body></html>", GROUPS[group(pnum)], spelled(pnum), pnum)
            .into_bytes()))
    }
}

#[test]
fn update_then_score_then_ship() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path());
    put(layout.ocr_artifacts_path(), "");

    let mut entries = vec![];
    for pnum in 100..140 {
        entries.push((pnum, if pnum < 120 { 2015 } else { 2016 }));
    }
    let dates = dates_for(&entries);
    dates.save(layout.dates_path()).unwrap();

    let settings = UpdateSettings {
        min_year: 2015, max_year: 2016, epoch: 2026, workers: 4, force_clean: false,
    };
    let fetcher = EvenPages { asked: Mutex::new(0) };
    let report = plan::update_bags(&layout, &dates, &settings, Some(&fetcher)).unwrap();
    assert_eq!(*fetcher.asked.lock().unwrap(), 40);
    assert_eq!(report.downloads.fetched, 20);
    assert_eq!(report.downloads.missing, 20);
    assert_eq!(report.parsed.parsed, 20);
    assert_eq!(report.cleaned.len(), 2);

    let vocab = Vocabulary::load(layout.vocabulary_path()).unwrap();
    assert!(vocab.get("alpha").is_some());
    assert!(vocab.get("wordbca").is_some());
    assert!(vocab.get("patent").is_some());

    // A rerun finds nothing new to fetch or parse
    let again = plan::update_bags(&layout, &dates, &settings, Some(&fetcher)).unwrap();
    assert_eq!(again.parsed.parsed, 0);
    assert_eq!(again.downloads.fetched, 0);
    assert!(again.cleaned.is_empty());

    // "patent" is in every page and is dropped; each group word is in two of ten and stays
    let patent = vocab.get("patent").unwrap();
    let rows = cleaned_rows(&layout, 2016);
    assert_eq!(rows.len(), 10);
    assert!(rows.values().all(|pairs| pairs.len() == 2 && pairs.iter().all(|&(id, _)| id != patent)));

    let retech_scores = retech::compute_retech(&layout, 2016, 2016).unwrap();
    assert_eq!(retech_scores.len(), 10);

    let mut categories = CategoryTable::new();
    for pnum in 100..140 {
        categories.insert(pnum, Some(group(pnum) as u8));
    }
    let rule = Specialization { ratio: 1.5, min_documents: 2 };
    let breadth_scores = breadth::compute_breadth_range(
        &layout, 2015, 2016, &categories.known(), &rule).unwrap();
    // Group words are the only specialized ones, and each page has one, all in its own category
    assert_eq!(breadth_scores.len(), 20);
    assert!(breadth_scores.iter().all(|s| s.value == 0.0));

    let shipped = ship::ship(&retech_scores, &breadth_scores, &dates, &categories,
                             layout.shipped_path()).unwrap();
    let mut text = String::new();
    GzDecoder::new(fs::File::open(layout.shipped_path()).unwrap())
        .read_to_string(&mut text).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], ship::HEADER);
    assert_eq!(shipped, 20);
    assert_eq!(lines.len(), 21);
    assert!(lines[1].starts_with("100,,2015,0,2018,"));
}
