//! Pulling patent text out of downloaded pages
//!
//! The page layout depends on when the page was downloaded, so the epoch directory a page sits in
//! picks one of a few fixed rulesets. Each ruleset tries some sections of the patent and says
//! which ones it couldn't find.
use scraper::{Html, Selector};

use crate::errors::*;
use crate::Year;

/// Which layout a page was downloaded under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    /// Abstract, claims and description each in their own section. Downloaded in 2014 or before.
    Legacy,
    /// Description only, bytes decoded forgivingly. 2015 through 2019.
    Transitional,
    /// Description only, and the page must be valid UTF-8.
    Current,
}

impl Era {
    pub fn for_epoch(epoch: Year) -> Era {
        match epoch {
            e if e <= 2014 => Era::Legacy,
            e if e <= 2019 => Era::Transitional,
            _ => Era::Current,
        }
    }

    /// The sections this era attempts, in the order they are concatenated
    pub fn sections(self) -> &'static [Section] {
        match self {
            Era::Legacy => &[Section::Abstract, Section::Claims, Section::Description],
            Era::Transitional | Era::Current => &[Section::Description],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Abstract,
    Claims,
    Description,
}

impl Section {
    /// The name written to the failure log
    pub fn code(self) -> &'static str {
        match self {
            Section::Abstract => "abs",
            Section::Claims => "claim",
            Section::Description => "desc",
        }
    }
}

/// What we got out of one page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extraction {
    /// Text of each section found, in section order
    pub texts: Vec<String>,
    pub failed: Vec<Section>,
}

impl Extraction {
    pub fn successes(&self) -> usize {
        self.texts.len()
    }

    /// Space separated names of the sections that failed, if any did
    pub fn failure_codes(&self) -> Option<String> {
        if self.failed.is_empty() {
            None
        } else {
            Some(self.failed.iter().map(|s| s.code()).collect::<Vec<_>>().join(" "))
        }
    }

    /// Every section found, joined with single spaces
    pub fn text(&self) -> String {
        self.texts.join(" ")
    }
}

/// Compiled selectors for every era, built once per run
pub struct Extractor {
    legacy_abstract: Selector,
    legacy_claims: Selector,
    legacy_description: Selector,
    description: Selector,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|err| Error::Other(format!("Bad selector {:?}: {}", css, err)))
}

impl Extractor {
    pub fn new() -> Result<Extractor> {
        Ok(Extractor {
            legacy_abstract: selector("div.patent-abstract-section div.abstract")?,
            legacy_claims: selector("div.patent-claims-section")?,
            legacy_description: selector("div.patent-description-section")?,
            description: selector("section[itemprop=\"description\"] div.description")?,
        })
    }

    fn selector_for(&self, era: Era, section: Section) -> &Selector {
        match (era, section) {
            (Era::Legacy, Section::Abstract) => &self.legacy_abstract,
            (Era::Legacy, Section::Claims) => &self.legacy_claims,
            (Era::Legacy, Section::Description) => &self.legacy_description,
            (_, _) => &self.description,
        }
    }

    /// Find each section of the era in a raw page
    pub fn extract(&self, era: Era, page: &[u8]) -> Extraction {
        let html = match era {
            Era::Current => match ::std::str::from_utf8(page) {
                Ok(text) => text.to_string(),
                Err(_) => return Extraction {
                    texts: vec![],
                    failed: era.sections().to_vec(),
                },
            },
            Era::Legacy | Era::Transitional => String::from_utf8_lossy(page).into_owned(),
        };
        let doc = Html::parse_document(&html);

        let mut extraction = Extraction::default();
        for &section in era.sections() {
            match doc.select(self.selector_for(era, section)).next() {
                Some(element) => extraction.texts.push(element.text().collect::<Vec<_>>().join(" ")),
                None => extraction.failed.push(section),
            }
        }
        extraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_PAGE: &str = r#"<html><body>
        <div class="patent-section patent-abstract-section"><div class="abstract">A gear box.</div></div>
        <div class="patent-section patent-description-section"><p>The <b>gear</b> turns.</p></div>
        </body></html>"#;

    const CURRENT_PAGE: &str = r#"<html><body>
        <section itemprop="description"><div class="description"><p>Shaft</p><p>and gear</p></div></section>
        </body></html>"#;

    #[test]
    fn eras_by_epoch() {
        assert_eq!(Era::for_epoch(2009), Era::Legacy);
        assert_eq!(Era::for_epoch(2014), Era::Legacy);
        assert_eq!(Era::for_epoch(2015), Era::Transitional);
        assert_eq!(Era::for_epoch(2019), Era::Transitional);
        assert_eq!(Era::for_epoch(2020), Era::Current);
        assert_eq!(Era::for_epoch(2026), Era::Current);
    }

    #[test]
    fn legacy_sections_fail_independently() {
        let ex = Extractor::new().unwrap();
        let got = ex.extract(Era::Legacy, LEGACY_PAGE.as_bytes());
        assert_eq!(got.successes(), 2);
        assert_eq!(got.failed, vec![Section::Claims]);
        assert_eq!(got.failure_codes(), Some("claim".to_string()));
        assert!(got.texts[0].contains("A gear box."));
        assert!(got.texts[1].contains("gear"));
    }

    #[test]
    fn description_only_eras() {
        let ex = Extractor::new().unwrap();
        let got = ex.extract(Era::Current, CURRENT_PAGE.as_bytes());
        assert_eq!(got.failure_codes(), None);
        assert_eq!(got.text(), "Shaft and gear");
        // The old layout has none of the new sections
        let got = ex.extract(Era::Transitional, LEGACY_PAGE.as_bytes());
        assert_eq!(got.successes(), 0);
        assert_eq!(got.failure_codes(), Some("desc".to_string()));
        let got = ex.extract(Era::Legacy, CURRENT_PAGE.as_bytes());
        assert_eq!(got.failure_codes(), Some("abs claim desc".to_string()));
    }

    #[test]
    fn only_current_pages_must_be_utf8() {
        let ex = Extractor::new().unwrap();
        let mut page = CURRENT_PAGE.as_bytes().to_vec();
        page.insert(20, 0xff);
        assert_eq!(ex.extract(Era::Current, &page).failed, vec![Section::Description]);
        assert_eq!(ex.extract(Era::Transitional, &page).successes(), 1);
    }
}
