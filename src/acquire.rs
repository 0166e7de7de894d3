//! Downloading patent pages
//!
//! Pages land in `raw/<epoch>/<stem>/<pnum>.html` where the epoch is the year of the download.
//! The page layout changes over the years, so parsing later picks its rules by epoch. Anything
//! already downloaded in this epoch is skipped, so an interrupted download can just be rerun.
//!
//! A fixed pool of fetch workers pulls patent numbers; pages are handed over a channel to one
//! writer thread, which is the only thing that touches the disk. A failed fetch is logged and
//! forgotten: no retry, no backoff.
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::StatusCode;

use chrono::{Datelike, Local};

use crate::errors::*;
use crate::farm::new_farm_set;
use crate::layout::{self, Layout};
use crate::{Pnum, Year};

pub const DEFAULT_WORKERS: usize = 20;

/// How often (in patent numbers) to say where we are
const PROGRESS_EVERY: Pnum = 25_000;

const PATENT_URL: &str = "https://patents.google.com/patent/US";
const BROWSER_AGENT: &str = "Mozilla/5.0 (X11; U; Linux i686; en-US; rv:1.9.0.1) \
                             Gecko/2008071615 Fedora/3.0.1-1.fc9 Firefox/3.0.1";

/// New downloads go into the directory of the current calendar year
pub fn current_epoch() -> Year {
    Local::now().year()
}

/// Something that can get the raw page for a patent
pub trait Fetch: Sync {
    /// `Ok(None)` means the source answered but has no page for this patent.
    fn fetch(&self, pnum: Pnum) -> Result<Option<Vec<u8>>>;
}

/// Patent pages from Google Patents
pub struct GooglePatents {
    client: Client,
}

impl GooglePatents {
    pub fn new(timeout: Duration) -> Result<GooglePatents> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(GooglePatents { client })
    }
}

impl Fetch for GooglePatents {
    fn fetch(&self, pnum: Pnum) -> Result<Option<Vec<u8>>> {
        let response = self.client.get(&format!("{}{}", PATENT_URL, pnum)).send()?;
        if response.status() != StatusCode::OK {
            debug!("{} answered {}", pnum, response.status());
            return Ok(None);
        }
        Ok(Some(response.bytes()?.to_vec()))
    }
}

/// What happened to the patents we were asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DownloadReport {
    pub already_present: usize,
    pub fetched: usize,
    pub missing: usize,
    pub failed: usize,
}

/// Fetch every patent in `pnums` that isn't in this epoch yet
pub fn download<F: Fetch + ?Sized>(fetcher: &F, layout: &Layout, epoch: Year, pnums: &[Pnum],
                                    workers: usize)
    -> Result<DownloadReport> {
    let start = Instant::now();
    let stems = pnums.iter().map(|&p| layout::stem(p)).collect::<::std::collections::BTreeSet<_>>();
    for stem in &stems {
        fs::create_dir_all(layout.epoch_dir(epoch).join(stem))?;
    }

    // Duplicates would race each other to the same file
    let mut seen = new_farm_set();
    let unique: Vec<Pnum> = pnums.iter().cloned().filter(|p| seen.insert(*p)).collect();

    let already_present = AtomicUsize::new(0);
    let missing = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    let (pages, inbox) = crossbeam_channel::bounded::<(PathBuf, Vec<u8>)>(4 * workers.max(1));
    let writer = thread::spawn(move || {
        let mut written = 0;
        for (path, body) in inbox {
            // Write beside the target then rename, so a crash never leaves half a page behind
            let partial = layout::partial_path(&path);
            match fs::write(&partial, &body).and_then(|_| fs::rename(&partial, &path)) {
                Ok(()) => written += 1,
                Err(err) => error!("Couldn't save {}: {}", path.display(), err),
            }
        }
        written
    });

    let pool = ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|err| Error::Other(format!("Couldn't start {} fetch workers: {}", workers, err)))?;
    pool.install(|| {
        unique.par_iter().for_each_with(pages, |pages, &pnum| {
            let path = layout.html_path(epoch, pnum);
            if path.exists() {
                if pnum % PROGRESS_EVERY == 0 {
                    info!("Have        {}", pnum);
                }
                already_present.fetch_add(1, Ordering::Relaxed);
                return;
            }
            if pnum % PROGRESS_EVERY == 0 {
                info!("Looking for {}", pnum);
            }
            match fetcher.fetch(pnum) {
                Ok(Some(body)) => {
                    if pages.send((path, body)).is_err() {
                        error!("The page writer is gone, dropping {}", pnum);
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
                Ok(None) => {
                    missing.fetch_add(1, Ordering::Relaxed);
                }
                Err(err) => {
                    debug!("Fetching {} failed: {}", pnum, err);
                    failed.fetch_add(1, Ordering::Relaxed);
                }
            }
        });
    });

    let fetched = writer.join()
        .map_err(|_| Error::Other("The page writer panicked".to_string()))?;
    let report = DownloadReport {
        already_present: already_present.into_inner(),
        fetched,
        missing: missing.into_inner(),
        failed: failed.into_inner(),
    };
    info!("Downloaded {} pages into epoch {} ({} already there, {} not found, {} failed) in {}s",
          report.fetched, epoch, report.already_present, report.missing, report.failed,
          start.elapsed().as_secs() + 1);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serves pages from memory, refuses odd numbers above 100
    struct FakePatents {
        asked: Mutex<Vec<Pnum>>,
    }

    impl Fetch for FakePatents {
        fn fetch(&self, pnum: Pnum) -> Result<Option<Vec<u8>>> {
            self.asked.lock().unwrap().push(pnum);
            if pnum > 100 && pnum % 2 == 1 {
                Err(Error::Other("connection reset".into()))
            } else if pnum == 13 {
                Ok(None)
            } else {
                Ok(Some(format!("<html>{}</html>", pnum).into_bytes()))
            }
        }
    }

    #[test]
    fn fetches_what_is_missing_and_survives_failures() {
        let dir = ::tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let fake = FakePatents { asked: Mutex::new(vec![]) };
        fs::create_dir_all(layout.html_path(2021, 7).parent().unwrap()).unwrap();
        fs::write(layout.html_path(2021, 7), "old").unwrap();

        let pnums = vec![7, 8, 13, 101, 102, 8];
        let report = download(&fake, &layout, 2021, &pnums, 3).unwrap();
        assert_eq!(report, DownloadReport { already_present: 1, fetched: 2, missing: 1, failed: 1 });

        assert_eq!(fs::read_to_string(layout.html_path(2021, 7)).unwrap(), "old");
        assert_eq!(fs::read_to_string(layout.html_path(2021, 102)).unwrap(), "<html>102</html>");
        assert!(!layout.html_path(2021, 101).exists());
        assert!(!layout.html_path(2021, 13).exists());
        let mut asked = fake.asked.lock().unwrap().clone();
        asked.sort();
        assert_eq!(asked, vec![8, 13, 101, 102]);

        // Second time around only the failures are retried
        let again = download(&fake, &layout, 2021, &pnums, 3).unwrap();
        assert_eq!(again.already_present, 3);
        assert_eq!(again.fetched, 0);
    }

    #[test]
    fn epochs_are_separate() {
        let dir = ::tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let fake = FakePatents { asked: Mutex::new(vec![]) };
        download(&fake, &layout, 2020, &[8], 1).unwrap();
        let report = download(&fake, &layout, 2021, &[8], 1).unwrap();
        assert_eq!(report.fetched, 1);
        assert!(layout.html_path(2020, 8).exists());
        assert!(layout.html_path(2021, 8).exists());
    }
}
