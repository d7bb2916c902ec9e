//! Chapter discovery: the dropdown based catalog and the lazy
//! "next chapter" walk, both behind [`ChapterSource`].

use crate::{
    browser::{By, Session},
    error::{CrawlError, Result},
    identifiers::extract_chapter_number,
    models::Chapter,
    politeness::Politeness,
    selection::Selection,
};
use async_trait::async_trait;
use log::{debug, info};
use std::collections::{HashSet, VecDeque};

/// One `<option>` of the chapter dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub id: String,
    pub label: String,
}

impl ListingEntry {
    pub fn new(id: &str, label: &str) -> Self {
        ListingEntry {
            id: id.to_string(),
            label: label.to_string(),
        }
    }
}

/// A finite, non-restartable sequence of chapters.
#[async_trait]
pub trait ChapterSource: Send {
    /// The next chapter, or `None` once the source is exhausted.
    async fn next_chapter(&mut self, session: &mut dyn Session) -> Result<Option<Chapter>>;

    /// Leaves the session on `chapter`'s page.
    async fn enter(&mut self, session: &mut dyn Session, chapter: &Chapter) -> Result<()>;
}

/// `"Chapter 12"` gives `"12"`, a bare `"12"` is taken as is.
pub fn chapter_number_from_label(label: &str) -> String {
    let mut tokens = label.split_whitespace();
    let first = tokens.next().unwrap_or_default();
    tokens.next().unwrap_or(first).to_string()
}

/// Everything before the last path segment of a chapter url.
pub fn series_base_url(url: &str) -> &str {
    let url = url.trim_end_matches('/');
    url.rsplit_once('/').map_or(url, |(base, _)| base)
}

pub fn chapter_url(series_base: &str, id: &str, number: &str) -> String {
    format!("{}/{}-chapter-{}-en", series_base, id, number)
}

/// `".../AgV11-chapter-1-en"` gives `"AgV11"`.
pub fn chapter_id_from_url(url: &str) -> String {
    let segment = url.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    segment
        .split_once("-chapter-")
        .map_or(segment, |(id, _)| id)
        .to_string()
}

/// Options of the first dropdown only; other `<select>`s on the page carry
/// no chapters.
pub fn listing_options_css(select_css: &str) -> String {
    format!("{}:first-of-type option", select_css)
}

/// Reads the chapter dropdown of the current page. Missing dropdown is fatal
/// since nothing can be selected without it.
pub async fn read_listing(session: &dyn Session, select_css: &str) -> Result<Vec<ListingEntry>> {
    let selects = session.find_elements(&By::css(select_css), &[]).await?;
    if selects.is_empty() {
        return Err(CrawlError::ElementNotFound(format!(
            "chapter selector '{}'",
            select_css
        )));
    }

    let options = session
        .find_elements(&By::css(&listing_options_css(select_css)), &["value"])
        .await?;

    Ok(options
        .iter()
        .map(|o| ListingEntry::new(o.attribute("value").unwrap_or_default(), o.text()))
        .collect())
}

/// Listing comes newest first; the catalog is oldest first.
pub fn build_catalog(
    listing: &[ListingEntry],
    series_url: &str,
    selection: &Selection,
) -> Result<Vec<Chapter>> {
    let base = series_base_url(series_url);
    let mut seen = HashSet::new();
    let mut chapters = Vec::new();

    for entry in listing.iter().rev() {
        // Placeholder options have no value
        if entry.id.is_empty() {
            continue;
        }

        let number = chapter_number_from_label(&entry.label);
        if !selection.contains(&number) {
            continue;
        }

        if !seen.insert(number.clone()) {
            return Err(CrawlError::InvalidSpecification(format!(
                "chapter {} is listed more than once",
                number
            )));
        }

        let url = chapter_url(base, &entry.id, &number);
        chapters.push(Chapter::new(entry.id.as_str(), number, url));
    }

    Ok(chapters)
}

/// Chapters known up front; each one is navigated to when entered.
pub struct Catalog {
    chapters: VecDeque<Chapter>,
    politeness: Politeness,
}

impl Catalog {
    pub fn new(chapters: Vec<Chapter>, politeness: Politeness) -> Self {
        Catalog {
            chapters: chapters.into(),
            politeness,
        }
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// Reads the dropdown of the page the session is on.
    pub async fn discover(
        session: &dyn Session,
        select_css: &str,
        series_url: &str,
        selection: &Selection,
        politeness: Politeness,
    ) -> Result<Self> {
        info!("Collecting chapters");
        let listing = read_listing(session, select_css).await?;
        let chapters = build_catalog(&listing, series_url, selection)?;
        info!(
            "{} of {} listed chapters selected",
            chapters.len(),
            listing.len()
        );
        Ok(Catalog::new(chapters, politeness))
    }
}

#[async_trait]
impl ChapterSource for Catalog {
    async fn next_chapter(&mut self, _session: &mut dyn Session) -> Result<Option<Chapter>> {
        Ok(self.chapters.pop_front())
    }

    async fn enter(&mut self, session: &mut dyn Session, chapter: &Chapter) -> Result<()> {
        self.politeness.pause().await;
        session.navigate(&chapter.url).await
    }
}

/// Discovers chapters one at a time by following the "next chapter" link,
/// starting from the page the session is on.
pub struct ChapterWalk {
    next_link: By,
    stop_after: Option<String>,
    politeness: Politeness,
    current: Option<Chapter>,
    finished: bool,
}

impl ChapterWalk {
    pub fn new(next_link: By, stop_after: Option<String>, politeness: Politeness) -> Self {
        ChapterWalk {
            next_link,
            stop_after,
            politeness,
            current: None,
            finished: false,
        }
    }

    fn finish(&mut self, reason: &str) -> Result<Option<Chapter>> {
        info!("Walk finished: {}", reason);
        self.finished = true;
        Ok(None)
    }
}

#[async_trait]
impl ChapterSource for ChapterWalk {
    async fn next_chapter(&mut self, session: &mut dyn Session) -> Result<Option<Chapter>> {
        if self.finished {
            return Ok(None);
        }

        if let Some(ref current) = self.current {
            if self.stop_after.as_deref() == Some(current.number.as_str()) {
                let reason = format!("reached chapter {}", current.number);
                return self.finish(&reason);
            }

            self.politeness.pause().await;
            match session.click(&self.next_link).await {
                Ok(()) => {}
                Err(CrawlError::ElementNotFound(_)) => return self.finish("no next chapter"),
                Err(e) => return Err(e),
            }
        }

        let url = session.current_url().await?;
        if self.current.as_ref().map(|c| c.url.as_str()) == Some(url.as_str()) {
            return self.finish("next chapter link did not move");
        }

        let chapter = Chapter::new(
            chapter_id_from_url(&url),
            extract_chapter_number(&url),
            url,
        );
        debug!("Walked to chapter {} at {}", chapter.number, chapter.url);
        self.current = Some(chapter.clone());

        Ok(Some(chapter))
    }

    async fn enter(&mut self, _session: &mut dyn Session, _chapter: &Chapter) -> Result<()> {
        Ok(())
    }
}
