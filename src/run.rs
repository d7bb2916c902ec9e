use crate::{
    browser::{BrowserOptions, By, ChromeSession, Session},
    catalog::{Catalog, ChapterSource, ChapterWalk},
    configuration::{Mode, Settings},
    error::{CrawlError, Result},
    fetch::{Fetch, HttpFetcher},
    layout::{create_dir_all, default_output_directory, write_atomic, Layout},
    models::{Chapter, Cli, Cover, Page},
    pages::PageCollector,
    politeness::Politeness,
    selection::Selection,
};
use futures::{stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use resolve_path::PathResolveExt;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};
use tokio_util::sync::CancellationToken;
use url::Url;

const CF_CLEARANCE_COOKIE: &str = "cf_clearance";

/// Everything one crawl needs, resolved from CLI and settings.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub url: String,
    pub output: PathBuf,
    pub selection: Selection,
    pub force: bool,
    pub stop_after: Option<String>,
    pub cf_clearance: Option<String>,
    pub settings: Settings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub chapters_downloaded: usize,
    pub chapters_skipped: usize,
    pub chapters_failed: usize,
    pub pages_written: usize,
    pub pages_failed: usize,
    pub cover_written: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ChapterStats {
    written: usize,
    failed: usize,
}

/// Binary entry point: resolves options, owns the browser for the whole
/// run and closes it on every path out.
pub async fn run(
    cli: Cli,
    settings: Settings,
    cancel: CancellationToken,
) -> anyhow::Result<RunSummary> {
    let options = resolve_options(cli, settings)?;
    info!("Output Directory: {}", options.output.display());

    let referer = Url::parse(&options.url)?.origin().ascii_serialization() + "/";
    let fetcher = HttpFetcher::new(options.settings.max_retries, Some(referer.as_str()))?;

    let mut session = ChromeSession::launch(&BrowserOptions {
        headless: options.settings.headless,
        chrome_path: options.settings.chrome_path.clone(),
    })
    .await?;

    let result = crawl(&mut session, &fetcher, &options, &cancel).await;

    if let Err(e) = session.close().await {
        warn!("Unable to close browser: {}", e);
    }

    Ok(result?)
}

/// Chapter spec and url are validated before the browser starts.
pub fn resolve_options(cli: Cli, settings: Settings) -> anyhow::Result<RunOptions> {
    let url = match cli.url {
        Some(url) if !url.trim().is_empty() => url.trim().to_string(),
        _ => anyhow::bail!("A chapter url is required"),
    };
    Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid url '{}': {}", url, e))?;

    let selection: Selection = cli.chapters.parse()?;

    let output = match settings
        .output_directory
        .clone()
        .or_else(|| default_output_directory(&url))
    {
        Some(dir) => dir,
        None => anyhow::bail!("Unable to derive an output directory from {}", url),
    };
    let output = output.try_resolve()?.into_owned();

    Ok(RunOptions {
        url,
        output,
        selection,
        force: cli.force,
        stop_after: cli.stop_after,
        cf_clearance: cli.cf_clearance,
        settings,
    })
}

/// Discovers chapters through `session` and materializes the selected ones
/// below `options.output`.
///
/// Page and cover failures are logged and skipped, a chapter whose page
/// cannot be opened is skipped, while failing to build the chapter list
/// aborts the run.
pub async fn crawl(
    session: &mut dyn Session,
    fetcher: &dyn Fetch,
    options: &RunOptions,
    cancel: &CancellationToken,
) -> Result<RunSummary> {
    let settings = &options.settings;
    let politeness = Politeness::new(settings.min_delay_ms, settings.max_delay_ms);
    let layout = Layout::new(&options.output);
    layout.prepare().await?;

    open_entry_page(session, options).await?;

    let mut source: Box<dyn ChapterSource> = match settings.mode {
        Mode::Catalog => Box::new(
            Catalog::discover(
                session,
                &settings.chapter_select_css,
                &options.url,
                &options.selection,
                politeness,
            )
            .await?,
        ),
        Mode::Walk => Box::new(ChapterWalk::new(
            By::css(&settings.next_chapter_css),
            options.stop_after.clone(),
            politeness,
        )),
    };

    let collector = PageCollector::new(settings.asset_host_marker.as_str(), settings.mode.into());
    let downloader = Downloader {
        fetcher,
        layout: &layout,
        concurrency: settings.concurrency.max(1),
        cancel,
    };
    let mut summary = RunSummary::default();
    // One cover per series; a later chapter's cover replaces an earlier one
    let mut cover: Option<Cover> = None;

    loop {
        if cancel.is_cancelled() {
            info!("Stopping: {:?}", summary);
            return Err(CrawlError::Cancelled);
        }
        let mut chapter = match source.next_chapter(session).await? {
            Some(chapter) => chapter,
            None => break,
        };

        if !options.selection.contains(&chapter.number) {
            debug!("Chapter {} not selected", chapter.number);
            continue;
        }

        if layout.has_chapter(&chapter.number) && !options.force {
            info!("Chapter {} exists, skipping", chapter.number);
            summary.chapters_skipped += 1;
            continue;
        }

        info!("Collecting pages for chapter {}", chapter.number);
        let collected = match source.enter(session, &chapter).await {
            Ok(()) => collector.collect_from(session).await,
            Err(e) => Err(e),
        };
        let collected = match collected {
            Ok(collected) => collected,
            Err(e) => {
                error!("Unable to open chapter {}: {}, skipping", chapter.number, e);
                summary.chapters_failed += 1;
                continue;
            }
        };
        chapter.pages = collected.pages;
        if collected.cover.is_some() {
            cover = collected.cover;
        }

        let progress = chapter_progress(&chapter.number, chapter.pages.len());
        match downloader.download_chapter(&chapter, &progress).await {
            Ok(stats) => {
                summary.chapters_downloaded += 1;
                summary.pages_written += stats.written;
                summary.pages_failed += stats.failed;
            }
            Err(CrawlError::Cancelled) => {
                info!("Stopping in chapter {}: {:?}", chapter.number, summary);
                return Err(CrawlError::Cancelled);
            }
            Err(e) => {
                error!("Error creating chapter {}: {}", chapter.number, e);
                summary.chapters_failed += 1;
            }
        }
    }

    if let Some(cover) = cover {
        summary.cover_written = downloader.save_cover(&cover).await;
    }

    info!("Finished!");
    Ok(summary)
}

fn chapter_progress(number: &str, pages: usize) -> ProgressBar {
    let bar = ProgressBar::new(pages as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "Chapter {prefix} {percent:>3}% {bar:40.cyan/blue} {pos:>3}/{len:3} • {elapsed_precise} • {eta}",
    ) {
        bar.set_style(style);
    }
    bar.set_prefix(number.to_string());
    bar
}

/// Pages sharing a file name would overwrite each other; the last one in
/// reading order is kept.
fn distinct_pages<'a>(chapter: &str, pages: &'a [Page]) -> Vec<&'a Page> {
    let mut seen = HashSet::new();
    let mut kept: Vec<&Page> = pages
        .iter()
        .rev()
        .filter(|page| {
            let fresh = seen.insert(page.file_name());
            if !fresh {
                warn!(
                    "Chapter {}: dropping {} since a later image is also named {}",
                    chapter,
                    page.image_url,
                    page.file_name()
                );
            }
            fresh
        })
        .collect();
    kept.reverse();
    kept
}

/// Loads the entry url, injects the access cookie and gets past the age gate.
async fn open_entry_page(session: &mut dyn Session, options: &RunOptions) -> Result<()> {
    session.navigate(&options.url).await?;

    if let Some(ref token) = options.cf_clearance {
        debug!("Injecting {} cookie", CF_CLEARANCE_COOKIE);
        session.delete_cookie(CF_CLEARANCE_COOKIE).await?;
        session.add_cookie(CF_CLEARANCE_COOKIE, token).await?;
        session.navigate(&options.url).await?;
    }

    match session.click(&By::xpath(&options.settings.age_gate_xpath)).await {
        Ok(()) => info!("Skipping age verification"),
        Err(CrawlError::ElementNotFound(_)) => debug!("No age verification"),
        Err(e) => return Err(e),
    }

    Ok(())
}

struct Downloader<'a> {
    fetcher: &'a dyn Fetch,
    layout: &'a Layout,
    concurrency: usize,
    cancel: &'a CancellationToken,
}

impl Downloader<'_> {
    /// Never fetches a cover when any `cover.*` is already on disk.
    async fn save_cover(&self, cover: &Cover) -> bool {
        if let Some(existing) = self.layout.existing_cover() {
            debug!("Cover {} exists, skipping", existing.display());
            return false;
        }

        let path = self.layout.cover_path(cover);
        let saved = match self.fetcher.fetch(&cover.image_url).await {
            Ok(bytes) => write_atomic(&path, 0, &bytes).await,
            Err(e) => Err(e),
        };

        match saved {
            Ok(()) => {
                info!("Writing cover \"{}\"", path.display());
                true
            }
            Err(e) => {
                warn!("Unable to save cover: {}", e);
                false
            }
        }
    }

    /// Pages are fetched concurrently and overwrite whatever is on disk.
    async fn download_chapter(&self, chapter: &Chapter, progress: &ProgressBar) -> Result<ChapterStats> {
        let final_dir = self.layout.chapter_dir(&chapter.number);
        let dir = if final_dir.is_dir() {
            final_dir.clone()
        } else {
            self.layout.staging_dir(&chapter.number)
        };
        create_dir_all(&dir).await?;

        let pages = distinct_pages(&chapter.number, &chapter.pages);
        info!("Downloading chapter {} ({} pages)", chapter.number, pages.len());
        progress.set_length(pages.len() as u64);

        let dir_path = dir.as_path();
        let results: Vec<Result<()>> = stream::iter(pages.into_iter().enumerate())
            .map(move |(i, page)| async move {
                let result = self.download_page(dir_path, i, page).await;
                progress.inc(1);
                result
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        progress.finish();

        let mut stats = ChapterStats::default();
        for result in results {
            match result {
                Ok(()) => stats.written += 1,
                Err(e @ (CrawlError::FileSystem { .. } | CrawlError::Cancelled)) => return Err(e),
                Err(e) => {
                    warn!("Chapter {}: {}", chapter.number, e);
                    stats.failed += 1;
                }
            }
        }

        if dir != final_dir {
            tokio::fs::rename(&dir, &final_dir)
                .await
                .map_err(|e| CrawlError::fs(&final_dir, e))?;
        }

        info!(
            "Chapter {} done: {} written, {} failed",
            chapter.number, stats.written, stats.failed
        );
        Ok(stats)
    }

    async fn download_page(&self, dir: &Path, index: usize, page: &Page) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }

        let bytes = self.fetcher.fetch(&page.image_url).await?;
        let path = Layout::page_path(dir, page);
        debug!("Writing page \"{}\"", path.display());
        write_atomic(&path, index, &bytes).await
    }
}
