//! The browser collaborator: navigate, query, click and read attributes.
//!
//! Crawling logic only sees the [`Session`] trait and plain [`Element`]
//! snapshots, so it can run against canned DOMs in tests.

use crate::error::{CrawlError, Result};
use async_trait::async_trait;
use chromiumoxide::{
    browser::{Browser, BrowserConfig},
    cdp::browser_protocol::network::{CookieParam, DeleteCookiesParams},
    Page,
};
use futures::StreamExt;
use log::{debug, info};
use std::collections::HashMap;
use tokio::{sync::Mutex, task::JoinHandle};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum By {
    TagName(String),
    ClassName(String),
    Css(String),
    XPath(String),
}

impl By {
    pub fn tag(name: &str) -> Self {
        By::TagName(name.to_string())
    }

    pub fn css(selector: &str) -> Self {
        By::Css(selector.to_string())
    }

    pub fn xpath(path: &str) -> Self {
        By::XPath(path.to_string())
    }

    /// CSS form of every selector kind except XPath.
    fn as_css(&self) -> Option<String> {
        match self {
            By::TagName(tag) => Some(tag.clone()),
            By::ClassName(class) => Some(format!(".{}", class)),
            By::Css(css) => Some(css.clone()),
            By::XPath(_) => None,
        }
    }
}

/// Snapshot of a DOM element: the attributes that were asked for plus its text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    attributes: HashMap<String, String>,
    text: String,
}

impl Element {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[async_trait]
pub trait Session: Send + Sync {
    async fn navigate(&mut self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    /// Every element matching `by`, in document order, reading only the
    /// named attributes.
    async fn find_elements(&self, by: &By, attributes: &[&str]) -> Result<Vec<Element>>;

    /// Clicks the first match, failing with `ElementNotFound` if there is none.
    async fn click(&mut self, by: &By) -> Result<()>;

    async fn add_cookie(&mut self, name: &str, value: &str) -> Result<()>;

    async fn delete_cookie(&mut self, name: &str) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub chrome_path: Option<String>,
}

/// A single Chrome/Chromium tab driven over the DevTools protocol.
pub struct ChromeSession {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
}

fn browser_error(e: impl ToString) -> CrawlError {
    CrawlError::Browser(e.to_string())
}

impl ChromeSession {
    pub async fn launch(options: &BrowserOptions) -> Result<Self> {
        info!("Opening web browser, please wait");

        let mut builder = BrowserConfig::builder().arg("--disable-gpu");
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(ref path) = options.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(CrawlError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(browser_error)?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        let page = browser.new_page("about:blank").await.map_err(browser_error)?;

        Ok(ChromeSession {
            browser: Mutex::new(browser),
            page,
            handler,
        })
    }

    async fn page_url(&self) -> Result<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(browser_error)?
            .unwrap_or_default())
    }

    async fn handles(&self, by: &By) -> Result<Vec<chromiumoxide::Element>> {
        let found = match (by, by.as_css()) {
            (_, Some(css)) => self.page.find_elements(css).await,
            (By::XPath(path), None) => self.page.find_xpaths(path.as_str()).await,
            (_, None) => Ok(Vec::new()),
        };
        found.map_err(browser_error)
    }
}

#[async_trait]
impl Session for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| CrawlError::fetch(url, e))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        self.page_url().await
    }

    async fn find_elements(&self, by: &By, attributes: &[&str]) -> Result<Vec<Element>> {
        let mut elements = Vec::new();

        for handle in self.handles(by).await? {
            let mut element = Element::new();
            for name in attributes {
                if let Some(value) = handle.attribute(*name).await.map_err(browser_error)? {
                    element = element.with_attribute(name, &value);
                }
            }
            let text = handle.inner_text().await.map_err(browser_error)?;
            elements.push(element.with_text(text.as_deref().unwrap_or_default().trim()));
        }

        Ok(elements)
    }

    async fn click(&mut self, by: &By) -> Result<()> {
        let handles = self
            .handles(by)
            .await
            .map_err(|_| CrawlError::ElementNotFound(format!("{:?}", by)))?;
        let first = handles
            .first()
            .ok_or_else(|| CrawlError::ElementNotFound(format!("{:?}", by)))?;

        first.click().await.map_err(browser_error)?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(browser_error)?;
        Ok(())
    }

    async fn add_cookie(&mut self, name: &str, value: &str) -> Result<()> {
        let cookie = CookieParam::builder()
            .name(name)
            .value(value)
            .url(self.page_url().await?)
            .build()
            .map_err(CrawlError::Browser)?;
        self.page.set_cookie(cookie).await.map_err(browser_error)?;
        Ok(())
    }

    async fn delete_cookie(&mut self, name: &str) -> Result<()> {
        let params = DeleteCookiesParams::builder()
            .name(name)
            .url(self.page_url().await?)
            .build()
            .map_err(CrawlError::Browser)?;
        self.page.delete_cookie(params).await.map_err(browser_error)?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        debug!("Closing web browser");
        let browser = self.browser.get_mut();
        browser.close().await.map_err(browser_error)?;
        browser.wait().await.map_err(browser_error)?;
        self.handler.abort();
        Ok(())
    }
}
