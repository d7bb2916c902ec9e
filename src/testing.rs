//! In-memory stand-ins for the browser and the image host.

use crate::{
    browser::{By, Element, Session},
    catalog::listing_options_css,
    error::{CrawlError, Result},
    fetch::Fetch,
};
use async_trait::async_trait;
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

/// Canned DOM snapshots keyed by page url.
#[derive(Debug, Default)]
pub struct FakeSession {
    current: String,
    elements: HashMap<(String, By), Vec<Element>>,
    links: HashMap<(String, By), String>,
    broken: HashSet<String>,
    pub navigations: Vec<String>,
    pub cookies: HashMap<String, String>,
    pub closed: bool,
}

impl FakeSession {
    pub fn new(start_url: &str) -> Self {
        FakeSession {
            current: start_url.to_string(),
            ..Default::default()
        }
    }

    pub fn with_elements(mut self, url: &str, by: By, elements: Vec<Element>) -> Self {
        self.elements.insert((url.to_string(), by), elements);
        self
    }

    /// Chapter dropdown on the start page.
    pub fn with_listing(self, select_css: &str, options: &[(&str, &str)]) -> Self {
        let start = self.current.clone();
        let options = options
            .iter()
            .map(|(id, label)| Element::new().with_attribute("value", id).with_text(label))
            .collect();
        self.with_elements(&start, By::css(select_css), vec![Element::new()])
            .with_elements(&start, By::css(&listing_options_css(select_css)), options)
    }

    /// `<img>` tags of a page as (src, alt) pairs.
    pub fn with_images(self, url: &str, images: &[(&str, &str)]) -> Self {
        let images = images
            .iter()
            .map(|(src, alt)| Element::new().with_attribute("src", src).with_attribute("alt", alt))
            .collect();
        self.with_elements(url, By::tag("img"), images)
    }

    /// Clicking `by` on `url` navigates to `target`.
    pub fn with_link(mut self, url: &str, by: By, target: &str) -> Self {
        self.links.insert((url.to_string(), by.clone()), target.to_string());
        self.with_elements(url, by, vec![Element::new()])
    }

    /// Navigating to `url` fails.
    pub fn with_broken_page(mut self, url: &str) -> Self {
        self.broken.insert(url.to_string());
        self
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.navigations.push(url.to_string());
        if self.broken.contains(url) {
            return Err(CrawlError::fetch(url, "connection reset"));
        }
        self.current = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.current.clone())
    }

    async fn find_elements(&self, by: &By, _attributes: &[&str]) -> Result<Vec<Element>> {
        Ok(self
            .elements
            .get(&(self.current.clone(), by.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn click(&mut self, by: &By) -> Result<()> {
        let target = self
            .links
            .get(&(self.current.clone(), by.clone()))
            .cloned()
            .ok_or_else(|| CrawlError::ElementNotFound(format!("{:?}", by)))?;
        self.current = target;
        Ok(())
    }

    async fn add_cookie(&mut self, name: &str, value: &str) -> Result<()> {
        self.cookies.insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_cookie(&mut self, name: &str) -> Result<()> {
        self.cookies.remove(name);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Serves bytes per url and records every request.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    bodies: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: &[u8]) -> Self {
        self.bodies.insert(url.to_string(), body.to_vec());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetch for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_string());
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| CrawlError::fetch(url, "404 Not Found"))
    }
}
