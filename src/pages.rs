//! Sorts the images of a chapter page into numbered pages and a cover.

use crate::{
    browser::{By, Element, Session},
    configuration::Mode,
    error::Result,
    identifiers::{
        extract_file_extension, extract_page_number, is_cover_image, COVER_SENTINEL,
        UNNUMBERED_PAGE,
    },
    models::{CollectedPages, Cover, Page},
};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverDetector {
    /// No `page N` in the alt text.
    AltText,
    /// The src does not look like a numbered asset, see [`is_cover_image`].
    UrlShape,
}

impl From<Mode> for CoverDetector {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Catalog => CoverDetector::AltText,
            Mode::Walk => CoverDetector::UrlShape,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageCollector {
    asset_host_marker: String,
    detector: CoverDetector,
}

impl PageCollector {
    pub fn new(asset_host_marker: impl Into<String>, detector: CoverDetector) -> Self {
        PageCollector {
            asset_host_marker: asset_host_marker.into(),
            detector,
        }
    }

    /// Queries every `<img>` of the current page.
    pub async fn collect_from(&self, session: &dyn Session) -> Result<CollectedPages> {
        let images = session.find_elements(&By::tag("img"), &["src", "alt"]).await?;
        Ok(self.collect(&images))
    }

    /// Keeps DOM order for pages. When several images qualify as cover the
    /// last one wins.
    pub fn collect(&self, images: &[Element]) -> CollectedPages {
        let mut collected = CollectedPages::default();

        for image in images {
            let src = match image.attribute("src") {
                Some(src) if src.contains(self.asset_host_marker.as_str()) => src,
                _ => continue,
            };
            // Images without alt text are decoration
            let alt = match image.attribute("alt") {
                Some(alt) if !alt.is_empty() => alt,
                _ => continue,
            };

            let file_extension = extract_file_extension(src);
            let (is_cover, number) = match self.detector {
                CoverDetector::AltText => {
                    let number = extract_page_number(alt, COVER_SENTINEL);
                    (number == COVER_SENTINEL, number)
                }
                CoverDetector::UrlShape => {
                    (is_cover_image(src), extract_page_number(alt, UNNUMBERED_PAGE))
                }
            };

            if is_cover {
                debug!("Found cover {}", src);
                collected.cover = Some(Cover {
                    image_url: src.to_string(),
                    file_extension,
                });
                continue;
            }

            collected.pages.push(Page {
                number,
                file_extension,
                image_url: src.to_string(),
            });
        }

        collected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "https://meo.comick.pictures/";

    fn img(src: &str, alt: &str) -> Element {
        Element::new().with_attribute("src", src).with_attribute("alt", alt)
    }

    fn catalog() -> PageCollector {
        PageCollector::new(".pictures/", CoverDetector::AltText)
    }

    #[test]
    fn pages_in_dom_order() {
        let images = vec![
            img(&format!("{HOST}2-b.png"), "Bleach page 2"),
            img(&format!("{HOST}1-a.jpg"), "Bleach page 1"),
        ];
        let collected = catalog().collect(&images);

        let numbers: Vec<&str> = collected.pages.iter().map(|p| p.number.as_str()).collect();
        assert_eq!(vec!["2", "1"], numbers);
        assert_eq!("png", collected.pages[0].file_extension);
        assert_eq!(format!("{HOST}1-a.jpg"), collected.pages[1].image_url);
        assert_eq!(None, collected.cover);
    }

    #[test]
    fn filters_foreign_and_undescribed_images() {
        let images = vec![
            img("https://comick.app/static/logo.png", "page 1"),
            Element::new().with_attribute("src", &format!("{HOST}1-a.jpg")),
            img(&format!("{HOST}2-a.jpg"), ""),
            Element::new().with_attribute("alt", "page 3"),
            img(&format!("{HOST}4-a.jpg"), "page 4"),
        ];
        let collected = catalog().collect(&images);

        assert_eq!(1, collected.pages.len());
        assert_eq!("4", collected.pages[0].number);
    }

    #[test]
    fn alt_text_cover_last_wins() {
        let images = vec![
            img(&format!("{HOST}first.jpg"), "cover"),
            img(&format!("{HOST}1-a.jpg"), "page 1"),
            img(&format!("{HOST}second.webp"), "Bleach cover"),
        ];
        let collected = catalog().collect(&images);

        assert_eq!(1, collected.pages.len());
        assert_eq!(
            Some(Cover {
                image_url: format!("{HOST}second.webp"),
                file_extension: "webp".into(),
            }),
            collected.cover
        );
    }

    #[test]
    fn url_shape_cover() {
        let collector = PageCollector::new(".pictures/", CoverDetector::UrlShape);
        let images = vec![
            img(&format!("{HOST}cover.jpg"), "page 9"),
            img(&format!("{HOST}1-a.jpg"), "page 1"),
            img(&format!("{HOST}2-a.jpg"), "credits"),
        ];
        let collected = collector.collect(&images);

        assert_eq!(format!("{HOST}cover.jpg"), collected.cover.unwrap().image_url);
        let numbers: Vec<&str> = collected.pages.iter().map(|p| p.number.as_str()).collect();
        assert_eq!(vec!["1", UNNUMBERED_PAGE], numbers);
    }

    #[test]
    fn detector_follows_mode() {
        assert_eq!(CoverDetector::AltText, Mode::Catalog.into());
        assert_eq!(CoverDetector::UrlShape, Mode::Walk.into());
    }
}
