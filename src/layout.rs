//! The output directory is the only persisted state:
//!
//! ```text
//! {output}/cover.{ext}
//! {output}/chapters/{chapter}/{page}.{ext}
//! ```
//!
//! A chapter directory exists only once all of its pages were attempted.
//! Until then pages go to a hidden staging directory next to it.

use crate::{
    error::{CrawlError, Result},
    models::{Cover, Page},
};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Layout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn chapters_dir(&self) -> PathBuf {
        self.root.join("chapters")
    }

    pub fn chapter_dir(&self, number: &str) -> PathBuf {
        self.chapters_dir().join(number)
    }

    pub fn staging_dir(&self, number: &str) -> PathBuf {
        self.chapters_dir().join(format!(".{}.part", number))
    }

    pub fn cover_path(&self, cover: &Cover) -> PathBuf {
        self.root.join(cover.file_name())
    }

    pub fn page_path(dir: &Path, page: &Page) -> PathBuf {
        dir.join(page.file_name())
    }

    pub fn has_chapter(&self, number: &str) -> bool {
        self.chapter_dir(number).is_dir()
    }

    /// Any `cover.*` file in the root, whatever its extension.
    pub fn existing_cover(&self) -> Option<PathBuf> {
        std::fs::read_dir(&self.root)
            .ok()?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .find(|path| {
                path.is_file() && path.file_stem().map_or(false, |stem| stem == "cover")
            })
    }

    pub async fn prepare(&self) -> Result<()> {
        create_dir_all(&self.chapters_dir()).await
    }
}

pub async fn create_dir_all(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| CrawlError::fs(path, e))
}

/// Writes next to `path` under a temporary name and renames into place, so
/// an interrupted write never leaves a truncated file behind. `tag` keeps
/// concurrent writers of the same path apart.
pub async fn write_atomic(path: &Path, tag: usize, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{}.{}.part", file_name, tag));

    tokio::fs::write(&temp, bytes)
        .await
        .map_err(|e| CrawlError::fs(&temp, e))?;
    if let Err(e) = tokio::fs::rename(&temp, path).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(CrawlError::fs(path, e));
    }
    Ok(())
}

/// The series segment of a chapter url, e.g. `bleach` for
/// `https://comick.app/comic/bleach/AgV11-chapter-1-en`.
pub fn default_output_directory(url: &str) -> Option<String> {
    let path = url::Url::parse(url).ok()?;
    let segments: Vec<&str> = path.path_segments()?.filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        [.., series, _chapter] => Some(series.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn paths() {
        let layout = Layout::new("/tmp/bleach");
        let page = Page {
            number: "3".into(),
            file_extension: "png".into(),
            image_url: String::new(),
        };
        let cover = Cover {
            image_url: String::new(),
            file_extension: "jpg".into(),
        };

        assert_eq!(PathBuf::from("/tmp/bleach/chapters/10.5"), layout.chapter_dir("10.5"));
        assert_eq!(PathBuf::from("/tmp/bleach/chapters/.1.part"), layout.staging_dir("1"));
        assert_eq!(PathBuf::from("/tmp/bleach/cover.jpg"), layout.cover_path(&cover));
        assert_eq!(
            PathBuf::from("/tmp/bleach/chapters/1/3.png"),
            Layout::page_path(&layout.chapter_dir("1"), &page)
        );
    }

    #[test]
    fn output_directory_from_url() {
        assert_eq!(
            Some("bleach".to_string()),
            default_output_directory("https://comick.app/comic/bleach/AgV11-chapter-1-en")
        );
        assert_eq!(
            Some("bleach".to_string()),
            default_output_directory("https://comick.app/comic/bleach/AgV11-chapter-1-en/")
        );
        assert_eq!(None, default_output_directory("https://comick.app/"));
        assert_eq!(None, default_output_directory("not a url"));
    }

    #[tokio::test]
    async fn prepare_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path().join("out"));

        layout.prepare().await.unwrap();
        layout.prepare().await.unwrap();

        assert!(layout.chapters_dir().is_dir());
        assert!(!layout.has_chapter("1"));
        assert_eq!(None, layout.existing_cover());
    }

    #[test]
    fn cover_found_whatever_its_extension() {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path());
        std::fs::create_dir(tmp.path().join("cover")).unwrap();
        std::fs::write(tmp.path().join(".cover.jpg.0.part"), b"").unwrap();
        assert_eq!(None, layout.existing_cover());

        std::fs::write(tmp.path().join("cover.webp"), b"").unwrap();
        assert_eq!(Some(tmp.path().join("cover.webp")), layout.existing_cover());
    }

    #[tokio::test]
    async fn atomic_write_replaces_and_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("1.jpg");

        write_atomic(&path, 0, b"old").await.unwrap();
        write_atomic(&path, 1, b"new").await.unwrap();

        assert_eq!(b"new".to_vec(), std::fs::read(&path).unwrap());
        let entries = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(1, entries);
    }
}
