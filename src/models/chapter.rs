/// One content image of a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub number: String,
    pub file_extension: String,
    pub image_url: String,
}

impl Page {
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.number, self.file_extension)
    }
}

/// The distinguished image without a page number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cover {
    pub image_url: String,
    pub file_extension: String,
}

impl Cover {
    pub fn file_name(&self) -> String {
        format!("cover.{}", self.file_extension)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub id: String,
    /// Kept as text so values like `10.5` survive untouched. Also used as
    /// the chapter's directory name.
    pub number: String,
    pub url: String,
    pub pages: Vec<Page>,
}

impl Chapter {
    pub fn new(id: impl Into<String>, number: impl Into<String>, url: impl Into<String>) -> Self {
        Chapter {
            id: id.into(),
            number: number.into(),
            url: url.into(),
            pages: Vec::new(),
        }
    }
}

/// Result of scanning one chapter page for images.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedPages {
    pub pages: Vec<Page>,
    pub cover: Option<Cover>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        let page = Page {
            number: "12".into(),
            file_extension: "webp".into(),
            image_url: "https://meo.comick.pictures/12-abc.webp".into(),
        };
        assert_eq!("12.webp", page.file_name());

        let cover = Cover {
            image_url: "https://meo.comick.pictures/cover.png".into(),
            file_extension: "png".into(),
        };
        assert_eq!("cover.png", cover.file_name());
    }
}
