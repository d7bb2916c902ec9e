use crate::models::Cli;
use config::{Config, ConfigError};
use serde::Deserialize;

/// How chapters are discovered. Each mode fixes its own cover detector and
/// page-number fallback so the two are never mixed within one run.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Read the chapter dropdown once and visit every selected chapter.
    #[default]
    Catalog,
    /// Start at the given chapter and follow the "next chapter" link.
    Walk,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub output_directory: Option<String>,
    pub mode: Mode,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub concurrency: usize,
    pub max_retries: u32,
    pub headless: bool,
    pub chrome_path: Option<String>,
    pub asset_host_marker: String,
    pub age_gate_xpath: String,
    pub chapter_select_css: String,
    pub next_chapter_css: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            output_directory: None,
            mode: Mode::Catalog,
            min_delay_ms: 100,
            max_delay_ms: 900,
            concurrency: 4,
            max_retries: 3,
            headless: true,
            chrome_path: None,
            asset_host_marker: ".pictures/".into(),
            age_gate_xpath:
                "/html/body/div[2]/div/div/div/div[2]/div[2]/div/div/div/div[3]/div/button".into(),
            chapter_select_css: ".info-reader-container select".into(),
            next_chapter_css: "a[rel=\"next\"]".into(),
        }
    }
}

impl Settings {
    /// Settings file (optional) overlaid with `MANGA_CRAWLER_*` variables.
    pub fn new(config_file: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(config::File::with_name(config_file).required(false))
            .add_source(config::Environment::with_prefix("MANGA_CRAWLER").try_parsing(true))
            .build()?;
        builder.try_deserialize()
    }

    /// Command line flags win over anything read from file or environment.
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        if let Some(ref output) = cli.output {
            self.output_directory = Some(output.clone());
        }
        if let Some(mode) = cli.mode {
            self.mode = mode;
        }
        if let Some(ms) = cli.min_delay_ms {
            self.min_delay_ms = ms;
        }
        if let Some(ms) = cli.max_delay_ms {
            self.max_delay_ms = ms;
        }
        if let Some(n) = cli.concurrency {
            self.concurrency = n;
        }
        if cli.headed {
            self.headless = false;
        }
        self
    }
}
