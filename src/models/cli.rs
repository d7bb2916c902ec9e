use crate::configuration::Mode;
use clap::Parser;

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file, any format the config crate understands
    #[arg(short, long, default_value = "manga-crawler")]
    pub config_file: String,

    /// Chapter url to get the chapter list from (example: 'https://comick.app/comic/bleach/AgV11-chapter-1-en')
    #[arg(short, long)]
    pub url: Option<String>,

    /// Output directory (default: the manga name in the url)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Chapters to download: '1,2,3', '1,2,5-10', '1-10' or '*' for all
    #[arg(long, default_value = "*")]
    pub chapters: String,

    /// Download chapters again even if their directory exists
    #[arg(short, long, default_value_t = false)]
    pub force: bool,

    /// Stop walking after this chapter (walk mode)
    #[arg(long)]
    pub stop_after: Option<String>,

    /// Site access token injected as the `cf_clearance` cookie
    #[arg(long, env = "CF_CLEARANCE", hide_env_values = true)]
    pub cf_clearance: Option<String>,

    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    #[arg(long)]
    pub min_delay_ms: Option<u64>,

    #[arg(long)]
    pub max_delay_ms: Option<u64>,

    /// Concurrent page downloads per chapter
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Show the browser window
    #[arg(long, default_value_t = false)]
    pub headed: bool,

    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    pub fn new() -> Self {
        Cli::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}
