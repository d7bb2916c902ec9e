pub mod chapter;
pub mod cli;

pub use chapter::{Chapter, CollectedPages, Cover, Page};
pub use cli::Cli;
