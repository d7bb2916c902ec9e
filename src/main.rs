use env_logger::{Builder, Env, Target};
use log::{error, info, warn};
use manga_crawler::{run, Cli, Settings};
use std::io::{self, BufRead, Write};
use std::process;
use tokio_util::sync::CancellationToken;

fn prompt_url() -> io::Result<String> {
    print!("Enter url: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() {
    // Parse Args
    let mut cli = Cli::new();

    // Init logging
    let level = if cli.verbose { "debug" } else { "info" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(level));
    builder.target(Target::Stdout);
    builder.init();

    // Parse Settings
    let settings = match Settings::new(&cli.config_file) {
        Ok(s) => s.merge_cli(&cli),
        Err(e) => {
            error!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    if cli.url.is_none() {
        match prompt_url() {
            Ok(url) if !url.is_empty() => cli.url = Some(url),
            Ok(_) => {
                error!("A chapter url is required");
                process::exit(1);
            }
            Err(e) => {
                error!("Unable to read url: {}", e);
                process::exit(1);
            }
        }
    }

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, letting running downloads finish");
            token.cancel();
        }
    });

    // Run
    match run(cli, settings, cancel).await {
        Ok(summary) => info!(
            "{} chapters downloaded ({} pages, {} failed), {} skipped, {} failed",
            summary.chapters_downloaded,
            summary.pages_written,
            summary.pages_failed,
            summary.chapters_skipped,
            summary.chapters_failed
        ),
        Err(e) => {
            error!("Application error: {}", e);
            process::exit(1);
        }
    }
}
