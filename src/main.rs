//! zotero-tagger CLI: tag library items with language-model suggestions.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use miette::Result;
use tracing::{info, warn};

use zotero_tagger::config::{Config, ProcessingOptions, UrlMode};
use zotero_tagger::extract::HttpFetcher;
use zotero_tagger::library::ZoteroClient;
use zotero_tagger::logging::{self, DEFAULT_LOG_FILE};
use zotero_tagger::processor::ItemProcessor;
use zotero_tagger::run::{RunController, RunSummary};
use zotero_tagger::suggest::{AnthropicClient, LlmSuggester};
use zotero_tagger::tags::TagStore;
use zotero_tagger::TaggerResult;

#[derive(Parser, Debug)]
#[command(
    name = "zotero-tagger",
    version,
    about = "Automatically tag Zotero library items using Claude"
)]
struct Cli {
    /// Look up the item URL only when no PDF text was obtained.
    #[arg(short = 'u', long)]
    url_fallback: bool,

    /// Always look up the item URL (wins over --url-fallback).
    #[arg(short = 'U', long)]
    url_always: bool,

    /// Parse the first PDF attachment of each item.
    #[arg(short = 'p', long)]
    parse_pdf: bool,

    /// Text file with known tags, one per line. Updated as new tags appear.
    #[arg(short = 't', long, value_name = "PATH")]
    tags_file: Option<PathBuf>,

    /// Process at most this many items.
    #[arg(short = 'l', long, value_name = "N")]
    limit: Option<usize>,

    /// Tag items that have nothing but a title, with a conservative prompt.
    #[arg(long)]
    title_only: bool,

    /// Pause between items, in seconds.
    #[arg(long, value_name = "SECS", default_value = "1")]
    delay_secs: u64,

    /// Append-only log file.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,
}

impl Cli {
    fn options(&self) -> ProcessingOptions {
        ProcessingOptions {
            url_mode: UrlMode::from_flags(self.url_fallback, self.url_always),
            parse_pdf: self.parse_pdf,
            title_only: self.title_only,
            tags_file: self.tags_file.clone(),
            limit: self.limit,
            delay: Duration::from_secs(self.delay_secs),
        }
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();
    let _guard = logging::init(&cli.log_file)?;

    if cli.url_fallback && cli.url_always {
        warn!("both --url-fallback and --url-always given; --url-always wins");
    }
    let options = cli.options();

    let summary = run(&options)?;
    println!(
        "Processed {} items: {} updated, {} unchanged, {} skipped, {} failed",
        summary.processed, summary.updated, summary.unchanged, summary.skipped, summary.failed
    );
    Ok(())
}

/// Load configuration and tags, then tag the library.
fn run(options: &ProcessingOptions) -> TaggerResult<RunSummary> {
    let config = Config::from_env()?;
    info!(
        library = %config.library_id,
        library_type = %config.library_type,
        "configuration loaded"
    );

    let mut store = match &options.tags_file {
        Some(path) => TagStore::load(path)?,
        None => {
            info!("no tags file given; starting with an empty tag set");
            TagStore::in_memory()
        }
    };

    let library = ZoteroClient::new(&config);
    let fetcher = HttpFetcher::new(config.zotero_api_key.clone());
    let client = AnthropicClient::from_config(&config);
    info!(model = client.model(), "using language model");
    let suggester = LlmSuggester::new(client);

    let processor = ItemProcessor::new(&library, &fetcher, &suggester, options);
    let summary = RunController::new(&library, processor, options).run(&mut store)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_short_flags() {
        let cli = Cli::parse_from(["zotero-tagger", "-u", "-p", "-t", "tags.txt", "-l", "5"]);
        let options = cli.options();
        assert_eq!(options.url_mode, UrlMode::Fallback);
        assert!(options.parse_pdf);
        assert_eq!(options.tags_file, Some(PathBuf::from("tags.txt")));
        assert_eq!(options.limit, Some(5));
        assert_eq!(options.delay, Duration::from_secs(1));
        assert_eq!(cli.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn cli_url_always_wins() {
        let cli = Cli::parse_from(["zotero-tagger", "-u", "-U"]);
        assert_eq!(cli.options().url_mode, UrlMode::Always);
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["zotero-tagger"]);
        let options = cli.options();
        assert_eq!(options.url_mode, UrlMode::Never);
        assert!(!options.parse_pdf);
        assert!(!options.title_only);
        assert!(options.limit.is_none());
    }

    #[test]
    fn cli_rejects_bad_limit() {
        assert!(Cli::try_parse_from(["zotero-tagger", "-l", "five"]).is_err());
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
