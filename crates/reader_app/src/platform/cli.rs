use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use reader_engine::ReaderConfig;

use super::logging::LogDestination;

/// Turns a saved web page into its reading-mode rendition.
#[derive(Debug, Parser)]
#[command(name = "reader_app", version)]
pub struct Cli {
    /// Saved HTML page to open.
    #[arg(long)]
    pub input: PathBuf,

    /// Address the page was saved from; drives the URL suitability rules.
    #[arg(long)]
    pub url: String,

    /// Where to write the page markup after activation (stdout when omitted).
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Also export the reader content as Markdown.
    #[arg(long)]
    pub markdown: Option<PathBuf>,

    /// Print an AI summary of the article.
    #[arg(long)]
    pub summarize: bool,

    /// Directory holding persisted settings and the API key.
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// Store this summarization API key before running.
    #[arg(long)]
    pub api_key: Option<String>,

    #[arg(long, value_enum, default_value_t = LogTarget::Terminal)]
    pub log: LogTarget,

    /// Skip the image preload wait of the first activation.
    #[arg(long)]
    pub no_preload_delay: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

impl Cli {
    pub fn reader_config(&self) -> ReaderConfig {
        let config = ReaderConfig::default();
        if self.no_preload_delay {
            config.without_preload_delay()
        } else {
            config
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn minimal_invocation_uses_defaults() {
        let args = ["reader_app", "--input", "page.html", "--url", "https://a.b/c"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.log, LogTarget::Terminal);
        assert!(!cli.summarize);
        assert_eq!(cli.reader_config().preload_delay, Duration::from_millis(1500));
    }

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::try_parse_from([
            "reader_app",
            "--input",
            "page.html",
            "--url",
            "https://a.b/c",
            "--log",
            "both",
            "--no-preload-delay",
            "--markdown",
            "out.md",
        ])
        .unwrap();
        assert_eq!(LogDestination::from(cli.log), LogDestination::Both);
        assert_eq!(cli.reader_config().preload_delay, Duration::ZERO);
        assert_eq!(cli.markdown, Some(PathBuf::from("out.md")));
    }

    #[test]
    fn url_is_required() {
        assert!(Cli::try_parse_from(["reader_app", "--input", "page.html"]).is_err());
    }
}
