use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_SEARCH_URL: &str = "https://www.amazon.com/s/ref=nb_sb_noss?url=search-alias%3Daps";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL for {option}: {reason}")]
    InvalidUrl { option: &'static str, reason: String },
    #[error("Unknown format '{0}'. Use: json, csv, or text")]
    UnknownFormat(String),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "offer-crawler")]
#[command(about = "Crawl marketplace offers for every product a keyword search returns", long_about = None)]
pub struct Args {
    /// Search keyword
    pub keyword: String,

    /// Search page URL; the keyword is set as its `field-keywords` parameter
    #[arg(long, default_value = DEFAULT_SEARCH_URL)]
    pub search_url: String,

    /// Maximum number of pages processed at the same time
    #[arg(short = 'c', long, default_value = "50")]
    pub max_concurrency: usize,

    /// How many times a failed page is retried
    #[arg(long, default_value = "3")]
    pub max_retries: u32,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "30")]
    pub timeout: u64,

    /// Seconds to wait for content loaded by an interaction, such as the other-offers panel
    #[arg(short, long, default_value = "30")]
    pub wait_timeout: u64,

    /// Custom user agent
    #[arg(short, long)]
    pub user_agent: Option<String>,

    /// Proxy URL (e.g., http://proxy.example.com:8080)
    #[arg(short, long)]
    pub proxy: Option<String>,

    /// Directory for datasets and HTML snapshots
    #[arg(long, env = "CRAWLER_STORAGE_DIR", default_value = "./storage")]
    pub storage_dir: PathBuf,

    /// Publish snapshot locations as URLs under this base instead of file paths
    #[arg(long, env = "CRAWLER_SNAPSHOT_BASE_URL")]
    pub snapshot_base_url: Option<String>,

    /// Output format: json, csv, or text
    #[arg(short, long, default_value = "json")]
    pub format: String,

    /// Save output to file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    Text,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "text" | "txt" => Ok(OutputFormat::Text),
            other => Err(ConfigError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub timeout: Duration,
    pub wait_timeout: Duration,
    pub user_agent: String,
    pub proxy: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub path: Option<PathBuf>,
    pub quiet: bool,
}

/// Validated settings for one crawl.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub keyword: String,
    pub search_url: Url,
    pub max_concurrency: usize,
    pub max_retries: u32,
    pub storage_dir: PathBuf,
    pub snapshot_base_url: Option<Url>,
    pub browser: BrowserConfig,
    pub output: OutputConfig,
}

impl Args {
    /// Log filter implied by `--verbose` / `--quiet`.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }

    pub fn into_config(self) -> Result<CrawlerConfig, ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::Zero("--max-concurrency"));
        }

        let search_url = parse_url("--search-url", &self.search_url)?;
        let snapshot_base_url = self
            .snapshot_base_url
            .as_deref()
            .map(|raw| parse_url("--snapshot-base-url", raw))
            .transpose()?;
        if let Some(proxy) = &self.proxy {
            parse_url("--proxy", proxy)?;
        }

        Ok(CrawlerConfig {
            keyword: self.keyword,
            search_url,
            max_concurrency: self.max_concurrency,
            max_retries: self.max_retries,
            storage_dir: self.storage_dir,
            snapshot_base_url,
            browser: BrowserConfig {
                timeout: Duration::from_secs(self.timeout),
                wait_timeout: Duration::from_secs(self.wait_timeout),
                user_agent: self
                    .user_agent
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
                proxy: self.proxy,
            },
            output: OutputConfig {
                format: self.format.parse()?,
                path: self.output,
                quiet: self.quiet,
            },
        })
    }
}

fn parse_url(option: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        option,
        reason: format!("{raw}: {e}"),
    })
}
