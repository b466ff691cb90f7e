use crate::error::{NewsCrawlError, Result};
use crate::output::batch_writer::STAGED_PREFIX;
use crate::schedule::IntervalField;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const TIMESTAMP_PLACEHOLDER: &str = "{timestamp}";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub schedule: ScheduleConfig,
    pub filters: FilterConfig,
    pub output: OutputConfig,
    pub feed: FeedConfig,
    pub article: ArticleConfig,
    pub logging: LoggingConfig,
}

/// Candidate sets whose cartesian product defines the intervals to crawl.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub years: Vec<u32>,
    pub months: Vec<u32>,
    pub days: Vec<u32>,
    pub hours: Vec<u32>,
    pub minutes: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Allowed source domains. Empty admits every domain.
    pub sources: Vec<String>,
    /// Allowed original-language codes. Always enforced.
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub out_dir: PathBuf,
    pub tmp_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedConfig {
    pub url_template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers_file: Option<PathBuf>,
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArticleConfig {
    pub timeout: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: PathBuf,
    pub level: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            years: vec![2021],
            months: vec![1],
            days: vec![1],
            hours: (0..24).collect(),
            minutes: vec![0, 15, 30, 45], // GDELT publishes every 15 minutes
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            languages: vec!["eng".to_string()],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("data"),
            tmp_dir: PathBuf::from("tmp"),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url_template: format!(
                "http://data.gdeltproject.org/gdeltv2/{}.translation.gkg.csv.zip",
                TIMESTAMP_PLACEHOLDER
            ),
            headers_file: None,
            timeout: 60,
        }
    }
}

impl Default for ArticleConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: format!("newscrawl/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("newscrawl.log"),
            level: "info".to_string(),
        }
    }
}

/// Flat layout of the `config.json` files used by earlier crawler deployments.
#[derive(Debug, Deserialize)]
struct LegacyConfig {
    years: Vec<u32>,
    months: Vec<u32>,
    days: Vec<u32>,
    hours: Vec<u32>,
    minutes: Vec<u32>,
    #[serde(default)]
    sources: Vec<String>,
    languages: Vec<String>,
    out_dir: PathBuf,
    tmp_dir: PathBuf,
}

impl From<LegacyConfig> for Config {
    fn from(legacy: LegacyConfig) -> Self {
        Self {
            schedule: ScheduleConfig {
                years: legacy.years,
                months: legacy.months,
                days: legacy.days,
                hours: legacy.hours,
                minutes: legacy.minutes,
            },
            filters: FilterConfig {
                sources: legacy.sources,
                languages: legacy.languages,
            },
            output: OutputConfig {
                out_dir: legacy.out_dir,
                tmp_dir: legacy.tmp_dir,
            },
            ..Self::default()
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(NewsCrawlError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| NewsCrawlError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            let legacy: LegacyConfig =
                serde_json::from_str(&content).map_err(|e| NewsCrawlError::Config {
                    message: format!("Failed to parse config file {}: {}", path.display(), e),
                })?;
            return Ok(legacy.into());
        }

        let config: Config = toml::from_str(&content).map_err(|e| NewsCrawlError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["newscrawl.toml", ".newscrawl.toml", "config.json"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref out_dir) = cli_args.out_dir {
            self.output.out_dir = out_dir.clone();
        }

        if let Some(ref tmp_dir) = cli_args.tmp_dir {
            self.output.tmp_dir = tmp_dir.clone();
        }

        if let Some(ref sources) = cli_args.sources {
            self.filters.sources = normalize_list(sources);
        }

        if let Some(ref languages) = cli_args.languages {
            self.filters.languages = normalize_list(languages);
        }

        if let Some(ref headers_file) = cli_args.headers_file {
            self.feed.headers_file = Some(headers_file.clone());
        }

        if let Some(ref log_file) = cli_args.log_file {
            self.logging.file = log_file.clone();
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| NewsCrawlError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| NewsCrawlError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let schedule = &self.schedule;
        let sets = [
            (IntervalField::Year, &schedule.years),
            (IntervalField::Month, &schedule.months),
            (IntervalField::Day, &schedule.days),
            (IntervalField::Hour, &schedule.hours),
            (IntervalField::Minute, &schedule.minutes),
        ];

        for (field, values) in sets {
            if values.is_empty() {
                return Err(NewsCrawlError::Config {
                    message: format!("At least one {} must be specified", field.name()),
                });
            }
            for &value in values {
                field.check(value)?;
            }
        }

        if self.filters.languages.is_empty() {
            return Err(NewsCrawlError::Config {
                message: "At least one language must be specified".to_string(),
            });
        }

        if !self.feed.url_template.contains(TIMESTAMP_PLACEHOLDER) {
            return Err(NewsCrawlError::Config {
                message: format!(
                    "Feed URL template must contain {}: {}",
                    TIMESTAMP_PLACEHOLDER, self.feed.url_template
                ),
            });
        }

        if self.feed.timeout == 0 || self.article.timeout == 0 {
            return Err(NewsCrawlError::Config {
                message: "Timeouts must be greater than 0".to_string(),
            });
        }

        if let Some(ref headers_file) = self.feed.headers_file {
            if !headers_file.is_file() {
                return Err(NewsCrawlError::Config {
                    message: format!("Header file not found: {}", headers_file.display()),
                });
            }
        }

        Ok(())
    }

    /// Create the output and scratch directories when missing, and remove
    /// files an interrupted run left behind in them.
    pub fn prepare_directories(&self) -> Result<()> {
        for dir in [&self.output.out_dir, &self.output.tmp_dir] {
            std::fs::create_dir_all(dir).map_err(|e| NewsCrawlError::Config {
                message: format!("Cannot create directory {}: {}", dir.display(), e),
            })?;
        }

        remove_leftovers(&self.output.out_dir, |name| {
            name.starts_with(STAGED_PREFIX) && name.ends_with(".csv")
        })?;
        remove_leftovers(&self.output.tmp_dir, |name| SCRATCH_ARCHIVE.is_match(name))?;
        Ok(())
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

/// `<timestamp>-<random>.zip`, as downloaded into `tmp_dir`.
static SCRATCH_ARCHIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{14}-.+\.zip$").expect("static pattern is valid"));

fn remove_leftovers(dir: &Path, is_leftover: impl Fn(&str) -> bool) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if !name.to_str().is_some_and(&is_leftover) || !entry.file_type()?.is_file() {
            continue;
        }

        std::fs::remove_file(entry.path())?;
        info!("removed leftover file {}", entry.path().display());
    }
    Ok(())
}

fn normalize_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub out_dir: Option<PathBuf>,
    pub tmp_dir: Option<PathBuf>,
    pub sources: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub headers_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_out_dir(mut self, out_dir: Option<PathBuf>) -> Self {
        self.out_dir = out_dir;
        self
    }

    pub fn with_tmp_dir(mut self, tmp_dir: Option<PathBuf>) -> Self {
        self.tmp_dir = tmp_dir;
        self
    }

    pub fn with_sources(mut self, sources: Option<Vec<String>>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_languages(mut self, languages: Option<Vec<String>>) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_headers_file(mut self, headers_file: Option<PathBuf>) -> Self {
        self.headers_file = headers_file;
        self
    }

    pub fn with_log_file(mut self, log_file: Option<PathBuf>) -> Self {
        self.log_file = log_file;
        self
    }
}
