use crate::error::{Error, Result};
use crate::parser::Tier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration, read from `strata.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub scan: ScanConfig,
    pub heuristic: HeuristicConfig,
    pub output: OutputConfig,
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,
}

/// Directory scan settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Glob patterns, matched against paths relative to the scan root
    pub exclude: Vec<String>,
    /// Files handled per batch
    pub chunk_size: usize,
    /// Only process high-priority files
    pub priority_only: bool,
    /// Stop after this many files
    pub max_files: Option<usize>,
    pub follow_links: bool,
}

/// Limits for the C# text heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    /// Above this size, files get the partial tier
    pub medium_file_bytes: usize,
    /// Above this size, files get the minimal tier
    pub large_file_bytes: usize,
    /// Lines read at the minimal tier
    pub minimal_line_limit: usize,
    pub partial_method_limit: usize,
    pub partial_constant_limit: usize,
    /// Soft per-file budget
    pub time_budget_ms: u64,
    pub tier: TierChoice,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Write the report here instead of stdout
    pub path: Option<PathBuf>,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    #[default]
    Summary,
    /// Files grouped by their documentation folder
    Layout,
}

/// Tier selection for C# files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TierChoice {
    /// Choose by file size
    #[default]
    Auto,
    Minimal,
    Partial,
    Full,
}

impl TierChoice {
    /// The forced tier, or `None` for size-based selection
    pub fn forced(&self) -> Option<Tier> {
        match self {
            TierChoice::Auto => None,
            TierChoice::Minimal => Some(Tier::Minimal),
            TierChoice::Partial => Some(Tier::Partial),
            TierChoice::Full => Some(Tier::Full),
        }
    }
}

impl std::str::FromStr for TierChoice {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(TierChoice::Auto);
        }
        Ok(match s.parse::<Tier>()? {
            Tier::Minimal => TierChoice::Minimal,
            Tier::Partial => TierChoice::Partial,
            Tier::Full => TierChoice::Full,
        })
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "Untitled Project".to_string(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude: vec!["**/*.Designer.cs".to_string()],
            chunk_size: 50,
            priority_only: false,
            max_files: None,
            follow_links: false,
        }
    }
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            medium_file_bytes: 50_000,
            large_file_bytes: 150_000,
            minimal_line_limit: 400,
            partial_method_limit: 5,
            partial_constant_limit: 20,
            time_budget_ms: 2_000,
            tier: TierChoice::Auto,
        }
    }
}

impl HeuristicConfig {
    /// Tier for a file of `bytes` bytes when none is forced
    pub fn tier_for_size(&self, bytes: usize) -> Tier {
        if bytes > self.large_file_bytes {
            Tier::Minimal
        } else if bytes > self.medium_file_bytes {
            Tier::Partial
        } else {
            Tier::Full
        }
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            path: None,
        }
    }
}

/// Command-line overrides applied on top of the file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub exclude: Vec<String>,
    pub tier: Option<TierChoice>,
    pub chunk_size: Option<usize>,
    pub priority_only: bool,
    pub max_files: Option<usize>,
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: CliOverrides) {
        if let Some(out) = cli.output {
            self.output.path = Some(out);
        }

        if let Some(format) = cli.format {
            self.output.format = format;
        }

        if !cli.exclude.is_empty() {
            self.scan.exclude.extend(cli.exclude);
        }

        if let Some(tier) = cli.tier {
            self.heuristic.tier = tier;
        }

        if let Some(size) = cli.chunk_size {
            self.scan.chunk_size = size;
        }

        if cli.priority_only {
            self.scan.priority_only = true;
        }

        if cli.max_files.is_some() {
            self.scan.max_files = cli.max_files;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.scan.chunk_size == 0 {
            return Err(Error::config_validation("chunk_size must be at least 1"));
        }

        if self.scan.max_files == Some(0) {
            return Err(Error::config_validation("max_files must be at least 1"));
        }

        if self.heuristic.medium_file_bytes >= self.heuristic.large_file_bytes {
            return Err(Error::config_validation(
                "medium_file_bytes must be smaller than large_file_bytes",
            ));
        }

        if self.heuristic.minimal_line_limit == 0 {
            return Err(Error::config_validation("minimal_line_limit must be at least 1"));
        }

        if self.heuristic.time_budget_ms == 0 {
            return Err(Error::config_validation("time_budget_ms must be at least 1"));
        }

        for pattern in &self.scan.exclude {
            glob::Pattern::new(pattern)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.project.name, "Untitled Project");
        assert_eq!(config.scan.chunk_size, 50);
        assert_eq!(config.heuristic.medium_file_bytes, 50_000);
        assert_eq!(config.heuristic.large_file_bytes, 150_000);
        assert_eq!(config.heuristic.tier, TierChoice::Auto);
        assert_eq!(config.output.format, OutputFormat::Summary);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[project]
name = "Billing"

[scan]
chunk_size = 10
priority_only = true
exclude = ["legacy/**"]

[heuristic]
tier = "partial"
time_budget_ms = 500

[output]
format = "json"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.project.name, "Billing");
        assert_eq!(config.scan.chunk_size, 10);
        assert!(config.scan.priority_only);
        assert_eq!(config.scan.exclude, vec!["legacy/**"]);
        assert_eq!(config.heuristic.tier, TierChoice::Partial);
        assert_eq!(config.heuristic.time_budget(), Duration::from_millis(500));
        assert_eq!(config.heuristic.partial_method_limit, 5);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/strata.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[scan]\nchunk_size = 0").unwrap();
        let result = Config::load(file.path());
        assert!(matches!(result, Err(Error::ConfigValidation(_))));
    }

    #[test]
    fn test_validation_chunk_size_zero() {
        let mut config = Config::default();
        config.scan.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_thresholds_out_of_order() {
        let mut config = Config::default();
        config.heuristic.medium_file_bytes = 200_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_bad_glob() {
        let mut config = Config::default();
        config.scan.exclude.push("[unclosed".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_cli() {
        let mut config = Config::default();
        config.merge_cli(CliOverrides {
            output: Some(PathBuf::from("report.json")),
            format: Some(OutputFormat::Layout),
            exclude: vec!["gen/**".to_string()],
            tier: Some(TierChoice::Full),
            chunk_size: Some(5),
            priority_only: true,
            max_files: Some(100),
        });

        assert_eq!(config.output.path, Some(PathBuf::from("report.json")));
        assert_eq!(config.output.format, OutputFormat::Layout);
        assert!(config.scan.exclude.contains(&"gen/**".to_string()));
        assert!(config.scan.exclude.contains(&"**/*.Designer.cs".to_string()));
        assert_eq!(config.heuristic.tier, TierChoice::Full);
        assert_eq!(config.scan.chunk_size, 5);
        assert!(config.scan.priority_only);
        assert_eq!(config.scan.max_files, Some(100));
    }

    #[test]
    fn test_merge_cli_empty_keeps_file_values() {
        let mut config = Config::default();
        config.scan.priority_only = true;
        config.merge_cli(CliOverrides::default());
        assert!(config.scan.priority_only);
        assert_eq!(config.output.format, OutputFormat::Summary);
    }

    #[test]
    fn test_tier_for_size() {
        let heuristic = HeuristicConfig::default();
        assert_eq!(heuristic.tier_for_size(10), Tier::Full);
        assert_eq!(heuristic.tier_for_size(50_000), Tier::Full);
        assert_eq!(heuristic.tier_for_size(50_001), Tier::Partial);
        assert_eq!(heuristic.tier_for_size(150_001), Tier::Minimal);
    }

    #[test]
    fn test_tier_choice_from_str() {
        assert_eq!("auto".parse::<TierChoice>().unwrap(), TierChoice::Auto);
        assert_eq!("FULL".parse::<TierChoice>().unwrap(), TierChoice::Full);
        assert_eq!(TierChoice::Minimal.forced(), Some(Tier::Minimal));
        assert!("huge".parse::<TierChoice>().is_err());
    }
}
