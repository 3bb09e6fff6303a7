// Analysis module: directory scans, role classification and priorities

pub mod metrics;
pub mod priority;
pub mod roles;

pub use metrics::{CommentStyle, FileMetrics};
pub use priority::{rank, Priority};
pub use roles::{classify, classify_explained, Classification, Role, Signal};

use crate::config::Config;
use crate::error::{Error, FailureKind, FileFailure, Result};
use crate::parser::{read_source, Extractor, SourceFile, SourceLanguage, SourceModel};
use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Directories never worth descending into
const IGNORED_DIRS: &[&str] = &[
    "__pycache__",
    ".git",
    ".pytest_cache",
    "venv",
    "env",
    ".venv",
    ".env",
    "node_modules",
    ".idea",
    ".vscode",
    "dist",
    "build",
    ".tox",
    "htmlcov",
    "bin",
    "obj",
];

/// Recognized files bucketed without reading them
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectSurvey {
    pub total: usize,
    /// File count per language name
    pub by_language: BTreeMap<String, usize>,
    pub high: Vec<PathBuf>,
    pub medium: Vec<PathBuf>,
    pub low: Vec<PathBuf>,
}

impl ProjectSurvey {
    /// Files in one priority bucket
    pub fn files(&self, priority: Priority) -> &[PathBuf] {
        match priority {
            Priority::High => &self.high,
            Priority::Medium => &self.medium,
            Priority::Low => &self.low,
        }
    }
}

/// Counters for a finished scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStats {
    /// Recognized files found under the root
    pub discovered: usize,
    /// Dropped by `priority_only`
    pub skipped_by_priority: usize,
    /// Dropped by `max_files`
    pub skipped_by_limit: usize,
    pub extracted: usize,
    pub failed: usize,
    /// Models that are truncated or timed out
    pub partial: usize,
    pub chunks: usize,
    pub roles: BTreeMap<Role, usize>,
}

/// Result of scanning a directory
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Models keyed by path relative to the scan root
    pub models: BTreeMap<PathBuf, SourceModel>,
    /// Paths in the order they were processed
    pub order: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
    pub stats: ScanStats,
}

impl ScanReport {
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&SourceModel> {
        self.models.get(path.as_ref())
    }

    /// Models in processing order
    pub fn iter(&self) -> impl Iterator<Item = &SourceModel> {
        self.order.iter().filter_map(|p| self.models.get(p))
    }

    /// Paths grouped by the documentation folder of their role
    pub fn layout(&self) -> BTreeMap<&'static str, Vec<&Path>> {
        let mut folders: BTreeMap<&'static str, Vec<&Path>> = BTreeMap::new();
        for (path, model) in &self.models {
            let folder = model.role.unwrap_or(Role::Unknown).folder();
            folders.entry(folder).or_default().push(path.as_path());
        }
        folders
    }
}

/// Main analyzer that walks a project and extracts every recognized file
pub struct Analyzer {
    config: Config,
    extractor: Extractor,
    exclude: Vec<Pattern>,
    verbose: bool,
}

impl Analyzer {
    /// Create a new analyzer with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let exclude = config
            .scan
            .exclude
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let extractor = Extractor::new(config.heuristic.clone())?;

        Ok(Self {
            config,
            extractor,
            exclude,
            verbose: false,
        })
    }

    /// Show a progress bar while scanning
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Count recognized files by language and priority
    pub fn survey(&self, root: &Path) -> Result<ProjectSurvey> {
        let mut survey = ProjectSurvey::default();
        for path in self.discover_files(root)? {
            let relative = relative_to(&path, root);
            if let Some(language) = SourceLanguage::from_path(&path) {
                *survey
                    .by_language
                    .entry(language.as_str().to_string())
                    .or_default() += 1;
            }
            match rank(&relative) {
                Priority::High => survey.high.push(relative),
                Priority::Medium => survey.medium.push(relative),
                Priority::Low => survey.low.push(relative),
            }
            survey.total += 1;
        }
        Ok(survey)
    }

    /// Extract, classify and collect every recognized file under `root`
    pub fn scan(&mut self, root: &Path) -> Result<ScanReport> {
        let mut report = ScanReport::default();

        let mut queue: Vec<(Priority, PathBuf, PathBuf)> = self
            .discover_files(root)?
            .into_iter()
            .map(|path| {
                let relative = relative_to(&path, root);
                (rank(&relative), relative, path)
            })
            .collect();
        queue.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
        report.stats.discovered = queue.len();

        if self.config.scan.priority_only {
            let before = queue.len();
            queue.retain(|(priority, _, _)| *priority == Priority::High);
            report.stats.skipped_by_priority = before - queue.len();
        }
        if let Some(max) = self.config.scan.max_files {
            if queue.len() > max {
                report.stats.skipped_by_limit = queue.len() - max;
                queue.truncate(max);
            }
        }

        info!(
            root = %root.display(),
            files = queue.len(),
            discovered = report.stats.discovered,
            "scanning"
        );

        let progress = self.progress_bar(queue.len());
        let chunk_size = self.config.scan.chunk_size.max(1);

        for (index, chunk) in queue.chunks(chunk_size).enumerate() {
            report.stats.chunks += 1;
            debug!(chunk = index + 1, files = chunk.len(), "processing chunk");

            for (_, relative, path) in chunk {
                if let Some(ref pb) = progress {
                    pb.set_message(relative.display().to_string());
                    pb.inc(1);
                }

                match self.process_path(path, relative) {
                    Ok(model) => {
                        report.stats.extracted += 1;
                        if model.is_partial() {
                            report.stats.partial += 1;
                        }
                        if let Some(role) = model.role {
                            *report.stats.roles.entry(role).or_default() += 1;
                        }
                        report.order.push(relative.clone());
                        report.models.insert(relative.clone(), model);
                    }
                    Err(kind) if kind.is_reportable() => {
                        warn!(path = %relative.display(), error = %kind, "extraction failed");
                        report.stats.failed += 1;
                        report.failures.push(FileFailure::new(relative.clone(), kind));
                    }
                    Err(_) => {}
                }
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("Scan complete");
        }

        info!(
            extracted = report.stats.extracted,
            failed = report.stats.failed,
            partial = report.stats.partial,
            "scan finished"
        );
        Ok(report)
    }

    /// Extract and classify one in-memory file
    pub fn process(&mut self, file: &SourceFile) -> std::result::Result<SourceModel, FailureKind> {
        let tier = self.config.heuristic.tier.forced();
        let mut model = self.extractor.extract(file, tier)?;
        model.role = Some(classify(&file.path, &file.content, Some(&model)));
        Ok(model)
    }

    fn process_path(
        &mut self,
        path: &Path,
        relative: &Path,
    ) -> std::result::Result<SourceModel, FailureKind> {
        let mut file = read_source(path)?;
        file.path = relative.to_path_buf();
        self.process(&file)
    }

    /// Find all recognized source files, sorted
    fn discover_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.exists() {
            return Err(Error::PathNotFound(root.to_path_buf()));
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(self.config.scan.follow_links)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_ignored_dir(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if SourceLanguage::from_path(path).is_none() {
                continue;
            }
            if self.should_exclude(path, root) {
                debug!(path = %path.display(), "excluded");
                continue;
            }

            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    /// Check the configured glob patterns against the root-relative path
    fn should_exclude(&self, path: &Path, root: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        self.exclude.iter().any(|p| p.matches_path(relative))
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.verbose {
            return None;
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    }
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    IGNORED_DIRS.contains(&name.as_ref()) || name.ends_with(".egg-info")
}

fn relative_to(path: &Path, root: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
        _ => path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| path.to_path_buf()),
    }
}
