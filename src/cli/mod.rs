//! CLI module for Strata

mod args;

pub use args::{Args, Command, FormatArg, TierArg};

use crate::analysis::{classify_explained, rank, Analyzer};
use crate::config::{CliOverrides, Config};
use crate::error::{Error, Result};
use crate::output;
use crate::parser::{read_source, Extractor, SourceLanguage};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

const DEFAULT_CONFIG: &str = "strata.toml";

/// Run a parsed command line
pub fn run(args: Args) -> ExitCode {
    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Analyze {
            path,
            output,
            config,
            format,
            tier,
            chunk_size,
            priority_only,
            max_files,
            exclude,
            verbose,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            cfg.merge_cli(CliOverrides {
                output,
                format: format.map(Into::into),
                exclude,
                tier: tier.map(Into::into),
                chunk_size,
                priority_only,
                max_files,
            });
            cfg.validate()?;

            if !path.exists() {
                return Err(Error::PathNotFound(path));
            }

            let project_name = project_name(&cfg, &path);
            let format = cfg.output.format;
            let destination = cfg.output.path.clone();

            let mut analyzer = Analyzer::new(cfg)?.with_verbose(verbose);
            let report = analyzer.scan(&path)?;
            let rendered = output::render(&report, format, &project_name)?;

            match destination {
                Some(out) => {
                    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&out, rendered)?;
                    println!(
                        "{} files extracted, {} failed",
                        report.stats.extracted, report.stats.failed
                    );
                    println!("Report written to: {}", out.display());
                }
                None => print!("{}", rendered),
            }

            Ok(())
        }

        Command::Survey { path, config } => {
            let cfg = load_config(config.as_deref())?;
            let analyzer = Analyzer::new(cfg)?;
            let survey = analyzer.survey(&path)?;
            print!("{}", output::render_survey(&survey, &path));
            Ok(())
        }

        Command::Classify { file } => {
            if !file.exists() {
                return Err(Error::PathNotFound(file));
            }
            if SourceLanguage::from_path(&file).is_none() {
                return Err(Error::other(format!(
                    "unsupported file type: {}",
                    file.display()
                )));
            }

            let source = read_source(&file).map_err(|e| Error::other(e.to_string()))?;
            let cfg = load_config(None)?;
            let mut extractor = Extractor::new(cfg.heuristic.clone())?;
            // A file that fails to parse is still classified from its path and content
            let model = match extractor.extract(&source, cfg.heuristic.tier.forced()) {
                Ok(model) => Some(model),
                Err(e) => {
                    debug!(error = %e, "classifying without a model");
                    None
                }
            };

            let classification = classify_explained(&file, &source.content, model.as_ref());
            println!("{}", file.display());
            println!("  role:     {} ({})", classification.role, classification.role.label());
            println!("  signal:   {}", classification.signal);
            println!("  priority: {}", rank(&file));
            println!("  folder:   {}", classification.role.folder());
            if let Some(model) = &model {
                for class in &model.classes {
                    println!("  {} (line {})", class.name, class.line);
                    for method in &class.methods {
                        println!("    {}", method.signature());
                    }
                }
                for function in &model.functions {
                    println!("  {}", function.signature());
                }
            }
            Ok(())
        }

        Command::Version => {
            println!("strata {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Load an explicit config file, or `strata.toml` from the working directory
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG);
            if default_path.exists() {
                Config::load(&default_path)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn project_name(cfg: &Config, path: &Path) -> String {
    if cfg.project.name == "Untitled Project" || cfg.project.name.is_empty() {
        path.canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .unwrap_or_else(|| "Project".to_string())
    } else {
        cfg.project.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_explicit_missing_file() {
        assert!(load_config(Some(Path::new("/nonexistent/strata.toml"))).is_err());
    }

    #[test]
    fn test_load_config_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("strata.toml");
        fs::write(&path, "[project]\nname = \"Billing\"\n").unwrap();
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.project.name, "Billing");
    }

    #[test]
    fn test_project_name_prefers_config() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        let derived = project_name(&cfg, dir.path());
        assert_eq!(
            derived,
            dir.path().file_name().unwrap().to_string_lossy().to_string()
        );

        cfg.project.name = "Billing".to_string();
        assert_eq!(project_name(&cfg, dir.path()), "Billing");
    }
}
