// Integration tests for Strata

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use strata::config::TierChoice;
use strata::{
    classify, classify_explained, rank, Analyzer, Completeness, Config, Extractor, FailureKind,
    Priority, Role, SourceFile, Tier,
};
use tempfile::TempDir;

fn fixtures_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn create_analyzer() -> Analyzer {
    Analyzer::new(Config::default()).expect("Failed to create analyzer")
}

fn strata() -> Command {
    Command::cargo_bin("strata").unwrap()
}

// ============================================================================
// Scan Tests
// ============================================================================

#[test]
fn test_scan_shop_project() {
    let report = create_analyzer().scan(&fixtures_path("shop")).expect("Scan failed");

    assert_eq!(report.models.len(), 8);
    assert!(report.failures.is_empty(), "Unexpected failures: {:?}", report.failures);
    assert_eq!(report.stats.partial, 0);
}

#[test]
fn test_scan_visits_high_priority_first() {
    let report = create_analyzer().scan(&fixtures_path("shop")).unwrap();

    let priorities: Vec<Priority> = report.order.iter().map(|p| rank(p)).collect();
    let mut sorted = priorities.clone();
    sorted.sort();
    assert_eq!(priorities, sorted);

    assert_eq!(
        &report.order[..2],
        &[
            PathBuf::from("Shop.Api/Controllers/OrdersController.cs"),
            PathBuf::from("Shop.Api/Program.cs"),
        ]
    );
    assert_eq!(report.order.last(), Some(&PathBuf::from("scripts/utils.py")));
}

#[test]
fn test_scan_assigns_roles() {
    let report = create_analyzer().scan(&fixtures_path("shop")).unwrap();

    let role = |path: &str| report.get(path).and_then(|m| m.role);
    assert_eq!(role("Shop.Api/Controllers/OrdersController.cs"), Some(Role::Controller));
    assert_eq!(role("Shop.Application/Services/OrderService.cs"), Some(Role::Service));
    assert_eq!(role("Shop.Domain/Entities/Order.cs"), Some(Role::Entity));
    assert_eq!(
        role("Shop.Infrastructure/Repositories/OrderRepository.cs"),
        Some(Role::Repository)
    );
    assert_eq!(role("Shop.Infrastructure/Data/ShopDbContext.cs"), Some(Role::DbContext));
    assert_eq!(role("scripts/utils.py"), Some(Role::Utility));
    assert_eq!(role("scripts/seed.py"), Some(Role::Class));
}

#[test]
fn test_scan_controller_structure() {
    let report = create_analyzer().scan(&fixtures_path("shop")).unwrap();
    let model = report.get("Shop.Api/Controllers/OrdersController.cs").unwrap();

    assert_eq!(model.tier, Some(Tier::Full));
    assert_eq!(model.namespace.as_deref(), Some("Shop.Api.Controllers"));
    assert_eq!(
        model.imports,
        vec!["using Microsoft.AspNetCore.Mvc", "using Shop.Application.Services"]
    );
    assert!(model.functions.is_empty());

    let class = model.class("OrdersController").unwrap();
    assert_eq!(class.base_types, vec!["ControllerBase"]);
    assert!(class.method("Get").is_some());
    assert!(class.method("Create").is_some());
    assert!(class.method("NotFound").is_none());
    assert!(class.method("Ok").is_none());
    assert!(model.metrics.complexity > 1);
}

#[test]
fn test_scan_python_structure() {
    let report = create_analyzer().scan(&fixtures_path("shop")).unwrap();
    let model = report.get("scripts/seed.py").unwrap();

    assert_eq!(
        model.doc_comment.as_deref(),
        Some("Seed the development database with sample orders.")
    );
    assert_eq!(
        model.imports,
        vec!["import json", "from pathlib import Path", "from utils import chunked"]
    );
    assert_eq!(model.constants, vec!["DEFAULT_COUNT"]);

    let seeder = model.class("Seeder").unwrap();
    let methods: Vec<_> = seeder.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(methods, vec!["__init__", "orders", "write"]);

    let functions: Vec<_> = model.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(functions, vec!["main"]);
}

#[test]
fn test_scan_priority_only() {
    let mut config = Config::default();
    config.scan.priority_only = true;
    let report = Analyzer::new(config).unwrap().scan(&fixtures_path("shop")).unwrap();

    assert_eq!(report.models.len(), 2);
    assert!(report.models.values().all(|m| rank(&m.path) == Priority::High));
}

#[test]
fn test_scan_forced_minimal_tier() {
    let mut config = Config::default();
    config.heuristic.tier = TierChoice::Minimal;
    let report = Analyzer::new(config).unwrap().scan(&fixtures_path("shop")).unwrap();

    let model = report.get("Shop.Application/Services/OrderService.cs").unwrap();
    assert_eq!(model.tier, Some(Tier::Minimal));
    let names: Vec<_> = model.classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["IOrderService", "OrderService"]);
    assert!(model.classes.iter().all(|c| c.methods.is_empty()));
}

#[test]
fn test_scan_is_deterministic() {
    let first = create_analyzer().scan(&fixtures_path("shop")).unwrap();
    let second = create_analyzer().scan(&fixtures_path("shop")).unwrap();
    assert_eq!(first.order, second.order);
    assert_eq!(first.models, second.models);
}

#[test]
fn test_survey_shop_project() {
    let survey = create_analyzer().survey(&fixtures_path("shop")).unwrap();

    assert_eq!(survey.total, 8);
    assert_eq!(survey.by_language.get("csharp"), Some(&6));
    assert_eq!(survey.by_language.get("python"), Some(&2));
    assert_eq!(survey.high.len(), 2);
    assert_eq!(survey.medium.len(), 4);
    assert_eq!(survey.low.len(), 2);
}

#[test]
fn test_scan_missing_root() {
    let result = create_analyzer().scan(Path::new("/nonexistent/shop"));
    assert!(matches!(result, Err(strata::Error::PathNotFound(_))));
}

// ============================================================================
// Extraction and Classification Tests
// ============================================================================

#[test]
fn test_repository_file_end_to_end() {
    let mut extractor = Extractor::new(Default::default()).unwrap();
    let file = SourceFile::new(
        "Repositories/Foo.cs",
        r#"class Foo { public string Bar() { return "x"; } }"#,
    );
    let model = extractor.extract(&file, Some(Tier::Full)).unwrap();

    assert_eq!(model.classes.len(), 1);
    assert_eq!(model.classes[0].name, "Foo");
    assert_eq!(model.classes[0].methods.len(), 1);
    assert_eq!(model.classes[0].methods[0].name, "Bar");
    assert_eq!(
        classify(&file.path, &file.content, Some(&model)),
        Role::Repository
    );
}

#[test]
fn test_controller_name_beats_directory() {
    let path = Path::new("Services/OrderController.cs");
    let classification = classify_explained(path, "public class OrderController { }", None);
    assert_eq!(classification.role, Role::Controller);
    assert_eq!(rank(path), Priority::High);
}

#[test]
fn test_unterminated_class_still_extracts() {
    let mut extractor = Extractor::new(Default::default()).unwrap();
    let file = SourceFile::new("Broken.cs", "public class Broken {\n    public void Run() {\n");
    let model = extractor.extract(&file, Some(Tier::Full)).unwrap();

    assert_eq!(model.classes.len(), 1);
    assert_eq!(model.classes[0].name, "Broken");
}

#[test]
fn test_zero_budget_marks_timed_out() {
    let mut config = Config::default();
    config.heuristic.time_budget_ms = 0;
    let mut extractor = Extractor::new(config.heuristic).unwrap();
    let file = SourceFile::new("Slow.cs", "class A { void B() { } }");
    let model = extractor.extract(&file, Some(Tier::Full)).unwrap();
    assert_eq!(model.completeness, Completeness::TimedOut);
}

#[test]
fn test_python_syntax_error_reports_position() {
    let mut extractor = Extractor::new(Default::default()).unwrap();
    let result = extractor.extract(&SourceFile::new("bad.py", "def f(:\n    pass\n"), None);
    match result {
        Err(FailureKind::Parse { line, column, .. }) => {
            assert!(line >= 1);
            assert!(column >= 1);
        }
        other => panic!("Expected parse failure, got {:?}", other),
    }
}

// ============================================================================
// CLI Tests
// ============================================================================

#[test]
fn test_cli_version() {
    strata()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("strata "));
}

#[test]
fn test_cli_analyze_summary() {
    strata()
        .args(["analyze", fixtures_path("shop").to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("8 files extracted, 0 failed"))
        .stdout(predicate::str::contains("Shop.Api/Controllers/OrdersController.cs"))
        .stdout(predicate::str::contains("Controllers"));
}

#[test]
fn test_cli_analyze_json_to_file() {
    let out_dir = TempDir::new().unwrap();
    let out = out_dir.path().join("report").join("shop.json");

    strata()
        .args(["analyze", fixtures_path("shop").to_str().unwrap()])
        .args(["--format", "json", "--output", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Report written to"));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["project"], "shop");
    assert_eq!(
        json["models"]["Shop.Infrastructure/Repositories/OrderRepository.cs"]["role"],
        "repository"
    );
    assert_eq!(json["stats"]["extracted"], 8);
}

#[test]
fn test_cli_analyze_layout() {
    strata()
        .args(["analyze", fixtures_path("shop").to_str().unwrap(), "--format", "layout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api/controllers/"))
        .stdout(predicate::str::contains("infrastructure/repositories/"))
        .stdout(predicate::str::contains("shared/utilities/"));
}

#[test]
fn test_cli_analyze_reports_failures_without_aborting() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("ok.py"), "def ok():\n    return 1\n").unwrap();
    fs::write(dir.path().join("broken.py"), "x = (1,\n").unwrap();

    strata()
        .args(["analyze", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 files extracted, 1 failed"))
        .stdout(predicate::str::contains("broken.py: syntax error"));
}

#[test]
fn test_cli_analyze_missing_path() {
    strata()
        .args(["analyze", "/nonexistent/shop"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Path not found"));
}

#[test]
fn test_cli_analyze_with_config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("strata.toml");
    fs::write(
        &config,
        "[project]\nname = \"Storefront\"\n\n[scan]\nexclude = [\"scripts/**\"]\n",
    )
    .unwrap();

    strata()
        .args(["analyze", fixtures_path("shop").to_str().unwrap()])
        .args(["--config", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Storefront\n"))
        .stdout(predicate::str::contains("6 files extracted"))
        .stdout(predicate::str::contains("seed.py").not());
}

#[test]
fn test_cli_analyze_invalid_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("strata.toml");
    fs::write(&config, "[scan]\nchunk_size = 0\n").unwrap();

    strata()
        .args(["analyze", fixtures_path("shop").to_str().unwrap()])
        .args(["--config", config.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("chunk_size"));
}

#[test]
fn test_cli_survey() {
    strata()
        .args(["survey", fixtures_path("shop").to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("8 source files"))
        .stdout(predicate::str::contains("high priority: 2"))
        .stdout(predicate::str::contains("Shop.Api/Program.cs"));
}

#[test]
fn test_cli_classify() {
    let file = fixtures_path("shop").join("Shop.Infrastructure/Data/ShopDbContext.cs");
    strata()
        .args(["classify", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("role:     db_context"))
        .stdout(predicate::str::contains("priority: medium"))
        .stdout(predicate::str::contains("infrastructure/contexts"))
        .stdout(predicate::str::contains("ShopDbContext (line 6)"))
        .stdout(predicate::str::contains("    OnModelCreating(builder) -> void"));
}

#[test]
fn test_cli_classify_unsupported_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("notes.txt");
    fs::write(&file, "hello").unwrap();

    strata()
        .args(["classify", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported file type"));
}
