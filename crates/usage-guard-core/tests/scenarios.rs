//! Integration test: sample policies end-to-end via Analyzer.
//!
//! Uses fixture documents under `tests/fixtures/sample/` to verify that the
//! full TOML → registry → tree walk → diagnostics pipeline reports exactly
//! the expected restricted usages.

use std::path::{Path, PathBuf};

use usage_guard_core::{AnalysisResult, Analyzer, Config, Severity, SyntaxTree};

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample")
}

fn analyze_fixtures() -> AnalysisResult {
    let root = fixture_root();
    let (config, registry) =
        Config::load(&root.join("usage-guard.toml")).expect("fixture config should load");
    Analyzer::builder()
        .root(&root)
        .config(config)
        .registry(registry)
        .build()
        .expect("analyzer should build")
        .analyze()
        .expect("analysis should succeed")
}

fn in_file<'a>(result: &'a AnalysisResult, file: &str) -> Vec<&'a usage_guard_core::Diagnostic> {
    result
        .diagnostics
        .iter()
        .filter(|d| d.location.file == Path::new(file))
        .collect()
}

#[test]
fn reports_each_scenario_once() {
    let result = analyze_fixtures();

    assert_eq!(result.files_checked, 3);
    let summary: Vec<String> = result
        .diagnostics
        .iter()
        .map(|d| format!("{} {}:{}", d.id, d.location.file.display(), d.location.line))
        .collect();
    assert_eq!(
        summary,
        [
            "NS001 src/Namespaces.cs:3",
            "TU001 src/Fields.cs:5",
            "TU001 src/Calls.cs:7",
            "GT001 src/Calls.cs:13",
        ]
    );
    assert!(result.has_errors());
}

// ── Scenario A: using inside a restricted namespace ──

#[test]
fn using_system_io_inside_company_product() {
    let result = analyze_fixtures();
    let found = in_file(&result, "src/Namespaces.cs");

    assert_eq!(found.len(), 1, "Other.Product must not be reported");
    let d = found[0];
    assert_eq!(d.id, "NS001");
    assert_eq!(d.rule, "no-system-in-product");
    assert_eq!((d.location.line, d.location.column), (3, 11));
    insta::assert_snapshot!(
        d.message,
        @"Namespace 'System.IO' is not allowed in namespace 'Company.Product.Foo'"
    );
}

// ── Scenario B: field type inside a restricted class ──

#[test]
fn forbidden_field_only_in_restricted_class() {
    let result = analyze_fixtures();
    let found = in_file(&result, "src/Fields.cs");

    assert_eq!(found.len(), 1, "OtherClass must not be reported");
    let d = found[0];
    assert_eq!(d.rule, "no-forbidden-type-in-restricted-class");
    assert_eq!(d.location.line, 5);
    assert_eq!(d.severity, Severity::Error);
    insta::assert_snapshot!(
        d.message,
        @"Usage of type 'ForbiddenType' is not allowed in 'secret'"
    );
}

// ── Scenario C: call returning an IO type from a sensitive method ──

#[test]
fn call_returning_io_type_in_sensitive_method() {
    let result = analyze_fixtures();
    let calls: Vec<_> = in_file(&result, "src/Calls.cs")
        .into_iter()
        .filter(|d| d.id == "TU001")
        .collect();

    assert_eq!(calls.len(), 1, "Relaxed must not be reported");
    let d = calls[0];
    assert_eq!((d.location.line, d.location.column), (7, 24));
    insta::assert_snapshot!(
        d.message,
        @"Usage of type 'File' is not allowed in 'SensitiveMethod'"
    );
}

#[test]
fn generic_argument_rule_carries_doc_ref() {
    let result = analyze_fixtures();
    let generic = result.by_id("GT001");

    assert_eq!(generic.len(), 1);
    assert_eq!(generic[0].doc_ref.as_deref(), Some("docs/migration.md"));
    insta::assert_snapshot!(
        generic[0].to_string(),
        @"src/Calls.cs:13:13: error [GT001] Usage of generic type 'Shim' is not allowed in 'Relaxed' (see: docs/migration.md)"
    );
}

// ── Configuration overrides ──

#[test]
fn category_overrides_apply_after_evaluation() {
    let root = fixture_root();
    let content = std::fs::read_to_string(root.join("usage-guard.toml")).unwrap();
    let content = format!(
        "{content}\n[categories.GT001]\nenabled = false\n\n[categories.NS001]\nseverity = \"warning\"\n"
    );
    let config = Config::parse(&content).unwrap();
    let registry = usage_guard_core::policy::registry_for_config(&config, &content).unwrap();

    let result = Analyzer::builder()
        .root(&root)
        .config(config)
        .registry(registry)
        .build()
        .unwrap()
        .analyze()
        .unwrap();

    assert!(result.by_id("GT001").is_empty());
    assert_eq!(result.by_id("NS001")[0].severity, Severity::Warning);
    assert_eq!(result.diagnostics.len(), 3);
}

#[test]
fn exclude_skips_documents() {
    let root = fixture_root();
    let (config, registry) = Config::load(&root.join("usage-guard.toml")).unwrap();
    let result = Analyzer::builder()
        .root(&root)
        .config(config)
        .registry(registry)
        .exclude("scenario_c*")
        .build()
        .unwrap()
        .analyze()
        .unwrap();

    assert_eq!(result.files_checked, 2);
    assert!(in_file(&result, "src/Calls.cs").is_empty());
}

#[test]
fn in_memory_trees_match_directory_analysis() {
    let root = fixture_root();
    let (config, registry) = Config::load(&root.join("usage-guard.toml")).unwrap();
    let analyzer = Analyzer::builder()
        .root(&root)
        .config(config)
        .registry(registry)
        .build()
        .unwrap();

    let trees: Vec<SyntaxTree> = ["scenario_a", "scenario_b", "scenario_c"]
        .iter()
        .map(|name| SyntaxTree::from_file(&root.join(format!("{name}.ast.json"))).unwrap())
        .collect();
    let result = analyzer.analyze_trees(&trees);

    assert_eq!(result.files_checked, 3);
    assert_eq!(result.diagnostics, analyze_fixtures().diagnostics);
}

#[test]
fn single_worker_gives_same_result() {
    let root = fixture_root();
    let (config, registry) = Config::load(&root.join("usage-guard.toml")).unwrap();
    let result = Analyzer::builder()
        .root(&root)
        .config(config)
        .registry(registry)
        .parallelism(1)
        .build()
        .unwrap()
        .analyze()
        .unwrap();

    assert_eq!(result.diagnostics, analyze_fixtures().diagnostics);
}

// ── Generated sources ──

#[test]
fn generated_sources_are_skipped_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = SyntaxTree::from_file(&fixture_root().join("scenario_a.ast.json")).unwrap();
    std::fs::write(
        dir.path().join("plain.ast.json"),
        serde_json::to_string(&tree).unwrap(),
    )
    .unwrap();
    tree.generated = true;
    std::fs::write(
        dir.path().join("generated.ast.json"),
        serde_json::to_string(&tree).unwrap(),
    )
    .unwrap();

    let analyze = |config: Config| {
        Analyzer::builder()
            .root(dir.path())
            .config(config)
            .registry(usage_guard_core::Preset::Sample.registry().unwrap())
            .build()
            .unwrap()
            .analyze()
            .unwrap()
    };

    let skipped = analyze(Config::default());
    assert_eq!(skipped.files_checked, 1);
    assert_eq!(skipped.diagnostics.len(), 1);

    let config = Config::parse("[analyzer]\nanalyze_generated = true\n").unwrap();
    let included = analyze(config);
    assert_eq!(included.files_checked, 2);
    assert_eq!(included.diagnostics.len(), 2);
}

// ── Unreadable documents ──

#[test]
fn broken_documents_are_skipped_unless_strict() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(
        fixture_root().join("scenario_a.ast.json"),
        dir.path().join("good.ast.json"),
    )
    .unwrap();
    std::fs::write(dir.path().join("broken.ast.json"), "{ not json").unwrap();
    std::fs::write(dir.path().join("notes.json"), "{ ignored }").unwrap();

    let registry = usage_guard_core::Preset::Sample.registry().unwrap();
    let lenient = Analyzer::builder()
        .root(dir.path())
        .registry(registry.clone())
        .build()
        .unwrap()
        .analyze()
        .unwrap();
    assert_eq!(lenient.files_checked, 1);
    assert_eq!(lenient.diagnostics.len(), 1);

    let strict = Analyzer::builder()
        .root(dir.path())
        .registry(registry)
        .fail_on_parse_error(true)
        .build()
        .unwrap()
        .analyze();
    assert!(matches!(
        strict,
        Err(usage_guard_core::AnalyzerError::Tree(
            usage_guard_core::TreeError::Parse { .. }
        ))
    ));
}
