//! Integration test: rule-set packages end-to-end via `run_multiple`.
//!
//! Uses the fixture document under `tests/fixtures/` to verify indexing,
//! rule dispatch, ignore handling, pruning and cancellation together.

use async_trait::async_trait;
use design_lint_core::index::traverse;
use design_lint_core::{
    run_multiple, CancellationToken, CheckError, DocumentFile, IgnoreConfig, MultiRunOutput,
    NoImageMetadata, NodeClass, OptionSchema, Rule, RuleConfig, RuleSetConfig, RuleSetDefinition,
    RuleSetEnv, RuleSetResult, RuleSetSource, RuleUtils, Runtime, SchemaError, Severity,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture_document() -> DocumentFile {
    let path = fixture_root().join("document.json");
    let contents = std::fs::read_to_string(&path).expect("fixture document should exist");
    DocumentFile::new(serde_json::from_str(&contents).expect("fixture document should parse"))
        .with_filepath(path)
}

// ── Test rules ──

struct ReportDocument;

#[async_trait]
impl Rule for ReportDocument {
    fn name(&self) -> &'static str {
        "report-document"
    }
    fn title(&self, _config: &RuleConfig) -> String {
        "Report document".to_string()
    }
    async fn check(&self, utils: &RuleUtils<'_>) -> Result<(), CheckError> {
        for document in utils.objects().of(NodeClass::Document) {
            utils.report("Document found", &[document])?;
        }
        Ok(())
    }
}

struct Fails;

#[async_trait]
impl Rule for Fails {
    fn name(&self) -> &'static str {
        "fails"
    }
    fn title(&self, _config: &RuleConfig) -> String {
        "Fails".to_string()
    }
    async fn check(&self, _utils: &RuleUtils<'_>) -> Result<(), CheckError> {
        Err(anyhow::anyhow!("layer data corrupt").into())
    }
}

struct ReportRectangles;

#[async_trait]
impl Rule for ReportRectangles {
    fn name(&self) -> &'static str {
        "report-rectangles"
    }
    fn title(&self, _config: &RuleConfig) -> String {
        "Report rectangles".to_string()
    }
    async fn check(&self, utils: &RuleUtils<'_>) -> Result<(), CheckError> {
        for rectangle in utils.objects().of(NodeClass::Rectangle) {
            utils.report("Rectangle found", &[rectangle])?;
        }
        Ok(())
    }
}

struct MaxChildren;

#[async_trait]
impl Rule for MaxChildren {
    fn name(&self) -> &'static str {
        "max-children"
    }
    fn title(&self, config: &RuleConfig) -> String {
        match config.option("limit") {
            Some(limit) => format!("Groups have at most {limit} children"),
            None => "Groups have a limited number of children".to_string(),
        }
    }
    fn options(&self) -> Result<Vec<OptionSchema>, SchemaError> {
        Ok(vec![OptionSchema::integer(
            "limit",
            "Limit",
            "Maximum number of children",
        )?
        .with_range(Some(0.0), None)])
    }
    async fn check(&self, utils: &RuleUtils<'_>) -> Result<(), CheckError> {
        let limit: usize = utils.option("limit")?;
        for group in utils.objects().groups() {
            if group.children().count() > limit {
                utils.report("Too many children", &[group])?;
            }
        }
        Ok(())
    }
}

struct CancelsRun(CancellationToken);

#[async_trait]
impl Rule for CancelsRun {
    fn name(&self) -> &'static str {
        "cancels-run"
    }
    fn title(&self, _config: &RuleConfig) -> String {
        "Cancels run".to_string()
    }
    async fn check(&self, _utils: &RuleUtils<'_>) -> Result<(), CheckError> {
        self.0.cancel();
        Ok(())
    }
}

// ── Helpers ──

fn single_rule_set(name: &str, rule: Arc<dyn Rule>) -> RuleSetSource {
    let rule_name = rule.name();
    RuleSetSource::definition(
        RuleSetDefinition::new(name)
            .with_rule(rule)
            .with_config(RuleSetConfig::new().rule(rule_name, RuleConfig::active())),
    )
}

async fn run(
    packages: BTreeMap<String, RuleSetSource>,
    file: &DocumentFile,
    ignore: &IgnoreConfig,
    cancel: &CancellationToken,
) -> MultiRunOutput {
    run_multiple(
        &packages,
        file,
        ignore,
        &RuleSetEnv::new(Runtime::Headless),
        cancel,
        &NoImageMetadata,
    )
    .await
    .expect("run should not be rejected")
}

fn result<'a>(output: &'a MultiRunOutput, name: &str) -> &'a RuleSetResult {
    output.results[name]
        .result()
        .unwrap_or_else(|| panic!("rule-set {name} should have run"))
}

// ── Scenarios ──

#[tokio::test]
async fn empty_tree_without_rules_passes() {
    let packages = BTreeMap::from([(
        "empty".to_string(),
        RuleSetSource::definition(RuleSetDefinition::new("empty")),
    )]);
    let output = run(
        packages,
        &DocumentFile::new(json!({})),
        &IgnoreConfig::default(),
        &CancellationToken::new(),
    )
    .await;

    let empty = result(&output, "empty");
    assert!(empty.violations.is_empty());
    assert!(empty.rule_errors.is_empty());
    assert!(empty.passed);
}

#[tokio::test]
async fn unconditional_report_yields_one_violation() {
    let packages = BTreeMap::from([(
        "core".to_string(),
        single_rule_set("core", Arc::new(ReportDocument)),
    )]);
    let output = run(
        packages,
        &fixture_document(),
        &IgnoreConfig::default(),
        &CancellationToken::new(),
    )
    .await;

    let core = result(&output, "core");
    assert_eq!(core.violations.len(), 1);
    assert!(core.rule_errors.is_empty());
    let location = &core.violations[0].locations[0];
    assert_eq!(location.pointer.as_deref(), Some("/document"));
    assert_eq!(location.object_id.as_deref(), Some("doc"));
}

#[tokio::test]
async fn failing_rule_yields_one_rule_error() {
    let packages = BTreeMap::from([("core".to_string(), single_rule_set("core", Arc::new(Fails)))]);
    let output = run(
        packages,
        &fixture_document(),
        &IgnoreConfig::default(),
        &CancellationToken::new(),
    )
    .await;

    let core = result(&output, "core");
    assert!(core.violations.is_empty());
    assert_eq!(core.rule_errors.len(), 1);
    assert_eq!(core.rule_errors[0].rule, "fails");
    assert!(core.rule_errors[0].message.contains("layer data corrupt"));
}

#[tokio::test]
async fn fully_ignored_rule_does_not_execute() {
    let packages = BTreeMap::from([(
        "core".to_string(),
        single_rule_set("core", Arc::new(ReportDocument)),
    )]);
    let ignore = IgnoreConfig::new().ignore_rule("core", "report-document");
    let output = run(
        packages,
        &fixture_document(),
        &ignore,
        &CancellationToken::new(),
    )
    .await;

    let core = result(&output, "core");
    assert!(core.violations.is_empty());
    assert!(core.profile.rule_timings.is_empty());
    assert!(output.ignore.is_rule_fully_ignored("core", "report-document"));
}

#[tokio::test]
async fn ignores_are_scoped_per_rule_set() {
    let packages = BTreeMap::from([
        ("a".to_string(), single_rule_set("a", Arc::new(ReportDocument))),
        ("b".to_string(), single_rule_set("b", Arc::new(ReportDocument))),
    ]);
    let ignore = IgnoreConfig::new().ignore_rule("a", "report-document");
    let output = run(
        packages,
        &fixture_document(),
        &ignore,
        &CancellationToken::new(),
    )
    .await;

    assert!(result(&output, "a").violations.is_empty());
    assert_eq!(result(&output, "b").violations.len(), 1);
}

// ── Properties ──

#[tokio::test]
async fn object_and_page_ignores_filter_iteration() {
    let packages = BTreeMap::from([(
        "core".to_string(),
        single_rule_set("core", Arc::new(ReportRectangles)),
    )]);
    let ignore = IgnoreConfig::new().ignore_page("page-2");
    let output = run(
        packages.clone(),
        &fixture_document(),
        &ignore,
        &CancellationToken::new(),
    )
    .await;
    let ids: Vec<_> = result(&output, "core")
        .violations
        .iter()
        .filter_map(|v| v.locations[0].object_id.as_deref())
        .collect();
    assert_eq!(ids, ["rect-1"]);

    let ignore = IgnoreConfig::new().ignore_objects("core", "report-rectangles", ["rect-1"]);
    let output = run(
        packages,
        &fixture_document(),
        &ignore,
        &CancellationToken::new(),
    )
    .await;
    let ids: Vec<_> = result(&output, "core")
        .violations
        .iter()
        .filter_map(|v| v.locations[0].object_id.as_deref())
        .collect();
    assert_eq!(ids, ["rect-2"]);
}

#[tokio::test]
async fn stale_directives_are_pruned_to_a_fixpoint() {
    let packages = || {
        BTreeMap::from([(
            "core".to_string(),
            single_rule_set("core", Arc::new(ReportRectangles)),
        )])
    };
    let stale = IgnoreConfig::new()
        .ignore_page("page-1")
        .ignore_page("deleted-page")
        .ignore_rule("retired-rule-set", "report-rectangles")
        .ignore_rule("core", "retired-rule")
        .ignore_objects("core", "report-rectangles", ["rect-2", "deleted-object"]);

    let file = fixture_document();
    let cancel = CancellationToken::new();
    let once = run(packages(), &file, &stale, &cancel).await.ignore;
    let twice = run(packages(), &file, &once, &cancel).await.ignore;

    assert_eq!(once.pages, ["page-1"]);
    assert!(!once.rule_sets.contains_key("retired-rule-set"));
    assert!(once.rule("core", "retired-rule").is_none());
    assert_eq!(once.ignored_objects("core", "report-rectangles"), ["rect-2"]);
    assert_eq!(once, twice);
}

#[tokio::test]
async fn severity_drives_pass_fail() {
    let definition = |severity: Severity| {
        RuleSetSource::definition(
            RuleSetDefinition::new("core")
                .with_rule(Arc::new(ReportRectangles))
                .with_config(RuleSetConfig::new().rule(
                    "report-rectangles",
                    RuleConfig::active().with_severity(severity),
                )),
        )
    };

    for (severity, expected) in [
        (Severity::Info, true),
        (Severity::Warn, true),
        (Severity::Error, false),
    ] {
        let packages = BTreeMap::from([("core".to_string(), definition(severity))]);
        let output = run(
            packages,
            &fixture_document(),
            &IgnoreConfig::default(),
            &CancellationToken::new(),
        )
        .await;
        let core = result(&output, "core");
        assert_eq!(core.violations.len(), 2);
        assert_eq!(core.passed, expected, "severity {severity}");
    }
}

#[tokio::test]
async fn rule_set_config_loads_from_toml_fixture() {
    let config = RuleSetConfig::from_file(&fixture_root().join("rules.toml"))
        .expect("fixture config should load");
    let packages = BTreeMap::from([(
        "core".to_string(),
        RuleSetSource::definition(
            RuleSetDefinition::new("core")
                .with_rule(Arc::new(ReportRectangles))
                .with_rule(Arc::new(MaxChildren))
                .with_config(config),
        ),
    )]);
    let output = run(
        packages,
        &fixture_document(),
        &IgnoreConfig::default(),
        &CancellationToken::new(),
    )
    .await;

    let core = result(&output, "core");
    assert_eq!(
        core.metadata.rules["report-rectangles"].title,
        "Rectangles are reported"
    );
    assert_eq!(
        core.metadata.rules["max-children"].title,
        "Groups have at most 1 children"
    );
    assert!(core.rule_errors.is_empty());

    // Only the artboard holds more than one child.
    let too_many: Vec<_> = core
        .violations
        .iter()
        .filter(|v| v.rule == "max-children")
        .filter_map(|v| v.locations[0].object_id.as_deref())
        .collect();
    assert_eq!(too_many, ["ab-1"]);
    assert!(!core.passed);
}

#[tokio::test]
async fn invalid_option_becomes_rule_error() {
    let packages = BTreeMap::from([(
        "core".to_string(),
        RuleSetSource::definition(
            RuleSetDefinition::new("core")
                .with_rule(Arc::new(MaxChildren))
                .with_config(RuleSetConfig::new().rule(
                    "max-children",
                    RuleConfig::active().with_option("limit", "many"),
                )),
        ),
    )]);
    let output = run(
        packages,
        &fixture_document(),
        &IgnoreConfig::default(),
        &CancellationToken::new(),
    )
    .await;

    let core = result(&output, "core");
    assert!(core.violations.is_empty());
    assert_eq!(core.rule_errors.len(), 1);
    assert!(core.rule_errors[0].message.contains("/limit"));
}

#[tokio::test]
async fn cancellation_mid_run_skips_remaining_work() {
    let cancel = CancellationToken::new();
    let first = RuleSetDefinition::new("a")
        .with_rule(Arc::new(CancelsRun(cancel.clone())))
        .with_rule(Arc::new(ReportDocument))
        .with_config(
            RuleSetConfig::new()
                .rule("cancels-run", RuleConfig::active())
                .rule("report-document", RuleConfig::active()),
        );
    let packages = BTreeMap::from([
        ("a".to_string(), RuleSetSource::definition(first)),
        ("b".to_string(), single_rule_set("b", Arc::new(ReportDocument))),
    ]);
    let output = run(packages, &fixture_document(), &IgnoreConfig::default(), &cancel).await;

    let a = result(&output, "a");
    assert!(a.violations.is_empty());
    assert_eq!(a.profile.rule_timings.len(), 1);
    assert!(!output.results.contains_key("b"));
}

#[test]
fn indexing_is_deterministic_and_partitioned() {
    let file = fixture_document();
    let cancel = CancellationToken::new();
    let first = traverse(&file.contents, &cancel);
    let second = traverse(&file.contents, &cancel);

    for class in NodeClass::ALL {
        let a: Vec<_> = first.local.of(*class).iter().map(|n| first.pointers.get(*n)).collect();
        let b: Vec<_> = second.local.of(*class).iter().map(|n| second.pointers.get(*n)).collect();
        assert_eq!(a, b, "local {class:?}");
    }

    for node in first.foreign.layers().iter().chain(first.foreign.of(NodeClass::SharedStyle)) {
        assert!(!first.local.contains(*node));
    }
    let foreign_ids: Vec<_> = first
        .foreign
        .of(NodeClass::SharedStyle)
        .iter()
        .filter_map(|n| n.id())
        .collect();
    assert_eq!(foreign_ids, ["fls-1-local"]);
    assert!(!first.object_ids.contains("meta"));
    assert!(first.object_ids.contains("fls-1-style"));
}
