//! Integration tests running the built-in presets end to end.

use design_lint_core::{
    run_multiple, CancellationToken, DocumentFile, IgnoreConfig, MultiRunOutput, NoImageMetadata,
    RuleSetEnv, RuleSetResult, Severity,
};
use design_lint_rules::{Preset, CORE};
use serde_json::{json, Value};

fn document() -> Value {
    json!({
        "document": {
            "_class": "document",
            "do_objectID": "doc",
            "layerStyles": {"_class": "sharedStyleContainer", "objects": [
                {"_class": "sharedStyle", "do_objectID": "ss-a", "name": "Primary",
                 "value": {"_class": "style", "do_objectID": "ss-a-v", "fills": [{"_class": "fill", "color": "red"}]}},
                {"_class": "sharedStyle", "do_objectID": "ss-b", "name": "Accent",
                 "value": {"_class": "style", "do_objectID": "ss-b-v", "fills": [{"_class": "fill", "color": "red"}]}}
            ]},
            "pages": [{
                "_class": "page", "do_objectID": "p1", "name": "Screens", "layers": [{
                    "_class": "artboard", "do_objectID": "ab", "name": "Home", "frame": {}, "layers": [{
                        "_class": "group", "do_objectID": "g", "name": "Group copy", "frame": {}, "layers": [{
                            "_class": "rectangle", "do_objectID": "r1", "name": "Rectangle 2", "frame": {}
                        }]
                    }, {
                        "_class": "rectangle", "do_objectID": "r2", "name": "Card", "frame": {}
                    }]
                }]
            }]
        },
        "meta": {},
        "user": {}
    })
}

async fn run(preset: Preset, ignore: &IgnoreConfig) -> MultiRunOutput {
    run_multiple(
        &preset.packages(),
        &DocumentFile::new(document()),
        ignore,
        &RuleSetEnv::default(),
        &CancellationToken::new(),
        &NoImageMetadata,
    )
    .await
    .unwrap()
}

fn core(output: &MultiRunOutput) -> &RuleSetResult {
    output.results[CORE].result().unwrap()
}

fn report(result: &RuleSetResult) -> String {
    result
        .violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Recommended ──

#[tokio::test]
async fn test_recommended_preset() {
    let output = run(Preset::Recommended, &IgnoreConfig::new()).await;
    let result = core(&output);

    assert!(!output.passed());
    assert!(result.rule_errors.is_empty());
    assert!(!result.metadata.rules.contains_key("images-max-dimensions"));
    insta::assert_snapshot!(report(result), @r"
    error: [core/shared-styles-no-duplicates] Shared styles look identical: Primary, Accent (at: /document/layerStyles/objects/0)
    warn: [core/names-pattern-disallowed] Layer name `Group copy` matches disallowed pattern `^(Rectangle|Oval|Group|Path|Line|Text|Image|Combined Shape)( \d+)?( copy( \d+)?)?$` (at: /document/pages/0/layers/0/layers/0)
    warn: [core/names-pattern-disallowed] Layer name `Rectangle 2` matches disallowed pattern `^(Rectangle|Oval|Group|Path|Line|Text|Image|Combined Shape)( \d+)?( copy( \d+)?)?$` (at: /document/pages/0/layers/0/layers/0/layers/0)
    ");
}

#[tokio::test]
async fn test_recommended_preset_with_ignores() {
    let ignore = IgnoreConfig::new()
        .ignore_objects(CORE, "names-pattern-disallowed", ["r1", "gone"])
        .ignore_rule(CORE, "shared-styles-no-duplicates");
    let output = run(Preset::Recommended, &ignore).await;
    let result = core(&output);

    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].locations[0].object_id.as_deref(), Some("g"));
    assert!(output.passed());

    let names = output.ignore.rule(CORE, "names-pattern-disallowed").unwrap();
    assert_eq!(names.objects, ["r1"]);
    assert!(output.ignore.is_rule_fully_ignored(CORE, "shared-styles-no-duplicates"));
}

// ── Strict ──

#[tokio::test]
async fn test_strict_preset_escalates_severity() {
    let output = run(Preset::Strict, &IgnoreConfig::new()).await;
    let result = core(&output);

    assert!(result.rule_errors.is_empty());
    assert!(result.metadata.rules.contains_key("images-max-dimensions"));
    assert_eq!(result.violations.len(), 3);
    assert!(result
        .violations
        .iter()
        .all(|v| v.severity == Severity::Error));
}

#[tokio::test]
async fn test_strict_preset_without_image_access() {
    let mut contents = document();
    contents["document"]["pages"][0]["layers"][0]["layers"]
        .as_array_mut()
        .unwrap()
        .push(json!({
            "_class": "bitmap", "do_objectID": "bmp", "name": "Hero", "frame": {},
            "image": {"_class": "MSJSONFileReference", "_ref": "images/hero.png"}
        }));

    let output = run_multiple(
        &Preset::Strict.packages(),
        &DocumentFile::new(contents),
        &IgnoreConfig::new(),
        &RuleSetEnv::default(),
        &CancellationToken::new(),
        &NoImageMetadata,
    )
    .await
    .unwrap();
    let result = core(&output);

    assert_eq!(result.rule_errors.len(), 1);
    assert_eq!(result.rule_errors[0].rule, "images-max-dimensions");
    assert_eq!(result.violations.len(), 3);
}
