use serde_json::json;

use super::*;
use crate::foundation::diagnostics::{CollectingSink, DiagnosticLevel};
use crate::vega::spec::Mark;

#[test]
fn parse_failure_releases_the_sink() {
    let mut sink = CollectingSink::new();
    let err = compile(
        &json!({
            "data": { "values": [] },
            "mark": "point",
            "selection": { "s": { "type": "lasso" } }
        }),
        Some(&mut sink),
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::Parse(_)));
    assert!(err.to_string().contains("lasso"));
    assert_eq!(sink.open_scopes(), 0);
}

#[test]
fn single_unit_end_to_end() {
    let mut sink = CollectingSink::new();
    let out = compile(
        &json!({
            "data": { "values": [{ "a": 1, "b": 2 }] },
            "mark": "point",
            "encoding": {
                "x": { "field": "a", "type": "quantitative" },
                "y": { "field": "b", "type": "quantitative" }
            }
        }),
        Some(&mut sink),
    )
    .unwrap();
    assert_eq!(sink.open_scopes(), 0);
    assert_eq!(sink.at_least(DiagnosticLevel::Warn).count(), 0);

    let spec = out.spec;
    assert_eq!(spec.description, None);
    assert_eq!(spec.data.len(), 1);
    assert_eq!(spec.data[0].name, "source");
    let signals: Vec<&str> = spec.signals.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(signals, ["width", "height"]);

    assert_eq!(spec.marks.len(), 1);
    let Mark::Group(outer) = &spec.marks[0] else {
        panic!("expected outer group");
    };
    assert_eq!(outer.name, "nested_main_group");
    let update = outer.encode.as_ref().and_then(|e| e.update.as_ref()).unwrap();
    assert_eq!(update["width"], json!({ "signal": "width" }));
    assert_eq!(update["height"], json!({ "signal": "height" }));

    let doc = serde_json::to_value(&spec).unwrap();
    assert_eq!(doc["autosize"], json!("pad"));
    assert_eq!(doc["scales"][0]["name"], json!("x"));
}

#[test]
fn named_root_description_and_size_reexport() {
    let out = compile(
        &json!({
            "name": "child",
            "description": "a chart",
            "mark": "tick"
        }),
        None,
    )
    .unwrap();
    assert_eq!(out.spec.description.as_deref(), Some("a chart"));
    let signals: Vec<&str> = out.spec.signals.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(signals, ["width", "height", "child_width", "child_height"]);
    assert_eq!(out.spec.signals[0].update.as_deref(), Some("child_width"));
}

#[test]
fn empty_description_is_omitted() {
    let out = compile(&json!({ "description": "", "mark": "point" }), None).unwrap();
    assert_eq!(out.spec.description, None);
    let doc = serde_json::to_value(&out.spec).unwrap();
    assert!(doc.get("description").is_none());
}

#[test]
fn top_level_properties_merge_config_and_spec() {
    let out = compile(
        &json!({
            "config": { "background": "#111", "padding": 4 },
            "background": "#fff",
            "mark": "point"
        }),
        None,
    )
    .unwrap();
    let top = &out.spec.top_level;
    assert_eq!(top.background.as_deref(), Some("#fff"));
    assert_eq!(top.padding, Some(json!(4)));
    assert_eq!(top.autosize, Some(json!("pad")));
}

#[test]
fn composite_root_keeps_layout_on_outer_group() {
    let out = compile(
        &json!({
            "data": { "values": [] },
            "hconcat": [{ "mark": "point" }, { "mark": "point" }]
        }),
        None,
    )
    .unwrap();
    let Mark::Group(outer) = &out.spec.marks[0] else {
        panic!("expected outer group");
    };
    assert!(outer.layout.is_some());
    assert!(outer.encode.is_none());
    assert_eq!(outer.marks.len(), 2);
}

#[test]
fn stage_errors_surface_unchanged() {
    let err = compile(&json!({ "config": 5, "mark": "point" }), None).unwrap_err();
    assert!(matches!(err, CompileError::Config(_)));

    let err = compile(&json!({ "background": 5, "mark": "point" }), None).unwrap_err();
    assert!(matches!(err, CompileError::Config(_)));

    let err = compile(&json!({ "marks": "point" }), None).unwrap_err();
    assert!(matches!(err, CompileError::Normalize(_)));

    let err = compile(&json!(3), None).unwrap_err();
    assert!(matches!(err, CompileError::Normalize(_)));

    let err = compile(&json!({ "layer": [] }), None).unwrap_err();
    assert!(matches!(err, CompileError::Model(_)));
}

#[test]
fn string_and_reader_entry_points() {
    let out = compile_str(r#"{"mark": "point"}"#, None).unwrap();
    assert_eq!(out.spec.marks.len(), 1);

    let out = compile_reader(r#"{"mark": "bar"}"#.as_bytes(), None).unwrap();
    assert_eq!(out.spec.marks.len(), 1);

    let err = compile_str("{not json", None).unwrap_err();
    assert!(matches!(err, CompileError::Serde(_)));
}
