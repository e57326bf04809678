use super::*;
use crate::foundation::diagnostics::{CollectingSink, DiagnosticLevel};
use crate::spec::model::{Channel, ConcatDirection, MarkType, NormalizedSpec};

fn run(input: Value) -> (CompileResult<NormalizedSpec>, CollectingSink) {
    let mut sink = CollectingSink::new();
    let out = normalize(&input, &Config::default(), &mut sink);
    (out, sink)
}

#[test]
fn plain_unit_stays_unit() {
    let (out, sink) = run(json!({
        "$schema": "ignored",
        "background": "white",
        "data": { "values": [{ "a": 1 }] },
        "mark": "point",
        "encoding": { "x": { "field": "a", "type": "quantitative" } }
    }));
    let NormalizedSpec::Unit(unit) = out.unwrap() else {
        panic!("expected unit");
    };
    assert_eq!(unit.mark.kind(), MarkType::Point);
    assert!(unit.encoding.contains_key(&Channel::X));
    assert!(sink.diagnostics.is_empty());
}

#[test]
fn row_column_encodings_become_facet() {
    let (out, sink) = run(json!({
        "name": "cars",
        "data": { "url": "cars.json" },
        "mark": "point",
        "encoding": {
            "x": { "field": "hp", "type": "quantitative" },
            "column": { "field": "origin", "type": "nominal" }
        }
    }));
    let NormalizedSpec::Facet(facet) = out.unwrap() else {
        panic!("expected facet");
    };
    assert_eq!(facet.header.name.as_deref(), Some("cars"));
    assert!(facet.header.data.is_some());
    assert!(facet.facet.column.is_some());
    assert!(facet.facet.row.is_none());

    let NormalizedSpec::Unit(inner) = facet.spec.as_ref() else {
        panic!("expected unit cell");
    };
    assert!(inner.header.name.is_none());
    assert!(inner.header.data.is_none());
    assert!(!inner.encoding.contains_key(&Channel::Column));
    assert_eq!(sink.at_least(DiagnosticLevel::Warn).count(), 0);
    assert_eq!(sink.diagnostics.len(), 1);
}

#[test]
fn line_with_point_becomes_layer() {
    let (out, _) = run(json!({
        "data": { "values": [] },
        "width": 300,
        "mark": { "type": "line", "point": true },
        "encoding": { "x": { "field": "t", "type": "temporal" } }
    }));
    let NormalizedSpec::Layer(layer) = out.unwrap() else {
        panic!("expected layer");
    };
    assert_eq!(layer.width, Some(300.0));
    assert!(layer.header.data.is_some());
    assert_eq!(layer.layer.len(), 2);
    let NormalizedSpec::Unit(overlay) = &layer.layer[1] else {
        panic!("expected unit overlay");
    };
    assert_eq!(overlay.mark.kind(), MarkType::Point);
    assert!(overlay.encoding.contains_key(&Channel::X));
}

#[test]
fn point_overlay_follows_config_default() {
    let mut config = Config::default();
    config.mark.point = true;
    let mut sink = CollectingSink::new();
    let out = normalize(
        &json!({ "mark": { "type": "area" } }),
        &config,
        &mut sink,
    )
    .unwrap();
    assert!(matches!(out, NormalizedSpec::Layer(_)));

    let out = normalize(
        &json!({ "mark": { "type": "area", "point": false } }),
        &config,
        &mut sink,
    )
    .unwrap();
    assert!(matches!(out, NormalizedSpec::Unit(_)));

    let out = normalize(&json!({ "mark": "line" }), &config, &mut sink).unwrap();
    let NormalizedSpec::Layer(layer) = out else {
        panic!("expected layer for string-form line mark");
    };
    assert_eq!(layer.layer.len(), 2);

    let out = normalize(&json!({ "mark": "bar" }), &config, &mut sink).unwrap();
    assert!(matches!(out, NormalizedSpec::Unit(_)));

    let out = normalize(&json!({ "mark": "line" }), &Config::default(), &mut sink).unwrap();
    assert!(matches!(out, NormalizedSpec::Unit(_)));
}

#[test]
fn facet_channels_inside_layer_are_dropped_with_warning() {
    let (out, sink) = run(json!({
        "layer": [{
            "mark": "bar",
            "encoding": { "row": { "field": "r", "type": "nominal" } }
        }]
    }));
    let NormalizedSpec::Layer(layer) = out.unwrap() else {
        panic!("expected layer");
    };
    let NormalizedSpec::Unit(unit) = &layer.layer[0] else {
        panic!("expected unit");
    };
    assert!(unit.encoding.is_empty());
    assert_eq!(sink.at_least(DiagnosticLevel::Warn).count(), 1);
}

#[test]
fn concat_direction_follows_key() {
    let (out, _) = run(json!({ "hconcat": [{ "mark": "bar" }, { "mark": "tick" }] }));
    let NormalizedSpec::Concat(concat) = out.unwrap() else {
        panic!("expected concat");
    };
    assert_eq!(concat.direction, ConcatDirection::Horizontal);
    assert_eq!(concat.concat.len(), 2);
}

#[test]
fn unsupported_shapes_are_normalize_errors() {
    let (out, _) = run(json!({ "marks": "bar" }));
    assert!(matches!(out, Err(CompileError::Normalize(_))));

    let (out, _) = run(json!([1]));
    assert!(matches!(out, Err(CompileError::Normalize(_))));

    let (out, _) = run(json!({ "mark": "bar", "encoding": { "z": { "field": "a" } } }));
    assert!(matches!(out, Err(CompileError::Normalize(_))));

    let (out, _) = run(json!({ "facet": { "row": { "field": "a" } } }));
    assert!(matches!(out, Err(CompileError::Normalize(_))));
}

#[test]
fn normalized_spec_serializes_back_to_canonical_json() {
    let (out, _) = run(json!({ "vconcat": [{ "mark": "bar" }] }));
    let value = serde_json::to_value(out.unwrap()).unwrap();
    assert_eq!(value, json!({ "vconcat": [{ "mark": "bar" }] }));
}
