use serde_json::json;

use crate::foundation::diagnostics::DiagnosticLevel;
use crate::foundation::error::CompileError;
use crate::model::tests::{built, parsed};
use crate::model::{Model, ModelComponents};
use crate::vega::spec::LayoutColumns;

fn scatter_matrix() -> serde_json::Value {
    json!({
        "data": { "url": "cars.json" },
        "repeat": { "row": ["Horsepower", "Miles per Gallon"], "column": ["Acceleration"] },
        "spec": {
            "mark": "point",
            "encoding": {
                "x": { "field": { "repeat": "column" }, "type": "quantitative" },
                "y": { "field": { "repeat": "row" }, "type": "quantitative" }
            }
        }
    })
}

#[test]
fn cells_are_named_after_their_fields() {
    let (model, _) = parsed(scatter_matrix());
    let Model::Repeat(repeat) = &model else {
        panic!("expected repeat");
    };
    let names: Vec<&str> = repeat.children.iter().map(|c| c.name()).collect();
    assert_eq!(
        names,
        [
            "child_Horsepower_Acceleration",
            "child_Miles_per_Gallon_Acceleration"
        ]
    );
}

#[test]
fn repeat_references_are_substituted() {
    let (model, sink) = parsed(scatter_matrix());
    assert_eq!(sink.at_least(DiagnosticLevel::Warn).count(), 0);

    let group = model.assemble_group(Vec::new()).unwrap();
    let second = serde_json::to_value(&group.marks[1]).unwrap();
    let update = &second["marks"][0]["encode"]["update"];
    assert_eq!(update["x"]["field"], json!("Acceleration"));
    assert_eq!(update["y"]["field"], json!("Miles per Gallon"));
}

#[test]
fn grid_follows_the_column_list() {
    let (model, _) = parsed(scatter_matrix());
    let layout = model.assemble_layout().unwrap().unwrap();
    assert_eq!(layout.columns, Some(LayoutColumns::Fixed(1)));

    let signals = model.assemble_layout_signals().unwrap();
    let own = &signals[signals.len() - 2..];
    assert_eq!(own[0].name, "width");
    assert_eq!(own[0].update.as_deref(), Some("child_Horsepower_Acceleration_width"));
    assert_eq!(
        own[1].update.as_deref(),
        Some("child_Horsepower_Acceleration_height + child_Miles_per_Gallon_Acceleration_height + 10")
    );
}

#[test]
fn column_only_repeat_is_one_row() {
    let (model, sink) = parsed(json!({
        "data": { "values": [] },
        "repeat": { "column": ["a", "b", "c"] },
        "spec": {
            "mark": "bar",
            "encoding": {
                "x": { "field": { "repeat": "column" }, "type": "nominal" },
                "y": { "field": { "repeat": "row" }, "type": "quantitative" }
            }
        }
    }));
    // every cell drops its unmatched row reference
    assert_eq!(sink.at_least(DiagnosticLevel::Warn).count(), 3);

    let Model::Repeat(repeat) = &model else {
        panic!("expected repeat");
    };
    let names: Vec<&str> = repeat.children.iter().map(|c| c.name()).collect();
    assert_eq!(names, ["child_a", "child_b", "child_c"]);
    assert_eq!(
        model.assemble_layout().unwrap().unwrap().columns,
        Some(LayoutColumns::Fixed(3))
    );
}

#[test]
fn repeat_needs_fields() {
    let err = built(json!({ "repeat": {}, "spec": { "mark": "point" } })).unwrap_err();
    assert!(matches!(err, CompileError::Model(_)));
}
