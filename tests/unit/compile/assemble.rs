use serde_json::Value;

use super::*;
use crate::vega::spec::{DataSource, Layout, LayoutColumns, PrimitiveMark};

/// Model stand-in with fixed, already-computed fragments.
#[derive(Default)]
struct FakeModel {
    name: String,
    description: Option<String>,
    selection_data: Vec<DataSource>,
    data: Vec<DataSource>,
    layout_signals: Vec<Signal>,
    top_signals: Vec<Signal>,
    group: GroupFragment,
    layout: Option<Layout>,
    parent_props: EncodeEntry,
}

impl ModelComponents for FakeModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn get_name(&self, suffix: &str) -> String {
        crate::foundation::naming::qualify(&self.name, suffix)
    }

    fn assemble_selection_data(&self, extras: Vec<DataSource>) -> CompileResult<Vec<DataSource>> {
        Ok(extras.into_iter().chain(self.selection_data.clone()).collect())
    }

    fn assemble_data(&self) -> CompileResult<Vec<DataSource>> {
        Ok(self.data.clone())
    }

    fn assemble_layout_signals(&self) -> CompileResult<Vec<Signal>> {
        Ok(self.layout_signals.clone())
    }

    fn assemble_selection_top_level_signals(&self, extras: Vec<Signal>) -> CompileResult<Vec<Signal>> {
        Ok(extras.into_iter().chain(self.top_signals.clone()).collect())
    }

    fn assemble_group(&self, extras: Vec<Signal>) -> CompileResult<GroupFragment> {
        let mut group = self.group.clone();
        group.signals = extras.into_iter().chain(group.signals).collect();
        group.layout = self.layout.clone();
        Ok(group)
    }

    fn assemble_layout(&self) -> CompileResult<Option<Layout>> {
        Ok(self.layout.clone())
    }

    fn assemble_parent_group_properties(&self) -> CompileResult<EncodeEntry> {
        Ok(self.parent_props.clone())
    }
}

fn point_mark() -> Mark {
    Mark::Primitive(PrimitiveMark {
        name: "marks".to_string(),
        kind: "symbol".to_string(),
        style: None,
        from: None,
        encode: None,
    })
}

fn document(model: &FakeModel) -> Value {
    let out = assemble(model, TopLevelProperties::default()).unwrap();
    serde_json::to_value(out.spec).unwrap()
}

#[test]
fn selection_data_precedes_regular_data() {
    let model = FakeModel {
        selection_data: vec![DataSource::named("S1"), DataSource::named("S2")],
        data: vec![DataSource::named("D1")],
        ..FakeModel::default()
    };
    let out = assemble(&model, TopLevelProperties::default()).unwrap();
    let names: Vec<&str> = out.spec.data.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["S1", "S2", "D1"]);
}

#[test]
fn unnamed_root_has_no_size_reexports() {
    let model = FakeModel {
        layout_signals: vec![Signal::value("width", json!(200))],
        top_signals: vec![Signal::update("sel", "vlSelectionResolve(\"sel_store\")")],
        ..FakeModel::default()
    };
    let out = assemble(&model, TopLevelProperties::default()).unwrap();
    let names: Vec<&str> = out.spec.signals.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["width", "sel"]);
    assert_eq!(out.spec.signals[0].update, None);
}

#[test]
fn named_root_reexports_its_size() {
    let model = FakeModel {
        name: "child".to_string(),
        layout_signals: vec![
            Signal::value("child_width", json!(200)),
            Signal::value("child_height", json!(200)),
        ],
        ..FakeModel::default()
    };
    let out = assemble(&model, TopLevelProperties::default()).unwrap();
    let signals = &out.spec.signals;
    assert_eq!(signals[0], Signal::update("width", "child_width"));
    assert_eq!(signals[1], Signal::update("height", "child_height"));
    assert_eq!(signals[2].name, "child_width");
    assert_eq!(signals.len(), 4);

    let doc = document(&model);
    assert_eq!(doc["marks"][0]["name"], json!("child_nested_main_group"));
}

#[test]
fn outer_group_binds_size_without_layout() {
    let model = FakeModel {
        group: GroupFragment {
            marks: vec![point_mark()],
            ..GroupFragment::default()
        },
        ..FakeModel::default()
    };
    let doc = document(&model);
    let marks = doc["marks"].as_array().unwrap();
    assert_eq!(marks.len(), 1);
    assert_eq!(
        marks[0],
        json!({
            "name": "nested_main_group",
            "type": "group",
            "encode": { "update": {
                "width": { "signal": "width" },
                "height": { "signal": "height" }
            }},
            "marks": [{ "name": "marks", "type": "symbol" }]
        })
    );
}

#[test]
fn outer_group_with_layout_omits_empty_encode() {
    let model = FakeModel {
        layout: Some(Layout::grid(Some(LayoutColumns::Fixed(2)), 10.0)),
        group: GroupFragment {
            signals: vec![Signal::value("local", json!(1))],
            ..GroupFragment::default()
        },
        ..FakeModel::default()
    };
    let doc = document(&model);
    let outer = &doc["marks"][0];
    assert!(outer.get("encode").is_none());
    assert_eq!(outer["layout"]["columns"], json!(2));
    assert_eq!(outer["signals"][0]["name"], json!("local"));
    assert!(doc.get("layout").is_none());
}

#[test]
fn parent_group_properties_win_over_size_binding() {
    let mut parent_props = EncodeEntry::new();
    parent_props.insert("width".to_string(), json!({ "value": 5 }));
    parent_props.insert("fill".to_string(), json!({ "value": "#eee" }));
    let model = FakeModel {
        parent_props,
        ..FakeModel::default()
    };
    let doc = document(&model);
    assert_eq!(
        doc["marks"][0]["encode"]["update"],
        json!({
            "width": { "value": 5 },
            "height": { "signal": "height" },
            "fill": { "value": "#eee" }
        })
    );
}

#[test]
fn root_group_fields_land_on_the_document() {
    let model = FakeModel {
        description: Some("cars".to_string()),
        group: GroupFragment {
            scales: vec![json!({ "name": "x" })],
            title: Some(json!("Cars")),
            ..GroupFragment::default()
        },
        ..FakeModel::default()
    };
    let doc = document(&model);
    assert_eq!(doc["$schema"], json!(VEGA_SCHEMA));
    assert_eq!(doc["description"], json!("cars"));
    assert_eq!(doc["autosize"], json!("pad"));
    assert_eq!(doc["scales"], json!([{ "name": "x" }]));
    assert_eq!(doc["title"], json!("Cars"));
    assert!(doc["marks"][0].get("scales").is_none());
    assert!(doc.get("axes").is_none());
}

#[test]
fn top_level_properties_override_defaults() {
    let top = TopLevelProperties {
        autosize: Some(json!("fit")),
        background: Some("white".to_string()),
        padding: None,
    };
    let out = assemble(&FakeModel::default(), top).unwrap();
    let doc = serde_json::to_value(out.spec).unwrap();
    assert_eq!(doc["autosize"], json!("fit"));
    assert_eq!(doc["background"], json!("white"));
    assert!(doc.get("padding").is_none());
    assert!(doc.get("description").is_none());
}
