use super::*;
use serde_json::Value;

use crate::foundation::diagnostics::CollectingSink;
use crate::spec::normalize::normalize;

pub(crate) fn normalized(input: Value) -> NormalizedSpec {
    normalize(&input, &Config::default(), &mut CollectingSink::new()).unwrap()
}

pub(crate) fn built(input: Value) -> CompileResult<Model> {
    build_model(
        &normalized(input),
        None,
        "",
        None,
        Arc::new(Config::default()),
    )
}

pub(crate) fn parsed_with(input: Value, config: Config) -> (Model, CollectingSink) {
    let mut sink = CollectingSink::new();
    let spec = normalize(&input, &config, &mut sink).unwrap();
    let mut model = build_model(&spec, None, "", None, Arc::new(config)).unwrap();
    model.parse(&mut sink).unwrap();
    (model, sink)
}

pub(crate) fn parsed(input: Value) -> (Model, CollectingSink) {
    parsed_with(input, Config::default())
}

#[test]
fn accessors_fail_before_parse() {
    let model = built(json!({ "mark": "point" })).unwrap();
    assert!(matches!(model.assemble_data(), Err(CompileError::Assembly(_))));
    assert!(matches!(
        model.assemble_group(Vec::new()),
        Err(CompileError::Assembly(_))
    ));
    assert!(matches!(model.assemble_layout(), Err(CompileError::Assembly(_))));
}

#[test]
fn second_parse_is_rejected() {
    let mut model = built(json!({ "mark": "point" })).unwrap();
    let mut sink = CollectingSink::new();
    model.parse(&mut sink).unwrap();
    assert!(matches!(model.parse(&mut sink), Err(CompileError::Parse(_))));
}

#[test]
fn children_are_named_after_their_position() {
    let model = built(json!({
        "layer": [{ "mark": "point" }, { "mark": "rule" }]
    }))
    .unwrap();
    let Model::Layer(layer) = &model else {
        panic!("expected layer");
    };
    let names: Vec<&str> = layer.children.iter().map(|c| c.name()).collect();
    assert_eq!(names, ["layer_0", "layer_1"]);

    let model = built(json!({
        "name": "top",
        "hconcat": [{ "mark": "point" }, { "name": "own", "mark": "bar" }]
    }))
    .unwrap();
    let Model::Concat(concat) = &model else {
        panic!("expected concat");
    };
    let names: Vec<&str> = concat.children.iter().map(|c| c.name()).collect();
    assert_eq!(names, ["top_concat_0", "own"]);
}

#[test]
fn children_inherit_data_and_transforms_derive_sources() {
    let (model, _) = parsed(json!({
        "name": "cars",
        "data": { "url": "cars.json" },
        "transform": [{ "type": "filter", "expr": "datum.hp > 100" }],
        "vconcat": [{ "mark": "point" }]
    }));
    let data = model.assemble_data().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0].name, "cars_source");
    assert_eq!(data[0].url.as_deref(), Some("cars.json"));
    assert_eq!(data[1].name, "cars_data");
    assert_eq!(data[1].source.as_deref(), Some("cars_source"));

    let Model::Concat(concat) = &model else {
        panic!("expected concat");
    };
    assert_eq!(concat.children[0].base().data_name.as_deref(), Some("cars_data"));
}

#[test]
fn named_data_is_referenced_not_declared() {
    let (model, _) = parsed(json!({ "data": { "name": "table" }, "mark": "point" }));
    assert!(model.assemble_data().unwrap().is_empty());
    assert_eq!(model.base().data_name.as_deref(), Some("table"));
}

#[test]
fn transforms_without_data_are_rejected() {
    let err = built(json!({ "transform": [{ "type": "filter" }], "mark": "point" })).unwrap_err();
    assert!(matches!(err, CompileError::Model(_)));
}

#[test]
fn extras_are_prepended() {
    let (model, _) = parsed(json!({
        "data": { "values": [] },
        "mark": "point",
        "selection": { "pick": { "type": "single" } }
    }));
    let data = model
        .assemble_selection_data(vec![DataSource::named("first")])
        .unwrap();
    let names: Vec<&str> = data.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["first", "pick_store"]);

    let group = model
        .assemble_group(vec![Signal::value("extra", json!(1))])
        .unwrap();
    assert_eq!(group.signals[0].name, "extra");
    assert_eq!(group.signals[1].name, "unit");
}

#[test]
fn repeater_looks_up_by_direction() {
    let repeater = RepeaterValue {
        row: Some("a".to_string()),
        column: None,
    };
    assert_eq!(repeater.get(RepeatDir::Row), Some("a"));
    assert_eq!(repeater.get(RepeatDir::Column), None);
}

#[test]
fn size_expressions() {
    assert_eq!(sum_expr(&["a"], 10.0), "a");
    assert_eq!(sum_expr(&["a", "b", "c"], 10.0), "a + b + c + 20");
    assert_eq!(max_expr(&["a"]), "a");
    assert_eq!(max_expr(&["a", "b"]), "max(a, b)");
}
