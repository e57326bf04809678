use serde_json::json;

use crate::{
    config::toplevel::TopLevelProperties,
    foundation::error::CompileResult,
    model::ModelComponents,
    vega::spec::{
        CompileOutput, Encode, EncodeEntry, GroupFragment, GroupMark, Mark, Signal, VEGA_SCHEMA,
        VgSpec,
    },
};

/// Build the output document from a parsed root model.
///
/// Pure function of its inputs; the model must already be parsed.
#[tracing::instrument(skip_all)]
pub fn assemble<M: ModelComponents + ?Sized>(
    model: &M,
    top_level: TopLevelProperties,
) -> CompileResult<CompileOutput> {
    let data = {
        let mut data = model.assemble_selection_data(Vec::new())?;
        data.extend(model.assemble_data()?);
        data
    };

    let mut signals = Vec::new();
    if !model.name().is_empty() {
        signals.push(Signal::update("width", model.get_name("width")));
        signals.push(Signal::update("height", model.get_name("height")));
    }
    signals.extend(model.assemble_layout_signals()?);
    signals.extend(model.assemble_selection_top_level_signals(Vec::new())?);

    let group = assemble_nested_main_group(model)?;
    tracing::debug!(
        sources = data.len(),
        signals = signals.len(),
        "assembled document"
    );

    Ok(CompileOutput {
        spec: VgSpec {
            schema: VEGA_SCHEMA.to_string(),
            description: model.description().map(str::to_string),
            top_level: top_level.with_default_autosize("pad"),
            data,
            signals,
            scales: group.scales,
            axes: group.axes,
            legends: group.legends,
            title: group.title,
            marks: group.marks,
        },
    })
}

/// Wrap the root's rendering group in one more group so its layout and signals are
/// scoped below the document root.
///
/// The returned fragment keeps the root group's scales, axes, legends and title; its
/// `marks` hold exactly the synthesized group.
pub fn assemble_nested_main_group<M: ModelComponents + ?Sized>(
    model: &M,
) -> CompileResult<GroupFragment> {
    let GroupFragment {
        marks,
        layout,
        signals,
        scales,
        axes,
        legends,
        title,
    } = model.assemble_group(Vec::new())?;

    let mut update = EncodeEntry::new();
    if model.assemble_layout()?.is_none() {
        update.insert("width".to_string(), json!({ "signal": "width" }));
        update.insert("height".to_string(), json!({ "signal": "height" }));
    }
    update.extend(model.assemble_parent_group_properties()?);

    let mut nested = GroupMark::from_fragment(
        model.get_name("nested_main_group"),
        GroupFragment {
            marks,
            layout,
            signals,
            ..GroupFragment::default()
        },
    );
    nested.encode = Encode::update_if_any(update);

    Ok(GroupFragment {
        marks: vec![Mark::Group(Box::new(nested))],
        layout: None,
        signals: Vec::new(),
        scales,
        axes,
        legends,
        title,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/compile/assemble.rs"]
mod tests;
