use std::{collections::BTreeMap, sync::Arc};

use crate::{
    config::resolve::Config,
    foundation::diagnostics::{Diagnostic, DiagnosticSink},
    foundation::error::CompileResult,
    model::{
        ParentScope, RepeaterValue,
        base::{Component, ModelBase},
        encode::{aggregate_source, encode_channels, resolve_channels},
        selection::parse_selections,
    },
    spec::model::{Channel, ChannelDef, MarkDef, SelectionDef, UnitSpec},
    vega::spec::{Encode, GroupFragment, Mark, MarkFrom, PrimitiveMark},
};

/// A single view: one mark bound to one data source.
#[derive(Debug)]
pub struct UnitModel {
    pub(crate) base: ModelBase,
    mark: MarkDef,
    encoding: BTreeMap<Channel, ChannelDef>,
    width: Option<f64>,
    height: Option<f64>,
    selection: BTreeMap<String, SelectionDef>,
    repeater: Option<RepeaterValue>,
}

impl UnitModel {
    pub(crate) fn build(
        spec: &UnitSpec,
        parent: Option<&ParentScope>,
        parent_given_name: &str,
        repeater: Option<&RepeaterValue>,
        config: Arc<Config>,
    ) -> CompileResult<Self> {
        Ok(Self {
            base: ModelBase::new(&spec.header, parent, parent_given_name, config)?,
            mark: spec.mark.clone(),
            encoding: spec.encoding.clone(),
            width: spec.width,
            height: spec.height,
            selection: spec.selection.clone(),
            repeater: repeater.cloned(),
        })
    }

    pub(crate) fn parse(&mut self, sink: &mut dyn DiagnosticSink) -> CompileResult<Component> {
        let base = &self.base;
        let mut component = Component {
            data: base.own_data.clone(),
            ..Component::default()
        };

        if base.shares_size {
            if self.width.is_some() || self.height.is_some() {
                sink.emit(Diagnostic::warn(format!(
                    "size of layered view '{}' is ignored; the layer sets it",
                    base.display_name()
                )));
            }
        } else {
            component.layout_signals = base.fixed_size_signals(self.width, self.height);
        }

        let mut channels = resolve_channels(&self.encoding, self.repeater.as_ref(), sink)?;
        let aggregate = aggregate_source(
            base.get_name("aggregate"),
            base.data_name.as_deref(),
            &mut channels,
        )?;
        let mark_data = match &aggregate {
            Some(source) => Some(source.name.clone()),
            None => base.data_name.clone(),
        };
        component.data.extend(aggregate);

        let guides = encode_channels(base, &self.mark, &channels, mark_data.as_deref(), sink)?;
        let kind = self.mark.kind();
        let mark = PrimitiveMark {
            name: base.get_name("marks"),
            kind: kind.vega_type().to_string(),
            style: Some(self.mark.style().unwrap_or(kind.as_str()).to_string()),
            from: mark_data.map(|data| MarkFrom {
                data: Some(data),
                facet: None,
            }),
            encode: Encode::update_if_any(guides.encode),
        };

        let selections = parse_selections(base, &self.selection)?;
        component.selection_data = selections.data;
        component.top_signals = selections.top_signals;
        component.group = GroupFragment {
            marks: vec![Mark::Primitive(mark)],
            signals: selections.group_signals,
            scales: guides.scales,
            axes: guides.axes,
            legends: guides.legends,
            title: base.title.clone(),
            layout: None,
        };
        component.parent_group_properties = base.view_group_properties();
        Ok(component)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/unit.rs"]
mod tests;
