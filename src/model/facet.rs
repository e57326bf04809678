use std::{collections::BTreeSet, sync::Arc};

use serde_json::json;

use crate::{
    config::resolve::Config,
    foundation::diagnostics::DiagnosticSink,
    foundation::error::{CompileError, CompileResult},
    model::{
        Model, ParentScope, RepeaterValue, build_model, cell_group, composite_group,
        base::{Component, ModelBase},
    },
    spec::model::{ChannelDef, FacetSpec, FieldRef},
    vega::spec::{DataSource, Facet, Layout, LayoutColumns, MarkFrom, Signal},
};

/// Small multiples: the inner view repeated once per distinct row/column value.
#[derive(Debug)]
pub struct FacetModel {
    pub(crate) base: ModelBase,
    pub(crate) row: Option<String>,
    pub(crate) column: Option<String>,
    pub(crate) child: Box<Model>,
}

impl FacetModel {
    pub(crate) fn build(
        spec: &FacetSpec,
        parent: Option<&ParentScope>,
        parent_given_name: &str,
        repeater: Option<&RepeaterValue>,
        config: Arc<Config>,
    ) -> CompileResult<Self> {
        let base = ModelBase::new(&spec.header, parent, parent_given_name, config.clone())?;
        let row = facet_field(&base, "row", spec.facet.row.as_ref(), repeater)?;
        let column = facet_field(&base, "column", spec.facet.column.as_ref(), repeater)?;
        if row.is_none() && column.is_none() {
            return Err(CompileError::model(format!(
                "facet '{}' needs a row or column field",
                base.display_name()
            )));
        }
        if base.data_name.is_none() {
            return Err(CompileError::model(format!(
                "facet '{}' has no data to partition",
                base.display_name()
            )));
        }

        let scope = ParentScope {
            data: Some(base.get_name("facet")),
            size: None,
        };
        let child = build_model(
            &spec.spec,
            Some(&scope),
            &base.get_name("child"),
            repeater,
            config,
        )?;
        Ok(Self {
            base,
            row,
            column,
            child: Box::new(child),
        })
    }

    pub(crate) fn parse(&mut self, sink: &mut dyn DiagnosticSink) -> CompileResult<Component> {
        self.child.parse(sink)?;

        let base = &self.base;
        let data = base
            .data_name
            .clone()
            .ok_or_else(|| CompileError::parse("facet lost its data source"))?;
        let facet_name = base.get_name("facet");

        let mut component = Component {
            data: base.own_data.clone(),
            ..Component::default()
        };
        for (dim, field) in [("row", &self.row), ("column", &self.column)] {
            if let Some(field) = field {
                component.data.push(DataSource {
                    name: base.get_name(&format!("{dim}_domain")),
                    source: Some(data.clone()),
                    transform: vec![json!({ "type": "aggregate", "groupby": [field] })],
                    ..DataSource::default()
                });
            }
        }

        // Sources derived from the per-cell partition only exist inside the cell.
        let child_component = self.child.component()?;
        let mut cell_data = Vec::new();
        let mut scoped = BTreeSet::from([facet_name.clone()]);
        let mut lifted = child_component.clone();
        lifted.data.clear();
        for source in &child_component.data {
            if source.source.as_ref().is_some_and(|s| scoped.contains(s)) {
                scoped.insert(source.name.clone());
                cell_data.push(source.clone());
            } else {
                lifted.data.push(source.clone());
            }
        }
        component.absorb(&lifted);

        let mut cell = cell_group(&self.child, base.get_name("cell"))?;
        cell.from = Some(MarkFrom {
            data: None,
            facet: Some(Facet {
                name: facet_name,
                data,
                groupby: [&self.row, &self.column].into_iter().flatten().cloned().collect(),
            }),
        });
        cell.data = cell_data;

        let spacing = base.config.layout.spacing;
        let child_size = self.child.size();
        let extent = |dim: &str, field: &Option<String>, cell_size: &str| match field {
            Some(_) => {
                let domain = base.get_name(&format!("{dim}_domain"));
                format!("length(data('{domain}')) * ({cell_size} + {spacing}) - {spacing}")
            }
            None => cell_size.to_string(),
        };
        component.layout_signals.push(Signal::update(
            base.size.width.clone(),
            extent("column", &self.column, &child_size.width),
        ));
        component.layout_signals.push(Signal::update(
            base.size.height.clone(),
            extent("row", &self.row, &child_size.height),
        ));

        let columns = match &self.column {
            Some(_) => LayoutColumns::Signal {
                signal: format!("length(data('{}'))", base.get_name("column_domain")),
            },
            None => LayoutColumns::Fixed(1),
        };
        component.layout = Some(Layout::grid(Some(columns), spacing));
        component.group = composite_group(vec![cell], base.title.clone());
        Ok(component)
    }
}

fn facet_field(
    base: &ModelBase,
    dim: &str,
    def: Option<&ChannelDef>,
    repeater: Option<&RepeaterValue>,
) -> CompileResult<Option<String>> {
    let Some(def) = def else {
        return Ok(None);
    };
    match &def.field {
        Some(FieldRef::Name(name)) => Ok(Some(name.clone())),
        Some(FieldRef::Repeat { repeat }) => repeater
            .and_then(|r| r.get(*repeat))
            .map(|name| Some(name.to_string()))
            .ok_or_else(|| {
                CompileError::model(format!(
                    "facet '{}' {dim} refers to a repeated field outside a matching repeat",
                    base.display_name()
                ))
            }),
        None => Err(CompileError::model(format!(
            "facet '{}' {dim} needs a field",
            base.display_name()
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/facet.rs"]
mod tests;
