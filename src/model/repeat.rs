use std::sync::Arc;

use crate::{
    config::resolve::Config,
    foundation::diagnostics::DiagnosticSink,
    foundation::error::{CompileError, CompileResult},
    model::{
        Model, ModelComponents, ParentScope, RepeaterValue, build_model, cell_group,
        composite_group, sum_expr,
        base::{Component, ModelBase},
    },
    spec::model::RepeatSpec,
    vega::spec::{Layout, LayoutColumns, Signal},
};

/// One copy of the inner view per (row field, column field) pair, row-major.
#[derive(Debug)]
pub struct RepeatModel {
    pub(crate) base: ModelBase,
    pub(crate) columns: usize,
    pub(crate) children: Vec<Model>,
}

impl RepeatModel {
    pub(crate) fn build(
        spec: &RepeatSpec,
        parent: Option<&ParentScope>,
        parent_given_name: &str,
        config: Arc<Config>,
    ) -> CompileResult<Self> {
        let base = ModelBase::new(&spec.header, parent, parent_given_name, config.clone())?;
        let (rows, columns) = (&spec.repeat.row, &spec.repeat.column);
        if rows.is_empty() && columns.is_empty() {
            return Err(CompileError::model(format!(
                "repeat '{}' needs at least one row or column field",
                base.display_name()
            )));
        }

        let row_fields: Vec<Option<&String>> = if rows.is_empty() {
            vec![None]
        } else {
            rows.iter().map(Some).collect()
        };
        let column_fields: Vec<Option<&String>> = if columns.is_empty() {
            vec![None]
        } else {
            columns.iter().map(Some).collect()
        };

        let scope = base.child_scope(false);
        let mut children = Vec::with_capacity(row_fields.len() * column_fields.len());
        for row in &row_fields {
            for column in &column_fields {
                let mut suffix = "child".to_string();
                for field in [row, column].into_iter().flatten() {
                    suffix.push('_');
                    suffix.push_str(field);
                }
                let repeater = RepeaterValue {
                    row: row.cloned(),
                    column: column.cloned(),
                };
                children.push(build_model(
                    &spec.spec,
                    Some(&scope),
                    &base.get_name(&suffix),
                    Some(&repeater),
                    config.clone(),
                )?);
            }
        }

        Ok(Self {
            base,
            columns: column_fields.len(),
            children,
        })
    }

    pub(crate) fn parse(&mut self, sink: &mut dyn DiagnosticSink) -> CompileResult<Component> {
        for child in &mut self.children {
            child.parse(sink)?;
        }

        let base = &self.base;
        let mut component = Component {
            data: base.own_data.clone(),
            ..Component::default()
        };
        let mut cells = Vec::with_capacity(self.children.len());
        for child in &self.children {
            component.absorb(child.component()?);
            cells.push(cell_group(child, child.get_name("group"))?);
        }

        let spacing = base.config.layout.spacing;
        let first_row: Vec<&str> = self.children[..self.columns]
            .iter()
            .map(|c| c.size().width.as_str())
            .collect();
        let first_column: Vec<&str> = self
            .children
            .iter()
            .step_by(self.columns)
            .map(|c| c.size().height.as_str())
            .collect();
        component.layout_signals.push(Signal::update(
            base.size.width.clone(),
            sum_expr(&first_row, spacing),
        ));
        component.layout_signals.push(Signal::update(
            base.size.height.clone(),
            sum_expr(&first_column, spacing),
        ));

        component.layout = Some(Layout::grid(
            Some(LayoutColumns::Fixed(
                u32::try_from(self.columns.max(1)).unwrap_or(u32::MAX),
            )),
            spacing,
        ));
        component.group = composite_group(cells, base.title.clone());
        Ok(component)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/repeat.rs"]
mod tests;
