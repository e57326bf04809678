use std::sync::Arc;

use crate::{
    config::resolve::Config,
    foundation::diagnostics::DiagnosticSink,
    foundation::error::{CompileError, CompileResult},
    model::{
        Model, ModelComponents, ParentScope, RepeaterValue, build_model, cell_group,
        composite_group, max_expr, sum_expr,
        base::{Component, ModelBase},
    },
    spec::model::{ConcatDirection, ConcatSpec},
    vega::spec::{Layout, LayoutColumns, Signal},
};

/// Views placed next to each other, in one row or one column.
#[derive(Debug)]
pub struct ConcatModel {
    pub(crate) base: ModelBase,
    pub(crate) direction: ConcatDirection,
    pub(crate) children: Vec<Model>,
}

impl ConcatModel {
    pub(crate) fn build(
        spec: &ConcatSpec,
        parent: Option<&ParentScope>,
        parent_given_name: &str,
        repeater: Option<&RepeaterValue>,
        config: Arc<Config>,
    ) -> CompileResult<Self> {
        let base = ModelBase::new(&spec.header, parent, parent_given_name, config.clone())?;
        if spec.concat.is_empty() {
            return Err(CompileError::model(format!(
                "concat '{}' has no views",
                base.display_name()
            )));
        }
        let scope = base.child_scope(false);
        let children = spec
            .concat
            .iter()
            .enumerate()
            .map(|(i, child)| {
                build_model(
                    child,
                    Some(&scope),
                    &base.get_name(&format!("concat_{i}")),
                    repeater,
                    config.clone(),
                )
            })
            .collect::<CompileResult<Vec<_>>>()?;
        Ok(Self {
            base,
            direction: spec.direction,
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

        let widths: Vec<&str> = self.children.iter().map(|c| c.size().width.as_str()).collect();
        let heights: Vec<&str> = self.children.iter().map(|c| c.size().height.as_str()).collect();
        let spacing = base.config.layout.spacing;
        let (width, height, columns) = match self.direction {
            ConcatDirection::Horizontal => (
                sum_expr(&widths, spacing),
                max_expr(&heights),
                self.children.len(),
            ),
            ConcatDirection::Vertical => (max_expr(&widths), sum_expr(&heights, spacing), 1),
        };
        component.layout_signals.push(Signal::update(base.size.width.clone(), width));
        component.layout_signals.push(Signal::update(base.size.height.clone(), height));

        component.layout = Some(Layout::grid(
            Some(LayoutColumns::Fixed(u32::try_from(columns).unwrap_or(u32::MAX))),
            spacing,
        ));
        component.group = composite_group(cells, base.title.clone());
        Ok(component)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/concat.rs"]
mod tests;
