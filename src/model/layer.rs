use std::sync::Arc;

use crate::{
    config::resolve::Config,
    foundation::diagnostics::{Diagnostic, DiagnosticSink},
    foundation::error::{CompileError, CompileResult},
    model::{
        Model, ModelComponents, ParentScope, RepeaterValue, build_model,
        base::{Component, ModelBase},
    },
    spec::model::{LayerSpec, NormalizedSpec},
};

/// Views drawn on top of each other in one plot area.
#[derive(Debug)]
pub struct LayerModel {
    pub(crate) base: ModelBase,
    pub(crate) children: Vec<Model>,
    width: Option<f64>,
    height: Option<f64>,
}

impl LayerModel {
    pub(crate) fn build(
        spec: &LayerSpec,
        parent: Option<&ParentScope>,
        parent_given_name: &str,
        repeater: Option<&RepeaterValue>,
        config: Arc<Config>,
    ) -> CompileResult<Self> {
        let base = ModelBase::new(&spec.header, parent, parent_given_name, config.clone())?;
        if spec.layer.is_empty() {
            return Err(CompileError::model(format!(
                "layer '{}' has no views",
                base.display_name()
            )));
        }

        let scope = base.child_scope(true);
        let mut children = Vec::with_capacity(spec.layer.len());
        for (i, child) in spec.layer.iter().enumerate() {
            if !matches!(child, NormalizedSpec::Unit(_) | NormalizedSpec::Layer(_)) {
                return Err(CompileError::model(format!(
                    "layer '{}' may only contain unit or layer views",
                    base.display_name()
                )));
            }
            children.push(build_model(
                child,
                Some(&scope),
                &base.get_name(&format!("layer_{i}")),
                repeater,
                config.clone(),
            )?);
        }

        Ok(Self {
            base,
            children,
            width: spec.width,
            height: spec.height,
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
        if base.shares_size {
            if self.width.is_some() || self.height.is_some() {
                sink.emit(Diagnostic::warn(format!(
                    "size of nested layer '{}' is ignored; the outer layer sets it",
                    base.display_name()
                )));
            }
        } else {
            component.layout_signals = base.fixed_size_signals(self.width, self.height);
        }

        let group = &mut component.group;
        group.title = base.title.clone();
        for child in &self.children {
            let fragment = child.assemble_group(Vec::new())?;
            group.marks.extend(fragment.marks);
            group.scales.extend(fragment.scales);
            for signal in fragment.signals {
                if !group.signals.iter().any(|s| s.name == signal.name) {
                    group.signals.push(signal);
                }
            }
            for axis in fragment.axes {
                let orient = axis.get("orient");
                if !group.axes.iter().any(|a| a.get("orient") == orient) {
                    group.axes.push(axis);
                }
            }
            group.legends.extend(fragment.legends);
        }
        for child in &self.children {
            component.absorb(child.component()?);
        }
        component.parent_group_properties = base.view_group_properties();
        Ok(component)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/layer.rs"]
mod tests;
