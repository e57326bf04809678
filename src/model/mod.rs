//! Composition tree built from a normalized spec.
//!
//! [`build_model`] turns a [`NormalizedSpec`] into a [`Model`]; [`Model::parse`] computes
//! every node's [`Component`](base::Component) bottom-up; the [`ModelComponents`]
//! accessors then hand the precomputed fragments to the assembler.

pub(crate) mod base;
pub(crate) mod concat;
pub(crate) mod encode;
pub(crate) mod facet;
pub(crate) mod layer;
pub(crate) mod repeat;
pub(crate) mod selection;
pub(crate) mod unit;

use std::sync::Arc;

use serde_json::json;

use crate::{
    config::resolve::Config,
    foundation::diagnostics::DiagnosticSink,
    foundation::error::{CompileError, CompileResult},
    spec::model::{NormalizedSpec, RepeatDir},
    vega::spec::{DataSource, Encode, EncodeEntry, GroupFragment, GroupMark, Layout, Mark, Signal},
};

pub use base::ModelBase;
pub use concat::ConcatModel;
pub use facet::FacetModel;
pub use layer::LayerModel;
pub use repeat::RepeatModel;
pub use unit::UnitModel;

/// What a parent hands down to a child at construction time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParentScope {
    /// Data source the child inherits when it declares none.
    pub data: Option<String>,
    /// Size signals the child draws into instead of its own (layer children).
    pub size: Option<SizeSignals>,
}

/// Names of the two signals holding a view's plot size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SizeSignals {
    /// Width signal name.
    pub width: String,
    /// Height signal name.
    pub height: String,
}

/// Fields a repeat cell substitutes for `{"repeat": "row"|"column"}` references.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepeaterValue {
    /// Field of the cell's row.
    pub row: Option<String>,
    /// Field of the cell's column.
    pub column: Option<String>,
}

impl RepeaterValue {
    /// Field bound to `dir`, if this cell has one.
    pub fn get(&self, dir: RepeatDir) -> Option<&str> {
        match dir {
            RepeatDir::Row => self.row.as_deref(),
            RepeatDir::Column => self.column.as_deref(),
        }
    }
}

/// Read-only view of a parsed model, as consumed by the assembler.
///
/// Every `assemble_*` accessor returns fragments computed by parse. Calling one on a
/// model that has not been parsed fails with an assembly error. Accessors taking
/// `extras` place them before the model's own entries.
pub trait ModelComponents {
    /// Effective node name; empty for an unnamed root.
    fn name(&self) -> &str;
    /// Node description, if any.
    fn description(&self) -> Option<&str>;
    /// `suffix` qualified by the node name.
    fn get_name(&self, suffix: &str) -> String;
    /// Selection store sources of the whole subtree.
    fn assemble_selection_data(&self, extras: Vec<DataSource>) -> CompileResult<Vec<DataSource>>;
    /// Regular sources of the whole subtree.
    fn assemble_data(&self) -> CompileResult<Vec<DataSource>>;
    /// Size signals of the whole subtree.
    fn assemble_layout_signals(&self) -> CompileResult<Vec<Signal>>;
    /// Selection resolve signals of the whole subtree.
    fn assemble_selection_top_level_signals(&self, extras: Vec<Signal>) -> CompileResult<Vec<Signal>>;
    /// The node's rendering group; `extras` are prepended to its signals.
    fn assemble_group(&self, extras: Vec<Signal>) -> CompileResult<GroupFragment>;
    /// Grid layout of the node's child groups, for composite nodes.
    fn assemble_layout(&self) -> CompileResult<Option<Layout>>;
    /// Visual properties the enclosing group should apply for this node.
    fn assemble_parent_group_properties(&self) -> CompileResult<EncodeEntry>;
}

/// A node of the composition tree.
#[derive(Debug)]
pub enum Model {
    /// Single view.
    Unit(UnitModel),
    /// Stacked views sharing one plot area.
    Layer(LayerModel),
    /// Small multiples over data partitions.
    Facet(FacetModel),
    /// Small multiples over field lists.
    Repeat(RepeatModel),
    /// Side-by-side views.
    Concat(ConcatModel),
}

/// Construct the model for `spec`.
///
/// `parent_given_name` becomes the node's name unless the spec names itself;
/// `repeater` carries the enclosing repeat cell's fields down to units.
pub fn build_model(
    spec: &NormalizedSpec,
    parent: Option<&ParentScope>,
    parent_given_name: &str,
    repeater: Option<&RepeaterValue>,
    config: Arc<Config>,
) -> CompileResult<Model> {
    let model = match spec {
        NormalizedSpec::Unit(s) => {
            Model::Unit(UnitModel::build(s, parent, parent_given_name, repeater, config)?)
        }
        NormalizedSpec::Layer(s) => {
            Model::Layer(LayerModel::build(s, parent, parent_given_name, repeater, config)?)
        }
        NormalizedSpec::Facet(s) => {
            Model::Facet(FacetModel::build(s, parent, parent_given_name, repeater, config)?)
        }
        NormalizedSpec::Repeat(s) => {
            Model::Repeat(RepeatModel::build(s, parent, parent_given_name, config)?)
        }
        NormalizedSpec::Concat(s) => {
            Model::Concat(ConcatModel::build(s, parent, parent_given_name, repeater, config)?)
        }
    };
    Ok(model)
}

impl Model {
    /// Shared node state.
    pub fn base(&self) -> &ModelBase {
        match self {
            Self::Unit(m) => &m.base,
            Self::Layer(m) => &m.base,
            Self::Facet(m) => &m.base,
            Self::Repeat(m) => &m.base,
            Self::Concat(m) => &m.base,
        }
    }

    fn base_mut(&mut self) -> &mut ModelBase {
        match self {
            Self::Unit(m) => &mut m.base,
            Self::Layer(m) => &mut m.base,
            Self::Facet(m) => &mut m.base,
            Self::Repeat(m) => &mut m.base,
            Self::Concat(m) => &mut m.base,
        }
    }

    /// Compute this node's component, parsing descendants first.
    ///
    /// Runs once per node; a second call fails with a parse error.
    pub fn parse(&mut self, sink: &mut dyn DiagnosticSink) -> CompileResult<()> {
        if self.base().component.is_some() {
            return Err(CompileError::parse(format!(
                "view '{}' was already parsed",
                self.base().display_name()
            )));
        }
        tracing::debug!(view = self.base().display_name(), "parse");
        let component = match self {
            Self::Unit(m) => m.parse(sink)?,
            Self::Layer(m) => m.parse(sink)?,
            Self::Facet(m) => m.parse(sink)?,
            Self::Repeat(m) => m.parse(sink)?,
            Self::Concat(m) => m.parse(sink)?,
        };
        self.base_mut().component = Some(component);
        Ok(())
    }

    /// Size signals this node draws into.
    pub fn size(&self) -> &SizeSignals {
        &self.base().size
    }

    pub(crate) fn component(&self) -> CompileResult<&base::Component> {
        self.base().component()
    }
}

impl ModelComponents for Model {
    fn name(&self) -> &str {
        &self.base().name
    }

    fn description(&self) -> Option<&str> {
        self.base().description.as_deref()
    }

    fn get_name(&self, suffix: &str) -> String {
        self.base().get_name(suffix)
    }

    fn assemble_selection_data(&self, extras: Vec<DataSource>) -> CompileResult<Vec<DataSource>> {
        let mut out = extras;
        out.extend(self.component()?.selection_data.iter().cloned());
        Ok(out)
    }

    fn assemble_data(&self) -> CompileResult<Vec<DataSource>> {
        Ok(self.component()?.data.clone())
    }

    fn assemble_layout_signals(&self) -> CompileResult<Vec<Signal>> {
        Ok(self.component()?.layout_signals.clone())
    }

    fn assemble_selection_top_level_signals(&self, extras: Vec<Signal>) -> CompileResult<Vec<Signal>> {
        let mut out = extras;
        out.extend(self.component()?.top_signals.iter().cloned());
        Ok(out)
    }

    fn assemble_group(&self, extras: Vec<Signal>) -> CompileResult<GroupFragment> {
        let component = self.component()?;
        let mut group = component.group.clone();
        let mut signals = extras;
        signals.append(&mut group.signals);
        group.signals = signals;
        group.layout = component.layout.clone();
        Ok(group)
    }

    fn assemble_layout(&self) -> CompileResult<Option<Layout>> {
        Ok(self.component()?.layout.clone())
    }

    fn assemble_parent_group_properties(&self) -> CompileResult<EncodeEntry> {
        Ok(self.component()?.parent_group_properties.clone())
    }
}

/// Wrap a parsed child into a `cell` group mark sized by its size signals.
pub(crate) fn cell_group(child: &Model, name: String) -> CompileResult<GroupMark> {
    let mut group = GroupMark::from_fragment(name, child.assemble_group(Vec::new())?);
    group.style = Some("cell".to_string());

    let size = child.size();
    let mut update = EncodeEntry::new();
    update.insert("width".to_string(), json!({ "signal": size.width }));
    update.insert("height".to_string(), json!({ "signal": size.height }));
    update.extend(child.assemble_parent_group_properties()?);
    group.encode = Encode::update_if_any(update);
    Ok(group)
}

/// `a + b + <gaps>` over size signal names.
pub(crate) fn sum_expr(names: &[&str], spacing: f64) -> String {
    let gaps = spacing * names.len().saturating_sub(1) as f64;
    if gaps == 0.0 {
        names.join(" + ")
    } else {
        format!("{} + {gaps}", names.join(" + "))
    }
}

/// `max(a, b, ...)` over size signal names.
pub(crate) fn max_expr(names: &[&str]) -> String {
    match names {
        [single] => (*single).to_string(),
        _ => format!("max({})", names.join(", ")),
    }
}

/// Group a composite node's wrapped children into the group fragment it renders.
pub(crate) fn composite_group(marks: Vec<GroupMark>, title: Option<serde_json::Value>) -> GroupFragment {
    GroupFragment {
        marks: marks.into_iter().map(|g| Mark::Group(Box::new(g))).collect(),
        title,
        ..GroupFragment::default()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/mod.rs"]
mod tests;
