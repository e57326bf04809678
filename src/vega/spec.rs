use serde_json::{Map, Value};

use crate::config::toplevel::TopLevelProperties;

/// Schema identifier stamped on every output document.
pub const VEGA_SCHEMA: &str = "http://vega.github.io/schema/vega/v3.0.json";

/// Encode entry: visual property name to value reference.
pub type EncodeEntry = Map<String, Value>;

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// The flat scene-graph document produced by a compile call.
///
/// Optional parts are `Option`/`Vec` fields which are omitted from JSON entirely when
/// absent or empty, never emitted as `null` or `{}`.
pub struct VgSpec {
    /// Schema identifier ([`VEGA_SCHEMA`]).
    #[serde(rename = "$schema")]
    pub schema: String,
    /// Root model description, when it has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Merged top-level properties (`autosize` always present).
    #[serde(flatten)]
    pub top_level: TopLevelProperties,
    /// Selection-derived sources followed by regular sources.
    pub data: Vec<DataSource>,
    /// Document-level signals.
    pub signals: Vec<Signal>,
    /// Root group scales.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scales: Vec<Value>,
    /// Root group axes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub axes: Vec<Value>,
    /// Root group legends.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub legends: Vec<Value>,
    /// Root group title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    /// Exactly one synthesized outer group.
    pub marks: Vec<Mark>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// A named data source.
pub struct DataSource {
    /// Unique source name.
    pub name: String,
    /// Upstream source this one derives from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Inline tuples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Value>,
    /// Remote location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Parse format for `url`/`values`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
    /// Transform pipeline.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transform: Vec<Value>,
}

impl DataSource {
    /// An empty named source (used for selection stores).
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// A reactive signal.
pub struct Signal {
    /// Signal identifier.
    pub name: String,
    /// Initial value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Update expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<String>,
    /// Event handlers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on: Vec<SignalOn>,
}

impl Signal {
    /// Signal with a constant initial value.
    pub fn value(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
            ..Self::default()
        }
    }

    /// Signal driven by an update expression.
    pub fn update(name: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            update: Some(expr.into()),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One event handler of a [`Signal`].
pub struct SignalOn {
    /// Event selector string, or a `{"signal": ...}` reference.
    pub events: Value,
    /// Expression evaluated on the event.
    pub update: String,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Grid layout descriptor for a group.
pub struct Layout {
    /// Spacing between cells.
    pub padding: LayoutPadding,
    /// Offset of headers from cells.
    pub offset: f64,
    /// Column count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<LayoutColumns>,
    /// Bounds calculation mode.
    pub bounds: &'static str,
    /// Cell alignment mode.
    pub align: &'static str,
}

impl Layout {
    /// Grid layout with the given column count and uniform padding.
    pub fn grid(columns: Option<LayoutColumns>, padding: f64) -> Self {
        Self {
            padding: LayoutPadding {
                row: padding,
                column: padding,
            },
            offset: padding,
            columns,
            bounds: "full",
            align: "all",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
/// Row and column spacing.
pub struct LayoutPadding {
    /// Vertical spacing.
    pub row: f64,
    /// Horizontal spacing.
    pub column: f64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
/// Fixed or data-driven column count.
pub enum LayoutColumns {
    /// Known at compile time.
    Fixed(u32),
    /// Bound to a signal expression.
    Signal {
        /// Expression.
        signal: String,
    },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// `encode` block of a mark.
pub struct Encode {
    /// Properties applied on every update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<EncodeEntry>,
}

impl Encode {
    /// `Some(Encode { update })` when `update` has at least one field.
    pub fn update_if_any(update: EncodeEntry) -> Option<Self> {
        (!update.is_empty()).then_some(Self {
            update: Some(update),
        })
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// `from` block of a mark.
pub struct MarkFrom {
    /// Source data name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Faceting directive for group marks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet: Option<Facet>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Partition of a source into per-cell subsets.
pub struct Facet {
    /// Name of the per-cell data.
    pub name: String,
    /// Source being partitioned.
    pub data: String,
    /// Partition fields.
    pub groupby: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
/// A scene-graph mark.
pub enum Mark {
    /// Container mark.
    Group(Box<GroupMark>),
    /// Leaf mark.
    Primitive(PrimitiveMark),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Leaf mark (`symbol`, `rect`, `line`, ...).
pub struct PrimitiveMark {
    /// Mark name.
    pub name: String,
    /// Renderer mark type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Named style.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Data binding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<MarkFrom>,
    /// Visual encoding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encode: Option<Encode>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Container mark with its own scope.
pub struct GroupMark {
    /// Mark name.
    pub name: String,
    /// Always `"group"`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Named style.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Data binding or facet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<MarkFrom>,
    /// Sources scoped to this group (derived from a facet partition).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<DataSource>,
    /// Group title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    /// Layout of child groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    /// Signals scoped to this group.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub signals: Vec<Signal>,
    /// Visual encoding of the group itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encode: Option<Encode>,
    /// Scales scoped to this group.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scales: Vec<Value>,
    /// Axes scoped to this group.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub axes: Vec<Value>,
    /// Legends scoped to this group.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub legends: Vec<Value>,
    /// Child marks.
    pub marks: Vec<Mark>,
}

impl GroupMark {
    /// Wrap a model's rendering group into a named group mark.
    pub fn from_fragment(name: String, fragment: GroupFragment) -> Self {
        let GroupFragment {
            marks,
            layout,
            signals,
            scales,
            axes,
            legends,
            title,
        } = fragment;
        Self {
            name,
            kind: "group",
            style: None,
            from: None,
            data: Vec::new(),
            title,
            layout,
            signals,
            encode: None,
            scales,
            axes,
            legends,
            marks,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// A model's assembled rendering group, before it is placed anywhere.
///
/// `layout` and `signals` are kept apart from the rest so callers can lift them into an
/// enclosing group without touching the other fields.
pub struct GroupFragment {
    /// Child marks.
    pub marks: Vec<Mark>,
    /// Layout of child groups.
    pub layout: Option<Layout>,
    /// Group-scoped signals.
    pub signals: Vec<Signal>,
    /// Scales.
    pub scales: Vec<Value>,
    /// Axes.
    pub axes: Vec<Value>,
    /// Legends.
    pub legends: Vec<Value>,
    /// Title.
    pub title: Option<Value>,
}

/// Result of a compile call.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct CompileOutput {
    /// The output document.
    pub spec: VgSpec,
}
