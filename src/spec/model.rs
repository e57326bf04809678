use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{
    config::resolve::json_kind,
    foundation::error::{CompileError, CompileResult},
};

/// Kind of composition a spec object describes, decided by which key it carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositionKind {
    /// `mark`
    Unit,
    /// `layer`
    Layer,
    /// `facet` + `spec`
    Facet,
    /// `repeat` + `spec`
    Repeat,
    /// `hconcat`
    HConcat,
    /// `vconcat`
    VConcat,
}

impl CompositionKind {
    /// Classify a spec object. Composite keys take precedence over `mark`.
    pub fn of(map: &Map<String, Value>) -> CompileResult<Self> {
        let kind = if map.contains_key("layer") {
            Self::Layer
        } else if map.contains_key("facet") {
            Self::Facet
        } else if map.contains_key("repeat") {
            Self::Repeat
        } else if map.contains_key("hconcat") {
            Self::HConcat
        } else if map.contains_key("vconcat") {
            Self::VConcat
        } else if map.contains_key("mark") {
            Self::Unit
        } else {
            return Err(CompileError::normalize(
                "spec must contain one of 'mark', 'layer', 'facet', 'repeat', 'hconcat' or 'vconcat'",
            ));
        };
        Ok(kind)
    }
}

/// A spec in canonical composite form: every extended shorthand has been rewritten.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedSpec {
    /// Single view.
    Unit(UnitSpec),
    /// Views drawn on top of each other.
    Layer(LayerSpec),
    /// Small multiples partitioned by data fields.
    Facet(FacetSpec),
    /// Small multiples over a list of fields.
    Repeat(RepeatSpec),
    /// Views placed side by side.
    Concat(ConcatSpec),
}

impl NormalizedSpec {
    /// Type a (rewritten) spec object.
    pub fn from_value(value: Value) -> CompileResult<Self> {
        let Value::Object(mut map) = value else {
            return Err(CompileError::normalize(format!(
                "spec must be an object, got {}",
                json_kind(&value)
            )));
        };
        let spec = match CompositionKind::of(&map)? {
            CompositionKind::Unit => Self::Unit(typed(Value::Object(map), "unit")?),
            CompositionKind::Layer => Self::Layer(typed(Value::Object(map), "layer")?),
            CompositionKind::Facet => Self::Facet(typed(Value::Object(map), "facet")?),
            CompositionKind::Repeat => Self::Repeat(typed(Value::Object(map), "repeat")?),
            kind @ (CompositionKind::HConcat | CompositionKind::VConcat) => {
                let (direction, key) = if kind == CompositionKind::HConcat {
                    (ConcatDirection::Horizontal, "hconcat")
                } else {
                    (ConcatDirection::Vertical, "vconcat")
                };
                let children = map.remove(key).unwrap_or(Value::Null);
                let mut spec: ConcatSpec = typed(Value::Object(map), key)?;
                spec.direction = direction;
                spec.concat = typed(children, key)?;
                Self::Concat(spec)
            }
        };
        Ok(spec)
    }

    /// Shared header fields of any variant.
    pub fn header(&self) -> &SpecHeader {
        match self {
            Self::Unit(s) => &s.header,
            Self::Layer(s) => &s.header,
            Self::Facet(s) => &s.header,
            Self::Repeat(s) => &s.header,
            Self::Concat(s) => &s.header,
        }
    }
}

fn typed<T: serde::de::DeserializeOwned>(value: Value, what: &str) -> CompileResult<T> {
    serde_json::from_value(value)
        .map_err(|e| CompileError::normalize(format!("invalid {what} spec: {e}")))
}

impl<'de> Deserialize<'de> for NormalizedSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
/// Fields every spec variant may carry.
pub struct SpecHeader {
    /// Explicit node name; scopes the node's output identifiers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Title text or title object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    /// Data owned by this node; children inherit it when they have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DataDef>,
    /// Transforms applied to this node's data.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transform: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
/// Where a node's data comes from.
pub enum DataDef {
    /// Inline tuples.
    Inline {
        /// Tuples.
        values: Value,
        /// Optional parse format.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<Value>,
    },
    /// Remote file.
    Url {
        /// Location.
        url: String,
        /// Optional parse format.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<Value>,
    },
    /// Source provided at runtime under this name.
    Named {
        /// Source name.
        name: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Single view: one mark type plus its encoding.
pub struct UnitSpec {
    /// Shared fields.
    #[serde(flatten)]
    pub header: SpecHeader,
    /// Mark type or mark definition.
    pub mark: MarkDef,
    /// Channel to field/value mapping.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub encoding: BTreeMap<Channel, ChannelDef>,
    /// Plot width in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Plot height in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Named interactive selections.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub selection: BTreeMap<String, SelectionDef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Layered views sharing one plot area.
pub struct LayerSpec {
    /// Shared fields.
    #[serde(flatten)]
    pub header: SpecHeader,
    /// Layers, bottom first.
    pub layer: Vec<NormalizedSpec>,
    /// Plot width in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Plot height in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Small multiples partitioned by field values.
pub struct FacetSpec {
    /// Shared fields.
    #[serde(flatten)]
    pub header: SpecHeader,
    /// Partition fields.
    pub facet: FacetMapping,
    /// Cell spec.
    pub spec: Box<NormalizedSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
/// Row and column partition fields of a facet.
pub struct FacetMapping {
    /// Vertical partition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<ChannelDef>,
    /// Horizontal partition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<ChannelDef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Small multiples over lists of fields.
pub struct RepeatSpec {
    /// Shared fields.
    #[serde(flatten)]
    pub header: SpecHeader,
    /// Fields to repeat over.
    pub repeat: RepeatMapping,
    /// Cell spec; may reference `{"repeat": "row"|"column"}` as a field.
    pub spec: Box<NormalizedSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
/// Row and column field lists of a repeat.
pub struct RepeatMapping {
    /// One row per field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub row: Vec<String>,
    /// One column per field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Concatenation direction.
pub enum ConcatDirection {
    /// `hconcat`
    Horizontal,
    /// `vconcat`
    #[default]
    Vertical,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
/// Views placed side by side.
pub struct ConcatSpec {
    /// Shared fields.
    #[serde(flatten)]
    pub header: SpecHeader,
    /// Direction, from the key the children were found under.
    #[serde(skip)]
    pub direction: ConcatDirection,
    /// Children in placement order.
    #[serde(skip)]
    pub concat: Vec<NormalizedSpec>,
}

impl Serialize for ConcatSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            #[serde(flatten)]
            header: &'a SpecHeader,
            #[serde(skip_serializing_if = "Option::is_none")]
            hconcat: Option<&'a [NormalizedSpec]>,
            #[serde(skip_serializing_if = "Option::is_none")]
            vconcat: Option<&'a [NormalizedSpec]>,
        }
        let children = Some(self.concat.as_slice());
        let (hconcat, vconcat) = match self.direction {
            ConcatDirection::Horizontal => (children, None),
            ConcatDirection::Vertical => (None, children),
        };
        Repr {
            header: &self.header,
            hconcat,
            vconcat,
        }
        .serialize(serializer)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
/// `"bar"` or `{"type": "bar", ...}`.
pub enum MarkDef {
    /// Bare mark type.
    Type(MarkType),
    /// Mark type with properties.
    Def(MarkProps),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Mark type with properties.
pub struct MarkProps {
    /// Mark type.
    #[serde(rename = "type")]
    pub kind: MarkType,
    /// Constant color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Named style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl MarkDef {
    /// Mark type regardless of form.
    pub fn kind(&self) -> MarkType {
        match self {
            Self::Type(t) => *t,
            Self::Def(p) => p.kind,
        }
    }

    /// Constant color, if set on the mark.
    pub fn color(&self) -> Option<&str> {
        match self {
            Self::Type(_) => None,
            Self::Def(p) => p.color.as_deref(),
        }
    }

    /// Named style, if set on the mark.
    pub fn style(&self) -> Option<&str> {
        match self {
            Self::Type(_) => None,
            Self::Def(p) => p.style.as_deref(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Chart mark types.
pub enum MarkType {
    /// Filled region under a line.
    Area,
    /// Rectangle anchored at zero.
    Bar,
    /// Filled circle symbol.
    Circle,
    /// Connected polyline.
    Line,
    /// Hollow circle symbol.
    Point,
    /// Free rectangle.
    Rect,
    /// Line segment.
    Rule,
    /// Filled square symbol.
    Square,
    /// Text label.
    Text,
    /// Short tick line.
    Tick,
}

impl MarkType {
    /// Spec-level name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Area => "area",
            Self::Bar => "bar",
            Self::Circle => "circle",
            Self::Line => "line",
            Self::Point => "point",
            Self::Rect => "rect",
            Self::Rule => "rule",
            Self::Square => "square",
            Self::Text => "text",
            Self::Tick => "tick",
        }
    }

    /// Renderer mark type.
    pub fn vega_type(self) -> &'static str {
        match self {
            Self::Area => "area",
            Self::Bar | Self::Rect | Self::Tick => "rect",
            Self::Circle | Self::Point | Self::Square => "symbol",
            Self::Line => "line",
            Self::Rule => "rule",
            Self::Text => "text",
        }
    }

    /// Marks colored by stroke rather than fill.
    pub fn is_stroked(self) -> bool {
        matches!(self, Self::Line | Self::Rule | Self::Point)
    }

    /// Marks which accept a point overlay.
    pub fn is_path(self) -> bool {
        matches!(self, Self::Line | Self::Area)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Encoding channels.
pub enum Channel {
    /// Horizontal position.
    X,
    /// Vertical position.
    Y,
    /// Fill or stroke color.
    Color,
    /// Symbol area, font size or stroke width.
    Size,
    /// Symbol shape.
    Shape,
    /// Mark opacity.
    Opacity,
    /// Label text.
    Text,
    /// Hover text.
    Tooltip,
    /// Facet rows.
    Row,
    /// Facet columns.
    Column,
}

impl Channel {
    /// Channel key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Color => "color",
            Self::Size => "size",
            Self::Shape => "shape",
            Self::Opacity => "opacity",
            Self::Text => "text",
            Self::Tooltip => "tooltip",
            Self::Row => "row",
            Self::Column => "column",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
/// Field or constant value bound to a channel.
pub struct ChannelDef {
    /// Data field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldRef>,
    /// Measurement type of `field`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldType>,
    /// Aggregate operation applied to `field`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<String>,
    /// Constant value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Axis/legend title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
/// A field name, or a placeholder filled in by an enclosing repeat.
pub enum FieldRef {
    /// Literal field name.
    Name(String),
    /// `{"repeat": "row"|"column"}`
    Repeat {
        /// Which repeat list supplies the field.
        repeat: RepeatDir,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Repeat list selector.
pub enum RepeatDir {
    /// `repeat.row`
    Row,
    /// `repeat.column`
    Column,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Measurement type of a field.
pub enum FieldType {
    /// Continuous numbers.
    Quantitative,
    /// Dates and times.
    Temporal,
    /// Ordered categories.
    Ordinal,
    /// Unordered categories.
    Nominal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Interactive selection definition.
pub struct SelectionDef {
    /// `single`, `multi` or `interval`; checked when the owning view is parsed.
    #[serde(rename = "type")]
    pub kind: String,
    /// Triggering event selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<String>,
}
