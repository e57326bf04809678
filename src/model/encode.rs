use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::{
    foundation::diagnostics::{Diagnostic, DiagnosticSink},
    foundation::error::{CompileError, CompileResult},
    model::{RepeaterValue, base::ModelBase},
    spec::model::{Channel, ChannelDef, FieldRef, FieldType, MarkDef, MarkType},
    vega::spec::{DataSource, EncodeEntry},
};

const AGGREGATE_OPS: [&str; 14] = [
    "count", "valid", "missing", "distinct", "sum", "mean", "average", "variance", "stdev",
    "median", "q1", "q3", "min", "max",
];

/// A channel definition with repeat references substituted and its type settled.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ResolvedChannel {
    pub(crate) field: Option<String>,
    pub(crate) kind: FieldType,
    pub(crate) aggregate: Option<String>,
    pub(crate) value: Option<Value>,
    pub(crate) title: Option<String>,
}

impl ResolvedChannel {
    fn is_discrete(&self) -> bool {
        matches!(self.kind, FieldType::Ordinal | FieldType::Nominal)
    }

    fn title(&self, field: &str) -> String {
        self.title.clone().unwrap_or_else(|| field.to_string())
    }
}

/// Encode entry of the unit's mark plus the guides it needs.
#[derive(Debug, Default)]
pub(crate) struct Guides {
    pub(crate) encode: EncodeEntry,
    pub(crate) scales: Vec<Value>,
    pub(crate) axes: Vec<Value>,
    pub(crate) legends: Vec<Value>,
}

/// Validate a unit's encoding. Unusable definitions are dropped with a warning.
pub(crate) fn resolve_channels(
    encoding: &BTreeMap<Channel, ChannelDef>,
    repeater: Option<&RepeaterValue>,
    sink: &mut dyn DiagnosticSink,
) -> CompileResult<BTreeMap<Channel, ResolvedChannel>> {
    let mut out = BTreeMap::new();
    for (&channel, def) in encoding {
        let ch = channel.as_str();
        if matches!(channel, Channel::Row | Channel::Column) {
            sink.emit(Diagnostic::warn(format!(
                "{ch} channel is not supported here; dropping it"
            )));
            continue;
        }
        if let Some(op) = def.aggregate.as_deref()
            && !AGGREGATE_OPS.contains(&op)
        {
            return Err(CompileError::parse(format!(
                "unknown aggregate operation '{op}' on {ch} channel"
            )));
        }

        let field = match &def.field {
            None => None,
            Some(FieldRef::Name(name)) => Some(name.clone()),
            Some(FieldRef::Repeat { repeat }) => match repeater.and_then(|r| r.get(*repeat)) {
                Some(name) => Some(name.to_string()),
                None => {
                    sink.emit(Diagnostic::warn(format!(
                        "{ch} channel refers to a repeated field outside a matching repeat; dropping it"
                    )));
                    continue;
                }
            },
        };

        let is_count = def.aggregate.as_deref() == Some("count");
        if field.is_none() && def.value.is_none() && !is_count {
            sink.emit(Diagnostic::warn(format!(
                "{ch} channel has neither a field nor a value; dropping it"
            )));
            continue;
        }

        let kind = match (def.kind, &def.aggregate, &field) {
            (Some(kind), _, _) => kind,
            (None, Some(_), _) => FieldType::Quantitative,
            (None, None, Some(f)) => {
                sink.emit(Diagnostic::warn(format!(
                    "{ch} channel field '{f}' has no type; assuming nominal"
                )));
                FieldType::Nominal
            }
            (None, None, None) => FieldType::Nominal,
        };

        out.insert(
            channel,
            ResolvedChannel {
                field,
                kind,
                aggregate: def.aggregate.clone(),
                value: def.value.clone(),
                title: def.title.clone(),
            },
        );
    }
    Ok(out)
}

/// Derived source applying the unit's aggregates, grouped by its plain fields.
///
/// Aggregated channels are rewritten to read the aggregate's output field.
pub(crate) fn aggregate_source(
    name: String,
    data: Option<&str>,
    channels: &mut BTreeMap<Channel, ResolvedChannel>,
) -> CompileResult<Option<DataSource>> {
    if channels.values().all(|c| c.aggregate.is_none()) {
        return Ok(None);
    }
    let Some(data) = data else {
        return Err(CompileError::parse(format!(
            "aggregate '{name}' has no data to read from"
        )));
    };

    let mut groupby: Vec<String> = Vec::new();
    let mut ops = Vec::new();
    let mut fields = Vec::new();
    let mut outputs = Vec::new();
    for ch in channels.values_mut() {
        match ch.aggregate.as_deref() {
            None => {
                if let Some(f) = &ch.field
                    && !groupby.contains(f)
                {
                    groupby.push(f.clone());
                }
            }
            Some(op) => {
                let output = match &ch.field {
                    Some(f) => format!("{op}_{f}"),
                    None => op.to_string(),
                };
                ops.push(json!(op));
                fields.push(ch.field.clone().map_or(Value::Null, Value::String));
                outputs.push(json!(output));
                ch.field = Some(output);
                ch.kind = FieldType::Quantitative;
            }
        }
    }

    Ok(Some(DataSource {
        name,
        source: Some(data.to_string()),
        transform: vec![json!({
            "type": "aggregate",
            "groupby": groupby,
            "ops": ops,
            "fields": fields,
            "as": outputs,
        })],
        ..DataSource::default()
    }))
}

/// Build the mark's encode entry and the scales, axes and legends backing it.
pub(crate) fn encode_channels(
    base: &ModelBase,
    mark: &MarkDef,
    channels: &BTreeMap<Channel, ResolvedChannel>,
    data: Option<&str>,
    sink: &mut dyn DiagnosticSink,
) -> CompileResult<Guides> {
    let kind = mark.kind();
    let mut cx = EncodeCx {
        base,
        kind,
        data,
        guides: Guides::default(),
    };

    for (&channel, def) in channels {
        match channel {
            Channel::X | Channel::Y => cx.position(channel, def)?,
            Channel::Color => cx.color(def)?,
            Channel::Size => match size_property(kind) {
                Some((prop, range)) => cx.scaled(prop, "size", json!(range), def)?,
                None => unsupported(sink, channel, kind),
            },
            Channel::Opacity => cx.scaled("opacity", "opacity", json!([0.3, 0.8]), def)?,
            Channel::Shape => {
                if kind.vega_type() == "symbol" {
                    cx.scaled("shape", "shape", json!("symbol"), def)?;
                } else {
                    unsupported(sink, channel, kind);
                }
            }
            Channel::Text => {
                if kind == MarkType::Text {
                    cx.passthrough("text", def);
                } else {
                    unsupported(sink, channel, kind);
                }
            }
            Channel::Tooltip => cx.passthrough("tooltip", def),
            Channel::Row | Channel::Column => {}
        }
    }

    if !channels.contains_key(&Channel::Color) {
        let color = mark.color().unwrap_or(base.config.mark.color.as_str());
        cx.guides
            .encode
            .insert(color_property(kind).to_string(), json!({ "value": color }));
    }
    cx.baseline(channels);
    match kind {
        MarkType::Point => {
            cx.guides
                .encode
                .entry("fill")
                .or_insert_with(|| json!({ "value": "transparent" }));
        }
        MarkType::Circle | MarkType::Square => {
            cx.guides
                .encode
                .entry("shape")
                .or_insert_with(|| json!({ "value": kind.as_str() }));
        }
        _ => {}
    }
    Ok(cx.guides)
}

fn unsupported(sink: &mut dyn DiagnosticSink, channel: Channel, kind: MarkType) {
    sink.emit(Diagnostic::warn(format!(
        "{} channel is not supported by {} marks; dropping it",
        channel.as_str(),
        kind.as_str()
    )));
}

fn color_property(kind: MarkType) -> &'static str {
    if kind.is_stroked() { "stroke" } else { "fill" }
}

fn size_property(kind: MarkType) -> Option<(&'static str, [f64; 2])> {
    match kind {
        MarkType::Circle | MarkType::Point | MarkType::Square => Some(("size", [9.0, 361.0])),
        MarkType::Text => Some(("fontSize", [8.0, 40.0])),
        MarkType::Line | MarkType::Rule => Some(("strokeWidth", [1.0, 8.0])),
        _ => None,
    }
}

struct EncodeCx<'a> {
    base: &'a ModelBase,
    kind: MarkType,
    data: Option<&'a str>,
    guides: Guides,
}

impl EncodeCx<'_> {
    fn domain(&self, field: &str) -> CompileResult<Value> {
        let Some(data) = self.data else {
            return Err(CompileError::parse(format!(
                "view '{}' encodes field '{field}' but has no data",
                self.base.display_name()
            )));
        };
        Ok(json!({ "data": data, "field": field }))
    }

    fn banded(&self, def: &ResolvedChannel) -> bool {
        matches!(self.kind, MarkType::Bar | MarkType::Rect) && def.is_discrete()
    }

    fn position(&mut self, channel: Channel, def: &ResolvedChannel) -> CompileResult<()> {
        let prop = channel.as_str();
        if let Some(value) = &def.value {
            self.guides.encode.insert(prop.to_string(), json!({ "value": value }));
            return Ok(());
        }
        let Some(field) = &def.field else {
            return Ok(());
        };

        let scale_name = self.base.get_name(prop);
        let banded = self.banded(def);
        let (range, orient, band_prop) = if channel == Channel::X {
            (json!([0, { "signal": self.base.size.width }]), "bottom", "width")
        } else {
            (json!([{ "signal": self.base.size.height }, 0]), "left", "height")
        };
        let scale_type = match def.kind {
            FieldType::Quantitative => "linear",
            FieldType::Temporal => "time",
            FieldType::Ordinal | FieldType::Nominal if banded => "band",
            FieldType::Ordinal | FieldType::Nominal => "point",
        };

        let mut scale = json!({
            "name": scale_name,
            "type": scale_type,
            "domain": self.domain(field)?,
            "range": range,
        });
        match scale_type {
            "linear" => {
                scale["nice"] = json!(true);
                scale["zero"] = json!(matches!(self.kind, MarkType::Bar | MarkType::Area));
            }
            "band" => scale["paddingInner"] = json!(0.1),
            "point" => scale["padding"] = json!(0.5),
            _ => {}
        }
        self.guides.scales.push(scale);

        self.guides
            .encode
            .insert(prop.to_string(), json!({ "scale": scale_name, "field": field }));
        if banded {
            self.guides
                .encode
                .insert(band_prop.to_string(), json!({ "scale": scale_name, "band": 1 }));
        }
        self.guides.axes.push(json!({
            "scale": scale_name,
            "orient": orient,
            "title": def.title(field),
        }));
        Ok(())
    }

    fn color(&mut self, def: &ResolvedChannel) -> CompileResult<()> {
        let prop = color_property(self.kind);
        if let Some(value) = &def.value {
            self.guides.encode.insert(prop.to_string(), json!({ "value": value }));
            return Ok(());
        }
        let Some(field) = &def.field else {
            return Ok(());
        };
        let scale_name = self.base.get_name("color");
        let (scale_type, range) = if def.is_discrete() {
            ("ordinal", "category")
        } else {
            ("linear", "ramp")
        };
        self.guides.scales.push(json!({
            "name": scale_name,
            "type": scale_type,
            "domain": self.domain(field)?,
            "range": range,
        }));
        self.guides
            .encode
            .insert(prop.to_string(), json!({ "scale": scale_name, "field": field }));
        self.guides.legends.push(json!({
            prop: scale_name,
            "title": def.title(field),
        }));
        Ok(())
    }

    /// Channel mapped through its own scale (`size`, `opacity`, `shape`).
    fn scaled(
        &mut self,
        prop: &str,
        suffix: &str,
        range: Value,
        def: &ResolvedChannel,
    ) -> CompileResult<()> {
        if let Some(value) = &def.value {
            self.guides.encode.insert(prop.to_string(), json!({ "value": value }));
            return Ok(());
        }
        let Some(field) = &def.field else {
            return Ok(());
        };
        let scale_name = self.base.get_name(suffix);
        let scale_type = match (def.is_discrete(), range.is_string()) {
            (_, true) => "ordinal",
            (true, false) => "point",
            (false, false) => "linear",
        };
        self.guides.scales.push(json!({
            "name": scale_name,
            "type": scale_type,
            "domain": self.domain(field)?,
            "range": range,
        }));
        self.guides
            .encode
            .insert(prop.to_string(), json!({ "scale": scale_name, "field": field }));
        Ok(())
    }

    fn passthrough(&mut self, prop: &str, def: &ResolvedChannel) {
        let entry = match (&def.field, &def.value) {
            (Some(field), _) => json!({ "field": field }),
            (None, Some(value)) => json!({ "value": value }),
            (None, None) => return,
        };
        self.guides.encode.insert(prop.to_string(), entry);
    }

    /// Anchor bars and areas at zero on their quantitative axis.
    fn baseline(&mut self, channels: &BTreeMap<Channel, ResolvedChannel>) {
        if !matches!(self.kind, MarkType::Bar | MarkType::Area) {
            return;
        }
        let scaled_quantitative = |channel: Channel| {
            channels.get(&channel).is_some_and(|d| {
                d.kind == FieldType::Quantitative && d.field.is_some() && d.value.is_none()
            })
        };
        let encode = &mut self.guides.encode;
        if scaled_quantitative(Channel::Y) && !encode.contains_key("height") {
            encode.insert(
                "y2".to_string(),
                json!({ "scale": self.base.get_name("y"), "value": 0 }),
            );
        } else if scaled_quantitative(Channel::X) && encode.contains_key("height") {
            encode.insert(
                "x2".to_string(),
                json!({ "scale": self.base.get_name("x"), "value": 0 }),
            );
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/encode.rs"]
mod tests;
