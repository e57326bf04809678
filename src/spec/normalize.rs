use serde_json::{Map, Value, json};

use crate::{
    config::resolve::{Config, json_kind},
    foundation::diagnostics::{Diagnostic, DiagnosticSink},
    foundation::error::{CompileError, CompileResult},
    spec::model::{CompositionKind, MarkType, NormalizedSpec},
};

/// Keys that only make sense on the outermost spec object.
const TOP_LEVEL_ONLY: [&str; 5] = ["$schema", "config", "autosize", "background", "padding"];

/// Header keys a rewritten unit hands to the composite that replaces it.
const LIFTED_KEYS: [&str; 5] = ["name", "description", "title", "data", "transform"];

/// Rewrite shorthand forms into canonical composite form and type the result.
///
/// Rewrites:
/// - a unit spec with `row`/`column` encodings becomes a facet around the unit;
/// - a `line`/`area` mark with a point overlay becomes a layer of the mark and `point`.
#[tracing::instrument(skip_all)]
pub fn normalize(
    input: &Value,
    config: &Config,
    sink: &mut dyn DiagnosticSink,
) -> CompileResult<NormalizedSpec> {
    let Value::Object(map) = input else {
        return Err(CompileError::normalize(format!(
            "input spec must be an object, got {}",
            json_kind(input)
        )));
    };
    let mut map = map.clone();
    for key in TOP_LEVEL_ONLY {
        map.remove(key);
    }

    let mut cx = NormalizeCx { config, sink };
    let rewritten = cx.spec(map, false)?;
    NormalizedSpec::from_value(rewritten)
}

struct NormalizeCx<'a> {
    config: &'a Config,
    sink: &'a mut dyn DiagnosticSink,
}

impl NormalizeCx<'_> {
    fn spec(&mut self, mut map: Map<String, Value>, in_layer: bool) -> CompileResult<Value> {
        match CompositionKind::of(&map)? {
            CompositionKind::Unit => self.unit(map, in_layer),
            CompositionKind::Layer => {
                let layers = self.children(&mut map, "layer", true)?;
                map.insert("layer".to_string(), Value::Array(layers));
                Ok(Value::Object(map))
            }
            CompositionKind::Facet | CompositionKind::Repeat => {
                let inner = match map.remove("spec") {
                    Some(Value::Object(inner)) => self.spec(inner, false)?,
                    Some(other) => {
                        return Err(CompileError::normalize(format!(
                            "'spec' must be an object, got {}",
                            json_kind(&other)
                        )));
                    }
                    None => {
                        return Err(CompileError::normalize(
                            "facet and repeat specs require an inner 'spec'",
                        ));
                    }
                };
                map.insert("spec".to_string(), inner);
                Ok(Value::Object(map))
            }
            CompositionKind::HConcat => {
                let children = self.children(&mut map, "hconcat", false)?;
                map.insert("hconcat".to_string(), Value::Array(children));
                Ok(Value::Object(map))
            }
            CompositionKind::VConcat => {
                let children = self.children(&mut map, "vconcat", false)?;
                map.insert("vconcat".to_string(), Value::Array(children));
                Ok(Value::Object(map))
            }
        }
    }

    fn children(
        &mut self,
        map: &mut Map<String, Value>,
        key: &str,
        in_layer: bool,
    ) -> CompileResult<Vec<Value>> {
        let Some(Value::Array(items)) = map.remove(key) else {
            return Err(CompileError::normalize(format!("'{key}' must be an array")));
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let Value::Object(child) = item else {
                return Err(CompileError::normalize(format!(
                    "'{key}' entries must be objects, got {}",
                    json_kind(&item)
                )));
            };
            out.push(self.spec(child, in_layer)?);
        }
        Ok(out)
    }

    fn unit(&mut self, mut map: Map<String, Value>, in_layer: bool) -> CompileResult<Value> {
        let facet = take_facet_channels(&mut map);
        if !facet.is_empty() {
            if in_layer {
                self.sink.emit(Diagnostic::warn(
                    "row/column encodings are not allowed inside a layer; dropping them",
                ));
            } else {
                self.sink.emit(Diagnostic::debug(
                    "faceted unit spec rewritten as facet composition",
                ));
                let mut outer = lift_header(&mut map);
                let inner = self.unit(map, false)?;
                outer.insert("facet".to_string(), Value::Object(facet));
                outer.insert("spec".to_string(), inner);
                return Ok(Value::Object(outer));
            }
        }

        if let Some(layered) = self.point_overlay(&mut map) {
            return Ok(layered);
        }
        Ok(Value::Object(map))
    }

    /// Split `line`/`area` marks with a point overlay into a two-layer spec.
    ///
    /// Both the string and the object mark forms fall back to `config.mark.point` when
    /// the mark does not say.
    fn point_overlay(&mut self, map: &mut Map<String, Value>) -> Option<Value> {
        let (kind, point) = match map.get_mut("mark") {
            Some(Value::String(kind)) => (mark_type(kind), None),
            Some(Value::Object(mark)) => {
                let kind = mark_type(mark.get("type").and_then(Value::as_str)?);
                (kind, mark.remove("point"))
            }
            _ => return None,
        };
        let kind = kind.filter(|k| k.is_path())?;
        let wants_point = match point {
            Some(Value::Bool(b)) => b,
            Some(_) | None => self.config.mark.point,
        };
        if !wants_point {
            return None;
        }

        self.sink.emit(Diagnostic::debug(format!(
            "{} mark with point overlay rewritten as layer",
            kind.as_str()
        )));
        let mut outer = lift_header(map);
        for key in ["width", "height"] {
            if let Some(v) = map.remove(key) {
                outer.insert(key.to_string(), v);
            }
        }
        let encoding = map.get("encoding").cloned().unwrap_or_else(|| json!({}));
        let overlay = json!({ "mark": "point", "encoding": encoding });
        outer.insert(
            "layer".to_string(),
            Value::Array(vec![Value::Object(std::mem::take(map)), overlay]),
        );
        Some(Value::Object(outer))
    }
}

fn mark_type(name: &str) -> Option<MarkType> {
    serde_json::from_value(Value::String(name.to_string())).ok()
}

fn take_facet_channels(map: &mut Map<String, Value>) -> Map<String, Value> {
    let mut facet = Map::new();
    if let Some(Value::Object(encoding)) = map.get_mut("encoding") {
        for channel in ["row", "column"] {
            if let Some(def) = encoding.remove(channel) {
                facet.insert(channel.to_string(), def);
            }
        }
    }
    facet
}

fn lift_header(map: &mut Map<String, Value>) -> Map<String, Value> {
    let mut outer = Map::new();
    for key in LIFTED_KEYS {
        if let Some(v) = map.remove(key) {
            outer.insert(key.to_string(), v);
        }
    }
    outer
}

#[cfg(test)]
#[path = "../../tests/unit/spec/normalize.rs"]
mod tests;
