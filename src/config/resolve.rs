use serde_json::{Map, Value, json};

use crate::foundation::error::{CompileError, CompileResult};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Resolved configuration: built-in defaults with the input spec's `config` merged on top.
pub struct Config {
    /// Default canvas sizing mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autosize: Option<Value>,
    /// Default canvas background.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Default canvas padding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<Value>,
    /// Single-view defaults.
    pub view: ViewConfig,
    /// Mark defaults.
    pub mark: MarkConfig,
    /// Composite layout defaults.
    pub layout: LayoutConfig,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Single-view defaults.
pub struct ViewConfig {
    /// Default plot width in pixels.
    pub width: f64,
    /// Default plot height in pixels.
    pub height: f64,
    /// Cell background fill.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    /// Cell border stroke.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Mark defaults.
pub struct MarkConfig {
    /// Fill/stroke color when no color encoding is given.
    pub color: String,
    /// Overlay points on `line`/`area` marks unless the mark says otherwise.
    #[serde(default)]
    pub point: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Composite layout defaults.
pub struct LayoutConfig {
    /// Spacing between cells of concat/repeat/facet grids.
    pub spacing: f64,
}

fn default_config_value() -> Value {
    json!({
        "view": { "width": 200.0, "height": 200.0 },
        "mark": { "color": "#4c78a8" },
        "layout": { "spacing": 10.0 }
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            autosize: None,
            background: None,
            padding: None,
            view: ViewConfig {
                width: 200.0,
                height: 200.0,
                fill: None,
                stroke: None,
            },
            mark: MarkConfig {
                color: "#4c78a8".to_string(),
                point: false,
            },
            layout: LayoutConfig { spacing: 10.0 },
        }
    }
}

impl Config {
    /// Serialized form, used as the extraction source for top-level properties.
    pub fn to_map(&self) -> CompileResult<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(m) => Ok(m),
            _ => Err(CompileError::config("config did not serialize to an object")),
        }
    }
}

/// Resolve the input spec's `config` section against the built-in defaults.
///
/// Objects are merged recursively; any other value in the user config replaces the
/// default wholesale.
#[tracing::instrument(skip(raw))]
pub fn init_config(raw: Option<&Value>) -> CompileResult<Config> {
    let mut merged = default_config_value();
    match raw {
        None | Some(Value::Null) => {}
        Some(user @ Value::Object(_)) => merge_deep(&mut merged, user),
        Some(other) => {
            return Err(CompileError::config(format!(
                "config must be an object, got {}",
                json_kind(other)
            )));
        }
    }
    serde_json::from_value(merged).map_err(|e| CompileError::config(e.to_string()))
}

pub(crate) fn merge_deep(base: &mut Value, over: &Value) {
    match (base, over) {
        (Value::Object(b), Value::Object(o)) => {
            for (k, v) in o {
                match b.get_mut(k) {
                    Some(slot) => merge_deep(slot, v),
                    None => {
                        b.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (slot, v) => *slot = v.clone(),
    }
}

pub(crate) fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/resolve.rs"]
mod tests;
