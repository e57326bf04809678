use serde_json::{Map, Value, json};

use crate::{
    config::resolve::{Config, json_kind},
    foundation::error::{CompileError, CompileResult},
};

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
/// Document-level settings which may come from the config or the input spec.
pub struct TopLevelProperties {
    /// Canvas sizing mode (`"pad"`, `"fit"`, `"none"` or an object).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autosize: Option<Value>,
    /// Canvas background color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Canvas padding (number or per-side object).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<Value>,
}

impl TopLevelProperties {
    /// Shallow, right-biased merge: every field present in `over` replaces ours.
    pub fn merge(self, over: Self) -> Self {
        Self {
            autosize: over.autosize.or(self.autosize),
            background: over.background.or(self.background),
            padding: over.padding.or(self.padding),
        }
    }

    /// `autosize`, falling back to `default` when unset.
    pub(crate) fn with_default_autosize(mut self, default: &str) -> Self {
        self.autosize.get_or_insert_with(|| json!(default));
        self
    }
}

/// Pick the top-level properties out of a spec-like object.
pub fn extract_top_level_properties(obj: &Map<String, Value>) -> CompileResult<TopLevelProperties> {
    let autosize = match obj.get("autosize") {
        None | Some(Value::Null) => None,
        Some(v @ (Value::String(_) | Value::Object(_))) => Some(v.clone()),
        Some(v) => return Err(bad_property("autosize", "a string or object", v)),
    };
    let background = match obj.get("background") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(v) => return Err(bad_property("background", "a string", v)),
    };
    let padding = match obj.get("padding") {
        None | Some(Value::Null) => None,
        Some(v @ (Value::Number(_) | Value::Object(_))) => Some(v.clone()),
        Some(v) => return Err(bad_property("padding", "a number or object", v)),
    };
    Ok(TopLevelProperties {
        autosize,
        background,
        padding,
    })
}

fn bad_property(name: &str, expected: &str, got: &Value) -> CompileError {
    CompileError::config(format!(
        "top-level property '{name}' must be {expected}, got {}",
        json_kind(got)
    ))
}

/// Config-derived properties overridden by spec-derived properties.
pub fn get_top_level_properties(
    input: &Map<String, Value>,
    config: &Config,
) -> CompileResult<TopLevelProperties> {
    let from_config = extract_top_level_properties(&config.to_map()?)?;
    let from_spec = extract_top_level_properties(input)?;
    Ok(from_config.merge(from_spec))
}

#[cfg(test)]
#[path = "../../tests/unit/config/toplevel.rs"]
mod tests;
