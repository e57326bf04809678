use std::collections::BTreeMap;

use serde_json::json;

use crate::{
    foundation::error::{CompileError, CompileResult},
    foundation::naming::var_name,
    model::base::ModelBase,
    spec::model::SelectionDef,
    vega::spec::{DataSource, Signal, SignalOn},
};

/// Supported selection kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SelectionKind {
    Single,
    Multi,
    Interval,
}

impl SelectionKind {
    pub(crate) fn parse(name: &str, kind: &str) -> CompileResult<Self> {
        match kind {
            "single" => Ok(Self::Single),
            "multi" => Ok(Self::Multi),
            "interval" => Ok(Self::Interval),
            other => Err(CompileError::parse(format!(
                "selection '{name}' has unsupported type '{other}'"
            ))),
        }
    }

    fn default_events(self) -> &'static str {
        match self {
            Self::Single | Self::Multi => "click",
            Self::Interval => "[mousedown, window:mouseup] > window:mousemove!",
        }
    }
}

/// Signals and store sources a unit's selections contribute.
#[derive(Debug, Default)]
pub(crate) struct SelectionParts {
    pub(crate) data: Vec<DataSource>,
    pub(crate) group_signals: Vec<Signal>,
    pub(crate) top_signals: Vec<Signal>,
}

/// Compile a unit's selections in name order.
pub(crate) fn parse_selections(
    base: &ModelBase,
    selections: &BTreeMap<String, SelectionDef>,
) -> CompileResult<SelectionParts> {
    let mut parts = SelectionParts::default();
    if selections.is_empty() {
        return Ok(parts);
    }

    parts.group_signals.push(Signal {
        name: "unit".to_string(),
        value: Some(json!({})),
        on: vec![SignalOn {
            events: json!("mousemove"),
            update: "isTuple(group()) ? group() : unit".to_string(),
        }],
        ..Signal::default()
    });

    let unit = base.get_name("unit");
    for (name, def) in selections {
        if name.is_empty() {
            return Err(CompileError::parse("selection names must not be empty"));
        }
        let kind = SelectionKind::parse(name, &def.kind)?;
        let id = var_name(name);
        let store = format!("{id}_store");
        let tuple = format!("{id}_tuple");

        parts.data.push(DataSource::named(store.clone()));

        let tuple_update = match kind {
            SelectionKind::Single | SelectionKind::Multi => format!(
                "datum && item().mark.marktype !== 'group' ? \
                 {{unit: \"{unit}\", fields: [\"_vgsid_\"], values: [datum[\"_vgsid_\"]]}} : null"
            ),
            SelectionKind::Interval => format!("{{unit: \"{unit}\", extent: [x(), y()]}}"),
        };
        parts.group_signals.push(Signal {
            name: tuple.clone(),
            value: Some(json!({})),
            on: vec![SignalOn {
                events: json!(def.on.as_deref().unwrap_or(kind.default_events())),
                update: tuple_update,
            }],
            ..Signal::default()
        });

        let modify = match kind {
            SelectionKind::Multi => format!("modify(\"{store}\", {tuple}, null)"),
            SelectionKind::Single | SelectionKind::Interval => {
                format!("modify(\"{store}\", {tuple}, true)")
            }
        };
        parts.group_signals.push(Signal {
            name: format!("{id}_modify"),
            on: vec![SignalOn {
                events: json!({ "signal": tuple }),
                update: modify,
            }],
            ..Signal::default()
        });

        parts
            .top_signals
            .push(Signal::update(id, format!("vlSelectionResolve(\"{store}\")")));
    }
    Ok(parts)
}

#[cfg(test)]
#[path = "../../tests/unit/model/selection.rs"]
mod tests;
