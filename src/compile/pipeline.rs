use std::{io::Read, sync::Arc};

use serde_json::Value;

use crate::{
    compile::assemble::assemble,
    config::{resolve::init_config, resolve::json_kind, toplevel::get_top_level_properties},
    foundation::diagnostics::{DiagnosticSink, SinkScope, TracingSink},
    foundation::error::{CompileError, CompileResult},
    model::build_model,
    spec::normalize::normalize,
    vega::spec::CompileOutput,
};

/// Compile an input spec into an output document.
///
/// Stages run in order: resolve config, normalize, build the model tree, parse it,
/// assemble. The first failing stage aborts the call and its error is returned as is.
///
/// Diagnostics go to `sink` when given, otherwise to `tracing`. The sink is bound for
/// exactly the duration of this call.
pub fn compile(
    input: &Value,
    sink: Option<&mut dyn DiagnosticSink>,
) -> CompileResult<CompileOutput> {
    let mut fallback = TracingSink;
    let mut scope = SinkScope::enter(match sink {
        Some(sink) => sink,
        None => &mut fallback,
    });
    run(input, scope.sink())
}

fn run(input: &Value, sink: &mut dyn DiagnosticSink) -> CompileResult<CompileOutput> {
    let Value::Object(input_map) = input else {
        return Err(CompileError::normalize(format!(
            "input spec must be an object, got {}",
            json_kind(input)
        )));
    };

    let config = Arc::new(init_config(input_map.get("config"))?);
    let spec = normalize(input, &config, sink)?;
    tracing::debug!("normalized input spec");

    let mut model = build_model(&spec, None, "", None, Arc::clone(&config))?;
    model.parse(sink)?;
    tracing::debug!("parsed model tree");

    assemble(&model, get_top_level_properties(input_map, &config)?)
}

/// [`compile`] a JSON string.
pub fn compile_str(
    input: &str,
    sink: Option<&mut dyn DiagnosticSink>,
) -> CompileResult<CompileOutput> {
    let value: Value = serde_json::from_str(input)?;
    compile(&value, sink)
}

/// [`compile`] JSON read from `reader`.
pub fn compile_reader<R: Read>(
    reader: R,
    sink: Option<&mut dyn DiagnosticSink>,
) -> CompileResult<CompileOutput> {
    let value: Value = serde_json::from_reader(reader)?;
    compile(&value, sink)
}

#[cfg(test)]
#[path = "../../tests/unit/compile/pipeline.rs"]
mod tests;
