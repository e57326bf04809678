//! chartgen compiles declarative chart specs into flat Vega scene-graph specs.
//!
//! An input spec describes a composition tree: single views (`mark` + `encoding`) which
//! can be layered, faceted, repeated and concatenated. Compilation runs in fixed stages:
//!
//! - resolve the `config` section against built-in defaults
//! - [`normalize`] shorthand forms into canonical composite form
//! - [`build_model`] and [`Model::parse`] the composition tree
//! - [`assemble`] the parsed tree into one output document
//!
//! [`compile`] runs the whole pipeline. Diagnostics go to a caller-supplied
//! [`DiagnosticSink`], or to `tracing` when none is given.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod compile;
mod config;
mod foundation;
mod model;
mod spec;
mod vega;

pub use crate::compile::assemble::{assemble, assemble_nested_main_group};
pub use crate::compile::pipeline::{compile, compile_reader, compile_str};
pub use crate::config::resolve::{Config, LayoutConfig, MarkConfig, ViewConfig, init_config};
pub use crate::config::toplevel::{
    TopLevelProperties, extract_top_level_properties, get_top_level_properties,
};
pub use crate::foundation::diagnostics::{
    CollectingSink, Diagnostic, DiagnosticLevel, DiagnosticSink, SinkScope, TracingSink,
};
pub use crate::foundation::error::{CompileError, CompileResult};
pub use crate::foundation::naming::{qualify, var_name};
pub use crate::model::{
    ConcatModel, FacetModel, LayerModel, Model, ModelBase, ModelComponents, ParentScope,
    RepeatModel, RepeaterValue, SizeSignals, UnitModel, build_model,
};
pub use crate::spec::model::{
    Channel, ChannelDef, CompositionKind, ConcatDirection, ConcatSpec, DataDef, FacetMapping,
    FacetSpec, FieldRef, FieldType, LayerSpec, MarkDef, MarkProps, MarkType, NormalizedSpec,
    RepeatDir, RepeatMapping, RepeatSpec, SelectionDef, SpecHeader, UnitSpec,
};
pub use crate::spec::normalize::normalize;
pub use crate::vega::spec::{
    CompileOutput, DataSource, Encode, EncodeEntry, Facet, GroupFragment, GroupMark, Layout,
    LayoutColumns, LayoutPadding, Mark, MarkFrom, PrimitiveMark, Signal, SignalOn, VEGA_SCHEMA,
    VgSpec,
};
