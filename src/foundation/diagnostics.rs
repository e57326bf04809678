use std::fmt;

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    /// Informational trace of a rewrite or default.
    Debug,
    /// Something in the input was ignored or replaced.
    Warn,
    /// A problem worth surfacing even though compilation continued.
    Error,
}

/// One diagnostic emitted while compiling.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Diagnostic {
    /// Severity.
    pub level: DiagnosticLevel,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    /// Build a [`DiagnosticLevel::Debug`] diagnostic.
    pub fn debug(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Debug,
            message: message.into(),
        }
    }

    /// Build a [`DiagnosticLevel::Warn`] diagnostic.
    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warn,
            message: message.into(),
        }
    }

    /// Build a [`DiagnosticLevel::Error`] diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagnosticLevel::Debug => "debug",
            DiagnosticLevel::Warn => "warn",
            DiagnosticLevel::Error => "error",
        };
        write!(f, "{level}: {}", self.message)
    }
}

/// Destination for diagnostics emitted during one compile call.
///
/// The sink is borrowed by the pipeline for the duration of a call and passed explicitly
/// to every stage that may emit, so concurrent compiles never share a sink unless the
/// caller chooses to.
///
/// Scope contract: `enter_scope` is called once before any stage runs and `exit_scope`
/// exactly once when the call returns, on success and on failure alike.
pub trait DiagnosticSink {
    /// Record one diagnostic.
    fn emit(&mut self, diagnostic: Diagnostic);

    /// Called when a compile call binds this sink.
    fn enter_scope(&mut self) {}

    /// Called when a compile call releases this sink.
    fn exit_scope(&mut self) {}
}

/// Default sink: forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic.level {
            DiagnosticLevel::Debug => tracing::debug!(message = %diagnostic.message),
            DiagnosticLevel::Warn => tracing::warn!(message = %diagnostic.message),
            DiagnosticLevel::Error => tracing::error!(message = %diagnostic.message),
        }
    }
}

/// In-memory sink for tests, tooling and the CLI.
#[derive(Debug, Default)]
pub struct CollectingSink {
    /// Diagnostics in emission order.
    pub diagnostics: Vec<Diagnostic>,
    open_scopes: usize,
}

impl CollectingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of compile calls currently holding this sink.
    pub fn open_scopes(&self) -> usize {
        self.open_scopes
    }

    /// Diagnostics at or above `level`.
    pub fn at_least(&self, level: DiagnosticLevel) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.level >= level)
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    fn enter_scope(&mut self) {
        self.open_scopes += 1;
    }

    fn exit_scope(&mut self) {
        self.open_scopes = self.open_scopes.saturating_sub(1);
    }
}

/// Scoped binding of a sink to one compile call.
///
/// Entering calls [`DiagnosticSink::enter_scope`] and enters a `compile` tracing span;
/// dropping the scope calls [`DiagnosticSink::exit_scope`] and leaves the span. Because
/// release happens in `Drop`, it runs on every exit path including `?` propagation.
pub struct SinkScope<'a> {
    sink: &'a mut dyn DiagnosticSink,
    _span: tracing::span::EnteredSpan,
}

impl<'a> SinkScope<'a> {
    /// Bind `sink` for the lifetime of the returned guard.
    pub fn enter(sink: &'a mut dyn DiagnosticSink) -> Self {
        let span = tracing::debug_span!("compile").entered();
        sink.enter_scope();
        Self { sink, _span: span }
    }

    /// The bound sink.
    pub fn sink(&mut self) -> &mut dyn DiagnosticSink {
        &mut *self.sink
    }
}

impl Drop for SinkScope<'_> {
    fn drop(&mut self) {
        self.sink.exit_scope();
    }
}

impl fmt::Debug for SinkScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkScope").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/diagnostics.rs"]
mod tests;
