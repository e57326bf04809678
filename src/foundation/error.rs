/// Convenience result type used across chartgen.
pub type CompileResult<T> = Result<T, CompileError>;

/// Error taxonomy for every compile stage.
///
/// Errors are raised where they are detected and propagate unchanged to the caller of
/// [`crate::compile`]; nothing in the pipeline retries or downgrades them.
#[derive(thiserror::Error, Debug)]
pub enum CompileError {
    /// Invalid `config` section or malformed top-level property.
    #[error("config error: {0}")]
    Config(String),

    /// Input spec shape is not supported by the normalizer.
    #[error("normalize error: {0}")]
    Normalize(String),

    /// A model node could not be constructed from its normalized spec.
    #[error("model error: {0}")]
    Model(String),

    /// A node failed while computing its components.
    #[error("parse error: {0}")]
    Parse(String),

    /// An assembly accessor found missing or inconsistent component state.
    #[error("assembly error: {0}")]
    Assembly(String),

    /// Errors when serializing or deserializing JSON.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CompileError {
    /// Build a [`CompileError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`CompileError::Normalize`] value.
    pub fn normalize(msg: impl Into<String>) -> Self {
        Self::Normalize(msg.into())
    }

    /// Build a [`CompileError::Model`] value.
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Build a [`CompileError::Parse`] value.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Build a [`CompileError::Assembly`] value.
    pub fn assembly(msg: impl Into<String>) -> Self {
        Self::Assembly(msg.into())
    }

    /// Build a [`CompileError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for CompileError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
