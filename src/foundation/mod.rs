pub(crate) mod diagnostics;
pub(crate) mod error;
pub(crate) mod naming;
