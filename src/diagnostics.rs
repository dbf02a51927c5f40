use std::fmt;

/// Verbosity setting threaded through every pipeline stage.
///
/// The binary installs a `tracing` subscriber; this value only decides
/// whether intermediate state is sent to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    verbose: bool,
}

impl Diagnostics {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn quiet() -> Self {
        Self { verbose: false }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Log `args` at debug level when verbose.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        if self.verbose {
            tracing::debug!("{args}");
        }
    }
}
