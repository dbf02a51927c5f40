pub mod diagnostics;
pub mod errors;
pub mod lexer;
pub mod loader;
pub mod request;
pub mod span;
pub mod template;

pub use diagnostics::Diagnostics;
pub use errors::{ErrorCategory, InstantiateError};
pub use request::InstantiationRequest;
pub use template::{instantiate, Instance};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extension of Rust source files.
pub const FILE_EXTENSION: &str = "rs";

/// Prefix of every generated file name.
pub const OUTPUT_PREFIX: &str = "rstemplate_";
