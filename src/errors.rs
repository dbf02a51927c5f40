use std::io;
use std::path::PathBuf;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, NoColor, StandardStream, WriteColor};
use thiserror::Error;

use crate::loader::LoadError;
use crate::span::Span;
use crate::template::emit::EmitError;

/// Broad class of a failure, used by callers that care who is at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The instantiation string or its arguments are wrong.
    UserInput,
    /// The template file has a shape this tool cannot instantiate.
    TemplateShape,
    /// The filesystem or the formatter failed.
    Environment,
}

/// Error located in a template source file.
#[derive(Debug, Clone)]
pub struct TemplateError {
    pub kind: TemplateErrorKind,
    pub span: Span,
}

impl TemplateError {
    pub fn new(kind: TemplateErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for TemplateError {}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateErrorKind {
    #[error("failed to parse template: {message}")]
    Parse { message: String },

    #[error("unterminated block comment")]
    UnterminatedComment,

    #[error("didn't find template definition")]
    NoDefinition,

    #[error("found multiple template definitions")]
    MultipleDefinitions { first: Span },

    #[error("invalid template parameter {param:?}")]
    InvalidParameter { param: String },

    #[error("template parameter `{param}` is declared twice")]
    DuplicateParameter { param: String },

    #[error("template parameter `{param}` has the same name as the template")]
    ParameterNamesTemplate { param: String },

    #[error("wrong number of arguments - template is expecting {expected} but {supplied} supplied")]
    WrongArgumentCount { expected: usize, supplied: usize },

    #[error("invalid type argument {arg:?}")]
    InvalidArgument { arg: String },

    #[error("unsupported declaration: {what}")]
    UnsupportedDeclaration { what: String },

    #[error("expected a single declaration in `{what}` block, found {count}")]
    MultipleSpecifications { what: String, count: usize },

    #[error("no definition for template type `{name}`")]
    MissingDefinition { name: String },

    #[error("`{first}` and `{second}` would both be renamed to `{replacement}`")]
    RenameCollision {
        first: String,
        second: String,
        replacement: String,
    },

    #[error("`{param}` is used where only an identifier is allowed, but `{arg}` is not an identifier")]
    TypeInIdentPosition {
        param: String,
        arg: String,
        others: Vec<Span>,
    },
}

impl TemplateErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TemplateErrorKind::WrongArgumentCount { .. }
            | TemplateErrorKind::InvalidArgument { .. } => ErrorCategory::UserInput,
            _ => ErrorCategory::TemplateShape,
        }
    }
}

/// Every way an instantiation can fail.
#[derive(Debug, Error)]
pub enum InstantiateError {
    #[error("bad template replacement string {0:?}")]
    BadInstantiation(String),

    #[error("invalid instantiation name {0:?}: expected an identifier")]
    InvalidName(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to read '{}': {error}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("{error}")]
    Template {
        path: PathBuf,
        text: String,
        error: TemplateError,
    },

    #[error(transparent)]
    Emit(#[from] EmitError),
}

impl InstantiateError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            InstantiateError::BadInstantiation(_) | InstantiateError::InvalidName(_) => {
                ErrorCategory::UserInput
            }
            InstantiateError::Load(e) => e.category(),
            InstantiateError::Read { .. } | InstantiateError::Emit(_) => {
                ErrorCategory::Environment
            }
            InstantiateError::Template { error, .. } => error.category(),
        }
    }
}

/// Renders diagnostics for one template file.
pub struct ErrorReporter {
    files: SimpleFiles<String, String>,
    file_id: usize,
}

impl ErrorReporter {
    pub fn new(filename: String, source: String) -> Self {
        let mut files = SimpleFiles::new();
        let file_id = files.add(filename, source);
        Self { files, file_id }
    }

    pub fn report_template_error(&self, err: &TemplateError) {
        self.emit(&self.template_diagnostic(err));
    }

    /// Same diagnostic as `report_template_error`, rendered without colour.
    pub fn render_template_error(&self, err: &TemplateError) -> String {
        let mut out = NoColor::new(Vec::new());
        self.write(&mut out, &self.template_diagnostic(err));
        String::from_utf8_lossy(out.get_ref()).into_owned()
    }

    fn template_diagnostic(&self, err: &TemplateError) -> Diagnostic<usize> {
        let mut labels = Vec::new();
        if !err.span.is_dummy() {
            labels.push(Label::primary(self.file_id, err.span.start..err.span.end));
        }

        match &err.kind {
            TemplateErrorKind::MultipleDefinitions { first } => {
                labels.push(
                    Label::secondary(self.file_id, first.start..first.end)
                        .with_message("first definition here"),
                );
            }
            TemplateErrorKind::TypeInIdentPosition { others, .. } => {
                for other in others {
                    labels.push(
                        Label::secondary(self.file_id, other.start..other.end)
                            .with_message("also used here"),
                    );
                }
            }
            _ => {}
        }

        let diagnostic = Diagnostic::error()
            .with_message(err.to_string())
            .with_labels(labels);
        match err.kind {
            TemplateErrorKind::NoDefinition => diagnostic.with_notes(vec![format!(
                "expected a `// template type Name(Params)` comment in {}",
                self.files.get(self.file_id).map_or("the template", |f| f.name().as_str())
            )]),
            _ => diagnostic,
        }
    }

    fn emit(&self, diag: &Diagnostic<usize>) {
        let writer = StandardStream::stderr(ColorChoice::Auto);
        self.write(&mut writer.lock(), diag);
    }

    fn write(&self, out: &mut dyn WriteColor, diag: &Diagnostic<usize>) {
        let config = term::Config::default();
        let _ = term::emit(out, &config, &self.files, diag);
    }
}

/// Render any instantiation failure to stderr.
///
/// Template errors get a source snippet; everything else is a plain
/// diagnostic with the error chain as notes.
pub fn report(err: &InstantiateError) {
    if let InstantiateError::Template { path, text, error } = err {
        ErrorReporter::new(path.display().to_string(), text.clone()).report_template_error(error);
        return;
    }

    let mut notes = Vec::new();
    let mut cause = std::error::Error::source(err);
    while let Some(e) = cause {
        notes.push(e.to_string());
        cause = e.source();
    }

    let files: SimpleFiles<String, String> = SimpleFiles::new();
    let diag: Diagnostic<usize> = Diagnostic::error()
        .with_message(err.to_string())
        .with_notes(notes);
    let writer = StandardStream::stderr(ColorChoice::Auto);
    let config = term::Config::default();
    let _ = term::emit(&mut writer.lock(), &config, &files, &diag);
}
