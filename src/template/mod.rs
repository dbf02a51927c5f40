//! Instantiating a template module.
//!
//! Pipeline: parse → find the directive → classify top-level items →
//! build the name table → rewrite → emit.

pub mod classify;
pub mod directive;
pub mod emit;
pub mod mapping;
pub mod rewrite;

use std::fs;
use std::path::Path;

use syn::{Attribute, Item};

use crate::diagnostics::Diagnostics;
use crate::errors::{InstantiateError, TemplateError, TemplateErrorKind};
use crate::lexer::scan_comments;
use crate::loader::{self, ModulePath};
use crate::request::InstantiationRequest;
use crate::span::Span;

pub use emit::{EmitError, Instance};

/// Resolve, read and instantiate the template `request` names.
///
/// Nothing is written; see [`Instance::write_to`].
pub fn instantiate(
    request: &InstantiationRequest,
    diag: &Diagnostics,
) -> Result<Instance, InstantiateError> {
    let files = loader::resolve(&request.search_dir, &request.source_module)?;
    let path = files.single(&request.source_module)?;
    diag.debug(format_args!("template file {}", path.display()));

    let text = fs::read_to_string(path).map_err(|error| InstantiateError::Read {
        path: path.to_path_buf(),
        error,
    })?;
    let source_module = loader::module_path_of_file(path).or_else(|| files.module.clone());
    instantiate_source(request, path, &text, source_module.as_ref(), diag)
}

/// Instantiate template source `text` read from `path`.
pub fn instantiate_source(
    request: &InstantiationRequest,
    path: &Path,
    text: &str,
    source_module: Option<&ModulePath>,
    diag: &Diagnostics,
) -> Result<Instance, InstantiateError> {
    let (attrs, items) = expand(request, text, diag).map_err(|error| InstantiateError::Template {
        path: path.to_path_buf(),
        text: text.to_string(),
        error,
    })?;

    let instance = emit::emit(
        attrs,
        items,
        &request.name,
        &request.describe(),
        emit::Placement {
            source_ref: &request.source_module,
            source_module,
            target_module: &request.target_module,
        },
    )?;
    Ok(instance)
}

/// Everything up to formatting: the items of the instance.
fn expand(
    request: &InstantiationRequest,
    text: &str,
    diag: &Diagnostics,
) -> Result<(Vec<Attribute>, Vec<Item>), TemplateError> {
    let file = syn::parse_file(text).map_err(|e| {
        TemplateError::new(
            TemplateErrorKind::Parse {
                message: e.to_string(),
            },
            Span::from_token_span(text, e.span()),
        )
    })?;

    let comments = scan_comments(text)?;
    let def = directive::scan(&comments)?;
    diag.debug(format_args!(
        "template definition {}({})",
        def.name,
        def.params.join(", ")
    ));

    if def.params.len() != request.args.len() {
        return Err(TemplateError::new(
            TemplateErrorKind::WrongArgumentCount {
                expected: def.params.len(),
                supplied: request.args.len(),
            },
            def.span,
        ));
    }

    let classified = classify::classify(file.items, &def, text, diag)?;
    let table = mapping::build(
        &def,
        &request.name,
        &request.args,
        &classified.candidates,
        diag,
    )?;

    let mut items = rewrite::rewrite_items(classified.items, &table, text)?;
    if !request.is_exported() {
        rewrite::privatize(&mut items);
    }
    diag.debug(format_args!("{} items kept", items.len()));

    Ok((file.attrs, items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCategory;
    use crate::loader::ModuleRef;

    const SET: &str = "\
// template type Set(A)

use std::collections::HashMap;

type A = u8;

pub struct Set {
    items: HashMap<A, ()>,
}

pub fn NewSet() -> Box<Set> {
    Box::new(Set { items: HashMap::new() })
}

impl Set {
    pub fn add(&mut self, a: A) {
        self.items.insert(a, ());
    }
}
";

    fn request(name: &str, args: &[&str]) -> InstantiationRequest {
        InstantiationRequest::new(
            ModuleRef::parse("templates::set").unwrap(),
            name,
            args.iter().map(|a| a.to_string()).collect(),
            ModulePath::parse("mypkg").unwrap(),
            ".",
        )
        .unwrap()
    }

    fn run(source: &str, name: &str, args: &[&str]) -> Result<Instance, InstantiateError> {
        let source_module = ModulePath::parse("templates::set").unwrap();
        instantiate_source(
            &request(name, args),
            Path::new("src/templates/set.rs"),
            source,
            Some(&source_module),
            &Diagnostics::quiet(),
        )
    }

    #[test]
    fn exported_instance() {
        let out = run(SET, "IntSet", &["i32"]).unwrap().source;
        assert!(out.contains("pub struct IntSet {\n    items: HashMap<i32, ()>,\n}"));
        assert!(out.contains("pub fn NewIntSet() -> Box<IntSet>"));
        assert!(out.contains("impl IntSet {"));
        assert!(out.contains("pub fn add(&mut self, a: i32)"));
        assert!(!out.contains("type A"));
        assert!(out.contains("into module `mypkg`"));
    }

    #[test]
    fn unexported_instance_is_private() {
        let out = run(SET, "intSet", &["i32"]).unwrap().source;
        assert!(out.contains("\nstruct intSet {"));
        assert!(out.contains("\nfn newintSet() -> Box<intSet>"));
        // methods keep their own visibility
        assert!(out.contains("pub fn add(&mut self, a: i32)"));
    }

    #[test]
    fn argument_count_is_checked_first() {
        let err = run(SET, "IntSet", &["i32", "u8"]).unwrap_err();
        match err {
            InstantiateError::Template { error, .. } => {
                assert_eq!(
                    error.kind,
                    TemplateErrorKind::WrongArgumentCount {
                        expected: 1,
                        supplied: 2
                    }
                );
                assert_eq!(error.category(), ErrorCategory::UserInput);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_errors_carry_a_location() {
        let source = "// template type Set(A)\nstruct Set {\n";
        let err = run(source, "IntSet", &["i32"]).unwrap_err();
        let InstantiateError::Template { error, .. } = err else {
            panic!("expected a template error");
        };
        assert!(matches!(error.kind, TemplateErrorKind::Parse { .. }));
        assert_eq!(error.category(), ErrorCategory::TemplateShape);
    }

    #[test]
    fn missing_directive() {
        let err = run("struct Set;\n", "IntSet", &["i32"]).unwrap_err();
        assert_eq!(err.to_string(), "didn't find template definition");
    }
}
