//! Sorting top-level items into stubs, kept items and rename candidates.

use proc_macro2::Ident;
use syn::parse::{Parse, ParseStream};
use syn::spanned::Spanned as _;
use syn::{Attribute, Expr, Item, Token, Type, Visibility};

use crate::diagnostics::Diagnostics;
use crate::errors::{TemplateError, TemplateErrorKind};
use crate::span::Span;
use crate::template::directive::TemplateDefinition;

/// What a top-level item declares, as far as instantiation cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    /// `use` and `extern crate`: kept, nothing to rename.
    Import,
    /// `struct`, `enum`, `union`, `type`, `trait`.
    Type(Ident),
    /// A free function.
    Function(Ident),
    /// `const`, `static`, or a `thread_local!` block with one static.
    ValueBinding(Vec<Ident>),
    /// `impl` blocks. Their methods follow the type they are attached to.
    Methods,
}

/// Items left after stub removal, plus every name to be renamed.
#[derive(Debug, Clone)]
pub struct Classified {
    pub items: Vec<Item>,
    /// Rename candidates in source order; a name may appear more than once.
    pub candidates: Vec<Ident>,
}

/// Work out what `item` declares.
///
/// Shapes with no sensible instantiation are errors rather than being
/// passed through untouched.
pub fn decl_kind(item: &Item, source: &str) -> Result<DeclKind, TemplateError> {
    let unsupported = |what: String| {
        TemplateError::new(
            TemplateErrorKind::UnsupportedDeclaration { what },
            Span::from_token_span(source, item.span()),
        )
    };

    let kind = match item {
        Item::Use(_) | Item::ExternCrate(_) => DeclKind::Import,
        Item::Const(c) => {
            if c.ident == "_" {
                DeclKind::ValueBinding(Vec::new())
            } else {
                DeclKind::ValueBinding(vec![c.ident.clone()])
            }
        }
        Item::Static(s) => DeclKind::ValueBinding(vec![s.ident.clone()]),
        Item::Struct(s) => DeclKind::Type(s.ident.clone()),
        Item::Enum(e) => DeclKind::Type(e.ident.clone()),
        Item::Union(u) => DeclKind::Type(u.ident.clone()),
        Item::Type(t) => DeclKind::Type(t.ident.clone()),
        Item::Trait(t) => DeclKind::Type(t.ident.clone()),
        Item::Fn(f) => DeclKind::Function(f.sig.ident.clone()),
        Item::Impl(_) => DeclKind::Methods,
        Item::Macro(m) if m.ident.is_none() && is_thread_local(&m.mac.path) => {
            let block: ThreadLocalBlock = m.mac.parse_body().map_err(|e| {
                TemplateError::new(
                    TemplateErrorKind::Parse {
                        message: e.to_string(),
                    },
                    Span::from_token_span(source, e.span()),
                )
            })?;
            if block.names.len() != 1 {
                return Err(TemplateError::new(
                    TemplateErrorKind::MultipleSpecifications {
                        what: "thread_local!".to_string(),
                        count: block.names.len(),
                    },
                    Span::from_token_span(source, item.span()),
                ));
            }
            DeclKind::ValueBinding(block.names)
        }
        Item::Macro(m) => match &m.ident {
            Some(name) => return Err(unsupported(format!("macro_rules! {name}"))),
            None => {
                let path = m
                    .mac
                    .path
                    .segments
                    .iter()
                    .map(|s| s.ident.to_string())
                    .collect::<Vec<_>>()
                    .join("::");
                return Err(unsupported(format!("item macro `{path}!`")));
            }
        },
        Item::Mod(m) => return Err(unsupported(format!("module `{}`", m.ident))),
        Item::ForeignMod(_) => return Err(unsupported("extern block".to_string())),
        Item::TraitAlias(t) => return Err(unsupported(format!("trait alias `{}`", t.ident))),
        Item::Verbatim(_) => return Err(unsupported("unparsed item".to_string())),
        _ => return Err(unsupported("unknown item kind".to_string())),
    };
    Ok(kind)
}

fn is_thread_local(path: &syn::Path) -> bool {
    path.segments
        .last()
        .is_some_and(|seg| seg.ident == "thread_local")
}

/// Names declared by a `thread_local!` body:
/// `static NAME: Type = init;` repeated, last semicolon optional.
struct ThreadLocalBlock {
    names: Vec<Ident>,
}

impl Parse for ThreadLocalBlock {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut names = Vec::new();
        while !input.is_empty() {
            input.call(Attribute::parse_outer)?;
            input.parse::<Visibility>()?;
            input.parse::<Token![static]>()?;
            names.push(input.parse::<Ident>()?);
            input.parse::<Token![:]>()?;
            input.parse::<Type>()?;
            input.parse::<Token![=]>()?;
            input.parse::<Expr>()?;
            if input.is_empty() {
                break;
            }
            input.parse::<Token![;]>()?;
        }
        Ok(Self { names })
    }
}

/// Partition `items` and collect rename candidates.
///
/// Types and free functions named after a formal parameter are the
/// template's placeholders and are dropped.
pub fn classify(
    items: Vec<Item>,
    def: &TemplateDefinition,
    source: &str,
    diag: &Diagnostics,
) -> Result<Classified, TemplateError> {
    let mut kept = Vec::with_capacity(items.len());
    let mut candidates = Vec::new();

    for item in items {
        let remove = match decl_kind(&item, source)? {
            DeclKind::Import | DeclKind::Methods => false,
            DeclKind::ValueBinding(names) => {
                for name in names {
                    diag.debug(format_args!("value {name}"));
                    candidates.push(name);
                }
                false
            }
            DeclKind::Type(name) => {
                diag.debug(format_args!("type {name}"));
                let stub = def.is_param(&name.to_string());
                candidates.push(name);
                stub
            }
            DeclKind::Function(name) => {
                diag.debug(format_args!("fn {name}"));
                let hook = def.is_param(&name.to_string());
                candidates.push(name);
                hook
            }
        };
        if !remove {
            kept.push(item);
        }
    }

    diag.debug(format_args!(
        "names to mangle = {:?}",
        candidates.iter().map(Ident::to_string).collect::<Vec<_>>()
    ));

    Ok(Classified {
        items: kept,
        candidates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(params: &[&str]) -> TemplateDefinition {
        TemplateDefinition {
            name: "Set".into(),
            params: params.iter().map(|p| p.to_string()).collect(),
            span: Span::dummy(),
        }
    }

    fn classify_source(source: &str, params: &[&str]) -> Result<Classified, TemplateError> {
        let file = syn::parse_file(source).unwrap();
        classify(file.items, &def(params), source, &Diagnostics::quiet())
    }

    fn names(classified: &Classified) -> Vec<String> {
        classified.candidates.iter().map(Ident::to_string).collect()
    }

    #[test]
    fn stub_types_are_removed() {
        let src = "type A = u8;\nstruct Set { items: Vec<A> }\n";
        let classified = classify_source(src, &["A"]).unwrap();
        assert_eq!(names(&classified), vec!["A", "Set"]);
        assert_eq!(classified.items.len(), 1);
        assert!(matches!(&classified.items[0], Item::Struct(s) if s.ident == "Set"));
    }

    #[test]
    fn hook_functions_are_removed() {
        let src = "struct A;\nfn A() -> A { A }\nfn NewSet() {}\n";
        let classified = classify_source(src, &["A"]).unwrap();
        assert_eq!(names(&classified), vec!["A", "A", "NewSet"]);
        assert_eq!(classified.items.len(), 1);
    }

    #[test]
    fn values_are_candidates_and_kept() {
        let src = "const LIMIT: usize = 4;\nstatic mut COUNT: usize = 0;\nconst _: () = ();\n";
        let classified = classify_source(src, &[]).unwrap();
        assert_eq!(names(&classified), vec!["LIMIT", "COUNT"]);
        assert_eq!(classified.items.len(), 3);
    }

    #[test]
    fn impls_and_imports_are_left_alone() {
        let src = "use std::fmt;\nstruct Set;\nimpl Set { fn len(&self) -> usize { 0 } }\n";
        let classified = classify_source(src, &[]).unwrap();
        assert_eq!(names(&classified), vec!["Set"]);
        assert_eq!(classified.items.len(), 3);
    }

    #[test]
    fn thread_local_with_one_static() {
        let src = "thread_local! { static CACHE: Vec<u8> = Vec::new(); }\n";
        let classified = classify_source(src, &[]).unwrap();
        assert_eq!(names(&classified), vec!["CACHE"]);
    }

    #[test]
    fn thread_local_with_many_statics_is_rejected() {
        let src = "thread_local! {\n    static A1: u8 = 0;\n    static B1: u8 = const { 1 };\n}\n";
        let err = classify_source(src, &[]).unwrap_err();
        assert_eq!(
            err.kind,
            TemplateErrorKind::MultipleSpecifications {
                what: "thread_local!".into(),
                count: 2
            }
        );
    }

    #[test]
    fn unsupported_items_are_rejected() {
        for (src, what) in [
            ("mod inner {}\n", "module `inner`"),
            ("macro_rules! m { () => {} }\n", "macro_rules! m"),
            ("lazy_static::lazy_static! { static ref X: u8 = 0; }\n", "item macro `lazy_static::lazy_static!`"),
            ("extern \"C\" { fn abs(x: i32) -> i32; }\n", "extern block"),
        ] {
            let err = classify_source(src, &[]).unwrap_err();
            assert_eq!(
                err.kind,
                TemplateErrorKind::UnsupportedDeclaration { what: what.into() },
                "{src}"
            );
        }
    }

    #[test]
    fn unsupported_item_span_points_at_item() {
        let src = "struct Set;\nmod inner {}\n";
        let err = classify_source(src, &[]).unwrap_err();
        assert_eq!(&src[err.span.start..err.span.end], "mod inner {}");
    }
}
