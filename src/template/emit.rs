//! Turning the rewritten items into the generated file.
//!
//! The output is meant to be pulled into its target module with
//! `include!("rstemplate_IntSet.rs");`, so paths and visibility are fixed up
//! as if the items were written there directly. Inner attributes are not
//! allowed under `include!`; the template's are copied onto each item
//! instead, and inner docs are dropped.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use proc_macro2::{Ident, Span as TokenSpan};
use syn::punctuated::Punctuated;
use syn::visit_mut::{self, VisitMut};
use syn::{AttrStyle, Attribute, Item, ItemUse, PathSegment, UsePath, UseTree, VisRestricted};
use thiserror::Error;

use crate::loader::{ModulePath, ModuleRef};
use crate::{FILE_EXTENSION, OUTPUT_PREFIX};

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("generated code does not parse after formatting: {reason}")]
    Format { reason: String },

    #[error("failed to write '{}': {error}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        error: io::Error,
    },
}

/// A finished instantiation, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub file_name: String,
    /// Module the generated code belongs to.
    pub module: ModulePath,
    pub source: String,
}

impl Instance {
    /// Create or truncate `dir/<file_name>` and write the source into it.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, EmitError> {
        let path = dir.join(&self.file_name);
        let write_error = |error| EmitError::Write {
            path: path.clone(),
            error,
        };

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o666);
        }
        let mut file = options.open(&path).map_err(write_error)?;
        file.write_all(self.source.as_bytes()).map_err(write_error)?;
        Ok(path)
    }
}

/// `rstemplate_IntSet.rs` for instance `IntSet`.
pub fn output_file_name(name: &str) -> String {
    format!("{OUTPUT_PREFIX}{name}.{FILE_EXTENSION}")
}

pub fn header(source: &ModuleRef, instantiation: &str, target: &ModulePath) -> String {
    format!(
        "// Code generated by rstemplate from `{source}` as `{instantiation}` into module `{target}`; DO NOT EDIT.\n"
    )
}

/// What the emitter needs to know about where the code came from and goes.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub source_ref: &'a ModuleRef,
    /// Module path of the template file, when it lives inside a crate.
    pub source_module: Option<&'a ModulePath>,
    pub target_module: &'a ModulePath,
}

/// Relocate, format and label the instantiated items.
pub fn emit(
    attrs: Vec<Attribute>,
    mut items: Vec<Item>,
    name: &str,
    instantiation: &str,
    placement: Placement<'_>,
) -> Result<Instance, EmitError> {
    if let Some(source_module) = placement.source_module {
        let mut relocator = Relocator {
            source: source_module,
            target: placement.target_module,
        };
        for item in items.iter_mut() {
            relocator.visit_item_mut(item);
        }
    }

    hoist_inner_attributes(attrs, &mut items);

    let file = syn::File {
        shebang: None,
        attrs: Vec::new(),
        items,
    };
    let body = prettyplease::unparse(&file);
    syn::parse_file(&body).map_err(|e| EmitError::Format {
        reason: e.to_string(),
    })?;

    let mut source = header(placement.source_ref, instantiation, placement.target_module);
    source.push('\n');
    source.push_str(&body);

    Ok(Instance {
        file_name: output_file_name(name),
        module: placement.target_module.clone(),
        source,
    })
}

/// Turn the file's inner attributes into outer ones on every item.
fn hoist_inner_attributes(attrs: Vec<Attribute>, items: &mut [Item]) {
    let hoisted: Vec<Attribute> = attrs
        .into_iter()
        .filter(|attr| !attr.path().is_ident("doc"))
        .map(|mut attr| {
            attr.style = AttrStyle::Outer;
            attr
        })
        .collect();
    if hoisted.is_empty() {
        return;
    }
    for item in items {
        if let Some(item_attrs) = item_attrs(item) {
            item_attrs.splice(0..0, hoisted.iter().cloned());
        }
    }
}

fn item_attrs(item: &mut Item) -> Option<&mut Vec<Attribute>> {
    match item {
        Item::Const(i) => Some(&mut i.attrs),
        Item::Enum(i) => Some(&mut i.attrs),
        Item::ExternCrate(i) => Some(&mut i.attrs),
        Item::Fn(i) => Some(&mut i.attrs),
        Item::Impl(i) => Some(&mut i.attrs),
        Item::Macro(i) => Some(&mut i.attrs),
        Item::Static(i) => Some(&mut i.attrs),
        Item::Struct(i) => Some(&mut i.attrs),
        Item::Trait(i) => Some(&mut i.attrs),
        Item::Type(i) => Some(&mut i.attrs),
        Item::Union(i) => Some(&mut i.attrs),
        Item::Use(i) => Some(&mut i.attrs),
        _ => None,
    }
}

/// Rewrites paths that name the template's own module so they still
/// resolve from the target module.
struct Relocator<'a> {
    source: &'a ModulePath,
    target: &'a ModulePath,
}

impl Relocator<'_> {
    /// For leading segments `idents`, how many to drop and what to put in
    /// their place.
    fn relocate(&self, idents: &[String]) -> Option<(usize, Vec<String>)> {
        match idents.first().map(String::as_str) {
            Some("crate") => {
                let own = self.source.segments();
                if own.is_empty() || self.source == self.target || !idents[1..].starts_with(own) {
                    return None;
                }
                let mut new = vec!["crate".to_string()];
                new.extend(self.target.segments().iter().cloned());
                Some((1 + own.len(), new))
            }
            Some("super") => {
                let levels = idents.iter().take_while(|s| *s == "super").count();
                let base = self.source.ancestor(levels)?;
                let mut new = vec!["crate".to_string()];
                new.extend(base.segments().iter().cloned());
                Some((levels, new))
            }
            _ => None,
        }
    }

    fn relocate_use_tree(&self, tree: &mut UseTree) {
        if let UseTree::Group(group) = tree {
            for item in group.items.iter_mut() {
                self.relocate_use_tree(item);
            }
            return;
        }

        let mut idents = Vec::new();
        let mut rest = &*tree;
        while let UseTree::Path(p) = rest {
            idents.push(p.ident.to_string());
            rest = &p.tree;
        }
        let Some((consumed, new)) = self.relocate(&idents) else {
            return;
        };

        let mut rest = tree.clone();
        for _ in 0..consumed {
            rest = match rest {
                UseTree::Path(p) => *p.tree,
                other => other,
            };
        }
        *tree = new.iter().rev().fold(rest, |inner, seg| {
            UseTree::Path(UsePath {
                ident: Ident::new(seg, TokenSpan::call_site()),
                colon2_token: Default::default(),
                tree: Box::new(inner),
            })
        });
    }
}

impl VisitMut for Relocator<'_> {
    fn visit_path_mut(&mut self, path: &mut syn::Path) {
        if path.leading_colon.is_none() {
            let idents: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
            if let Some((consumed, new)) = self.relocate(&idents) {
                let mut segments: Punctuated<PathSegment, syn::Token![::]> = new
                    .iter()
                    .map(|s| PathSegment::from(Ident::new(s, TokenSpan::call_site())))
                    .collect();
                segments.extend(path.segments.iter().skip(consumed).cloned());
                path.segments = segments;
            }
        }
        visit_mut::visit_path_mut(self, path);
    }

    fn visit_item_use_mut(&mut self, item: &mut ItemUse) {
        if item.leading_colon.is_none() {
            self.relocate_use_tree(&mut item.tree);
        }
    }

    fn visit_vis_restricted_mut(&mut self, vis: &mut VisRestricted) {
        self.visit_path_mut(&mut vis.path);
        let shorthand = vis.path.segments.len() == 1
            && matches!(
                vis.path.segments[0].ident.to_string().as_str(),
                "crate" | "self" | "super"
            );
        if !shorthand {
            vis.in_token = Some(Default::default());
        }
    }
}
