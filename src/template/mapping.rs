//! The old-name → new-name table.

use proc_macro2::{Ident, Span as TokenSpan};
use quote::ToTokens;
use rustc_hash::FxHashMap;
use syn::ext::IdentExt;

use crate::diagnostics::Diagnostics;
use crate::errors::{TemplateError, TemplateErrorKind};
use crate::request::is_exported;
use crate::template::directive::TemplateDefinition;

/// What an identifier is replaced with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    Ident(Ident),
    /// A concrete type argument that is not a plain identifier.
    Type(Box<syn::Type>),
}

impl Replacement {
    pub fn to_source(&self) -> String {
        match self {
            Replacement::Ident(ident) => ident.to_string(),
            Replacement::Type(ty) => ty.to_token_stream().to_string(),
        }
    }
}

/// Substitution table keyed by the original identifier text.
///
/// Built once; the first mapping registered for a name wins.
#[derive(Debug, Clone, Default)]
pub struct NameMapping {
    map: FxHashMap<String, Replacement>,
    order: Vec<String>,
}

impl NameMapping {
    pub fn get(&self, name: &str) -> Option<&Replacement> {
        self.map.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Replacement)> {
        self.order
            .iter()
            .map(|name| (name.as_str(), &self.map[name]))
    }

    pub(crate) fn register(&mut self, name: String, replacement: Replacement) {
        if self.map.contains_key(&name) {
            return;
        }
        self.order.push(name.clone());
        self.map.insert(name, replacement);
    }
}

/// Interpret a caller-supplied type argument.
pub fn parse_argument(arg: &str) -> Option<Replacement> {
    let arg = arg.trim();
    if arg.is_empty() {
        return None;
    }
    if let Ok(ident) = syn::parse_str::<Ident>(arg) {
        return Some(Replacement::Ident(ident));
    }
    syn::parse_str::<syn::Type>(arg)
        .ok()
        .map(|ty| Replacement::Type(Box::new(ty)))
}

/// New name for a top-level `name` of template `template` instantiated as
/// `instance`.
///
/// The first occurrence of the template name is replaced; names that don't
/// contain it get the instance name as a suffix. Unexported instances never
/// produce an upper-case leading letter.
pub fn mangle(name: &str, template: &str, instance: &str, exported: bool) -> String {
    let mut replacement = if name.contains(template) {
        name.replacen(template, instance, 1)
    } else {
        format!("{name}{instance}")
    };
    if !exported && is_exported(&replacement) {
        let mut chars = replacement.chars();
        if let Some(first) = chars.next() {
            replacement = first.to_lowercase().chain(chars).collect();
        }
    }
    replacement
}

fn make_ident(name: &str) -> Option<Ident> {
    syn::parse_str::<Ident>(name)
        .or_else(|_| syn::parse_str::<Ident>(&format!("r#{name}")))
        .ok()
        .map(|mut ident| {
            ident.set_span(TokenSpan::call_site());
            ident
        })
}

/// Build the substitution table for instantiating `def` as `name(args)`.
pub fn build(
    def: &TemplateDefinition,
    name: &str,
    args: &[String],
    candidates: &[Ident],
    diag: &Diagnostics,
) -> Result<NameMapping, TemplateError> {
    let mut mapping = NameMapping::default();

    // Parameters first, so their stubs are never mangled.
    for (param, arg) in def.params.iter().zip(args) {
        let replacement = parse_argument(arg).ok_or_else(|| {
            TemplateError::new(
                TemplateErrorKind::InvalidArgument { arg: arg.clone() },
                def.span,
            )
        })?;
        mapping.register(param.clone(), replacement);
    }

    let exported = is_exported(name);
    let mut found = false;
    // replacement text -> original name, for collision detection
    let mut produced: FxHashMap<String, String> = FxHashMap::default();

    for candidate in candidates {
        let key = candidate.to_string();
        if key == def.name {
            found = true;
        }
        if mapping.contains(&key) {
            continue;
        }

        let bare = candidate.unraw().to_string();
        let new_name = mangle(&bare, &def.name, name, exported);
        if !bare.contains(&def.name) {
            diag.debug(format_args!(
                "top level definition '{key}' doesn't contain template name '{}', using '{new_name}'",
                def.name
            ));
        }
        if let Some(first) = produced.get(&new_name) {
            return Err(TemplateError::new(
                TemplateErrorKind::RenameCollision {
                    first: first.clone(),
                    second: key,
                    replacement: new_name,
                },
                def.span,
            ));
        }
        let ident = make_ident(&new_name).ok_or_else(|| {
            TemplateError::new(
                TemplateErrorKind::InvalidArgument {
                    arg: new_name.clone(),
                },
                def.span,
            )
        })?;
        produced.insert(new_name, key.clone());
        mapping.register(key, Replacement::Ident(ident));
    }

    if !found {
        return Err(TemplateError::new(
            TemplateErrorKind::MissingDefinition {
                name: def.name.clone(),
            },
            def.span,
        ));
    }

    if diag.is_verbose() {
        for (from, to) in mapping.iter() {
            diag.debug(format_args!("mapping {from} -> {}", to.to_source()));
        }
    }
    Ok(mapping)
}
