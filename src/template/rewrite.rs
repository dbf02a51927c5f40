//! Whole-tree identifier substitution.
//!
//! Every identifier node is visited once and looked up in the original
//! table, so a replacement is never itself rewritten by a later entry.

use proc_macro2::{Group, Ident, Spacing, TokenStream, TokenTree};
use quote::{quote, ToTokens};
use syn::punctuated::Punctuated;
use syn::visit_mut::{self, VisitMut};
use syn::{parse_quote, ExprPath, Item, Lifetime, Macro, MetaList, Path, PathSegment, Token, Type, TypePath, Visibility};

use crate::errors::{TemplateError, TemplateErrorKind};
use crate::span::Span;
use crate::template::mapping::{NameMapping, Replacement};

struct Rewriter<'a> {
    mapping: &'a NameMapping,
    /// Type arguments found where only an identifier fits.
    misplaced: Vec<(String, proc_macro2::Span)>,
}

impl<'a> Rewriter<'a> {
    fn new(mapping: &'a NameMapping) -> Self {
        Self {
            mapping,
            misplaced: Vec::new(),
        }
    }

    fn type_for(&self, ident: &Ident) -> Option<&'a Type> {
        match self.mapping.get(&ident.to_string()) {
            Some(Replacement::Type(ty)) => Some(ty),
            _ => None,
        }
    }

    /// `A` on its own, as a type.
    fn bare_type(&self, path: &TypePath) -> Option<&'a Type> {
        if path.qself.is_some() || path.path.leading_colon.is_some() {
            return None;
        }
        match path.path.segments.iter().collect::<Vec<_>>().as_slice() {
            [only] if only.arguments.is_none() => self.type_for(&only.ident),
            _ => None,
        }
    }

    /// `A::rest` where `A` stands for a type: the `<T>::rest` form and the
    /// remaining segments.
    fn qualified_root(&self, path: &Path) -> Option<(&'a Type, Punctuated<PathSegment, Token![::]>)> {
        if path.leading_colon.is_some() || path.segments.len() < 2 {
            return None;
        }
        let first = path.segments.first()?;
        if !first.arguments.is_none() {
            return None;
        }
        let ty = self.type_for(&first.ident)?;
        let rest = path.segments.iter().skip(1).cloned().collect();
        Some((ty, rest))
    }

    fn rewrite_tokens(&mut self, tokens: TokenStream) -> TokenStream {
        let tokens: Vec<TokenTree> = tokens.into_iter().collect();
        let mut out = TokenStream::new();
        for (i, tt) in tokens.iter().enumerate() {
            let lifetime_name =
                i > 0 && matches!(&tokens[i - 1], TokenTree::Punct(p) if p.as_char() == '\'');
            match tt {
                TokenTree::Ident(ident) if !lifetime_name => {
                    match self.mapping.get(&ident.to_string()) {
                        Some(Replacement::Ident(new)) => {
                            let mut new = new.clone();
                            new.set_span(ident.span());
                            out.extend([TokenTree::Ident(new)]);
                        }
                        // `A::x` needs the qualified form, as in `qualified_root`.
                        Some(Replacement::Type(ty)) if starts_path_sep(&tokens[i + 1..]) => {
                            out.extend(quote!(<#ty>));
                        }
                        Some(Replacement::Type(ty)) => out.extend(ty.to_token_stream()),
                        None => out.extend([tt.clone()]),
                    }
                }
                TokenTree::Group(group) => {
                    let mut new = Group::new(group.delimiter(), self.rewrite_tokens(group.stream()));
                    new.set_span(group.span());
                    out.extend([TokenTree::Group(new)]);
                }
                other => out.extend([other.clone()]),
            }
        }
        out
    }
}

/// Whether `tokens` begins with `::`.
fn starts_path_sep(tokens: &[TokenTree]) -> bool {
    match tokens {
        [TokenTree::Punct(a), TokenTree::Punct(b), ..] => {
            a.as_char() == ':' && a.spacing() == Spacing::Joint && b.as_char() == ':'
        }
        _ => false,
    }
}

impl VisitMut for Rewriter<'_> {
    fn visit_ident_mut(&mut self, ident: &mut Ident) {
        match self.mapping.get(&ident.to_string()) {
            Some(Replacement::Ident(new)) => {
                let mut new = new.clone();
                new.set_span(ident.span());
                *ident = new;
            }
            Some(Replacement::Type(_)) => self.misplaced.push((ident.to_string(), ident.span())),
            None => {}
        }
    }

    fn visit_lifetime_mut(&mut self, _lifetime: &mut Lifetime) {}

    fn visit_type_mut(&mut self, ty: &mut Type) {
        if let Type::Path(path) = ty {
            if let Some(concrete) = self.bare_type(path) {
                *ty = concrete.clone();
                return;
            }
        }
        visit_mut::visit_type_mut(self, ty);
    }

    fn visit_type_path_mut(&mut self, path: &mut TypePath) {
        if path.qself.is_none() {
            if let Some((ty, rest)) = self.qualified_root(&path.path) {
                *path = parse_quote!(<#ty>::#rest);
                // Only the trailing segments are template code.
                for seg in path.path.segments.iter_mut() {
                    self.visit_path_segment_mut(seg);
                }
                return;
            }
        }
        visit_mut::visit_type_path_mut(self, path);
    }

    fn visit_expr_path_mut(&mut self, expr: &mut ExprPath) {
        if expr.qself.is_none() {
            if let Some((ty, rest)) = self.qualified_root(&expr.path) {
                let attrs = std::mem::take(&mut expr.attrs);
                *expr = parse_quote!(<#ty>::#rest);
                expr.attrs = attrs;
                for attr in expr.attrs.iter_mut() {
                    self.visit_attribute_mut(attr);
                }
                for seg in expr.path.segments.iter_mut() {
                    self.visit_path_segment_mut(seg);
                }
                return;
            }
        }
        visit_mut::visit_expr_path_mut(self, expr);
    }

    fn visit_macro_mut(&mut self, mac: &mut Macro) {
        visit_mut::visit_macro_mut(self, mac);
        let tokens = std::mem::take(&mut mac.tokens);
        mac.tokens = self.rewrite_tokens(tokens);
    }

    fn visit_meta_list_mut(&mut self, list: &mut MetaList) {
        visit_mut::visit_meta_list_mut(self, list);
        let tokens = std::mem::take(&mut list.tokens);
        list.tokens = self.rewrite_tokens(tokens);
    }
}

/// Apply `mapping` to every identifier in `items`.
///
/// Matching is by name alone, so a template `const MAX` also renames the
/// `MAX` in `usize::MAX`. `source` is the template text, used to locate
/// errors.
pub fn rewrite_items(
    mut items: Vec<Item>,
    mapping: &NameMapping,
    source: &str,
) -> Result<Vec<Item>, TemplateError> {
    let mut rewriter = Rewriter::new(mapping);
    for item in items.iter_mut() {
        rewriter.visit_item_mut(item);
    }

    if let Some(((param, first), rest)) = rewriter.misplaced.split_first().map(|(f, r)| (f.clone(), r)) {
        let arg = mapping
            .get(&param)
            .map(Replacement::to_source)
            .unwrap_or_default();
        let others = rest
            .iter()
            .map(|(_, span)| Span::from_token_span(source, *span))
            .collect();
        return Err(TemplateError::new(
            TemplateErrorKind::TypeInIdentPosition { param, arg, others },
            Span::from_token_span(source, first),
        ));
    }
    Ok(items)
}

/// Drop `pub` from every top-level item.
pub fn privatize(items: &mut [Item]) {
    for item in items {
        if let Some(vis) = item_visibility(item) {
            *vis = Visibility::Inherited;
        }
    }
}

fn item_visibility(item: &mut Item) -> Option<&mut Visibility> {
    match item {
        Item::Const(i) => Some(&mut i.vis),
        Item::Enum(i) => Some(&mut i.vis),
        Item::ExternCrate(i) => Some(&mut i.vis),
        Item::Fn(i) => Some(&mut i.vis),
        Item::Static(i) => Some(&mut i.vis),
        Item::Struct(i) => Some(&mut i.vis),
        Item::Trait(i) => Some(&mut i.vis),
        Item::Type(i) => Some(&mut i.vis),
        Item::Union(i) => Some(&mut i.vis),
        Item::Use(i) => Some(&mut i.vis),
        _ => None,
    }
}
