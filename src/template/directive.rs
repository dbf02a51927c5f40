//! Finding the `template type Name(Params)` comment.

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashSet;

use crate::errors::{TemplateError, TemplateErrorKind};
use crate::lexer::token::Comment;
use crate::request::parse_args;
use crate::span::{Span, Spanned};

// "template type Set(A)", matched against the text between the comment markers
static TEMPLATE_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+template\s+type\s+(\w+)\((.*?)\)\s*$").expect("directive pattern is valid")
});

/// The template a source file declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDefinition {
    /// Name the template uses for itself, e.g. `Set`.
    pub name: String,
    /// Formal parameters in declaration order, e.g. `["A"]`.
    pub params: Vec<String>,
    /// The directive comment.
    pub span: Span,
}

impl TemplateDefinition {
    pub fn is_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p == name)
    }
}

/// Match one comment against the directive grammar.
///
/// Doc comments never match: their marker is followed by `/`, `!` or `*`,
/// not whitespace.
pub fn match_directive(comment: &Comment) -> Option<(String, Vec<String>)> {
    let caps = TEMPLATE_TYPE.captures(comment.body())?;
    Some((caps[1].to_string(), parse_args(&caps[2])))
}

/// Find the single template directive among `comments`.
pub fn scan(comments: &[Spanned<Comment>]) -> Result<TemplateDefinition, TemplateError> {
    let mut found: Option<TemplateDefinition> = None;
    for comment in comments {
        let Some((name, params)) = match_directive(&comment.node) else {
            continue;
        };
        if let Some(first) = &found {
            return Err(TemplateError::new(
                TemplateErrorKind::MultipleDefinitions { first: first.span },
                comment.span,
            ));
        }
        found = Some(TemplateDefinition {
            name,
            params,
            span: comment.span,
        });
    }

    let def = found.ok_or_else(|| TemplateError::new(TemplateErrorKind::NoDefinition, Span::dummy()))?;
    validate(&def)?;
    Ok(def)
}

fn validate(def: &TemplateDefinition) -> Result<(), TemplateError> {
    let mut seen = FxHashSet::default();
    for param in &def.params {
        let kind = if syn::parse_str::<syn::Ident>(param).is_err() {
            TemplateErrorKind::InvalidParameter {
                param: param.clone(),
            }
        } else if !seen.insert(param.as_str()) {
            TemplateErrorKind::DuplicateParameter {
                param: param.clone(),
            }
        } else if *param == def.name {
            TemplateErrorKind::ParameterNamesTemplate {
                param: param.clone(),
            }
        } else {
            continue;
        };
        return Err(TemplateError::new(kind, def.span));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::scan_comments;

    fn scan_source(source: &str) -> Result<TemplateDefinition, TemplateError> {
        scan(&scan_comments(source).unwrap())
    }

    #[test]
    fn line_comment_directive() {
        let def = scan_source("// template type Set(A)\nstruct Set;\n").unwrap();
        assert_eq!(def.name, "Set");
        assert_eq!(def.params, vec!["A"]);
        assert_eq!(def.span, Span::new(0, 23));
    }

    #[test]
    fn block_comment_directive() {
        let def = scan_source("/* template type Map(K, V) */\n").unwrap();
        assert_eq!(def.name, "Map");
        assert_eq!(def.params, vec!["K", "V"]);
    }

    #[test]
    fn multi_line_block_comment_directive() {
        let def = scan_source("/*\n   template type Map( K ,V )\n*/\n").unwrap();
        assert_eq!(def.params, vec!["K", "V"]);
    }

    #[test]
    fn whitespace_is_tolerated() {
        let def = scan_source("//   template\ttype  Set(A)   \n").unwrap();
        assert_eq!(def.name, "Set");
    }

    #[test]
    fn empty_parameter_list() {
        let def = scan_source("// template type Unit( )\n").unwrap();
        assert!(def.params.is_empty());
    }

    #[test]
    fn doc_comments_do_not_count() {
        let err = scan_source("/// template type Set(A)\n//! template type Set(A)\n").unwrap_err();
        assert_eq!(err.kind, TemplateErrorKind::NoDefinition);
    }

    #[test]
    fn marker_must_be_followed_by_whitespace() {
        let err = scan_source("//template type Set(A)\n").unwrap_err();
        assert_eq!(err.kind, TemplateErrorKind::NoDefinition);
    }

    #[test]
    fn trailing_text_does_not_match() {
        let err = scan_source("// template type Set(A) for ints\n").unwrap_err();
        assert_eq!(err.kind, TemplateErrorKind::NoDefinition);
    }

    #[test]
    fn multiple_definitions_are_rejected() {
        let src = "// template type Set(A)\n// template type Bag(B)\n";
        let err = scan_source(src).unwrap_err();
        assert_eq!(
            err.kind,
            TemplateErrorKind::MultipleDefinitions {
                first: Span::new(0, 23)
            }
        );
        assert_eq!(err.span, Span::new(24, 47));
    }

    #[test]
    fn invalid_parameters() {
        let err = scan_source("// template type Set(A, )\n").unwrap_err();
        assert!(matches!(err.kind, TemplateErrorKind::InvalidParameter { ref param } if param.is_empty()));

        let err = scan_source("// template type Set(Vec<u8>)\n").unwrap_err();
        assert!(matches!(err.kind, TemplateErrorKind::InvalidParameter { .. }));

        let err = scan_source("// template type Set(A, A)\n").unwrap_err();
        assert!(matches!(err.kind, TemplateErrorKind::DuplicateParameter { .. }));

        let err = scan_source("// template type Set(Set)\n").unwrap_err();
        assert!(matches!(err.kind, TemplateErrorKind::ParameterNamesTemplate { .. }));
    }
}
