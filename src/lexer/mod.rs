pub mod token;

use crate::errors::{TemplateError, TemplateErrorKind};
use crate::span::{Span, Spanned};
use logos::Logos;
use token::{Comment, CommentKind, RawToken};

/// Collect every comment of a Rust source file, in source order.
///
/// `syn` drops ordinary comments while parsing, so they are recovered from
/// the raw text. Doc comments are returned too; telling them apart is left
/// to the caller.
pub fn scan_comments(source: &str) -> Result<Vec<Spanned<Comment>>, TemplateError> {
    let mut comments = Vec::new();
    let mut lex = RawToken::lexer(source);
    while let Some(result) = lex.next() {
        let span = Span::new(lex.span().start, lex.span().end);
        match result {
            Ok(RawToken::LineComment) => comments.push(Spanned::new(
                Comment {
                    kind: CommentKind::Line,
                    text: lex.slice().trim_end_matches('\r').to_string(),
                },
                span,
            )),
            Ok(RawToken::BlockComment) => comments.push(Spanned::new(
                Comment {
                    kind: CommentKind::Block,
                    text: lex.slice().to_string(),
                },
                span,
            )),
            Ok(_) => {}
            Err(()) if lex.slice().starts_with("/*") => {
                return Err(TemplateError::new(
                    TemplateErrorKind::UnterminatedComment,
                    span,
                ));
            }
            // Anything else malformed has already been rejected by the parser.
            Err(()) => {}
        }
    }
    Ok(comments)
}
