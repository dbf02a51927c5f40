use logos::Logos;

/// Raw tokens of a Rust source file, as far as comment scanning needs them.
///
/// Only comments are kept by the scanner. String, char and lifetime tokens
/// exist so that `//` or `/*` inside a literal is never taken for a comment.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum RawToken {
    // ── Comments ─────────────────────────────────────────────
    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    // ── Literals ─────────────────────────────────────────────
    #[regex(r#"[bc]?"([^"\\]|\\(.|\n))*""#)]
    Str,

    #[regex(r##"[bc]?r#*""##, raw_string)]
    RawStr,

    #[regex(r"b?'([^'\\\n]|\\[^\n]|\\u\{[0-9a-fA-F_]+\})'")]
    Char,

    #[regex(r"'[A-Za-z_][A-Za-z0-9_]*")]
    Lifetime,

    #[regex(r"(r#)?[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"[0-9][0-9A-Za-z_]*")]
    Number,

    // ── Everything else, one char at a time ──────────────────
    #[regex(r"[^ \t\r\n\f]", priority = 0)]
    Punct,
}

/// Consume a possibly nested block comment after its opening `/*`.
fn block_comment(lex: &mut logos::Lexer<RawToken>) -> bool {
    let rest = lex.remainder().as_bytes();
    let mut depth = 1usize;
    let mut i = 0;
    while i < rest.len() {
        if rest[i..].starts_with(b"/*") {
            depth += 1;
            i += 2;
        } else if rest[i..].starts_with(b"*/") {
            depth -= 1;
            i += 2;
            if depth == 0 {
                lex.bump(i);
                return true;
            }
        } else {
            i += 1;
        }
    }
    lex.bump(rest.len());
    false
}

/// Consume a raw string body after its opening `r#"`.
fn raw_string(lex: &mut logos::Lexer<RawToken>) -> bool {
    let hashes = lex.slice().bytes().filter(|&b| b == b'#').count();
    let mut terminator = String::with_capacity(hashes + 1);
    terminator.push('"');
    terminator.extend(std::iter::repeat('#').take(hashes));

    match lex.remainder().find(&terminator) {
        Some(end) => {
            lex.bump(end + terminator.len());
            true
        }
        None => {
            let len = lex.remainder().len();
            lex.bump(len);
            false
        }
    }
}

/// Which syntax a comment was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    Line,
    Block,
}

/// A comment with its markers still attached, e.g. `// text` or `/* text */`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
    pub text: String,
}

impl Comment {
    /// Text between the comment markers.
    pub fn body(&self) -> &str {
        match self.kind {
            CommentKind::Line => self.text.strip_prefix("//").unwrap_or(&self.text),
            CommentKind::Block => {
                let inner = self.text.strip_prefix("/*").unwrap_or(&self.text);
                inner.strip_suffix("*/").unwrap_or(inner)
            }
        }
    }
}
