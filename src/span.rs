use proc_macro2::LineColumn;

/// Byte range into a template source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    /// Errors about the file as a whole carry no location.
    pub fn is_dummy(&self) -> bool {
        *self == Span::dummy()
    }

    /// Map a `proc_macro2` span of a tree parsed from `source` back to bytes.
    pub fn from_token_span(source: &str, span: proc_macro2::Span) -> Span {
        let start = offset_of(source, span.start());
        let end = offset_of(source, span.end()).max(start);
        Span::new(start, end)
    }
}

/// A value paired with the place it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Byte offset of a 1-based line, 0-based char column position.
///
/// Positions past the end of a line or of the file clamp to the nearest
/// valid offset.
pub fn offset_of(source: &str, at: LineColumn) -> usize {
    if at.line == 0 {
        return 0;
    }
    let mut line_start = 0;
    for _ in 1..at.line {
        match source[line_start..].find('\n') {
            Some(nl) => line_start += nl + 1,
            None => return source.len(),
        }
    }
    let line_end = source[line_start..]
        .find('\n')
        .map_or(source.len(), |nl| line_start + nl);
    source[line_start..line_end]
        .char_indices()
        .nth(at.column)
        .map_or(line_end, |(i, _)| line_start + i)
}
