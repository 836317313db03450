use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// The box stream ran out while the text still had characters to place.
    #[error(
        "box stream exhausted after {consumed} glyph(s): no box left for '{character}' at line {line}, column {column}"
    )]
    BoxStreamExhausted {
        line: usize,
        column: usize,
        character: char,
        consumed: usize,
    },
}
