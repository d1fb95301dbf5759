/// A template that cannot be compiled. Every variant carries the 1-based line
/// of the offending tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("line {line}, column {column}: tag is never closed")]
    UnterminatedTag { line: usize, column: usize },

    #[error("line {line}: block `{name}` is never closed")]
    UnclosedBlock { name: String, line: usize },

    #[error("line {line}: `/{name}` closes a block that was never opened")]
    UnexpectedClose { name: String, line: usize },

    #[error("line {line}: `/{found}` does not match open block `{expected}`")]
    MismatchedClose {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("line {line}: `else` outside of a block")]
    UnexpectedElse { line: usize },

    #[error("line {line}: block `{name}` has more than one `else`")]
    DuplicateElse { name: String, line: usize },

    #[error("line {line}: unknown helper `{name}`")]
    UnknownHelper { name: String, line: usize },

    #[error("line {line}: `{helper}` expects {expected} argument(s), got {found}")]
    Arity {
        helper: String,
        expected: &'static str,
        found: usize,
        line: usize,
    },

    #[error("line {line}: `{helper}` can only be used as a block (`#{helper}`)")]
    BlockOnly { helper: String, line: usize },

    #[error("line {line}: `{helper}` does not take named argument `{key}`")]
    UnexpectedNamedArgument {
        helper: String,
        key: String,
        line: usize,
    },

    #[error("line {line}: {message}")]
    Syntax { message: String, line: usize },
}
