use thiserror::Error;

/// Errors that can occur while turning Groovy sources into Java stubs.
#[derive(Error, Debug)]
pub enum StubError {
    #[error("file error: {message} (path: {path})")]
    File { message: String, path: String },

    #[error("parse error: {message} (path: {path}, line: {line}, column: {column})")]
    Parse {
        message: String,
        path: String,
        line: usize,
        column: usize,
    },

    #[error("model error: {message} (path: {path}, line: {line:?})")]
    ModelBuild {
        message: String,
        path: String,
        line: Option<usize>,
    },

    #[error("render error: {message} (class: {class})")]
    Render { message: String, class: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StubError {
    /// Returns `true` for errors that must abort a whole batch instead of
    /// only the source file that raised them.
    ///
    /// Only renderer invariant violations qualify: a stub that cannot be
    /// rendered correctly from a well-formed model is a programming error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StubError::Render { .. })
    }
}

/// Convenience alias for results using `StubError`.
pub type Result<T> = std::result::Result<T, StubError>;
