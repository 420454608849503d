#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrativeError {
    Parse(String),
    NoChapters(String),
    UnknownChapter(String),
    /// A chapter-level operation with no narrative open.
    NotActive,
    Config(String),
}

impl std::fmt::Display for NarrativeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NarrativeError::Parse(msg) => write!(f, "narrative parse error: {msg}"),
            NarrativeError::NoChapters(id) => write!(f, "narrative {id} has no chapters"),
            NarrativeError::UnknownChapter(id) => write!(f, "unknown chapter: {id}"),
            NarrativeError::NotActive => write!(f, "no narrative is active"),
            NarrativeError::Config(msg) => write!(f, "invalid session config: {msg}"),
        }
    }
}

impl std::error::Error for NarrativeError {}
