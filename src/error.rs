use thiserror::Error;

/// Reasons a link configuration is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkConfigError {
    #[error("link has no name")]
    Unnamed,
    #[error("link name only contains blank spaces")]
    OnlyBlankSpaces,
    #[error("a link named {0:?} already exists")]
    NameAlreadyExists(String),
    #[error("head end node missing")]
    HeadEndNodeMissing,
    #[error("tail end node missing")]
    TailEndNodeMissing,
    #[error("head end node port missing")]
    HeadEndNodePortMissing,
    #[error("tail end node port missing")]
    TailEndNodePortMissing,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("the progress event generator only allows a single listener")]
    SingleListenerOnly,
    #[error("id generator exhausted")]
    IdGeneratorExhausted,
    #[error("invalid GoS level: {0}")]
    InvalidGosLevel(u8),
    #[error("invalid link configuration: {0}")]
    InvalidLinkConfig(#[from] LinkConfigError),
}
