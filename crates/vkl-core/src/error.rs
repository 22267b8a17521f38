use crate::handle::HandleKind;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("unknown handle: {0:#x}")]
    UnknownHandle(u64),

    #[error("handle already registered: {kind} {handle:#x}")]
    AlreadyRegistered { handle: u64, kind: HandleKind },

    #[error("cannot register a null {0} handle")]
    NullHandle(HandleKind),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
