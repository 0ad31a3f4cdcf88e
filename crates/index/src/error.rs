use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("indexing task failed: {0}")]
    TaskFailed(String),

    #[error("{0}")]
    Other(String),
}
