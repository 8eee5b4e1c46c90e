use thiserror::Error;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("failed to initialize tokio runtime")]
    Runtime(#[from] std::io::Error),
}
