use thiserror::Error;

#[derive(Error, Debug)]
pub enum DockerError {
    #[error("Container already created: {0}")]
    AlreadyCreated(String),

    #[error("Container has not been created yet")]
    NotCreated,

    #[error("Passing input through container's stdin is not supported")]
    InputNotSupported,

    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("Network not found: {0}")]
    NetworkNotFound(String),

    #[error("Docker connection failed: {0}")]
    ConnectionError(String),

    #[error("Invalid memory limit: {0}")]
    InvalidMemoryLimit(String),

    #[error("Docker API error: {0}")]
    ApiError(#[from] bollard::errors::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DockerError>;

const REMOVAL_IN_PROGRESS: &str = "already in progress";

impl DockerError {
    /// Misuse of the container lifecycle, never worth retrying.
    pub fn is_state_error(&self) -> bool {
        matches!(self, DockerError::AlreadyCreated(_) | DockerError::NotCreated)
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, DockerError::InputNotSupported | DockerError::InvalidMemoryLimit(_))
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            DockerError::ContainerNotFound(_) | DockerError::NetworkNotFound(_) => true,
            DockerError::ApiError(bollard::errors::Error::DockerResponseServerError {
                status_code,
                ..
            }) => *status_code == 404,
            _ => false,
        }
    }

    /// The daemon answers a second removal request with a conflict whose
    /// message is the only thing separating it from other conflicts.
    pub fn is_removal_in_progress(&self) -> bool {
        match self {
            DockerError::ApiError(bollard::errors::Error::DockerResponseServerError {
                message,
                ..
            }) => message.contains(REMOVAL_IN_PROGRESS),
            _ => false,
        }
    }
}
