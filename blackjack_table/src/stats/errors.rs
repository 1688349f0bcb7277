use thiserror::Error;

/// Stats errors
#[derive(Debug, Error)]
pub enum StatsError {
    /// Backing store failure
    #[error("Stats store unavailable: {0}")]
    Unavailable(String),
}

impl StatsError {
    pub fn client_message(&self) -> String {
        match self {
            StatsError::Unavailable(_) => "Internal server error".to_string(),
        }
    }
}

pub type StatsResult<T> = Result<T, StatsError>;
