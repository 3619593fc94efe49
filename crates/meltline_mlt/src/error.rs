use thiserror::Error;

#[derive(Debug, Error)]
pub enum MltError {
    #[error("input must be a Timeline, Track, Stack or Clip, not {0}")]
    InvalidInput(&'static str),

    #[error("no producer registered under id `{0}`")]
    UnresolvableProducer(String),

    #[error("producer `{0}` has no resource property")]
    MissingResource(String),

    #[error("invalid profile override: {0}")]
    InvalidConfiguration(String),
}

pub type Result<T> = std::result::Result<T, MltError>;
