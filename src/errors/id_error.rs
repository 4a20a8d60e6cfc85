use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdError {
    #[error("Unable to read id list `{0}`:\n\t{1}")]
    ReadError(String, std::io::Error),
    #[error("Unable to write id list `{0}`:\n\t{1}")]
    WriteError(String, std::io::Error),
    #[error("Id size must lie in [1, {1}], got {0}")]
    InvalidSize(u32, u32),
    #[error("Id list `{0}` not found")]
    NotFound(String),
    #[error("Unable to deserialize id list `{0}`:\n\t{1}")]
    DeserializationError(String, serde_json::Error),
    #[error("Unable to serialize id list `{0}`:\n\t{1}")]
    SerializationError(String, serde_json::Error),
}
