use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Unable to read profile file `{0}`:\n\t{1}")]
    ConfigReadError(String, std::io::Error),
    #[error("Unable to parse profile file `{0}`:\n\t{1}")]
    ConfigParseError(String, serde_yaml::Error),
    #[error("Unsupported test id `{0}`: not found in the profile file")]
    UnsupportedTestId(String),
}
