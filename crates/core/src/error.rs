use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Can't find required attribute '{0}'")]
    MissingField(&'static str),

    #[error("Malformed input: {0}")]
    Parse(String),

    #[error("Invalid value for '{field}': {message}")]
    InvalidArgument { field: String, message: String },

    #[error("Event with ID {0} already exists")]
    AlreadySaved(DbId),
}

impl CoreError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }
}
