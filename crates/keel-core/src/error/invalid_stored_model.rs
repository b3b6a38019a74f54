use super::Error;

/// Error when a stored domain model cannot be loaded.
///
/// This occurs when the stored document has an unsupported version or when
/// reference resolution finds a name that does not match any stored type or
/// field.
#[derive(Debug)]
pub(super) struct InvalidStoredModelError {
    message: Box<str>,
}

impl std::error::Error for InvalidStoredModelError {}

impl core::fmt::Display for InvalidStoredModelError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid stored model: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid stored model error.
    pub fn invalid_stored_model(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidStoredModel(InvalidStoredModelError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid stored model error.
    pub fn is_invalid_stored_model(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidStoredModel(_))
    }
}
