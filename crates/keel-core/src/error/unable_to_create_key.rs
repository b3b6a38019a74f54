use super::Error;

/// Error raised when a new key is requested for a type whose hierarchy has no
/// usable key generator.
///
/// The builder accepts such hierarchies (their generator is resolved to
/// `None`), so this error only surfaces at instance creation.
#[derive(Debug)]
pub(super) struct UnableToCreateKeyError {
    type_name: Box<str>,
    reason: Box<str>,
}

impl std::error::Error for UnableToCreateKeyError {}

impl core::fmt::Display for UnableToCreateKeyError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "Unable to create key for '{}': {}",
            self.type_name, self.reason
        )
    }
}

impl Error {
    /// Creates an unable-to-create-key error for the named type.
    pub fn unable_to_create_key(type_name: impl Into<String>, reason: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnableToCreateKey(UnableToCreateKeyError {
            type_name: type_name.into().into(),
            reason: reason.into().into(),
        }))
    }

    /// Returns `true` if this error is an unable-to-create-key error.
    pub fn is_unable_to_create_key(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::UnableToCreateKey(_))
    }
}
