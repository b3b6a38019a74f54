use super::Error;

/// Error raised when the declared types cannot be turned into a domain model.
///
/// This occurs when:
/// - Types form a dependency loop (inheritance, structure containment, key references)
/// - A hierarchy has no key fields or its key fields are of an illegal type
/// - A custom key generator cannot serve the hierarchy's key
/// - Field, column, or index names collide after the naming convention is applied
///
/// The message is rendered without a prefix. Callers match on its leading
/// words, so every message constructed by the builder starts with a stable
/// phrase.
#[derive(Debug)]
pub(super) struct DomainBuilderError {
    message: Box<str>,
}

impl std::error::Error for DomainBuilderError {}

impl core::fmt::Display for DomainBuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error {
    /// Creates a domain builder error.
    ///
    /// This is the only kind of error raised while building a domain model.
    pub fn domain_builder(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::DomainBuilder(DomainBuilderError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is a domain builder error.
    pub fn is_domain_builder(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::DomainBuilder(_))
    }
}
