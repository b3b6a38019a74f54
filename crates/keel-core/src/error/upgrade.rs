use super::Error;

/// Error raised while ordering upgrade handlers or resolving upgrade hints.
///
/// This occurs when:
/// - Upgrade handlers depend on each other in a loop
/// - Two handlers claim the same assembly
/// - A hint names a type or field that exists in neither model
#[derive(Debug)]
pub(super) struct UpgradeError {
    message: Box<str>,
}

impl std::error::Error for UpgradeError {}

impl core::fmt::Display for UpgradeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error {
    /// Creates an upgrade error.
    pub fn upgrade(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Upgrade(UpgradeError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an upgrade error.
    pub fn is_upgrade(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Upgrade(_))
    }
}
