//! Record identifiers: the validation contract and the default generator.

pub mod generator;

pub use generator::UidGenerator;

use crate::types::StoreResult;

/// Validates and normalizes candidate identifiers.
///
/// Implementations must reject anything containing path separators or
/// traversal components; the persistent tier uses the normalized id verbatim
/// as a filename.
pub trait UidValidator: Send + Sync {
    /// Return the normalized identifier, or `StoreError::InvalidId`.
    fn validate(&self, candidate: &str) -> StoreResult<String>;
}

/// Validate `candidate` and require that normalization left it unchanged.
///
/// Storage keys and filenames are taken verbatim, so an id that only becomes
/// valid after normalization is still rejected.
pub fn validate_exact(validator: &dyn UidValidator, candidate: &str) -> StoreResult<()> {
    match validator.validate(candidate) {
        Ok(normalized) if normalized == candidate => Ok(()),
        _ => Err(crate::types::StoreError::InvalidId(candidate.to_string())),
    }
}
