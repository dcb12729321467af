//! Errors raised by dict construction and keyed operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DictError {
    /// The class passed to a constructor is neither `dict` nor a
    /// registered subclass of it.
    #[error("unable to create dict with non dict subclass `{class}`")]
    NotDictSubclass { class: String },
    /// The native seed is not an associative structure.
    #[error("invalid type of native dict initializer: {found}")]
    InvalidSeed { found: &'static str },
    /// A keyed operation received something other than a string.
    #[error("invalid native dict key type: {found}")]
    InvalidKey { found: &'static str },
}

pub type Result<T, E = DictError> = std::result::Result<T, E>;
