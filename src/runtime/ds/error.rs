use thiserror::Error;

/// Broad classification of [`ObjError`], used by callers that only care
/// about which family of failure they hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad argument shape or type.
    Validation,
    /// Prototype/registry shape violations.
    Structural,
    /// Instantiation or resolution protocol violations.
    Protocol,
    /// Property access failures and errors raised by user functions.
    Access,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObjError {
    #[error("{operation}: expected {expected}, found {found}")]
    Validation {
        operation: &'static str,
        expected: &'static str,
        found: String,
    },
    #[error("private member '{key}' must start with '{prefix}'")]
    NotPrefixed { key: String, prefix: String },
    #[error("generator for '{0}' is not a function")]
    InvalidGenerator(String),
    #[error("host path '{0}' does not resolve to an object")]
    UnresolvedHost(String),
    #[error("mocks can only be added while testing mode is on")]
    MockOutsideTesting,

    #[error("trait does not share a common ancestor with its host")]
    StructuralMismatch,
    #[error("class is already memoized")]
    AlreadyMemoized,
    #[error("class does not own an instance registry")]
    NotOwner,
    #[error("cannot redefine property '{0}'")]
    NotConfigurable(String),
    #[error("cannot add property '{0}', object is not extensible")]
    NotExtensible(String),

    #[error("class has no init method")]
    MissingInit,
    #[error("init returned neither undefined nor an instance of the class")]
    InvalidInitResult,
    #[error("deferred property '{0}' was read while it was being resolved")]
    CyclicResolution(String),

    #[error("cannot assign to read-only property '{0}'")]
    ReadOnly(String),
    #[error("'{0}' is not a function")]
    NotCallable(String),
    #[error("{0}")]
    Thrown(String),
}

impl ObjError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ObjError::Validation { .. }
            | ObjError::NotPrefixed { .. }
            | ObjError::InvalidGenerator(_)
            | ObjError::UnresolvedHost(_)
            | ObjError::MockOutsideTesting => ErrorKind::Validation,
            ObjError::StructuralMismatch
            | ObjError::AlreadyMemoized
            | ObjError::NotOwner
            | ObjError::NotConfigurable(_)
            | ObjError::NotExtensible(_) => ErrorKind::Structural,
            ObjError::MissingInit
            | ObjError::InvalidInitResult
            | ObjError::CyclicResolution(_) => ErrorKind::Protocol,
            ObjError::ReadOnly(_) | ObjError::NotCallable(_) | ObjError::Thrown(_) => {
                ErrorKind::Access
            }
        }
    }

    /// Convenience for native functions that want to raise.
    pub fn thrown(message: impl Into<String>) -> Self {
        ObjError::Thrown(message.into())
    }
}
