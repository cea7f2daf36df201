use std::fmt;

use sloader::errors::ClassError;
use thiserror::Error;

/// The reasons an interpreter session can fail.
#[derive(Debug, Error)]
pub enum RuntimeErrorKind {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed class file: {0}")]
    MalformedClassFile(#[from] ClassError),
    #[error("class not found: {0}")]
    ClassNotFound(String),
    #[error("symbol not resolved: {0}")]
    SymbolNotResolved(String),
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },
    #[error("operand stack underflow")]
    StackUnderflow,
    #[error("{what} index {index} out of bounds, length is {len}")]
    OutOfBounds {
        what: &'static str,
        index: usize,
        len: usize,
    },
    #[error("unknown instruction {0:#04x}")]
    UnknownInstruction(u8),
    #[error("native method not implemented: {class}.{name}")]
    UnsupportedNative { class: String, name: String },
    #[error("not supported: {0}")]
    Unsupported(String),
    /// Recursion guard signal; swallowed by class initialization, never
    /// surfaced as a session result.
    #[error("class {0} is already being initialized")]
    InitializationInProgress(String),
}

/// A fatal interpreter error plus the frames it unwound through.
///
/// Each method invocation appends its own `<class>.<method>()` descriptor on
/// the way out, innermost first, so the session result carries a full
/// backtrace without any in-VM exception machinery.
#[derive(Debug)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub frames: Vec<String>,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind) -> RuntimeError {
        RuntimeError {
            kind,
            frames: Vec::new(),
        }
    }

    /// Appends the frame descriptor of the method being unwound.
    pub fn with_frame(mut self, class_name: &str, method_name: &str) -> RuntimeError {
        self.frames
            .push(format!("{}.{}()", class_name.replace('/', "."), method_name));
        self
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for frame in &self.frames {
            write!(f, "\n\t{frame}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<RuntimeErrorKind> for RuntimeError {
    fn from(kind: RuntimeErrorKind) -> RuntimeError {
        RuntimeError::new(kind)
    }
}

impl From<ClassError> for RuntimeError {
    fn from(error: ClassError) -> RuntimeError {
        RuntimeError::new(RuntimeErrorKind::MalformedClassFile(error))
    }
}

impl From<std::io::Error> for RuntimeError {
    fn from(error: std::io::Error) -> RuntimeError {
        RuntimeError::new(RuntimeErrorKind::Io(error))
    }
}
