use thiserror::Error;

/// Everything that can go wrong while decoding a class file or one of the
/// descriptor strings referenced by it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassError {
    #[error("unexpected end of class file at offset {0}")]
    UnexpectedEof(u64),
    #[error("magic value in class file was incorrect: {0:#010X}")]
    MalformedMagic(u32),
    #[error("unknown constant pool tag {tag} at offset {offset}")]
    UnknownTag { tag: u8, offset: u64 },
    #[error("invalid descriptor: {0}")]
    BadDescriptor(String),
    #[error("no constant pool entry at index {0}")]
    NotFound(u16),
    #[error("constant pool entry at index {index} is a {found}, expected {expected}")]
    WrongKind {
        index: u16,
        expected: &'static str,
        found: &'static str,
    },
}
