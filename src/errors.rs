//! Errors specific to reading, writing or modifying a PE image.
//!
//! Every error can be reduced to an [`ErrorKind`], the fixed set of outcomes reported to callers.

use alloc::{collections::TryReserveError, string::String};
use core::fmt;

#[cfg(feature = "std")]
use std::io::Error as IOError;

/// Outcome of a failed operation.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ErrorKind {
    /// Memory for the image data could not be allocated.
    BadAlloc,
    /// The image could not be read.
    Read,
    /// The image could not be written.
    Write,
    /// The image violates the portable executable layout.
    CorruptFile,
    /// The data is not a portable executable image.
    InvalidSignature,
    /// The image is valid but uses a variant that is not implemented.
    Unsupported,
}
impl ErrorKind {
    /// Returns a human readable description of the error kind.
    pub const fn message(self) -> &'static str {
        match self {
            ErrorKind::BadAlloc => "memory allocation failed",
            ErrorKind::Read => "failed to read file",
            ErrorKind::Write => "failed to write file",
            ErrorKind::CorruptFile => "file is corrupt",
            ErrorKind::InvalidSignature => "file is not a portable executable",
            ErrorKind::Unsupported => "file format is not supported",
        }
    }
}
impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.message()) }
}

/// Returns the message describing an error kind.
pub const fn error_message(kind: ErrorKind) -> &'static str { kind.message() }

/// Error that can occur when reading and parsing bytes.
#[derive(Debug)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[cfg_attr(feature = "std", error("{0}"))]
pub struct ReadError(pub String);

/// Errors that can occur when decoding, encoding or modifying resource data.
#[derive(Debug)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum ResourceError {
    #[cfg_attr(feature = "std", error("invalid bytes: {0}"))]
    InvalidBytes(ReadError),
    #[cfg_attr(feature = "std", error("invalid table: {0}"))]
    InvalidTable(String),
    #[cfg_attr(feature = "std", error("invalid string block: {0}"))]
    InvalidStringBlock(String),
    #[cfg_attr(feature = "std", error("reserved field is not zero: {0:#x}"))]
    ReservedNotZero(u32),
    #[cfg_attr(feature = "std", error("resource table at {0:#x} visited twice"))]
    CyclicTable(u32),
    #[cfg_attr(feature = "std", error("resource tree nested deeper than {0} levels"))]
    TooDeep(usize),
    #[cfg_attr(feature = "std", error("rva {0:#x} is not contained in any section"))]
    UnmappedAddress(u32),
    #[cfg_attr(feature = "std", error("string of {0} characters exceeds the length limit"))]
    StringTooLong(usize),
    #[cfg_attr(feature = "std", error("resource directory of {0} bytes exceeds the address space"))]
    TooLarge(usize),
}
impl ResourceError {
    /// Returns the outcome reported for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResourceError::StringTooLong(_) | ResourceError::TooLarge(_) => ErrorKind::Unsupported,
            _ => ErrorKind::CorruptFile,
        }
    }
}
impl From<ReadError> for ResourceError {
    fn from(error: ReadError) -> Self { ResourceError::InvalidBytes(error) }
}

/// Errors that can occur when reading a PE image.
#[derive(Debug)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum ImageReadError {
    #[cfg_attr(feature = "std", error("invalid bytes: {0}"))]
    InvalidBytes(ReadError),
    #[cfg_attr(feature = "std", error("invalid signature: {0}"))]
    InvalidSignature(String),
    #[cfg_attr(feature = "std", error("invalid header: {0}"))]
    InvalidHeader(String),
    #[cfg_attr(feature = "std", error("invalid section: {0}"))]
    InvalidSection(String),
    #[cfg_attr(feature = "std", error("unsupported image: {0}"))]
    Unsupported(String),
    #[cfg_attr(feature = "std", error("invalid resource directory: {0}"))]
    InvalidResource(ResourceError),
    #[cfg_attr(feature = "std", error("allocation failed: {0}"))]
    Allocation(TryReserveError),
    #[cfg(feature = "std")]
    #[error("io error: {0}")]
    IOError(IOError),
}
impl ImageReadError {
    /// Returns the outcome reported for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImageReadError::InvalidBytes(_)
            | ImageReadError::InvalidHeader(_)
            | ImageReadError::InvalidSection(_) => ErrorKind::CorruptFile,
            ImageReadError::InvalidSignature(_) => ErrorKind::InvalidSignature,
            ImageReadError::Unsupported(_) => ErrorKind::Unsupported,
            ImageReadError::InvalidResource(error) => error.kind(),
            ImageReadError::Allocation(_) => ErrorKind::BadAlloc,
            #[cfg(feature = "std")]
            ImageReadError::IOError(_) => ErrorKind::Read,
        }
    }
}
impl From<ReadError> for ImageReadError {
    fn from(error: ReadError) -> Self { ImageReadError::InvalidBytes(error) }
}
impl From<ResourceError> for ImageReadError {
    fn from(error: ResourceError) -> Self { ImageReadError::InvalidResource(error) }
}
impl From<TryReserveError> for ImageReadError {
    fn from(error: TryReserveError) -> Self { ImageReadError::Allocation(error) }
}
#[cfg(feature = "std")]
impl From<IOError> for ImageReadError {
    fn from(error: IOError) -> Self { ImageReadError::IOError(error) }
}

/// Errors that can occur when writing a PE image.
#[derive(Debug)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum ImageWriteError {
    #[cfg_attr(feature = "std", error("section {0} overlaps the following section"))]
    SectionOverlap(usize),
    #[cfg_attr(feature = "std", error("resource section shared with data directory {0}"))]
    SharedSection(usize),
    #[cfg_attr(feature = "std", error("image exceeds the address space"))]
    TooLarge,
    #[cfg_attr(feature = "std", error("not enough space in the header for a new section"))]
    NotEnoughSpaceInHeader,
    #[cfg_attr(feature = "std", error("symbol table at {0:#x} is located in section data"))]
    SymbolTableInSections(u32),
    #[cfg_attr(feature = "std", error("invalid resource directory: {0}"))]
    InvalidResource(ResourceError),
    #[cfg(feature = "std")]
    #[error("io error: {0}")]
    IOError(IOError),
}
impl ImageWriteError {
    /// Returns the outcome reported for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImageWriteError::SectionOverlap(_)
            | ImageWriteError::SharedSection(_)
            | ImageWriteError::TooLarge
            | ImageWriteError::NotEnoughSpaceInHeader
            | ImageWriteError::SymbolTableInSections(_) => ErrorKind::Unsupported,
            ImageWriteError::InvalidResource(error) => error.kind(),
            #[cfg(feature = "std")]
            ImageWriteError::IOError(_) => ErrorKind::Write,
        }
    }
}
impl From<ResourceError> for ImageWriteError {
    fn from(error: ResourceError) -> Self { ImageWriteError::InvalidResource(error) }
}
#[cfg(feature = "std")]
impl From<IOError> for ImageWriteError {
    fn from(error: IOError) -> Self { ImageWriteError::IOError(error) }
}
