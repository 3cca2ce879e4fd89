//! # lumpcodec
//!
//! Compress and expand the Huffman + LZ lumps found in the Doom 64 ROM.
//! The work happens on buffers, see `lump::encode` and `lump::decode`.
//! The `lump` module also has functions that work on files or anything
//! else with `Read + Seek` or `Write + Seek`.

mod tools;
pub mod lump;

pub use lump::{decode,encode};

type DYNERR = Box<dyn std::error::Error>;

/// Errors coming out of the lump decoder.
/// None of these are retried, the input is taken to be corrupt or short.
#[derive(thiserror::Error,Debug,Clone,PartialEq,Eq)]
pub enum DecodeError {
    #[error("expanded data exceeds the capacity of {capacity} bytes")]
    OutputOverflow { capacity: usize },
    #[error("bit stream ended before the end of stream symbol")]
    TruncatedInput,
    /// Code outside the 629 symbol alphabet.  The tree only has leaves for
    /// valid codes, so a stream can produce this only through `Symbol::from_code`.
    #[error("symbol {0} is outside the alphabet")]
    InvalidSymbol(usize)
}

/// File Errors
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("file format mismatch")]
    FileFormatMismatch,
    #[error("file too large")]
    FileTooLarge
}
