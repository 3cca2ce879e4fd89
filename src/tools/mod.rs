//! Building blocks shared by the lump encoder and decoder

pub mod adaptive_huff;
pub mod bit_stream;
pub mod ring_buffer;
pub mod symbol_table;
