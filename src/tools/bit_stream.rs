//! Bit level access to compressed lumps.
//! Bits are packed MSB first within each byte, which is exactly the ordering
//! `bit_vec` uses when converting from and to bytes.

use bit_vec::BitVec;
use crate::DecodeError;

/// Reads bits from a compressed buffer, MSB first.
pub struct BitReader {
    bits: BitVec,
    ptr: usize
}

/// Accumulates bits and packs them into bytes, MSB first.
pub struct BitWriter {
    bits: BitVec
}

impl BitReader {
    pub fn create(dat: &[u8]) -> Self {
        Self {
            bits: BitVec::from_bytes(dat),
            ptr: 0
        }
    }
    /// get the next bit, running off the end is an error rather than a fill value
    pub fn read_bit(&mut self) -> Result<bool,DecodeError> {
        match self.bits.get(self.ptr) {
            Some(bit) => {
                self.ptr += 1;
                Ok(bit)
            },
            None => Err(DecodeError::TruncatedInput)
        }
    }
    /// Read a raw integer of `count` bits.  The first bit read is the
    /// least significant bit of the result.
    pub fn read_bits(&mut self,count: usize) -> Result<u32,DecodeError> {
        let mut ans: u32 = 0;
        for i in 0..count {
            if self.read_bit()? {
                ans |= 1 << i;
            }
        }
        Ok(ans)
    }
    /// number of bits consumed so far
    pub fn position(&self) -> usize {
        self.ptr
    }
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            bits: BitVec::new()
        }
    }
    pub fn write_bit(&mut self,bit: bool) {
        self.bits.push(bit);
    }
    /// Write the low `count` bits of `value`, least significant first,
    /// so that `BitReader::read_bits` gives back `value`.
    pub fn write_bits(&mut self,count: usize,value: u32) {
        for i in 0..count {
            self.bits.push(value & (1 << i) != 0);
        }
    }
    /// pad the partial byte, if any, with zero bits
    pub fn flush_to_byte_boundary(&mut self) {
        while self.bits.len() % 8 != 0 {
            self.bits.push(false);
        }
    }
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.flush_to_byte_boundary();
        self.bits.to_bytes()
    }
}

#[test]
fn msb_first() {
    let mut reader = BitReader::create(&[0b1010_0000,0xff]);
    assert_eq!(reader.read_bit(),Ok(true));
    assert_eq!(reader.read_bit(),Ok(false));
    assert_eq!(reader.read_bit(),Ok(true));
    assert_eq!(reader.read_bits(5),Ok(0));
    assert_eq!(reader.position(),8);
    assert_eq!(reader.read_bits(8),Ok(0xff));
    assert_eq!(reader.read_bit(),Err(DecodeError::TruncatedInput));
}

#[test]
fn raw_values_are_lsb_first() {
    // 0b0110 written LSB first puts 0,1,1,0 on the wire
    let mut writer = BitWriter::new();
    writer.write_bits(4,0b0110);
    writer.write_bit(true);
    let bytes = writer.into_bytes();
    assert_eq!(bytes,vec![0b0110_1000]);
    let mut reader = BitReader::create(&bytes);
    assert_eq!(reader.read_bits(4),Ok(0b0110));
    assert_eq!(reader.read_bit(),Ok(true));
}

#[test]
fn flush_pads_with_zeros() {
    let mut writer = BitWriter::new();
    writer.write_bit(true);
    writer.flush_to_byte_boundary();
    writer.flush_to_byte_boundary();
    writer.write_bits(2,3);
    assert_eq!(writer.into_bytes(),vec![0x80,0xc0]);
    assert_eq!(BitWriter::new().into_bytes(),Vec::<u8>::new());
}
