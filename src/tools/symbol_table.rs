//! Symbol alphabet and length classes.
//!
//! The tree codes 629 symbols: 256 literal bytes, an end of stream marker,
//! and 372 run codes.  Run codes come in six classes of 62, one code per
//! run length 3..=64.  Each class is followed by a fixed number of raw bits
//! that, together with the run length, give the distance back into history.

use crate::DecodeError;

/// extra bits following a run code, by class
pub const EXTRA_BITS: [u8;6] = [4,6,8,10,12,14];
pub const NUM_SYMBOLS: usize = 629;
pub const END_CODE: u16 = 256;
pub const FIRST_RUN_CODE: u16 = 257;
pub const RUNS_PER_CLASS: u16 = 62;
pub const MIN_RUN: usize = 3;
pub const MAX_RUN: usize = 64;

/// Anything the adaptive tree can code.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum Symbol {
    Literal(u8),
    End,
    /// `class` indexes the length class table, `length` is 3..=64
    Run { class: usize, length: usize }
}

impl Symbol {
    pub fn code(&self) -> u16 {
        match *self {
            Symbol::Literal(b) => b as u16,
            Symbol::End => END_CODE,
            Symbol::Run { class, length } => FIRST_RUN_CODE + RUNS_PER_CLASS * class as u16 + (length - MIN_RUN) as u16
        }
    }
    pub fn from_code(code: u16) -> Result<Self,DecodeError> {
        match code {
            0..=255 => Ok(Symbol::Literal(code as u8)),
            END_CODE => Ok(Symbol::End),
            c if (c as usize) < NUM_SYMBOLS => {
                let class = (c - FIRST_RUN_CODE) / RUNS_PER_CLASS;
                let length = c - RUNS_PER_CLASS * class - (FIRST_RUN_CODE - MIN_RUN as u16);
                Ok(Symbol::Run { class: class as usize, length: length as usize })
            },
            c => Err(DecodeError::InvalidSymbol(c as usize))
        }
    }
}

/// One of the six buckets of run distances.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub struct LengthClass {
    /// raw bits that follow the run code
    pub extra_bits: u8,
    /// shortest run this class can code
    pub base_length: usize,
    /// smallest value of (distance - length) in this class
    pub base_offset: usize,
    /// largest value of (distance - length) in this class
    pub last_offset: usize
}

/// Length classes plus the window size they imply.
pub struct SymbolTable {
    classes: [LengthClass;6],
    window_size: usize
}

impl SymbolTable {
    /// Build the class table.  The classes tile a single numeric space, each
    /// starting where the previous one's `1 << extra_bits` values end.
    pub fn initialize() -> Self {
        let mut classes = [LengthClass { extra_bits: 0, base_length: MIN_RUN, base_offset: 0, last_offset: 0 };6];
        let mut base = 0;
        for (class,bits) in classes.iter_mut().zip(EXTRA_BITS) {
            class.extra_bits = bits;
            class.base_offset = base;
            base += 1 << bits;
            class.last_offset = base - 1;
        }
        // a run can reach back past the last offset by its own length
        let window_size = classes[5].last_offset + MAX_RUN;
        Self {
            classes,
            window_size
        }
    }
    pub fn class(&self,idx: usize) -> &LengthClass {
        &self.classes[idx]
    }
    pub fn window_size(&self) -> usize {
        self.window_size
    }
    /// Choose the run symbol and extra value for a copy of `length` bytes
    /// starting `distance` bytes back.  Picks the smallest class that can hold
    /// the distance, `None` if the pair cannot be coded at all.
    pub fn run_symbol(&self,length: usize,distance: usize) -> Option<(Symbol,u32)> {
        if length > MAX_RUN || distance < length {
            return None;
        }
        let gap = distance - length;
        let class = self.classes.iter().position(|c| gap <= c.last_offset)?;
        if length < self.classes[class].base_length {
            return None;
        }
        let extra = (gap - self.classes[class].base_offset) as u32;
        Some((Symbol::Run { class, length },extra))
    }
    /// number of raw bits that follow the symbol
    pub fn extra_bits(&self,symbol: Symbol) -> usize {
        match symbol {
            Symbol::Run { class, .. } => self.classes[class].extra_bits as usize,
            _ => 0
        }
    }
    /// how many bytes back a run starts, given its class, length, and extra value
    pub fn run_distance(&self,class: usize,length: usize,extra: u32) -> usize {
        self.classes[class].base_offset + extra as usize + length
    }
}

#[test]
fn class_table() {
    let table = SymbolTable::initialize();
    let bases: Vec<usize> = (0..6).map(|i| table.class(i).base_offset).collect();
    let lasts: Vec<usize> = (0..6).map(|i| table.class(i).last_offset).collect();
    assert_eq!(bases,vec![0,16,80,336,1360,5456]);
    assert_eq!(lasts,vec![15,79,335,1359,5455,21839]);
    assert_eq!(table.class(3).extra_bits,10);
    assert_eq!(table.class(0).base_length,3);
    assert_eq!(table.window_size(),0x558f);
}

#[test]
fn symbol_codes() {
    assert_eq!(Symbol::Literal(0x41).code(),0x41);
    assert_eq!(Symbol::End.code(),256);
    assert_eq!(Symbol::Run { class: 0, length: 3 }.code(),257);
    assert_eq!(Symbol::Run { class: 0, length: 64 }.code(),318);
    assert_eq!(Symbol::Run { class: 1, length: 3 }.code(),319);
    assert_eq!(Symbol::Run { class: 5, length: 64 }.code(),628);
    for code in 0..NUM_SYMBOLS as u16 {
        assert_eq!(Symbol::from_code(code).map(|s| s.code()),Ok(code));
    }
    assert_eq!(Symbol::from_code(629),Err(DecodeError::InvalidSymbol(629)));
}

#[test]
fn run_classes() {
    let table = SymbolTable::initialize();
    assert_eq!(table.run_symbol(3,3),Some((Symbol::Run { class: 0, length: 3 },0)));
    assert_eq!(table.run_symbol(10,25),Some((Symbol::Run { class: 0, length: 10 },15)));
    assert_eq!(table.run_symbol(10,26),Some((Symbol::Run { class: 1, length: 10 },0)));
    assert_eq!(table.run_symbol(64,1024),Some((Symbol::Run { class: 3, length: 64 },960-336)));
    assert_eq!(table.run_distance(3,64,960-336),1024);
    assert_eq!(table.extra_bits(Symbol::Run { class: 3, length: 64 }),10);
    assert_eq!(table.extra_bits(Symbol::Literal(0)),0);
    assert_eq!(table.run_symbol(64,21839+64),Some((Symbol::Run { class: 5, length: 64 },16383)));
    assert_eq!(table.run_symbol(64,21839+65),None);
    assert_eq!(table.run_symbol(10,9),None);
    assert_eq!(table.run_symbol(2,9),None);
    assert_eq!(table.run_symbol(65,90),None);
}
