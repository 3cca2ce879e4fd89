//! Doom 64 Lump Compression
//!
//! Lumps are coded as a stream of symbols from an adaptive Huffman tree.
//! A symbol is a literal byte, the end of stream marker, or a run code that
//! copies 3 to 64 bytes from history.  A run code is followed by 4 to 14 raw
//! bits which, along with the run length, give the distance back to the
//! start of the copy.  The distance is always at least the run length.
//!
//! * The bit stream is packed MSB first and ends with a zero-padded byte
//! * The encoder pads the result to a multiple of 4 bytes, the decoder
//!   ignores anything after the end of stream symbol
//! * There is no header, the expanded size is kept by the archive directory
//!
//! The encoder searches only the last 1024 bytes, taking the longest match and,
//! among equal lengths, the nearest one.  Matches are found with hash chains
//! and always verified against the history window.

use std::io::{Cursor,Read,Write,Seek,SeekFrom};
use crate::tools::adaptive_huff::AdaptiveTree;
use crate::tools::bit_stream::{BitReader,BitWriter};
use crate::tools::ring_buffer::RingBuffer;
use crate::tools::symbol_table::{Symbol,SymbolTable,MIN_RUN,MAX_RUN};
use crate::{DecodeError,DYNERR};

// LZ coding constants

const LOOKBACK: usize = 1024; // farthest distance the encoder will use
const HASH_BITS: usize = 12;
const HASH_SIZE: usize = 1 << HASH_BITS;
const NIL: usize = usize::MAX; // end of a hash chain
const ALIGN: usize = 4; // compressed lumps are padded to this many bytes

/// Options controlling compression
#[derive(Clone)]
pub struct Options {
    /// starting position in the input file
    pub in_offset: u64,
    /// starting position in the output file
    pub out_offset: u64,
    /// return error if input is larger
    pub max_file_size: u64,
    /// expected size of the expanded lump, decoding past this is an error
    pub expanded_size: Option<usize>
}

pub const STD_OPTIONS: Options = Options {
    in_offset: 0,
    out_offset: 0,
    max_file_size: u32::MAX as u64/4,
    expanded_size: None
};

type HistoryWindow = RingBuffer<u8>;

/// symbol counts gathered while coding a lump
#[derive(Debug,Default,Clone,Copy)]
struct CodingStats {
    literals: usize,
    runs: usize
}

/// States of the decoder
enum State {
    ReadSymbol,
    EmitLiteral(u8),
    EmitRun { length: usize, distance: usize },
    Done
}

struct Decompressor {
    reader: BitReader,
    tree: AdaptiveTree,
    table: SymbolTable,
    window: HistoryWindow,
    output: Vec<u8>,
    capacity: usize,
    stats: CodingStats
}

impl Decompressor {
    fn new(compressed: &[u8],capacity: usize) -> Self {
        let table = SymbolTable::initialize();
        let window = HistoryWindow::create(0,table.window_size());
        Self {
            reader: BitReader::create(compressed),
            tree: AdaptiveTree::create(),
            table,
            window,
            output: Vec::with_capacity(capacity.min(1 << 20)),
            capacity,
            stats: CodingStats::default()
        }
    }
    fn push(&mut self,b: u8) -> Result<(),DecodeError> {
        if self.output.len() >= self.capacity {
            return Err(DecodeError::OutputOverflow { capacity: self.capacity });
        }
        self.output.push(b);
        Ok(())
    }
    fn step(&mut self,state: State) -> Result<State,DecodeError> {
        match state {
            State::ReadSymbol => {
                let code = self.tree.decode_symbol(&mut self.reader)?;
                match Symbol::from_code(code)? {
                    Symbol::Literal(b) => Ok(State::EmitLiteral(b)),
                    Symbol::End => Ok(State::Done),
                    Symbol::Run { class, length } => {
                        let extra = self.reader.read_bits(self.table.class(class).extra_bits as usize)?;
                        let distance = self.table.run_distance(class,length,extra);
                        Ok(State::EmitRun { length, distance })
                    }
                }
            },
            State::EmitLiteral(b) => {
                log::trace!("literal {:02x}",b);
                self.stats.literals += 1;
                self.window.append(b);
                self.push(b)?;
                Ok(State::ReadSymbol)
            },
            State::EmitRun { length, distance } => {
                log::trace!("run of {} from {} back",length,distance);
                self.stats.runs += 1;
                // one byte at a time, the source may overlap what is being written
                for _k in 0..length {
                    let b = self.window.replay(distance);
                    self.push(b)?;
                }
                Ok(State::ReadSymbol)
            },
            State::Done => Ok(State::Done)
        }
    }
    fn run(mut self) -> Result<Vec<u8>,DecodeError> {
        let mut state = State::ReadSymbol;
        while !matches!(state,State::Done) {
            state = self.step(state)?;
        }
        log::debug!("expanded {} bits into {} bytes, {:?}",self.reader.position(),self.output.len(),self.stats);
        Ok(self.output)
    }
}

/// Hash chains over 3 byte prefixes.  `head` gives the latest position with
/// a given hash, `prev` links each position to the one before it, so a walk
/// visits candidates in order of increasing distance.
struct MatchFinder {
    head: Vec<usize>,
    prev: Vec<usize>
}

impl MatchFinder {
    fn create(len: usize) -> Self {
        Self {
            head: vec![NIL;HASH_SIZE],
            prev: vec![NIL;len]
        }
    }
    fn hash(raw: &[u8],pos: usize) -> usize {
        (((raw[pos] as usize) << 8) ^ ((raw[pos+1] as usize) << 4) ^ raw[pos+2] as usize) & (HASH_SIZE - 1)
    }
    /// index the prefix starting at `pos`, must be called for every position in order
    fn insert(&mut self,raw: &[u8],pos: usize) {
        if pos + MIN_RUN <= raw.len() {
            let h = Self::hash(raw,pos);
            self.prev[pos] = self.head[h];
            self.head[h] = pos;
        }
    }
    /// Find the longest match for `raw[pos..]` in the window, returns (length,distance).
    /// A match cannot run past the cursor, so the length is capped by the distance.
    /// Ties go to the nearest match because nearer candidates are seen first.
    fn longest(&self,raw: &[u8],pos: usize,window: &HistoryWindow) -> Option<(usize,usize)> {
        if raw.len() - pos < MIN_RUN {
            return None;
        }
        let mut best_length = 0;
        let mut best_distance = 0;
        let mut curs = self.head[Self::hash(raw,pos)];
        while curs != NIL {
            let distance = pos - curs;
            if distance > LOOKBACK {
                break;
            }
            let cap = MAX_RUN.min(distance).min(raw.len() - pos);
            let mut i = 0;
            while i < cap && window.get(i as i64 - distance as i64) == raw[pos + i] {
                i += 1;
            }
            if i > best_length {
                best_length = i;
                best_distance = distance;
                if i == MAX_RUN {
                    break;
                }
            }
            curs = self.prev[curs];
        }
        match best_length >= MIN_RUN {
            true => Some((best_length,best_distance)),
            false => None
        }
    }
}

struct Compressor {
    writer: BitWriter,
    tree: AdaptiveTree,
    table: SymbolTable,
    window: HistoryWindow,
    finder: MatchFinder,
    stats: CodingStats
}

impl Compressor {
    fn new(len: usize) -> Self {
        let table = SymbolTable::initialize();
        let window = HistoryWindow::create(0,table.window_size());
        Self {
            writer: BitWriter::new(),
            tree: AdaptiveTree::create(),
            table,
            window,
            finder: MatchFinder::create(len),
            stats: CodingStats::default()
        }
    }
    fn emit(&mut self,symbol: Symbol) {
        self.tree.encode_symbol(symbol.code(),&mut self.writer);
    }
    /// Code the whole buffer, returns the padded lump and the symbol counts
    fn run(mut self,raw: &[u8]) -> (Vec<u8>,CodingStats) {
        let mut pos = 0;
        while pos < raw.len() {
            let run = self.finder.longest(raw,pos,&self.window)
                .and_then(|(length,distance)| self.table.run_symbol(length,distance).map(|(symbol,extra)| (symbol,extra,length,distance)));
            let step = match run {
                Some((symbol,extra,length,distance)) => {
                    log::trace!("run of {} from {} back",length,distance);
                    self.emit(symbol);
                    self.writer.write_bits(self.table.extra_bits(symbol),extra);
                    self.stats.runs += 1;
                    length
                },
                None => {
                    log::trace!("literal {:02x}",raw[pos]);
                    self.emit(Symbol::Literal(raw[pos]));
                    self.stats.literals += 1;
                    1
                }
            };
            for _k in 0..step {
                self.window.append(raw[pos]);
                self.finder.insert(raw,pos);
                pos += 1;
            }
        }
        self.emit(Symbol::End);
        self.writer.flush_to_byte_boundary();
        let mut ans = self.writer.into_bytes();
        while ans.len() % ALIGN != 0 {
            ans.push(0);
        }
        (ans,self.stats)
    }
}

/// Compress a buffer.  Every call starts from a fresh tree and window,
/// so equal inputs always give equal outputs.
pub fn encode(raw: &[u8]) -> Vec<u8> {
    let (ans,stats) = Compressor::new(raw.len()).run(raw);
    log::debug!("compressed {} bytes into {}, {:?}",raw.len(),ans.len(),stats);
    ans
}

/// Expand a compressed lump.  `expected_output_size` is the capacity of the
/// output, the result can be shorter, but producing more is an error.
/// An empty buffer is taken to be an empty lump.
pub fn decode(compressed: &[u8],expected_output_size: usize) -> Result<Vec<u8>,DecodeError> {
    if compressed.is_empty() {
        return Ok(Vec::new());
    }
    Decompressor::new(compressed,expected_output_size).run()
}

/// Main compression function.
/// `expanded_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `compressed_out` is an object with `Write` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// Returns (in_size,out_size) or error.
pub fn compress<R,W>(expanded_in: &mut R, compressed_out: &mut W, opt: &Options) -> Result<(u64,u64),DYNERR>
where R: Read + Seek, W: Write + Seek {
    let mut expanded_length = expanded_in.seek(SeekFrom::End(0))?;
    if opt.in_offset > expanded_length {
        return Err(Box::new(crate::Error::FileFormatMismatch));
    }
    expanded_length -= opt.in_offset;
    if expanded_length > opt.max_file_size {
        return Err(Box::new(crate::Error::FileTooLarge));
    }
    expanded_in.seek(SeekFrom::Start(opt.in_offset))?;
    let mut raw = Vec::new();
    expanded_in.read_to_end(&mut raw)?;
    let compressed = encode(&raw);
    compressed_out.seek(SeekFrom::Start(opt.out_offset))?;
    compressed_out.write_all(&compressed)?;
    compressed_out.flush()?;
    Ok((expanded_length,compressed.len() as u64))
}

/// Main decompression function.
/// `compressed_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `expanded_out` is an object with `Write` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// The capacity of the output is `opt.expanded_size`, unbounded if `None`.
/// Returns (in_size,out_size) or error.
pub fn expand<R,W>(compressed_in: &mut R, expanded_out: &mut W, opt: &Options) -> Result<(u64,u64),DYNERR>
where R: Read + Seek, W: Write + Seek {
    let mut compressed_size = compressed_in.seek(SeekFrom::End(0))?;
    if opt.in_offset > compressed_size {
        return Err(Box::new(crate::Error::FileFormatMismatch));
    }
    compressed_size -= opt.in_offset;
    if compressed_size > opt.max_file_size {
        return Err(Box::new(crate::Error::FileTooLarge));
    }
    compressed_in.seek(SeekFrom::Start(opt.in_offset))?;
    let mut compressed = Vec::new();
    compressed_in.read_to_end(&mut compressed)?;
    let expanded = decode(&compressed,opt.expanded_size.unwrap_or(usize::MAX))?;
    expanded_out.seek(SeekFrom::Start(opt.out_offset))?;
    expanded_out.write_all(&expanded)?;
    expanded_out.flush()?;
    Ok((compressed_size,expanded.len() as u64))
}

/// Convenience function, calls `compress` with a slice returning a Vec
pub fn compress_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    compress(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}

/// Convenience function, calls `expand` with a slice returning a Vec
pub fn expand_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    expand(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}

// *************** TESTS *****************

#[cfg(test)]
fn stats_for(raw: &[u8]) -> CodingStats {
    Compressor::new(raw.len()).run(raw).1
}

#[test]
fn compression_works() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let expected = "5F 7A 95 94 5B 28 ED 24 E5 DE 09 69 7D 83 22 5B 0E 3B F1 C9 F3 EB 8D C7 8F AF 9D 40 EF 02 FF B6";
    assert_eq!(encode(test_data),hex::decode(expected.replace(" ","")).unwrap());
    assert_eq!(encode(b"a"),hex::decode("6B2EA000").unwrap());
}

#[test]
fn empty_lump() {
    // nothing but the end of stream code and padding
    let compressed = encode(&[]);
    assert_eq!(compressed,vec![0xba,0x80,0x00,0x00]);
    assert_eq!(decode(&compressed,0),Ok(Vec::new()));
    assert_eq!(decode(&[],0),Ok(Vec::new()));
}

#[test]
fn invertibility() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = encode(test_data);
    assert_eq!(compressed.len() % 4,0);
    assert_eq!(decode(&compressed,test_data.len()),Ok(test_data.to_vec()));
    // capacity can be larger than the lump
    assert_eq!(decode(&compressed,1000),Ok(test_data.to_vec()));
}

#[test]
fn long_run_is_chained() {
    let test_data = [b'a';70];
    let compressed = encode(&test_data);
    assert_eq!(compressed,hex::decode("6B192BB002404C08585F0840").unwrap());
    let stats = stats_for(&test_data);
    assert_eq!(stats.literals,3);
    assert!(stats.runs >= 2);
    assert_eq!(decode(&compressed,70),Ok(test_data.to_vec()));
}

#[test]
fn repeating_pattern() {
    let test_data = "ab".repeat(15);
    let compressed = encode(test_data.as_bytes());
    assert!(stats_for(test_data.as_bytes()).runs > 0);
    assert_eq!(decode(&compressed,test_data.len()),Ok(test_data.into_bytes()));
}

#[test]
fn independent_instances() {
    let test_data = "the quick brown fox jumps over the lazy dog, the quick brown fox".as_bytes();
    assert_eq!(encode(test_data),encode(test_data));
}

#[test]
fn overflow_is_reported() {
    let test_data: Vec<u8> = (0..100u8).collect();
    let compressed = encode(&test_data);
    assert_eq!(decode(&compressed,50),Err(DecodeError::OutputOverflow { capacity: 50 }));
    assert_eq!(decode(&compressed,99),Err(DecodeError::OutputOverflow { capacity: 99 }));
    assert_eq!(decode(&compressed,100),Ok(test_data));
}

#[test]
fn truncation_is_reported() {
    let test_data = "hello world, hello world, hello world".as_bytes();
    let compressed = encode(test_data);
    assert_eq!(decode(&compressed[0..1],100),Err(DecodeError::TruncatedInput));
    assert_eq!(decode(&compressed[0..compressed.len()/2],100),Err(DecodeError::TruncatedInput));
}

#[test]
fn run_before_start_reads_zeros() {
    let mut tree = AdaptiveTree::create();
    let mut writer = BitWriter::new();
    tree.encode_symbol(Symbol::Run { class: 0, length: 3 }.code(),&mut writer);
    writer.write_bits(4,2);
    tree.encode_symbol(Symbol::Literal(9).code(),&mut writer);
    tree.encode_symbol(Symbol::End.code(),&mut writer);
    assert_eq!(decode(&writer.into_bytes(),10),Ok(vec![0,0,0,9]));
}

#[test]
fn matches_stay_in_lookback() {
    // the second copy of the block is too far back to be matched
    let block: Vec<u8> = (0..40u8).collect();
    let mut test_data = block.clone();
    test_data.extend((0..1100).map(|i| (i % 7) as u8 + 100));
    test_data.extend(&block);
    let compressed = encode(&test_data);
    assert_eq!(decode(&compressed,test_data.len()),Ok(test_data.clone()));
    assert!(stats_for(&test_data).literals >= 80);
    let near: Vec<u8> = [block.clone(),block.clone()].concat();
    assert_eq!(stats_for(&near).runs,1);
}

#[cfg(test)]
fn longest_at(raw: &[u8],pos: usize) -> Option<(usize,usize)> {
    let mut finder = MatchFinder::create(raw.len());
    let mut window = HistoryWindow::create(0,SymbolTable::initialize().window_size());
    for i in 0..pos {
        window.append(raw[i]);
        finder.insert(raw,i);
    }
    finder.longest(raw,pos,&window)
}

#[test]
fn longest_then_nearest() {
    // two equal matches, the nearer one wins
    assert_eq!(longest_at(b"abcXabcYabc",8),Some((3,4)));
    // a longer match wins even when it is farther back
    assert_eq!(longest_at(b"abcdQabcRabcd",9),Some((4,9)));
    assert_eq!(longest_at(b"abcXabd",4),None);
}

#[test]
fn file_offsets() {
    let test_data = "xxxxI am Sam. Sam I am.".as_bytes();
    let mut opt = STD_OPTIONS;
    opt.in_offset = 4;
    let compressed = compress_slice(test_data,&opt).expect("compression failed");
    assert_eq!(compressed,encode(&test_data[4..]));
    let mut opt = STD_OPTIONS;
    opt.expanded_size = Some(19);
    assert_eq!(expand_slice(&compressed,&opt).expect("expansion failed"),test_data[4..].to_vec());
    opt.expanded_size = Some(5);
    assert!(expand_slice(&compressed,&opt).is_err());
    opt.in_offset = 1000;
    assert!(expand_slice(&compressed,&opt).is_err());
}
