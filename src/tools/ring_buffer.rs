//! Ring buffer holding the history window of an LZ coder
use num_traits::PrimInt;

pub struct RingBuffer<T: PrimInt> {
    buf: Vec<T>,
    pos: usize,
    n: usize
}

impl <T: PrimInt> RingBuffer<T> {
    pub fn create(fill: T,n: usize) -> Self {
        Self {
            buf: vec![fill;n],
            pos: 0,
            n
        }
    }
    /// get value at cursor + offset, negative offsets look back into history
    pub fn get(&self,offset: i64) -> T {
        self.buf[(self.pos as i64 + offset).rem_euclid(self.n as i64) as usize]
    }
    /// write at the cursor and advance it, wrapping at capacity
    pub fn append(&mut self,val: T) {
        self.buf[self.pos] = val;
        self.pos = (self.pos + 1) % self.n;
    }
    /// Copy the value `distance` behind the cursor to the cursor and return it.
    /// Source and destination move together, so calling this repeatedly
    /// replays history one element at a time even when the ranges overlap.
    pub fn replay(&mut self,distance: usize) -> T {
        let val = self.get(-(distance as i64));
        self.append(val);
        val
    }
}

#[test]
fn wraparound() {
    let mut ring: RingBuffer<u8> = RingBuffer::create(0,4);
    for b in 1..=5 {
        ring.append(b);
    }
    // cursor is now at 1, slot 0 holds the 5 that overwrote the 1
    assert_eq!(ring.get(-1),5);
    assert_eq!(ring.get(3),5);
    assert_eq!(ring.get(-4),2);
    assert_eq!(ring.get(2),4);
}

#[test]
fn overlapping_replay() {
    // distance 2 with 6 replays repeats the last two values three times
    let mut ring: RingBuffer<u8> = RingBuffer::create(0,16);
    ring.append(b'a');
    ring.append(b'b');
    let run: Vec<u8> = (0..6).map(|_| ring.replay(2)).collect();
    assert_eq!(run,b"ababab".to_vec());
    assert_eq!(ring.get(-8),b'a');
    assert_eq!(ring.get(0),0);
}

#[test]
fn replay_before_start_reads_fill() {
    let mut ring: RingBuffer<u8> = RingBuffer::create(0,8);
    ring.append(7);
    assert_eq!(ring.replay(3),0);
    assert_eq!(ring.get(-1),0);
    assert_eq!(ring.get(-2),7);
}
