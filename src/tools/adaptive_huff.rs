//! Module to perform the adaptive Huffman coding of lump symbols.
//! This is used by the `lump` module.
//!
//! The tree starts out as a complete binary heap: node 1 is the root, node `i`
//! has sons `2i` and `2i+1`, and the 629 leaves occupy nodes 0x275..0x4EA.
//! After every symbol the encoder and decoder run the same `update`, which
//! bumps the leaf weight and lets heavier nodes climb by trading places with
//! their uncles.  The coding is bit-compatible with the tables used by the
//! N64 decoder, including its 16 bit weights and its halving rule.

use crate::tools::bit_stream::{BitReader,BitWriter};
use crate::tools::symbol_table::NUM_SYMBOLS;
use crate::DecodeError;

const ROOT: usize = 1;
/// index of the first leaf, the leaf for code `c` is `LEAF_BASE + c`
const LEAF_BASE: usize = 0x275;
const NODE_COUNT: usize = LEAF_BASE + NUM_SYMBOLS;
/// when the root weight lands on this value all weights are halved
const MAX_WEIGHT: i16 = 2000;

#[derive(Clone,Copy,Default)]
struct Node {
    /// occurrence count, for a branch the sum over its sons once it has been touched
    weight: i16,
    parent: usize,
    /// son followed on a 0 bit and on a 1 bit
    son: [usize;2]
}

/// Adaptive prefix code over the lump alphabet.
/// The tree is constantly updated as symbols are coded.
pub struct AdaptiveTree {
    /// slot 0 is never used, so that the heap arithmetic works out
    nodes: Vec<Node>
}

impl AdaptiveTree {
    /// Create the tree in its baseline state.  Every node other than the
    /// root starts with weight 1, the root with 0.
    pub fn create() -> Self {
        let mut nodes = vec![Node::default();NODE_COUNT];
        for (i,node) in nodes.iter_mut().enumerate().skip(2) {
            node.parent = i / 2;
            node.weight = 1;
        }
        for (i,node) in nodes.iter_mut().enumerate().take(LEAF_BASE).skip(ROOT) {
            node.son = [2*i,2*i+1];
        }
        Self {
            nodes
        }
    }
    fn is_leaf(node: usize) -> bool {
        node >= LEAF_BASE
    }
    /// the other son of this node's parent
    fn sibling(&self,node: usize) -> usize {
        let parent = &self.nodes[self.nodes[node].parent];
        match parent.son[0] == node {
            true => parent.son[1],
            false => parent.son[0]
        }
    }
    /// Set each ancestor's weight to the sum of its sons, from `node` up to the root.
    /// `sibling` must be the current sibling of `node`.
    fn reweigh(&mut self,mut node: usize,mut sibling: usize) {
        loop {
            let parent = self.nodes[node].parent;
            self.nodes[parent].weight = self.nodes[sibling].weight.wrapping_add(self.nodes[node].weight);
            node = parent;
            if node == ROOT {
                break;
            }
            sibling = self.sibling(node);
        }
        if self.nodes[ROOT].weight == MAX_WEIGHT {
            self.halve();
        }
    }
    /// halve every weight in one pass, the shape of the tree is untouched
    fn halve(&mut self) {
        log::trace!("halving tree weights");
        for node in self.nodes.iter_mut().skip(ROOT) {
            node.weight >>= 1;
        }
    }
    /// Increment the weight of `code` and restore the ordering of the tree.
    /// A node trades places with its uncle only if the uncle is strictly
    /// lighter, so on a tie the node already nearer the root stays put.
    pub fn update(&mut self,code: u16) {
        let mut curr = LEAF_BASE + code as usize;
        self.nodes[curr].weight = self.nodes[curr].weight.wrapping_add(1);
        if self.nodes[curr].parent == ROOT {
            return;
        }
        let sibling = self.sibling(curr);
        self.reweigh(curr,sibling);
        loop {
            let parent = self.nodes[curr].parent;
            let grand = self.nodes[parent].parent;
            let uncle = self.sibling(parent);
            if self.nodes[uncle].weight < self.nodes[curr].weight {
                // curr takes the uncle's slot under grand, the uncle takes curr's slot under parent
                let uncle_slot = match self.nodes[grand].son[0] == parent {
                    true => 1,
                    false => 0
                };
                self.nodes[grand].son[uncle_slot] = curr;
                let curr_slot = match self.nodes[parent].son[0] == curr {
                    true => 0,
                    false => 1
                };
                self.nodes[parent].son[curr_slot] = uncle;
                let new_sibling = self.nodes[parent].son[1-curr_slot];
                self.nodes[uncle].parent = parent;
                self.nodes[curr].parent = grand;
                self.reweigh(uncle,new_sibling);
            }
            curr = parent;
            if self.nodes[curr].parent == ROOT {
                break;
            }
        }
    }
    /// Travel from the root to a leaf, choosing sons by the bits read.
    /// The tree is updated before the code is returned.
    /// Every branch has two sons, so the only failure is running out of bits.
    pub fn decode_symbol(&mut self,reader: &mut BitReader) -> Result<u16,DecodeError> {
        let mut node = ROOT;
        while !Self::is_leaf(node) {
            let bit = reader.read_bit()? as usize;
            node = self.nodes[node].son[bit];
        }
        let code = (node - LEAF_BASE) as u16;
        self.update(code);
        Ok(code)
    }
    /// Write the current code for `code`, then update the tree.
    pub fn encode_symbol(&mut self,code: u16,writer: &mut BitWriter) {
        let path = self.code_bits(code);
        for bit in path.into_iter().rev() {
            writer.write_bit(bit);
        }
        self.update(code);
    }
    /// bits from leaf up to root, so the last element is the first bit sent
    fn code_bits(&self,code: u16) -> Vec<bool> {
        let mut ans = Vec::new();
        let mut node = LEAF_BASE + code as usize;
        while node != ROOT {
            let parent = self.nodes[node].parent;
            ans.push(self.nodes[parent].son[1] == node);
            node = parent;
        }
        ans
    }
}

#[cfg(test)]
fn lcg(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1103515245).wrapping_add(12345) & 0x7fffffff;
    *seed >> 16
}

#[cfg(test)]
fn code_length(tree: &AdaptiveTree,code: u16) -> usize {
    tree.code_bits(code).len()
}

#[test]
fn baseline_codes() {
    let tree = AdaptiveTree::create();
    // leaf 0x275 = 0b1001110101, the code is the path below the leading 1
    let mut bits: Vec<bool> = tree.code_bits(0);
    bits.reverse();
    assert_eq!(bits,vec![false,false,true,true,true,false,true,false,true]);
    assert_eq!(code_length(&tree,255),9);
    assert_eq!(code_length(&tree,256),9);
    assert_eq!(code_length(&tree,628),10);
}

#[test]
fn frequent_symbols_get_shorter() {
    let mut tree = AdaptiveTree::create();
    let before = code_length(&tree,b'e' as u16);
    for _i in 0..200 {
        tree.update(b'e' as u16);
    }
    assert!(code_length(&tree,b'e' as u16) < before);
    assert!(code_length(&tree,b'e' as u16) < code_length(&tree,b'q' as u16));
}

#[test]
fn encoder_and_decoder_agree() {
    let mut seed = 7;
    let codes: Vec<u16> = (0..4000).map(|_| (lcg(&mut seed) % NUM_SYMBOLS as u32) as u16).collect();
    let mut enc = AdaptiveTree::create();
    let mut writer = BitWriter::new();
    for c in &codes {
        enc.encode_symbol(*c,&mut writer);
    }
    let bytes = writer.into_bytes();
    let mut dec = AdaptiveTree::create();
    let mut reader = BitReader::create(&bytes);
    for c in &codes {
        assert_eq!(dec.decode_symbol(&mut reader),Ok(*c));
    }
}

#[test]
fn parent_outweighs_child() {
    // the root is excluded: updating a son of the root does not reweigh it
    let mut tree = AdaptiveTree::create();
    let mut seed = 1;
    for _i in 0..3000 {
        let r = lcg(&mut seed) % 40;
        let code = match r < 30 {
            true => r,
            false => 256 + r
        };
        tree.update(code as u16);
    }
    for node in 2..NODE_COUNT {
        let parent = tree.nodes[node].parent;
        assert!(tree.nodes[node].weight >= 0);
        if parent != ROOT {
            assert!(tree.nodes[node].weight <= tree.nodes[parent].weight,"node {} outweighs parent {}",node,parent);
        }
    }
}

#[test]
fn weights_halve_at_ceiling() {
    let mut tree = AdaptiveTree::create();
    let mut seed = 1;
    let mut drops = 0;
    let mut last = 0;
    for _i in 0..3000 {
        tree.update((lcg(&mut seed) % NUM_SYMBOLS as u32) as u16);
        let root = tree.nodes[ROOT].weight;
        assert!(root < MAX_WEIGHT);
        if root < last {
            drops += 1;
        }
        last = root;
    }
    assert!(drops > 0);
}

#[test]
fn halving_keeps_shape() {
    let mut tree = AdaptiveTree::create();
    for c in [1,1,1,2,2,300,300,300,300,256] {
        tree.update(c);
    }
    let before: Vec<(i16,usize,[usize;2])> = tree.nodes.iter().map(|n| (n.weight,n.parent,n.son)).collect();
    tree.halve();
    for (node,(w,p,s)) in tree.nodes.iter().zip(before) {
        assert_eq!(node.weight,w >> 1);
        assert_eq!(node.parent,p);
        assert_eq!(node.son,s);
    }
}

#[test]
fn truncated_walk() {
    let mut tree = AdaptiveTree::create();
    let mut reader = BitReader::create(&[]);
    assert_eq!(tree.decode_symbol(&mut reader),Err(DecodeError::TruncatedInput));
}
