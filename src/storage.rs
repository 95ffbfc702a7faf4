//! Node arena.
//!
//! Nodes live in a plain `Vec<Node>` indexed by node id; the unique tables in
//! [`subtable`][crate::subtable] map children to these ids. Next to every node
//! the arena keeps its external reference count, i.e. the number of live
//! handles the callers hold on it. Freed cells are recycled through a free list.

use crate::node::Node;

#[derive(Debug, Clone)]
struct Entry {
    node: Node,
    refs: u32,
    occupied: bool,
}

pub struct Storage {
    data: Vec<Entry>,
    free: Vec<u32>,
    /// Number of occupied cells, including the terminal.
    real_size: usize,
    /// Largest `real_size` ever observed.
    peak_size: usize,
}

impl Storage {
    /// Create a new storage with room for `2^bits` nodes before reallocation.
    ///
    /// The terminal node is allocated at index 0.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Storage bits should be in the range 0..=31");

        let mut data = Vec::with_capacity(1 << bits);
        data.push(Entry {
            node: Node::TERMINAL,
            refs: 0,
            occupied: true,
        });

        Self {
            data,
            free: Vec::new(),
            real_size: 1,
            peak_size: 1,
        }
    }

    /// Get the number of allocated cells (occupied or free).
    pub fn size(&self) -> usize {
        self.data.len()
    }
    /// Get the number of occupied cells.
    pub fn real_size(&self) -> usize {
        self.real_size
    }
    pub fn peak_size(&self) -> usize {
        self.peak_size
    }

    pub fn is_occupied(&self, id: u32) -> bool {
        self.data.get(id as usize).is_some_and(|e| e.occupied)
    }

    pub fn node(&self, id: u32) -> Node {
        let entry = &self.data[id as usize];
        debug_assert!(entry.occupied, "Node {} is not occupied", id);
        entry.node
    }

    /// Store a new node and return its id.
    pub fn add(&mut self, node: Node) -> u32 {
        let id = match self.free.pop() {
            Some(id) => {
                self.data[id as usize] = Entry {
                    node,
                    refs: 0,
                    occupied: true,
                };
                id
            }
            None => {
                let id = self.data.len() as u32;
                self.data.push(Entry {
                    node,
                    refs: 0,
                    occupied: true,
                });
                id
            }
        };
        self.real_size += 1;
        self.peak_size = self.peak_size.max(self.real_size);
        id
    }

    /// Release the cell at the given id.
    pub fn drop(&mut self, id: u32) {
        assert_ne!(id, 0, "Terminal node cannot be dropped");
        let entry = &mut self.data[id as usize];
        debug_assert!(entry.occupied);
        entry.occupied = false;
        entry.refs = 0;
        self.free.push(id);
        self.real_size -= 1;
    }

    pub fn refs(&self, id: u32) -> u32 {
        self.data[id as usize].refs
    }

    pub fn inc_ref(&mut self, id: u32) {
        let entry = &mut self.data[id as usize];
        entry.refs = entry.refs.saturating_add(1);
    }

    /// Decrement the reference count, returning the new value.
    pub fn dec_ref(&mut self, id: u32) -> u32 {
        let entry = &mut self.data[id as usize];
        entry.refs = entry.refs.saturating_sub(1);
        entry.refs
    }

    /// Ids of all occupied non-terminal nodes with a positive reference count.
    pub fn referenced(&self) -> impl Iterator<Item = u32> + '_ {
        self.data
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, e)| e.occupied && e.refs > 0)
            .map(|(i, _)| i as u32)
    }
}
