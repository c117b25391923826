//! Ordered multiway tree keyed by any totally ordered key, intended to hold
//! `(hilbert index, payload)` pairs for a spatial index.
//!
//! The tree is in-memory and single-writer: `&mut self` on `put` and `&self`
//! on `get`/`range` encode the caller-side reader/writer discipline. Range
//! scans are pull-based iterators that re-walk from the root on every call,
//! so dropping a scan early wastes at most the descent frames already on its
//! stack.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::hilbert;
use crate::layout;
use crate::node::{Entry, MemoryNode, NodeStore};

/// Smallest maximum fan-out the tree accepts. Fan-out must also be even.
pub const MIN_FANOUT: usize = 4;

/// Total order used to route descent. Defaults to `K::cmp`.
pub type Comparator<K> = fn(&K, &K) -> Ordering;

/// Geometry of one spatial store: curve depth and dimensionality plus the
/// tree fan-out. An external page store persists this next to its pages;
/// here it only travels as a YAML string.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TreeConfig {
    pub bits: u32,
    pub dims: usize,
    pub max_children: usize,
}

impl TreeConfig {
    pub fn default() -> Self {
        Self {
            bits: 16,
            dims: 2,
            max_children: 64,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.bits == 0 || self.bits > hilbert::MAX_BITS {
            return Err(Error::InvalidBits(self.bits));
        }
        if self.dims == 0 {
            return Err(Error::InvalidDimensions(self.dims));
        }
        if self.max_children < MIN_FANOUT || self.max_children % 2 != 0 {
            return Err(Error::InvalidFanout(self.max_children));
        }
        Ok(())
    }

    pub fn from_yaml(serialized: &str) -> Result<Self, Error> {
        let config: Self =
            serde_yaml::from_str(serialized).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, Error> {
        serde_yaml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Width in bytes of one serialized `(index, point)` entry record.
    pub fn record_size(&self) -> usize {
        layout::record_size(self.bits, self.dims)
    }
}

/// In-memory multiway search tree.
///
/// Keys route descent through routing entries whose key equals the first key
/// reachable in their child subtree. Every non-root node holds between
/// `max_children / 2` and `max_children` entries, and all leaves sit at
/// depth `height`. Duplicate keys coexist: `put` never overwrites, and
/// `size` counts every insertion.
pub struct BTree<K, V, S: NodeStore<K, V> = MemoryNode<K, V>> {
    root: S,
    height: usize,
    size: usize,
    max_children: usize,
    comparator: Comparator<K>,
    _values: PhantomData<fn() -> V>,
}

impl<K: Ord, V, S: NodeStore<K, V>> BTree<K, V, S> {
    pub fn new(max_children: usize) -> Result<Self, Error> {
        Self::with_comparator(max_children, K::cmp)
    }
}

impl<K, V, S: NodeStore<K, V>> BTree<K, V, S> {
    pub fn with_comparator(
        max_children: usize,
        comparator: Comparator<K>,
    ) -> Result<Self, Error> {
        if max_children < MIN_FANOUT || max_children % 2 != 0 {
            return Err(Error::InvalidFanout(max_children));
        }
        Ok(Self {
            root: S::empty(max_children),
            height: 0,
            size: 0,
            max_children,
            comparator,
            _values: PhantomData,
        })
    }

    /// Number of entries inserted so far, duplicates included.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// 0 while the root is a leaf; grows by one on every root split.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Point lookup. Returns the first match found, or `None`.
    pub fn get(&self, key: &K) -> Option<&V> {
        Self::search(&self.root, key, self.height, self.comparator)
    }

    fn search<'a>(x: &'a S, key: &K, ht: usize, cmp: Comparator<K>) -> Option<&'a V> {
        if ht == 0 {
            // leaf
            for j in 0..x.len() {
                if cmp(key, x.key(j)) == Ordering::Equal {
                    return x.value(j);
                }
            }
            None
        } else {
            // internal: last entry j such that j is final or key < key(j+1)
            for j in 0..x.len() {
                if j + 1 == x.len() || cmp(key, x.key(j + 1)) == Ordering::Less {
                    return Self::search(x.child(j), key, ht - 1, cmp);
                }
            }
            None
        }
    }

    /// Inserts `(key, value)`. An equal key coexists with the entries
    /// already present and lands after them.
    pub fn put(&mut self, key: K, value: V)
    where
        K: Clone,
    {
        let overflow = Self::insert_into(&mut self.root, key, value, self.height, self.comparator);
        self.size += 1;
        if let Some(sibling) = overflow {
            // the root split: give it a new parent
            let old_root = std::mem::replace(&mut self.root, S::empty(self.max_children));
            self.root = old_root.make_parent_with(sibling);
            self.height += 1;
            debug!("root split, height is now {}", self.height);
        }
    }

    fn insert_into(h: &mut S, key: K, value: V, ht: usize, cmp: Comparator<K>) -> Option<S>
    where
        K: Clone,
    {
        if ht == 0 {
            // leaf: first slot whose key is strictly greater
            let mut j = 0;
            while j < h.len() && cmp(&key, h.key(j)) != Ordering::Less {
                j += 1;
            }
            h.insert(j, Entry::leaf(key, value));
        } else {
            debug_assert!(h.len() > 0);
            let mut j = 0;
            loop {
                if j + 1 == h.len() || cmp(&key, h.key(j + 1)) == Ordering::Less {
                    match Self::insert_into(h.child_mut(j), key, value, ht - 1, cmp) {
                        None => return None,
                        Some(sibling) => {
                            // route to the new sibling by its first key
                            let routing_key = sibling.key(0).clone();
                            h.insert(j + 1, Entry::internal(routing_key, sibling));
                            break;
                        }
                    }
                }
                j += 1;
            }
        }

        if h.is_full() {
            Some(h.split())
        } else {
            None
        }
    }

    /// Lazy scan of all values with key in `[lower, upper)`, in ascending
    /// key order. Each call re-walks from the root against the tree's
    /// current state; `lower >= upper` yields an empty iterator without
    /// touching the tree.
    pub fn range(&self, lower: K, upper: K) -> Range<'_, K, V, S> {
        let mut stack = Vec::new();
        if (self.comparator)(&lower, &upper) == Ordering::Less {
            stack.push(Frame {
                node: &self.root,
                height: self.height,
                cursor: 0,
            });
        }
        let visited = stack.len();
        Range {
            stack,
            lower,
            upper,
            comparator: self.comparator,
            visited,
            _values: PhantomData,
        }
    }
}

struct Frame<'a, S> {
    node: &'a S,
    height: usize,
    cursor: usize,
}

/// Streaming range scan over a [`BTree`].
///
/// Internal nodes descend into child `j` whenever `j` is the last entry or
/// `lower < key(j+1)`; that over-includes subtrees near the boundary but
/// never skips a match. Leaves are visited left to right and filtered
/// entry by entry.
pub struct Range<'a, K, V, S: NodeStore<K, V>> {
    stack: Vec<Frame<'a, S>>,
    lower: K,
    upper: K,
    comparator: Comparator<K>,
    visited: usize,
    _values: PhantomData<fn() -> V>,
}

impl<'a, K, V, S: NodeStore<K, V>> Range<'a, K, V, S> {
    /// Nodes touched so far, the root included. An abandoned scan stops at
    /// the frames already pushed, so this stays `O(height)` past the last
    /// emitted value.
    pub fn visited_nodes(&self) -> usize {
        self.visited
    }

    fn less(&self, a: &K, b: &K) -> bool {
        (self.comparator)(a, b) == Ordering::Less
    }
}

impl<'a, K, V: 'a, S: NodeStore<K, V>> Iterator for Range<'a, K, V, S> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        loop {
            let depth = self.stack.len();
            let (node, height, cursor) = match self.stack.last() {
                None => return None,
                Some(f) => (f.node, f.height, f.cursor),
            };

            if height == 0 {
                // leaf: emit entries inside [lower, upper)
                let mut j = cursor;
                while j < node.len() {
                    let k = node.key(j);
                    if !self.less(k, &self.lower) && self.less(k, &self.upper) {
                        self.stack[depth - 1].cursor = j + 1;
                        return Some(node.value(j).expect("leaf entry has no value"));
                    }
                    j += 1;
                }
                self.stack.pop();
            } else {
                // internal: descend into the next admissible child
                let mut j = cursor;
                let mut descended = false;
                while j < node.len() {
                    if j + 1 == node.len() || self.less(&self.lower, node.key(j + 1)) {
                        self.stack[depth - 1].cursor = j + 1;
                        self.stack.push(Frame {
                            node: node.child(j),
                            height: height - 1,
                            cursor: 0,
                        });
                        self.visited += 1;
                        descended = true;
                        break;
                    }
                    j += 1;
                }
                if !descended {
                    self.stack.pop();
                }
            }
        }
    }
}

impl<K, V, S> fmt::Display for BTree<K, V, S>
where
    K: fmt::Display,
    V: fmt::Display,
    S: NodeStore<K, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_node(f, &self.root, self.height, "")
    }
}

fn fmt_node<K, V, S>(f: &mut fmt::Formatter<'_>, h: &S, ht: usize, indent: &str) -> fmt::Result
where
    K: fmt::Display,
    V: fmt::Display,
    S: NodeStore<K, V>,
{
    if ht == 0 {
        for j in 0..h.len() {
            match h.value(j) {
                Some(v) => writeln!(f, "{}{} {}", indent, h.key(j), v)?,
                None => writeln!(f, "{}{}", indent, h.key(j))?,
            }
        }
    } else {
        let deeper = format!("{}     ", indent);
        for j in 0..h.len() {
            if j > 0 {
                writeln!(f, "{}({})", indent, h.key(j))?;
            }
            fmt_node(f, h.child(j), ht - 1, &deeper)?;
        }
    }
    Ok(())
}
