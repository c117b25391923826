//! Entry model and the capability surface a tree node must expose.
//!
//! The tree algorithm only ever talks to nodes through [`NodeStore`], so the
//! array-backed [`MemoryNode`] can later be joined by a paged, disk-backed
//! implementation without touching the tree itself. Whether a node is a leaf
//! or internal is a property of its depth in the tree, not a per-node flag.

/// One slot of a node: a key plus either a leaf payload or a child link.
#[derive(Debug)]
pub struct Entry<K, V, S> {
    key: K,
    value: Option<V>,
    child: Option<Box<S>>,
}

impl<K, V, S> Entry<K, V, S> {
    /// Leaf entry: carries a value, no child.
    pub fn leaf(key: K, value: V) -> Self {
        Self {
            key,
            value: Some(value),
            child: None,
        }
    }

    /// Routing entry: carries a child, no value. `key` must equal the first
    /// key reachable in the child subtree.
    pub fn internal(key: K, child: S) -> Self {
        Self {
            key,
            value: None,
            child: Some(Box::new(child)),
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn child(&self) -> Option<&S> {
        self.child.as_deref()
    }

    pub fn child_mut(&mut self) -> Option<&mut S> {
        self.child.as_deref_mut()
    }
}

/// Capability surface the tree algorithm needs from a node storage strategy.
///
/// Entries are kept sorted ascending by key; `insert` trusts the position the
/// caller found during descent and never re-sorts.
pub trait NodeStore<K, V>: Sized {
    /// A node with no entries and room for `max_children` of them.
    fn empty(max_children: usize) -> Self;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, j: usize) -> &Entry<K, V, Self>;

    fn key(&self, j: usize) -> &K;

    fn value(&self, j: usize) -> Option<&V>;

    /// Child of routing entry `j`. Panics if entry `j` is a leaf entry,
    /// which is a structural bug, not a caller error.
    fn child(&self, j: usize) -> &Self;

    fn child_mut(&mut self, j: usize) -> &mut Self;

    /// Inserts `entry` at position `j`, shifting later entries right.
    fn insert(&mut self, j: usize, entry: Entry<K, V, Self>);

    fn is_full(&self) -> bool;

    /// Keeps the lower half of the entries in place and returns a new
    /// sibling holding the upper half. Only called on a full node.
    fn split(&mut self) -> Self;

    /// Consumes a just-split root and its new sibling and returns their new
    /// two-entry parent.
    fn make_parent_with(self, sibling: Self) -> Self
    where
        K: Clone;
}

/// Array-backed in-memory node.
#[derive(Debug)]
pub struct MemoryNode<K, V> {
    max_children: usize,
    entries: Vec<Entry<K, V, Self>>,
}

impl<K, V> NodeStore<K, V> for MemoryNode<K, V> {
    fn empty(max_children: usize) -> Self {
        Self {
            max_children,
            entries: Vec::with_capacity(max_children),
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn entry(&self, j: usize) -> &Entry<K, V, Self> {
        &self.entries[j]
    }

    fn key(&self, j: usize) -> &K {
        self.entries[j].key()
    }

    fn value(&self, j: usize) -> Option<&V> {
        self.entries[j].value()
    }

    fn child(&self, j: usize) -> &Self {
        self.entries[j].child().expect("routing entry has no child")
    }

    fn child_mut(&mut self, j: usize) -> &mut Self {
        self.entries[j]
            .child_mut()
            .expect("routing entry has no child")
    }

    fn insert(&mut self, j: usize, entry: Entry<K, V, Self>) {
        self.entries.insert(j, entry);
    }

    fn is_full(&self) -> bool {
        self.entries.len() == self.max_children
    }

    fn split(&mut self) -> Self {
        debug_assert!(self.is_full());
        let upper = self.entries.split_off(self.max_children / 2);
        Self {
            max_children: self.max_children,
            entries: upper,
        }
    }

    fn make_parent_with(self, sibling: Self) -> Self
    where
        K: Clone,
    {
        let mut parent = Self::empty(self.max_children);
        let low_key = self.key(0).clone();
        let high_key = sibling.key(0).clone();
        parent.entries.push(Entry::internal(low_key, self));
        parent.entries.push(Entry::internal(high_key, sibling));
        parent
    }
}
