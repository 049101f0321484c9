use std::borrow::Borrow;
use std::cmp::Ordering;
use std::mem;

use log::{debug, trace};
#[cfg(feature = "serde")]
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::entry::{Entry, OccupiedEntry, VacantEntry};
use crate::index::{DefaultIx, IndexType, NodeIndex};
use crate::iter::{IntoIter, Iter, Keys, Values};
use crate::node::{Color, Node};

/// An ordered key-value map backed by a red-black tree.
///
/// With the `serde` feature the arena is serialized as is. Deserialization
/// rejects layouts whose links leave the arena or disagree with their parents.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RbTreeMap<K, V, Ix = DefaultIx> {
    /// Vector that stores nodes, the sentinel lives at index 0
    pub(crate) nodes: Vec<Node<K, V, Ix>>,
    /// Root of the tree, `None` when the map is empty
    pub(crate) root: Option<NodeIndex<Ix>>,
    /// Number of elements in the map
    pub(crate) len: usize,
}

/// Serialized form of a map, checked before it is handed out.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct ArenaLayout<K, V, Ix> {
    nodes: Vec<Node<K, V, Ix>>,
    root: Option<NodeIndex<Ix>>,
    len: usize,
}

#[cfg(feature = "serde")]
impl<K, V, Ix> ArenaLayout<K, V, Ix>
where
    Ix: IndexType,
{
    fn validate(&self) -> Result<(), String> {
        let size = self.nodes.len();
        let Some(sentinel) = self.nodes.first() else {
            return Err("missing sentinel node".to_owned());
        };
        if sentinel.key.is_some()
            || sentinel.value.is_some()
            || sentinel.is_red()
            || !sentinel.left.is_sentinel()
            || !sentinel.right.is_sentinel()
            || !sentinel.parent.is_sentinel()
        {
            return Err("malformed sentinel node".to_owned());
        }
        if self.len + 1 != size {
            return Err(format!("len {} does not match {} nodes", self.len, size - 1));
        }
        match self.root {
            None if self.len != 0 => return Err("non-empty map without root".to_owned()),
            Some(root)
                if root.is_sentinel()
                    || root.index() >= size
                    || !self.nodes[root.index()].parent.is_sentinel() =>
            {
                return Err(format!("invalid root {root:?}"));
            }
            _ => {}
        }
        for (i, node) in self.nodes.iter().enumerate().skip(1) {
            if node.key.is_none() || node.value.is_none() {
                return Err(format!("node {i} holds no entry"));
            }
            if node.parent.index() >= size {
                return Err(format!("node {i} has parent {:?} out of range", node.parent));
            }
            for child in [node.left, node.right] {
                if child.index() >= size {
                    return Err(format!("node {i} has child {child:?} out of range"));
                }
                if !child.is_sentinel() && self.nodes[child.index()].parent.index() != i {
                    return Err(format!("child {child:?} does not point back to node {i}"));
                }
            }
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, Ix> Deserialize<'de> for RbTreeMap<K, V, Ix>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
    Ix: IndexType + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let layout = ArenaLayout::deserialize(deserializer)?;
        layout.validate().map_err(de::Error::custom)?;
        Ok(Self {
            nodes: layout.nodes,
            root: layout.root,
            len: layout.len,
        })
    }
}

impl<K, V, Ix> RbTreeMap<K, V, Ix>
where
    K: Ord,
    Ix: IndexType,
{
    /// Creates a new `RbTreeMap` with estimated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut nodes = vec![Node::new_sentinel()];
        nodes.reserve(capacity);
        RbTreeMap {
            nodes,
            root: None,
            len: 0,
        }
    }

    /// Insert a key-value pair into the map.
    /// If the key exists, overwrite and return the previous value.
    ///
    /// # Panics
    ///
    /// This method panics when the tree is at the maximum number of nodes for its index
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// assert_eq!(map.insert(1, "a"), None);
    /// assert_eq!(map.insert(1, "b"), Some("a"));
    /// assert_eq!(map.insert(1, "c"), Some("b"));
    /// assert_eq!(map.len(), 1);
    /// ```
    #[inline]
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.search(&key) {
            (_, Some(node_idx)) => self.node_mut(node_idx, Node::set_value(value)),
            (parent, None) => {
                let _ignore = self.insert_inner(parent, key, value);
                None
            }
        }
    }

    /// Remove a key from the map, returning the value at the key if the key exists
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    /// assert_eq!(map.len(), 2);
    /// assert_eq!(map.remove(&3), None);
    /// assert_eq!(map.len(), 2);
    /// assert_eq!(map.remove(&2), Some("b"));
    /// assert_eq!(map.len(), 1);
    /// ```
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Remove a key from the map, returning the stored key and value if the key exists
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// map.insert(String::from("a"), 1);
    /// assert_eq!(map.remove_entry("a"), Some((String::from("a"), 1)));
    /// assert_eq!(map.remove_entry("a"), None);
    /// ```
    #[inline]
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (_, found) = self.search(key);
        found.map(|node_idx| self.remove_inner(node_idx))
    }

    /// Return reference to the value corresponding to the key.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// map.insert(1, "a");
    /// map.insert(7, "b");
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&7), Some(&"b"));
    /// assert_eq!(map.get(&5), None);
    /// ```
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search(key).1.map(|idx| self.node_ref(idx, Node::value))
    }

    /// Return references to the stored key and value corresponding to the key.
    #[inline]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search(key).1.map(|idx| self.node_ref(idx, Node::entry))
    }

    /// Return a mutable reference to the value corresponding to the key.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// map.insert(3, 0);
    /// map.get_mut(&3).map(|v| *v += 1);
    /// assert_eq!(map.get(&3), Some(&1));
    /// ```
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search(key)
            .1
            .map(|idx| self.node_mut(idx, Node::value_mut))
    }

    /// Return `true` if the map contains a value for the key.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search(key).1.is_some()
    }

    /// Return the entry with the minimum key.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// assert_eq!(map.first_key_value(), None);
    /// map.insert(5, "b");
    /// map.insert(1, "a");
    /// assert_eq!(map.first_key_value(), Some((&1, &"a")));
    /// ```
    #[inline]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.root
            .map(|root| self.node_ref(self.tree_minimum(root), Node::entry))
    }

    /// Return the entry with the maximum key.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// assert_eq!(map.last_key_value(), None);
    /// map.insert(5, "b");
    /// map.insert(1, "a");
    /// assert_eq!(map.last_key_value(), Some((&5, &"b")));
    /// ```
    #[inline]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.root
            .map(|root| self.node_ref(self.tree_maximum(root), Node::entry))
    }

    /// Return the entry with the greatest key strictly less than the given key.
    ///
    /// The given key does not need to be present in the map.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::RbTreeMap;
    ///
    /// let map: RbTreeMap<_, _> = [(10, "a"), (20, "b"), (30, "c")].into_iter().collect();
    /// assert_eq!(map.predecessor(&20), Some((&10, &"a")));
    /// assert_eq!(map.predecessor(&25), Some((&20, &"b")));
    /// assert_eq!(map.predecessor(&10), None);
    /// ```
    #[inline]
    pub fn predecessor<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut x = self.root_or_sentinel();
        let mut candidate = None;
        while !x.is_sentinel() {
            let x_key: &Q = self.node_ref(x, Node::key).borrow();
            if x_key < key {
                candidate = Some(x);
                x = self.node_ref(x, Node::right);
            } else {
                x = self.node_ref(x, Node::left);
            }
        }
        candidate.map(|idx| self.node_ref(idx, Node::entry))
    }

    /// Return the entry with the smallest key strictly greater than the given key.
    ///
    /// The given key does not need to be present in the map.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::RbTreeMap;
    ///
    /// let map: RbTreeMap<_, _> = [(10, "a"), (20, "b"), (30, "c")].into_iter().collect();
    /// assert_eq!(map.successor(&20), Some((&30, &"c")));
    /// assert_eq!(map.successor(&5), Some((&10, &"a")));
    /// assert_eq!(map.successor(&30), None);
    /// ```
    #[inline]
    pub fn successor<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut x = self.root_or_sentinel();
        let mut candidate = None;
        while !x.is_sentinel() {
            let x_key: &Q = self.node_ref(x, Node::key).borrow();
            if x_key > key {
                candidate = Some(x);
                x = self.node_ref(x, Node::left);
            } else {
                x = self.node_ref(x, Node::right);
            }
        }
        candidate.map(|idx| self.node_ref(idx, Node::entry))
    }

    /// Get the given key's corresponding entry in the map for in-place manipulation.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::{Entry, RbTreeMap};
    ///
    /// let mut map = RbTreeMap::new();
    ///
    /// assert!(matches!(map.entry(1), Entry::Vacant(_)));
    /// map.entry(1).or_insert(0);
    /// assert!(matches!(map.entry(1), Entry::Occupied(_)));
    /// map.entry(1).and_modify(|v| *v += 1);
    /// assert_eq!(map.get(&1), Some(&1));
    /// ```
    #[inline]
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, Ix> {
        match self.search(&key) {
            (_, Some(node_idx)) => Entry::Occupied(OccupiedEntry {
                map_ref: self,
                node_idx,
            }),
            (parent, None) => Entry::Vacant(VacantEntry {
                map_ref: self,
                key,
                parent,
            }),
        }
    }

    /// Get an iterator over the entries of the map, sorted by key.
    #[inline]
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V, Ix> {
        Iter::new(self)
    }

    /// Get an iterator over the keys of the map, in sorted order.
    #[inline]
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V, Ix> {
        Keys { inner: self.iter() }
    }

    /// Get an iterator over the values of the map, in order by key.
    #[inline]
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V, Ix> {
        Values { inner: self.iter() }
    }

    /// Return the number of nodes on the longest path from the root to a leaf.
    ///
    /// A red-black tree holding `n` entries never exceeds `2 * log2(n + 1)`.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::RbTreeMap;
    ///
    /// let map: RbTreeMap<_, _> = (0..1024).map(|i| (i, ())).collect();
    /// assert!(map.height() <= 20);
    /// ```
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack: Vec<(NodeIndex<Ix>, usize)> =
            self.root.map(|root| (root, 1)).into_iter().collect();
        while let Some((x, depth)) = stack.pop() {
            height = height.max(depth);
            for child in [self.node_ref(x, Node::left), self.node_ref(x, Node::right)] {
                if !child.is_sentinel() {
                    stack.push((child, depth + 1));
                }
            }
        }
        height
    }

    /// Remove all elements from the map
    #[inline]
    pub fn clear(&mut self) {
        debug!("clearing map of {} entries", self.len);
        self.nodes.clear();
        self.nodes.push(Node::new_sentinel());
        self.root = None;
        self.len = 0;
    }

    /// Return the number of elements in the map.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return `true` if the map contains no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> RbTreeMap<K, V>
where
    K: Ord,
{
    /// Create an empty `RbTreeMap`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new_sentinel()],
            root: None,
            len: 0,
        }
    }
}

impl<K, V, Ix> Default for RbTreeMap<K, V, Ix>
where
    K: Ord,
    Ix: IndexType,
{
    #[inline]
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<K, V, Ix> FromIterator<(K, V)> for RbTreeMap<K, V, Ix>
where
    K: Ord,
    Ix: IndexType,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, Ix> Extend<(K, V)> for RbTreeMap<K, V, Ix>
where
    K: Ord,
    Ix: IndexType,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            let _ignore = self.insert(key, value);
        }
    }
}

impl<'a, K, V, Ix> IntoIterator for &'a RbTreeMap<K, V, Ix>
where
    K: Ord,
    Ix: IndexType,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, Ix>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, Ix> IntoIterator for RbTreeMap<K, V, Ix>
where
    K: Ord,
    Ix: IndexType,
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, Ix>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<K, V, Ix> RbTreeMap<K, V, Ix>
where
    K: Ord,
    Ix: IndexType,
{
    /// Link a new node below `parent` and rebalance. Returns the index of the new node.
    ///
    /// `parent` must be the insertion point returned by `search` for `key`.
    pub(crate) fn insert_inner(&mut self, parent: NodeIndex<Ix>, key: K, value: V) -> NodeIndex<Ix> {
        let z = NodeIndex::new(self.nodes.len());
        // check for max capacity, except if we use usize
        assert!(
            <Ix as IndexType>::max().index() == !0 || NodeIndex::end() != z,
            "Reached maximum number of nodes"
        );
        let go_left = !parent.is_sentinel() && key < *self.node_ref(parent, Node::key);
        self.nodes.push(Node::new_leaf(key, value));

        if parent.is_sentinel() {
            debug_assert!(self.root.is_none(), "only an empty tree has no insertion parent");
            self.node_mut(z, Node::set_color(Color::Black));
            self.root = Some(z);
        } else {
            self.node_mut(z, Node::set_parent(parent));
            if go_left {
                self.node_mut(parent, Node::set_left(z));
            } else {
                self.node_mut(parent, Node::set_right(z));
            }
            self.insert_fixup(z);
        }

        self.len = self.len.wrapping_add(1);
        z
    }

    /// Remove a node from the tree and release its slot. Returns the removed entry.
    pub(crate) fn remove_inner(&mut self, z: NodeIndex<Ix>) -> (K, V) {
        let mut target = z;
        if !self.node_ref(z, Node::left).is_sentinel()
            && !self.node_ref(z, Node::right).is_sentinel()
        {
            // Keep `z` in place and delete its in-order predecessor instead.
            let pred = self.tree_maximum(self.node_ref(z, Node::left));
            self.swap_entries(z, pred);
            target = pred;
        }
        self.unlink(target);
        let node = self.release(target);
        self.len = self.len.wrapping_sub(1);
        node.into_entry()
    }

    /// Detach a node with at most one child from the tree.
    fn unlink(&mut self, z: NodeIndex<Ix>) {
        let parent = self.node_ref(z, Node::parent);
        let child = if self.node_ref(z, Node::left).is_sentinel() {
            self.node_ref(z, Node::right)
        } else {
            self.node_ref(z, Node::left)
        };

        if !child.is_sentinel() {
            debug_assert!(
                self.node_ref(z, Node::is_black) && self.node_ref(child, Node::is_red),
                "a node with exactly one child must be black with a red child"
            );
            self.transplant(z, child);
            self.node_mut(child, Node::set_color(Color::Black));
            return;
        }

        self.transplant(z, NodeIndex::SENTINEL);
        if self.node_ref(z, Node::is_black) && !parent.is_sentinel() {
            self.remove_fixup(NodeIndex::SENTINEL, parent);
        }
    }

    /// Search for the node with exactly the given key.
    ///
    /// Returns the insertion parent together with the matching node. On a hit the
    /// insertion parent is the parent of the matching node, on a miss it is the last
    /// real node visited (the sentinel when the tree is empty).
    pub(crate) fn search<Q>(&self, key: &Q) -> (NodeIndex<Ix>, Option<NodeIndex<Ix>>)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut parent = NodeIndex::SENTINEL;
        let mut x = self.root_or_sentinel();
        while !x.is_sentinel() {
            let x_key: &Q = self.node_ref(x, Node::key).borrow();
            match key.cmp(x_key) {
                Ordering::Less => {
                    parent = x;
                    x = self.node_ref(x, Node::left);
                }
                Ordering::Greater => {
                    parent = x;
                    x = self.node_ref(x, Node::right);
                }
                Ordering::Equal => return (self.node_ref(x, Node::parent), Some(x)),
            }
        }
        (parent, None)
    }

    /// Restore red-black tree properties after an insert.
    fn insert_fixup(&mut self, mut z: NodeIndex<Ix>) {
        while let Some(parent) = self.parent_of(z) {
            if self.node_ref(parent, Node::is_black) {
                break;
            }
            // A red parent is never the root, so the grandparent exists.
            let Some(grand_parent) = self.grand_parent_of(z) else {
                break;
            };
            let uncle = self.uncle_of(z).unwrap_or(NodeIndex::SENTINEL);

            if self.node_ref(uncle, Node::is_red) {
                trace!("insert fixup: red uncle {uncle:?}, recolor and move up to {grand_parent:?}");
                self.node_mut(parent, Node::set_color(Color::Black));
                self.node_mut(uncle, Node::set_color(Color::Black));
                self.node_mut(grand_parent, Node::set_color(Color::Red));
                z = grand_parent;
                continue;
            }

            if self.is_left_child(parent) {
                if self.is_right_child(z) {
                    trace!("insert fixup: zig-zag at {z:?}, rotate {parent:?} left");
                    self.left_rotate(parent);
                    z = parent;
                    continue;
                }
                trace!("insert fixup: straight line at {z:?}, rotate {grand_parent:?} right");
                self.right_rotate(grand_parent);
            } else {
                if self.is_left_child(z) {
                    trace!("insert fixup: zig-zag at {z:?}, rotate {parent:?} right");
                    self.right_rotate(parent);
                    z = parent;
                    continue;
                }
                trace!("insert fixup: straight line at {z:?}, rotate {grand_parent:?} left");
                self.left_rotate(grand_parent);
            }
            self.node_mut(parent, Node::toggle_color);
            self.node_mut(grand_parent, Node::toggle_color);
            break;
        }
        if let Some(root) = self.root {
            self.node_mut(root, Node::set_color(Color::Black));
        }
    }

    /// Restore red-black tree properties after a remove.
    ///
    /// `x` carries one black too few and sits below `parent`. `x` may be the sentinel,
    /// in which case `parent` tells on which side of it the sentinel stands.
    fn remove_fixup(&mut self, mut x: NodeIndex<Ix>, mut parent: NodeIndex<Ix>) {
        while !parent.is_sentinel() && self.node_ref(x, Node::is_black) {
            let mut w;
            if self.node_ref(parent, Node::left) == x {
                w = self.node_ref(parent, Node::right);
                if self.node_ref(w, Node::is_red) {
                    trace!("remove fixup: red sibling {w:?}, rotate {parent:?} left");
                    self.node_mut(w, Node::set_color(Color::Black));
                    self.node_mut(parent, Node::set_color(Color::Red));
                    self.left_rotate(parent);
                    w = self.node_ref(parent, Node::right);
                }
                if self.left_ref(w, Node::is_black) && self.right_ref(w, Node::is_black) {
                    trace!("remove fixup: black nephews, move up to {parent:?}");
                    self.node_mut(w, Node::set_color(Color::Red));
                    x = parent;
                    parent = self.node_ref(x, Node::parent);
                } else if self.right_ref(w, Node::is_red) {
                    trace!("remove fixup: red far nephew, rotate {parent:?} left");
                    self.node_mut(w, Node::set_color(self.node_ref(parent, Node::color)));
                    self.node_mut(parent, Node::set_color(Color::Black));
                    self.right_mut(w, Node::set_color(Color::Black));
                    self.left_rotate(parent);
                    break;
                } else {
                    trace!("remove fixup: red near nephew, rotate {w:?} right");
                    self.left_mut(w, Node::set_color(Color::Black));
                    self.node_mut(w, Node::set_color(Color::Red));
                    self.right_rotate(w);
                }
            } else {
                w = self.node_ref(parent, Node::left);
                if self.node_ref(w, Node::is_red) {
                    trace!("remove fixup: red sibling {w:?}, rotate {parent:?} right");
                    self.node_mut(w, Node::set_color(Color::Black));
                    self.node_mut(parent, Node::set_color(Color::Red));
                    self.right_rotate(parent);
                    w = self.node_ref(parent, Node::left);
                }
                if self.right_ref(w, Node::is_black) && self.left_ref(w, Node::is_black) {
                    trace!("remove fixup: black nephews, move up to {parent:?}");
                    self.node_mut(w, Node::set_color(Color::Red));
                    x = parent;
                    parent = self.node_ref(x, Node::parent);
                } else if self.left_ref(w, Node::is_red) {
                    trace!("remove fixup: red far nephew, rotate {parent:?} right");
                    self.node_mut(w, Node::set_color(self.node_ref(parent, Node::color)));
                    self.node_mut(parent, Node::set_color(Color::Black));
                    self.left_mut(w, Node::set_color(Color::Black));
                    self.right_rotate(parent);
                    break;
                } else {
                    trace!("remove fixup: red near nephew, rotate {w:?} left");
                    self.right_mut(w, Node::set_color(Color::Black));
                    self.node_mut(w, Node::set_color(Color::Red));
                    self.left_rotate(w);
                }
            }
        }
        if !x.is_sentinel() {
            self.node_mut(x, Node::set_color(Color::Black));
        }
    }

    /// Binary tree left rotate.
    fn left_rotate(&mut self, x: NodeIndex<Ix>) {
        if self.node_ref(x, Node::right).is_sentinel() {
            return;
        }
        let y = self.node_ref(x, Node::right);
        self.node_mut(x, Node::set_right(self.node_ref(y, Node::left)));
        if !self.node_ref(y, Node::left).is_sentinel() {
            self.left_mut(y, Node::set_parent(x));
        }

        self.replace_parent(x, y);
        self.node_mut(y, Node::set_left(x));
    }

    /// Binary tree right rotate.
    fn right_rotate(&mut self, x: NodeIndex<Ix>) {
        if self.node_ref(x, Node::left).is_sentinel() {
            return;
        }
        let y = self.node_ref(x, Node::left);
        self.node_mut(x, Node::set_left(self.node_ref(y, Node::right)));
        if !self.node_ref(y, Node::right).is_sentinel() {
            self.right_mut(y, Node::set_parent(x));
        }

        self.replace_parent(x, y);
        self.node_mut(y, Node::set_right(x));
    }

    /// Replace parent during a rotation.
    fn replace_parent(&mut self, x: NodeIndex<Ix>, y: NodeIndex<Ix>) {
        self.node_mut(y, Node::set_parent(self.node_ref(x, Node::parent)));
        if self.node_ref(x, Node::parent).is_sentinel() {
            self.root = Some(y);
        } else if self.is_left_child(x) {
            self.parent_mut(x, Node::set_left(y));
        } else {
            self.parent_mut(x, Node::set_right(y));
        }
        self.node_mut(x, Node::set_parent(y));
    }

    /// Find the node with the minimum key in the subtree of `x`.
    fn tree_minimum(&self, mut x: NodeIndex<Ix>) -> NodeIndex<Ix> {
        while !self.node_ref(x, Node::left).is_sentinel() {
            x = self.node_ref(x, Node::left);
        }
        x
    }

    /// Find the node with the maximum key in the subtree of `x`.
    fn tree_maximum(&self, mut x: NodeIndex<Ix>) -> NodeIndex<Ix> {
        while !self.node_ref(x, Node::right).is_sentinel() {
            x = self.node_ref(x, Node::right);
        }
        x
    }

    /// Replace one subtree as a child of its parent with another subtree.
    ///
    /// `v` may be the sentinel, whose parent link is left untouched.
    fn transplant(&mut self, u: NodeIndex<Ix>, v: NodeIndex<Ix>) {
        let parent = self.node_ref(u, Node::parent);
        if parent.is_sentinel() {
            self.root = (!v.is_sentinel()).then_some(v);
        } else if self.is_left_child(u) {
            self.node_mut(parent, Node::set_left(v));
        } else {
            self.node_mut(parent, Node::set_right(v));
        }
        if !v.is_sentinel() {
            self.node_mut(v, Node::set_parent(parent));
        }
    }

    /// Exchange the keys and values of two distinct real nodes.
    fn swap_entries(&mut self, a: NodeIndex<Ix>, b: NodeIndex<Ix>) {
        debug_assert!(a != b && !a.is_sentinel() && !b.is_sentinel());
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.nodes.split_at_mut(hi.index());
        let (x, y) = (&mut head[lo.index()], &mut tail[0]);
        mem::swap(&mut x.key, &mut y.key);
        mem::swap(&mut x.value, &mut y.value);
    }

    /// Swap-remove an unlinked node from the arena and repair the links of the
    /// node moved into its slot.
    fn release(&mut self, z: NodeIndex<Ix>) -> Node<K, V, Ix> {
        let node = self.nodes.swap_remove(z.index());
        let old = NodeIndex::<Ix>::new(self.nodes.len());
        if old != z {
            trace!("arena: moving {old:?} into released slot {z:?}");
            self.update_idx(old, z);
        }
        node
    }

    /// Update links to a node that moved from `old` to `new` inside the arena.
    fn update_idx(&mut self, old: NodeIndex<Ix>, new: NodeIndex<Ix>) {
        if self.root == Some(old) {
            self.root = Some(new);
        }
        let parent = self.node_ref(new, Node::parent);
        if !parent.is_sentinel() {
            if self.node_ref(parent, Node::left) == old {
                self.node_mut(parent, Node::set_left(new));
            } else {
                self.node_mut(parent, Node::set_right(new));
            }
        }
        if !self.node_ref(new, Node::left).is_sentinel() {
            self.left_mut(new, Node::set_parent(new));
        }
        if !self.node_ref(new, Node::right).is_sentinel() {
            self.right_mut(new, Node::set_parent(new));
        }
    }
}

// Relational lookups, each `None` when the relative does not exist.
impl<K, V, Ix> RbTreeMap<K, V, Ix>
where
    Ix: IndexType,
{
    /// Root of the tree, or the sentinel when the tree is empty.
    pub(crate) fn root_or_sentinel(&self) -> NodeIndex<Ix> {
        self.root.unwrap_or(NodeIndex::SENTINEL)
    }

    /// Parent of a real node.
    pub(crate) fn parent_of(&self, node: NodeIndex<Ix>) -> Option<NodeIndex<Ix>> {
        let parent = self.node_ref(node, Node::parent);
        (!parent.is_sentinel()).then_some(parent)
    }

    pub(crate) fn grand_parent_of(&self, node: NodeIndex<Ix>) -> Option<NodeIndex<Ix>> {
        self.parent_of(node).and_then(|parent| self.parent_of(parent))
    }

    /// The other child of the parent of a real node, possibly the sentinel.
    pub(crate) fn sibling_of(&self, node: NodeIndex<Ix>) -> Option<NodeIndex<Ix>> {
        self.parent_of(node).map(|parent| {
            if self.node_ref(parent, Node::left) == node {
                self.node_ref(parent, Node::right)
            } else {
                self.node_ref(parent, Node::left)
            }
        })
    }

    pub(crate) fn uncle_of(&self, node: NodeIndex<Ix>) -> Option<NodeIndex<Ix>> {
        self.parent_of(node).and_then(|parent| self.sibling_of(parent))
    }

    /// Check if a node is a left child of its parent.
    fn is_left_child(&self, node: NodeIndex<Ix>) -> bool {
        self.parent_ref(node, Node::left) == node
    }

    /// Check if a node is a right child of its parent.
    fn is_right_child(&self, node: NodeIndex<Ix>) -> bool {
        self.parent_ref(node, Node::right) == node
    }
}

// Convenient methods for reference or mutate current/parent/left/right node
impl<'a, K, V, Ix> RbTreeMap<K, V, Ix>
where
    Ix: IndexType,
{
    pub(crate) fn node_ref<F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<K, V, Ix>) -> R,
    {
        op(&self.nodes[node.index()])
    }

    pub(crate) fn node_mut<F, R>(&'a mut self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a mut Node<K, V, Ix>) -> R,
    {
        debug_assert!(!node.is_sentinel(), "the sentinel must never be mutated");
        op(&mut self.nodes[node.index()])
    }

    pub(crate) fn left_ref<F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<K, V, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].left().index();
        op(&self.nodes[idx])
    }

    pub(crate) fn right_ref<F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<K, V, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].right().index();
        op(&self.nodes[idx])
    }

    fn parent_ref<F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<K, V, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].parent().index();
        op(&self.nodes[idx])
    }

    fn left_mut<F, R>(&'a mut self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a mut Node<K, V, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].left();
        self.node_mut(idx, op)
    }

    fn right_mut<F, R>(&'a mut self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a mut Node<K, V, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].right();
        self.node_mut(idx, op)
    }

    fn parent_mut<F, R>(&'a mut self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a mut Node<K, V, Ix>) -> R,
    {
        let idx = self.nodes[node.index()].parent();
        self.node_mut(idx, op)
    }
}
