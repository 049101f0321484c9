use std::iter::FusedIterator;

use crate::index::{IndexType, NodeIndex};
use crate::node::Node;
use crate::rbtreemap::RbTreeMap;

/// Pushes a link of nodes on the left to stack.
fn left_link<K, V, Ix>(
    map_ref: &RbTreeMap<K, V, Ix>,
    mut x: NodeIndex<Ix>,
    stack: &mut Vec<NodeIndex<Ix>>,
) where
    Ix: IndexType,
{
    while !x.is_sentinel() {
        stack.push(x);
        x = map_ref.node_ref(x, Node::left);
    }
}

/// An iterator over the entries of a `RbTreeMap`, sorted by key.
#[derive(Debug)]
pub struct Iter<'a, K, V, Ix> {
    /// Reference to the map
    pub(crate) map_ref: &'a RbTreeMap<K, V, Ix>,
    /// Stack for iteration
    pub(crate) stack: Vec<NodeIndex<Ix>>,
    /// Entries not yielded yet
    pub(crate) remaining: usize,
}

impl<'a, K, V, Ix> Iter<'a, K, V, Ix>
where
    Ix: IndexType,
{
    pub(crate) fn new(map_ref: &'a RbTreeMap<K, V, Ix>) -> Self {
        let mut stack = Vec::new();
        left_link(map_ref, map_ref.root_or_sentinel(), &mut stack);
        Iter {
            map_ref,
            stack,
            remaining: map_ref.len,
        }
    }
}

impl<'a, K, V, Ix> Iterator for Iter<'a, K, V, Ix>
where
    Ix: IndexType,
{
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let x = self.stack.pop()?;
        left_link(
            self.map_ref,
            self.map_ref.node_ref(x, Node::right),
            &mut self.stack,
        );
        self.remaining -= 1;
        Some(self.map_ref.node_ref(x, Node::entry))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, Ix> ExactSizeIterator for Iter<'_, K, V, Ix> where Ix: IndexType {}

impl<K, V, Ix> FusedIterator for Iter<'_, K, V, Ix> where Ix: IndexType {}

/// An iterator over the keys of a `RbTreeMap`, in sorted order.
#[derive(Debug)]
pub struct Keys<'a, K, V, Ix> {
    pub(crate) inner: Iter<'a, K, V, Ix>,
}

impl<'a, K, V, Ix> Iterator for Keys<'a, K, V, Ix>
where
    Ix: IndexType,
{
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, Ix> ExactSizeIterator for Keys<'_, K, V, Ix> where Ix: IndexType {}

impl<K, V, Ix> FusedIterator for Keys<'_, K, V, Ix> where Ix: IndexType {}

/// An iterator over the values of a `RbTreeMap`, in order by key.
#[derive(Debug)]
pub struct Values<'a, K, V, Ix> {
    pub(crate) inner: Iter<'a, K, V, Ix>,
}

impl<'a, K, V, Ix> Iterator for Values<'a, K, V, Ix>
where
    Ix: IndexType,
{
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, Ix> ExactSizeIterator for Values<'_, K, V, Ix> where Ix: IndexType {}

impl<K, V, Ix> FusedIterator for Values<'_, K, V, Ix> where Ix: IndexType {}

/// An owning iterator over the entries of a `RbTreeMap`, sorted by key.
#[derive(Debug)]
pub struct IntoIter<K, V, Ix> {
    map: RbTreeMap<K, V, Ix>,
    /// Stack for iteration
    stack: Vec<NodeIndex<Ix>>,
}

impl<K, V, Ix> IntoIter<K, V, Ix>
where
    Ix: IndexType,
{
    pub(crate) fn new(map: RbTreeMap<K, V, Ix>) -> Self {
        let mut stack = Vec::new();
        left_link(&map, map.root_or_sentinel(), &mut stack);
        IntoIter { map, stack }
    }
}

impl<K, V, Ix> Iterator for IntoIter<K, V, Ix>
where
    Ix: IndexType,
{
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let x = self.stack.pop()?;
        left_link(
            &self.map,
            self.map.node_ref(x, Node::right),
            &mut self.stack,
        );
        self.map.len -= 1;
        let node = &mut self.map.nodes[x.index()];
        match (node.key.take(), node.value.take()) {
            (Some(key), Some(value)) => Some((key, value)),
            _ => unreachable!("every node on the stack holds an entry"),
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.map.len, Some(self.map.len))
    }
}

impl<K, V, Ix> ExactSizeIterator for IntoIter<K, V, Ix> where Ix: IndexType {}

impl<K, V, Ix> FusedIterator for IntoIter<K, V, Ix> where Ix: IndexType {}
