#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::index::{IndexType, NodeIndex};

/// Node of the red-black tree
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node<K, V, Ix> {
    /// Left children
    pub left: NodeIndex<Ix>,
    /// Right children
    pub right: NodeIndex<Ix>,
    /// Parent
    pub parent: NodeIndex<Ix>,
    /// Color of the node
    pub color: Color,

    /// Key of the node, `None` only for the sentinel
    pub key: Option<K>,
    /// Value of the node, `None` only for the sentinel
    pub value: Option<V>,
}

impl<K, V, Ix> Node<K, V, Ix>
where
    Ix: IndexType,
{
    /// The black leaf every null link of a map points at.
    pub fn new_sentinel() -> Self {
        Node {
            left: NodeIndex::SENTINEL,
            right: NodeIndex::SENTINEL,
            parent: NodeIndex::SENTINEL,
            color: Color::Black,
            key: None,
            value: None,
        }
    }

    /// A detached red node.
    pub fn new_leaf(key: K, value: V) -> Self {
        Node {
            left: NodeIndex::SENTINEL,
            right: NodeIndex::SENTINEL,
            parent: NodeIndex::SENTINEL,
            color: Color::Red,
            key: Some(key),
            value: Some(value),
        }
    }
}

// Convenient getter/setter methods
impl<K, V, Ix> Node<K, V, Ix>
where
    Ix: IndexType,
{
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn key(&self) -> &K {
        match self.key {
            Some(ref key) => key,
            None => unreachable!("the sentinel carries no key"),
        }
    }

    pub fn value(&self) -> &V {
        match self.value {
            Some(ref value) => value,
            None => unreachable!("the sentinel carries no value"),
        }
    }

    pub fn value_mut(&mut self) -> &mut V {
        match self.value {
            Some(ref mut value) => value,
            None => unreachable!("the sentinel carries no value"),
        }
    }

    pub fn entry(&self) -> (&K, &V) {
        (self.key(), self.value())
    }

    pub fn into_entry(self) -> (K, V) {
        match (self.key, self.value) {
            (Some(key), Some(value)) => (key, value),
            _ => unreachable!("the sentinel carries no entry"),
        }
    }

    pub fn left(&self) -> NodeIndex<Ix> {
        self.left
    }

    pub fn right(&self) -> NodeIndex<Ix> {
        self.right
    }

    pub fn parent(&self) -> NodeIndex<Ix> {
        self.parent
    }

    pub fn is_black(&self) -> bool {
        matches!(self.color, Color::Black)
    }

    pub fn is_red(&self) -> bool {
        matches!(self.color, Color::Red)
    }

    pub fn toggle_color(&mut self) {
        self.color = self.color.toggle();
    }

    pub fn set_value(value: V) -> impl FnOnce(&mut Node<K, V, Ix>) -> Option<V> {
        move |node: &mut Node<K, V, Ix>| node.value.replace(value)
    }

    pub fn set_color(color: Color) -> impl FnOnce(&mut Node<K, V, Ix>) {
        move |node: &mut Node<K, V, Ix>| {
            node.color = color;
        }
    }

    pub fn set_left(left: NodeIndex<Ix>) -> impl FnOnce(&mut Node<K, V, Ix>) {
        move |node: &mut Node<K, V, Ix>| {
            node.left = left;
        }
    }

    pub fn set_right(right: NodeIndex<Ix>) -> impl FnOnce(&mut Node<K, V, Ix>) {
        move |node: &mut Node<K, V, Ix>| {
            node.right = right;
        }
    }

    pub fn set_parent(parent: NodeIndex<Ix>) -> impl FnOnce(&mut Node<K, V, Ix>) {
        move |node: &mut Node<K, V, Ix>| {
            node.parent = parent;
        }
    }
}

/// The color of the node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Color {
    /// Red node
    Red,
    /// Black node
    Black,
}

impl Color {
    pub fn toggle(self) -> Self {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }
}
