//! `rb_tree_map` is an ordered map based on a red-black tree.
//!
//! It fully implements the insertion and deletion functionality of a red-black tree,
//! ensuring that each lookup and modification requires at most O(logN) time complexity.
//!
//! To safely and efficiently handle insertion and deletion operations in Rust,
//! `rb_tree_map` uses arrays to simulate pointers for managing the parent-child
//! references in the red-black tree. Every null link points at one sentinel slot
//! reserved at index 0 of each map, so the balancing code never deals with missing
//! children. This approach also ensures that the map has the `Send` and `Unpin`
//! traits, allowing it to be safely transferred between threads and to maintain
//! a fixed memory location during asynchronous operations.
//!
//! For shared access from multiple threads, [`SyncRbTreeMap`] wraps a map in a
//! readers-writer lock.
//!
//! # Example
//!
//! ```rust
//! use rb_tree_map::RbTreeMap;
//!
//! let mut map = RbTreeMap::new();
//! map.insert(10, "ten");
//! map.insert(5, "five");
//! assert_eq!(map.get(&10), Some(&"ten"));
//! assert_eq!(map.remove(&5), Some("five"));
//! assert_eq!(map.len(), 1);
//! ```
//!

mod entry;
mod index;
mod iter;
mod node;
mod rbtreemap;
mod sync;

#[cfg(test)]
mod tests;

pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use index::{DefaultIx, IndexType, NodeIndex};
pub use iter::{IntoIter, Iter, Keys, Values};
pub use rbtreemap::RbTreeMap;
pub use sync::SyncRbTreeMap;
