//! A `RbTreeMap` that can be shared between threads.
//!
//! The whole tree is guarded by one readers-writer lock: lookups take shared
//! access, insertions and removals take exclusive access for their full duration,
//! rebalancing included. Guards are released when they go out of scope, so every
//! exit path (an overwrite, a missing key) gives the lock back.

use std::borrow::Borrow;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::index::{DefaultIx, IndexType};
use crate::rbtreemap::RbTreeMap;

/// A thread-safe handle to a `RbTreeMap`.
///
/// Cloning the handle is cheap, every clone refers to the same map.
///
/// # Example
///
/// ```rust
/// use rb_tree_map::SyncRbTreeMap;
/// use std::thread;
///
/// let map = SyncRbTreeMap::new();
/// let handles: Vec<_> = (0..4)
///     .map(|t| {
///         let map = map.clone();
///         thread::spawn(move || {
///             for i in 0..100 {
///                 map.insert(t * 100 + i, i);
///             }
///         })
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// assert_eq!(map.len(), 400);
/// assert_eq!(map.get(&250), Some(50));
/// ```
#[derive(Debug)]
pub struct SyncRbTreeMap<K, V, Ix = DefaultIx> {
    inner: Arc<RwLock<RbTreeMap<K, V, Ix>>>,
}

impl<K, V, Ix> Clone for SyncRbTreeMap<K, V, Ix> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> SyncRbTreeMap<K, V>
where
    K: Ord,
{
    /// Create an empty `SyncRbTreeMap`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::from_map(RbTreeMap::new())
    }
}

impl<K, V, Ix> Default for SyncRbTreeMap<K, V, Ix>
where
    K: Ord,
    Ix: IndexType,
{
    #[inline]
    fn default() -> Self {
        Self::from_map(RbTreeMap::default())
    }
}

impl<K, V, Ix> From<RbTreeMap<K, V, Ix>> for SyncRbTreeMap<K, V, Ix>
where
    K: Ord,
    Ix: IndexType,
{
    fn from(map: RbTreeMap<K, V, Ix>) -> Self {
        Self::from_map(map)
    }
}

impl<K, V, Ix> SyncRbTreeMap<K, V, Ix>
where
    K: Ord,
    Ix: IndexType,
{
    /// Wrap an existing map.
    #[inline]
    #[must_use]
    pub fn from_map(map: RbTreeMap<K, V, Ix>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Return a clone of the value corresponding to the key.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        V: Clone,
    {
        self.read_guard().get(key).cloned()
    }

    /// Return `true` if the map contains a value for the key.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.read_guard().contains_key(key)
    }

    /// Insert a key-value pair, returning the previous value if the key existed.
    #[inline]
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.write_guard().insert(key, value)
    }

    /// Remove a key, returning its value if the key existed.
    #[inline]
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.write_guard().remove(key)
    }

    /// Return clones of the entry with the minimum key.
    #[inline]
    pub fn first_key_value(&self) -> Option<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        Self::cloned(self.read_guard().first_key_value())
    }

    /// Return clones of the entry with the maximum key.
    #[inline]
    pub fn last_key_value(&self) -> Option<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        Self::cloned(self.read_guard().last_key_value())
    }

    /// Return clones of the entry with the greatest key strictly less than the given key.
    #[inline]
    pub fn predecessor<Q>(&self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q> + Clone,
        Q: Ord + ?Sized,
        V: Clone,
    {
        Self::cloned(self.read_guard().predecessor(key))
    }

    /// Return clones of the entry with the smallest key strictly greater than the given key.
    #[inline]
    pub fn successor<Q>(&self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q> + Clone,
        Q: Ord + ?Sized,
        V: Clone,
    {
        Self::cloned(self.read_guard().successor(key))
    }

    /// Remove all elements from the map
    #[inline]
    pub fn clear(&self) {
        self.write_guard().clear();
    }

    /// Return the number of elements in the map.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_guard().len()
    }

    /// Return `true` if the map contains no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_guard().is_empty()
    }

    /// Run `f` with shared access to the map.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::SyncRbTreeMap;
    ///
    /// let map = SyncRbTreeMap::new();
    /// map.insert(1, 10);
    /// map.insert(2, 20);
    /// let sum: i32 = map.read(|m| m.values().sum());
    /// assert_eq!(sum, 30);
    /// ```
    #[inline]
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&RbTreeMap<K, V, Ix>) -> R,
    {
        f(&self.read_guard())
    }

    /// Run `f` with exclusive access to the map.
    ///
    /// # Example
    /// ```rust
    /// use rb_tree_map::SyncRbTreeMap;
    ///
    /// let map = SyncRbTreeMap::new();
    /// map.write(|m| m.extend([(1, "a"), (2, "b")]));
    /// assert_eq!(map.len(), 2);
    /// ```
    #[inline]
    pub fn write<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut RbTreeMap<K, V, Ix>) -> R,
    {
        f(&mut self.write_guard())
    }

    /// Unwrap the map if this is the last handle to it.
    ///
    /// # Errors
    ///
    /// Returns the handle back when other clones are still alive.
    #[inline]
    pub fn try_into_inner(self) -> Result<RbTreeMap<K, V, Ix>, Self> {
        Arc::try_unwrap(self.inner)
            .map(|lock| lock.into_inner().unwrap_or_else(PoisonError::into_inner))
            .map_err(|inner| Self { inner })
    }

    // Poisoning is not propagated: later callers see the map as the panicking
    // holder left it.
    fn read_guard(&self) -> RwLockReadGuard<'_, RbTreeMap<K, V, Ix>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, RbTreeMap<K, V, Ix>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn cloned(entry: Option<(&K, &V)>) -> Option<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        entry.map(|(key, value)| (key.clone(), value.clone()))
    }
}
