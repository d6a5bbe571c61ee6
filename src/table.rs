// Copyright (c) 2022-2023 the cflow authors

//! Dense keyed storage.
//!
//! This module implements a primary table which associates data with a
//! dense, opaque integer key. The block graph uses it as the backing store
//! for basic blocks: keys hand out stable, copyable references without any
//! ownership relation between blocks.

use serde::{Deserialize, Serialize};
use std::{
    marker::PhantomData,
    ops::{Index, IndexMut},
};

/// An opaque key to uniquely identify a table entry.
pub trait TableKey: Copy {
    /// Create a new table key from an index.
    fn new(index: usize) -> Self;
    /// Return the index wrapped within this table key.
    fn index(self) -> usize;
}

/// A primary table that provides dense key-based storage.
///
/// Entries can be added but never removed, which keeps the storage a plain
/// vector and the keys valid for the lifetime of the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryTable<I, V> {
    storage: Vec<V>,
    unused: PhantomData<I>,
}

impl<I, V> PrimaryTable<I, V> {
    /// Create a new primary table.
    pub fn new() -> Self {
        Self {
            storage: vec![],
            unused: PhantomData,
        }
    }

    /// Return the number of entries in the table.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl<I, V> Default for PrimaryTable<I, V> {
    fn default() -> PrimaryTable<I, V> {
        PrimaryTable::new()
    }
}

impl<I: TableKey, V> PrimaryTable<I, V> {
    /// Add a new entry to the table.
    ///
    /// Returns the key under which the entry can be accessed again.
    pub fn add(&mut self, value: V) -> I {
        let index = self.storage.len();
        self.storage.push(value);
        I::new(index)
    }

    /// Return an iterator over the keys and values in the table, in
    /// insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &V)> {
        self.storage.iter().enumerate().map(|(k, v)| (I::new(k), v))
    }

    /// Return an iterator over the keys in the table, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = I> {
        (0..self.storage.len()).map(I::new)
    }

    /// Return an iterator over the values in the table, in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.storage.iter()
    }

    /// Return an iterator over mutable values in the table, in insertion
    /// order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.storage.iter_mut()
    }

    /// Look up an entry, returning `None` for out-of-range keys.
    pub fn get(&self, key: I) -> Option<&V> {
        self.storage.get(key.index())
    }
}

impl<I: TableKey, V> Index<I> for PrimaryTable<I, V> {
    type Output = V;

    fn index(&self, idx: I) -> &V {
        &self.storage[idx.index()]
    }
}

impl<I: TableKey, V> IndexMut<I> for PrimaryTable<I, V> {
    fn index_mut(&mut self, idx: I) -> &mut V {
        &mut self.storage[idx.index()]
    }
}
