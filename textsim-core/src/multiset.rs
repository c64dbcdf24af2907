//! Token multiset: a counter with set-like operations that respect counts.
//!
//! Backs the token family (Jaccard, Dice, Overlap, Tversky) and doubles as
//! the frequency vector of the vector family (Cosine, Euclidean, Manhattan,
//! Chebyshev). Counts are strictly positive; a zero count means the key is
//! absent. Iteration order is unspecified.

use std::collections::HashMap;
use std::hash::Hash;

/// Mapping from item to positive count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multiset<T: Eq + Hash> {
    counts: HashMap<T, u32>,
}

impl<T: Eq + Hash> Default for Multiset<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash> Multiset<T> {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }

    /// Add one occurrence of `item`.
    #[inline]
    pub fn increment(&mut self, item: T) {
        *self.counts.entry(item).or_insert(0) += 1;
    }

    /// Count for `item`, zero if absent.
    #[inline]
    pub fn count(&self, item: &T) -> u32 {
        self.counts.get(item).copied().unwrap_or(0)
    }

    /// Number of distinct items.
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total_count(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    /// Pointwise minimum, dropping items absent from either side.
    pub fn intersect(&self, other: &Multiset<T>) -> Multiset<T>
    where
        T: Clone,
    {
        let mut result = Multiset::new();
        for (item, &count) in &self.counts {
            let other_count = other.count(item);
            if other_count > 0 {
                result.counts.insert(item.clone(), count.min(other_count));
            }
        }
        result
    }

    /// Pointwise maximum.
    pub fn union_with(&self, other: &Multiset<T>) -> Multiset<T>
    where
        T: Clone,
    {
        let mut result = self.clone();
        for (item, &count) in &other.counts {
            let entry = result.counts.entry(item.clone()).or_insert(0);
            *entry = (*entry).max(count);
        }
        result
    }

    /// Pointwise sum.
    pub fn sum_with(&self, other: &Multiset<T>) -> Multiset<T>
    where
        T: Clone,
    {
        let mut result = self.clone();
        for (item, &count) in &other.counts {
            *result.counts.entry(item.clone()).or_insert(0) += count;
        }
        result
    }

    /// Iterate over distinct items.
    pub fn keys(&self) -> impl Iterator<Item = &T> {
        self.counts.keys()
    }

    /// Iterate over `(item, count)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&T, u32)> {
        self.counts.iter().map(|(item, &count)| (item, count))
    }

    /// Distinct items of either multiset, each visited exactly once.
    pub fn union_of_keys<'a>(&'a self, other: &'a Multiset<T>) -> impl Iterator<Item = &'a T> {
        self.counts
            .keys()
            .chain(other.counts.keys().filter(move |&item| self.count(item) == 0))
    }

    /// Frequency-vector dot product.
    pub fn dot_product(&self, other: &Multiset<T>) -> f64 {
        self.counts
            .iter()
            .map(|(item, &count)| f64::from(count) * f64::from(other.count(item)))
            .sum()
    }

    /// Frequency-vector Euclidean magnitude.
    pub fn magnitude(&self) -> f64 {
        self.counts
            .values()
            .map(|&count| f64::from(count) * f64::from(count))
            .sum::<f64>()
            .sqrt()
    }
}

impl<T: Eq + Hash> FromIterator<T> for Multiset<T> {
    fn from_iter<I: IntoIterator<Item = T>>(items: I) -> Self {
        let mut result = Multiset::new();
        for item in items {
            result.increment(item);
        }
        result
    }
}
