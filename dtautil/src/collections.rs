use std::collections::BTreeMap;

/// Counts occurrences of some key. Iteration order is stable, so summaries printed from a
/// Counter are deterministic.
#[derive(Clone, Debug, PartialEq)]
pub struct Counter<T: Ord + PartialEq + Clone> {
    map: BTreeMap<T, usize>,
    sum: usize,
}

impl<T: Ord + PartialEq + Clone> Default for Counter<T> {
    fn default() -> Counter<T> {
        Counter::new()
    }
}

impl<T: Ord + PartialEq + Clone> Counter<T> {
    pub fn new() -> Counter<T> {
        Counter {
            map: BTreeMap::new(),
            sum: 0,
        }
    }

    pub fn add(&mut self, val: T, amount: usize) -> usize {
        let entry = self.map.entry(val).or_insert(0);
        *entry += amount;
        self.sum += amount;
        *entry
    }

    pub fn inc(&mut self, val: T) -> usize {
        self.add(val, 1)
    }

    /// If the key is missing, returns 0
    pub fn get(&self, val: T) -> usize {
        self.map.get(&val).cloned().unwrap_or(0)
    }

    pub fn sum(&self) -> usize {
        self.sum
    }

    pub fn is_empty(&self) -> bool {
        self.sum == 0
    }

    pub fn borrow(&self) -> &BTreeMap<T, usize> {
        &self.map
    }

    pub fn consume(self) -> BTreeMap<T, usize> {
        self.map
    }

    /// Adds every count from another Counter into this one.
    pub fn extend(&mut self, other: Counter<T>) {
        for (val, amount) in other.map {
            self.add(val, amount);
        }
    }
}
