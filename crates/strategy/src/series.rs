use std::collections::VecDeque;

/// Bounded rolling buffer of scalar values with FIFO eviction.
///
/// Insertion order is time order; `len() <= capacity` always holds.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    capacity: usize,
    values: VecDeque<f64>,
}

impl PriceSeries {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "PriceSeries capacity must be > 0");
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Append a value, returning the evicted oldest value when full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        self.values.push_back(value);
        if self.values.len() > self.capacity {
            self.values.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
