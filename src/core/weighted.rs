/// Weighted tables and the shared weighted-random sampler.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A table mapping values to accumulated integer weights.
///
/// Adding a value that is already present increments its weight instead of
/// creating a second entry. Entries keep first-insertion order so that a
/// seeded generator walks them identically on every run.
///
/// Deserialization rebuilds the total from the entries; a stored
/// `total_weight` is not trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "WeightedTableData<T>",
    bound(deserialize = "T: Deserialize<'de> + PartialEq")
)]
pub struct WeightedTable<T> {
    entries: Vec<(T, u32)>,
    total_weight: u32,
}

/// On-disk shape of a [`WeightedTable`].
#[derive(Deserialize)]
struct WeightedTableData<T> {
    entries: Vec<(T, u32)>,
}

impl<T: PartialEq> From<WeightedTableData<T>> for WeightedTable<T> {
    fn from(data: WeightedTableData<T>) -> Self {
        let mut table = WeightedTable::new();
        for (value, weight) in data.entries {
            table.add(value, weight);
        }
        table
    }
}

impl<T> Default for WeightedTable<T> {
    fn default() -> Self {
        WeightedTable {
            entries: Vec::new(),
            total_weight: 0,
        }
    }
}

impl<T: PartialEq> WeightedTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment `value` by one.
    pub fn increment(&mut self, value: T) {
        self.add(value, 1);
    }

    /// Add `weight` to `value`, inserting it if absent. A zero weight is ignored.
    pub fn add(&mut self, value: T, weight: u32) {
        if weight == 0 {
            return;
        }
        if let Some(entry) = self.entries.iter_mut().find(|(v, _)| v == &value) {
            entry.1 += weight;
        } else {
            self.entries.push((value, weight));
        }
        self.total_weight += weight;
    }

    /// Weight currently held by `value`, or 0 when absent.
    pub fn weight_of(&self, value: &T) -> u32 {
        self.entries
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, w)| *w)
            .unwrap_or(0)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.entries.iter().any(|(v, _)| v == value)
    }
}

impl<T> WeightedTable<T> {
    pub fn total_weight(&self) -> u32 {
        self.total_weight
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(T, u32)] {
        &self.entries
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(v, _)| v)
    }

    /// Pick a value proportionally to its weight. `None` for an empty table.
    pub fn sample(&self, rng: &mut StdRng) -> Option<&T> {
        sample_weighted(&self.entries, self.total_weight, |(_, w)| *w, rng).map(|(v, _)| v)
    }
}

impl<T: PartialEq> FromIterator<T> for WeightedTable<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut table = WeightedTable::new();
        for value in iter {
            table.increment(value);
        }
        table
    }
}

/// Weighted selection over any slice of items.
///
/// Draws `r` uniformly in `[1, total_weight]`, then walks the items in a
/// freshly shuffled order, subtracting each weight from `r` until an item
/// with `r <= weight` is reached. The shuffle only changes which item owns
/// which slice of the range, never the probabilities.
///
/// Returns `None` when `items` is empty or `total_weight` is zero.
pub fn sample_weighted<'a, T, F>(
    items: &'a [T],
    total_weight: u32,
    weight_of: F,
    rng: &mut StdRng,
) -> Option<&'a T>
where
    F: Fn(&T) -> u32,
{
    if items.is_empty() || total_weight == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..items.len()).collect();
    order.shuffle(rng);

    let mut remaining = rng.gen_range(1..=total_weight);
    for idx in order {
        let item = &items[idx];
        let weight = weight_of(item);
        if remaining > weight {
            remaining -= weight;
        } else {
            return Some(item);
        }
    }
    None
}
