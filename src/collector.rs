use std::collections::{BTreeSet, HashMap};

use crate::PointId;

/// Output sink for the pairs discovered by a join.
///
/// [`ResultCollector::add_pair`] is the only mutator used by the joins. Every join clears its
/// collector once its preconditions hold and before recording anything.
pub trait ResultCollector {
    /// The underlying storage exposed by [`ResultCollector::result`].
    type Output;

    /// Records that ```right``` was found within range of ```left```.
    fn add_pair(&mut self, left: PointId, right: PointId);

    /// Returns every partner recorded for ```id```.
    fn pairs_of(&self, id: PointId) -> Vec<PointId>;

    /// Removes all recorded pairs.
    fn clear(&mut self);

    /// Exposes the underlying storage for bulk consumption.
    fn result(&self) -> &Self::Output;

    /// Returns all recorded pairs in the collector's iteration order.
    fn pairs(&self) -> Vec<(PointId, PointId)>;

    /// Returns the number of stored pairs.
    fn len(&self) -> usize;

    /// Returns ```true``` if nothing has been recorded.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: ResultCollector + ?Sized> ResultCollector for &mut C {
    type Output = C::Output;

    fn add_pair(&mut self, left: PointId, right: PointId) {
        (**self).add_pair(left, right)
    }

    fn pairs_of(&self, id: PointId) -> Vec<PointId> {
        (**self).pairs_of(id)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn result(&self) -> &Self::Output {
        (**self).result()
    }

    fn pairs(&self) -> Vec<(PointId, PointId)> {
        (**self).pairs()
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

/// Flat list of alternating ids: ```[left0, right0, left1, right1, ...]```.
///
/// Keeps insertion order and duplicates. [`ResultCollector::pairs_of`] is a linear scan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PairList {
    ids: Vec<PointId>,
}

impl PairList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultCollector for PairList {
    type Output = Vec<PointId>;

    fn add_pair(&mut self, left: PointId, right: PointId) {
        self.ids.push(left);
        self.ids.push(right);
    }

    fn pairs_of(&self, id: PointId) -> Vec<PointId> {
        self.ids
            .chunks_exact(2)
            .filter(|pair| pair[0] == id)
            .map(|pair| pair[1])
            .collect()
    }

    fn clear(&mut self) {
        self.ids.clear();
    }

    fn result(&self) -> &Vec<PointId> {
        &self.ids
    }

    fn pairs(&self) -> Vec<(PointId, PointId)> {
        self.ids
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect()
    }

    fn len(&self) -> usize {
        self.ids.len() / 2
    }
}

/// Adjacency map from an id to the ascending, duplicate-free set of its partners.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NeighborMap {
    map: HashMap<PointId, BTreeSet<PointId>>,
}

impl NeighborMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored partner set of ```id``` without copying.
    pub fn neighbors(&self, id: PointId) -> Option<&BTreeSet<PointId>> {
        self.map.get(&id)
    }
}

impl ResultCollector for NeighborMap {
    type Output = HashMap<PointId, BTreeSet<PointId>>;

    fn add_pair(&mut self, left: PointId, right: PointId) {
        self.map.entry(left).or_default().insert(right);
    }

    fn pairs_of(&self, id: PointId) -> Vec<PointId> {
        self.map
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn result(&self) -> &HashMap<PointId, BTreeSet<PointId>> {
        &self.map
    }

    fn pairs(&self) -> Vec<(PointId, PointId)> {
        self.map
            .iter()
            .flat_map(|(&left, set)| set.iter().map(move |&right| (left, right)))
            .collect()
    }

    fn len(&self) -> usize {
        self.map.values().map(BTreeSet::len).sum()
    }
}
