use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::Arc;

use log::trace;

use crate::lttb::{downsample, Point};
use crate::Result;

/// Memoizes downsampled series per (snapshot, target size).
///
/// A snapshot key identifies one batch of telemetry (e.g. a timestamp plus an
/// antpol). When new data arrives for a snapshot the caller invalidates it.
#[derive(Debug)]
pub struct DownsampleCache<K> {
    entries: HashMap<(K, usize), Arc<[Point]>>,
    order: VecDeque<(K, usize)>,
    limit: Option<usize>,
}

impl<K: Hash + Eq + Clone> DownsampleCache<K> {
    pub fn new() -> Self {
        DownsampleCache {
            entries: HashMap::new(),
            order: VecDeque::new(),
            limit: None,
        }
    }

    /// Cache that holds at most `limit` series, evicting the oldest insert first.
    pub fn with_capacity_limit(limit: usize) -> Self {
        DownsampleCache {
            limit: Some(limit),
            ..Self::new()
        }
    }

    pub fn get(&self, key: &K, target: usize) -> Option<Arc<[Point]>> {
        self.entries.get(&(key.clone(), target)).cloned()
    }

    /// Return the cached series for `key` at `target` points, downsampling
    /// `points` on a miss. Failed computations are not stored.
    pub fn get_or_compute(
        &mut self,
        key: K,
        points: &[Point],
        target: usize,
    ) -> Result<Arc<[Point]>> {
        let entry_key = (key, target);
        if let Some(hit) = self.entries.get(&entry_key) {
            return Ok(hit.clone());
        }

        let sampled: Arc<[Point]> = downsample(points, target)?.into();
        if let Some(limit) = self.limit {
            while self.entries.len() >= limit {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                self.entries.remove(&oldest);
            }
            if limit == 0 {
                return Ok(sampled);
            }
        }
        trace!("caching {} points at target {}", sampled.len(), target);
        self.order.push_back(entry_key.clone());
        self.entries.insert(entry_key, sampled.clone());
        Ok(sampled)
    }

    /// Drop every cached target size for one snapshot.
    pub fn invalidate(&mut self, key: &K) {
        self.entries.retain(|(k, _), _| k != key);
        self.order.retain(|(k, _)| k != key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Hash + Eq + Clone> Default for DownsampleCache<K> {
    fn default() -> Self {
        Self::new()
    }
}
