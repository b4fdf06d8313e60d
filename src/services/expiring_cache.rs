use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A bounded map whose entries expire after a fixed age.
///
/// Entries carry their insertion timestamp; expired or over-capacity
/// entries are evicted whenever the cache is touched. Re-inserting a key
/// refreshes its timestamp and moves it to the back of the line.
pub struct ExpiringCache<K, V> {
    max_len: usize,
    max_age: Duration,
    entries: HashMap<K, (V, Instant)>,
    order: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V> ExpiringCache<K, V> {
    pub fn new(max_len: usize, max_age: Duration) -> Self {
        Self {
            max_len,
            max_age,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.evict_expired();
        self.entries.get(key).map(|(value, _)| value)
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.evict_expired();

        if self.entries.insert(key.clone(), (value, Instant::now())).is_some() {
            self.order.retain(|existing| existing != &key);
        }
        self.order.push_back(key);

        while self.order.len() > self.max_len {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_expired(&mut self) {
        while let Some(front) = self.order.front() {
            let expired = self
                .entries
                .get(front)
                .map(|(_, inserted)| inserted.elapsed() > self.max_age)
                .unwrap_or(true);
            if !expired {
                break;
            }
            let front = self.order.pop_front().unwrap();
            self.entries.remove(&front);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_returns_values() {
        let mut cache = ExpiringCache::new(10, Duration::from_secs(60));
        cache.insert("a", 1);
        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"b"), None);
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let mut cache = ExpiringCache::new(2, Duration::from_secs(60));
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_eq!(cache.get(&"c"), Some(&3));
    }

    #[test]
    fn reinsert_refreshes_position() {
        let mut cache = ExpiringCache::new(2, Duration::from_secs(60));
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("a", 10);
        cache.insert("c", 3);
        // "b" was the oldest once "a" got refreshed.
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"a"), Some(&10));
    }

    #[test]
    fn entries_expire_after_max_age() {
        let mut cache = ExpiringCache::new(10, Duration::from_millis(10));
        cache.insert("a", 1);
        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get(&"a"), None);
        assert!(cache.is_empty());
    }
}
