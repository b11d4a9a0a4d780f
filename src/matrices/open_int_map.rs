//! Open addressing hash map from `usize` keys to values, used as storage of
//! the sparse matrices and vectors. Absent keys read as the `missing` value.
use std::fmt;

const DEFAULT_EXPECTED_SIZE: usize = 16;
const LOAD_FACTOR: f64 = 0.5;
const PERTURB_SHIFT: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Free,
    Full,
    Removed,
}

#[derive(Clone)]
pub struct OpenIntMap<T: Clone> {
    keys: Vec<usize>,
    values: Vec<T>,
    states: Vec<Slot>,
    missing: T,
    size: usize,
    removed: usize,
    mask: usize,
}

fn capacity_for(expected: usize) -> usize {
    if expected == 0 {
        return 1;
    }
    let capacity = (expected as f64 / LOAD_FACTOR).ceil() as usize;
    capacity.next_power_of_two()
}

fn hash_of(key: usize) -> usize {
    let h = key ^ (key >> 20) ^ (key >> 12);
    h ^ (h >> 7) ^ (h >> 4)
}

impl<T: Clone> OpenIntMap<T> {
    pub fn new(missing: T) -> Self {
        Self::with_expected_size(DEFAULT_EXPECTED_SIZE, missing)
    }

    pub fn with_expected_size(expected: usize, missing: T) -> Self {
        let capacity = capacity_for(expected);
        OpenIntMap {
            keys: vec![0; capacity],
            values: vec![missing.clone(); capacity],
            states: vec![Slot::Free; capacity],
            missing,
            size: 0,
            removed: 0,
            mask: capacity - 1,
        }
    }

    /// Ok(slot) when `key` is stored, Err(slot) with the insertion slot otherwise.
    fn find(&self, key: usize) -> Result<usize, usize> {
        let hash = hash_of(key);
        let mut perturb = hash;
        let mut j = hash;
        let mut first_removed = None;
        loop {
            let index = j & self.mask;
            match self.states[index] {
                Slot::Free => return Err(first_removed.unwrap_or(index)),
                Slot::Full if self.keys[index] == key => return Ok(index),
                Slot::Removed if first_removed.is_none() => first_removed = Some(index),
                _ => {}
            }
            j = j.wrapping_mul(5).wrapping_add(perturb).wrapping_add(1);
            perturb >>= PERTURB_SHIFT;
        }
    }

    pub fn get(&self, key: usize) -> T {
        match self.find(key) {
            Ok(index) => self.values[index].clone(),
            Err(_) => self.missing.clone(),
        }
    }

    pub fn contains_key(&self, key: usize) -> bool {
        self.find(key).is_ok()
    }

    /// Stores `value` under `key`, returning the previous value if there was one.
    pub fn put(&mut self, key: usize, value: T) -> Option<T> {
        match self.find(key) {
            Ok(index) => Some(std::mem::replace(&mut self.values[index], value)),
            Err(index) => {
                if self.states[index] == Slot::Removed {
                    self.removed -= 1;
                }
                self.keys[index] = key;
                self.values[index] = value;
                self.states[index] = Slot::Full;
                self.size += 1;
                if (self.size + self.removed) as f64 > self.capacity() as f64 * LOAD_FACTOR {
                    self.rehash();
                }
                None
            }
        }
    }

    pub fn remove(&mut self, key: usize) -> Option<T> {
        match self.find(key) {
            Ok(index) => {
                self.states[index] = Slot::Removed;
                self.size -= 1;
                self.removed += 1;
                Some(std::mem::replace(
                    &mut self.values[index],
                    self.missing.clone(),
                ))
            }
            Err(_) => None,
        }
    }

    fn capacity(&self) -> usize {
        self.states.len()
    }

    fn rehash(&mut self) {
        let new_capacity = capacity_for(self.size.max(1) * 2);
        let keys = std::mem::take(&mut self.keys);
        let values = std::mem::take(&mut self.values);
        let states = std::mem::take(&mut self.states);
        self.keys = vec![0; new_capacity];
        self.values = vec![self.missing.clone(); new_capacity];
        self.states = vec![Slot::Free; new_capacity];
        self.mask = new_capacity - 1;
        self.size = 0;
        self.removed = 0;
        for ((key, value), state) in keys.into_iter().zip(values).zip(states) {
            if state == Slot::Full {
                self.put(key, value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn missing(&self) -> &T {
        &self.missing
    }

    /// Stored `(key, value)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, state)| **state == Slot::Full)
            .map(move |(i, _)| (self.keys[i], &self.values[i]))
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for OpenIntMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::collections::HashMap;

    #[test]
    fn test_put_get_remove() {
        let mut map = OpenIntMap::new(0.0);
        assert!(map.is_empty());
        assert_eq!(map.put(7, 1.5), None);
        assert_eq!(map.put(7, 2.5), Some(1.5));
        assert_eq!(map.get(7), 2.5);
        assert_eq!(map.get(8), 0.0);
        assert_eq!(map.len(), 1);
        assert_eq!(map.remove(7), Some(2.5));
        assert_eq!(map.remove(7), None);
        assert!(!map.contains_key(7));
        assert!(map.is_empty());
    }

    #[test]
    fn test_against_std_hashmap() {
        let mut rng = rand::rng();
        let mut map = OpenIntMap::with_expected_size(2, -1i64);
        let mut reference = HashMap::new();
        for step in 0..5000 {
            let key = rng.random_range(0..500usize);
            if rng.random_bool(0.3) {
                assert_eq!(map.remove(key), reference.remove(&key));
            } else {
                assert_eq!(map.put(key, step), reference.insert(key, step));
            }
        }
        assert_eq!(map.len(), reference.len());
        for (key, value) in &reference {
            assert_eq!(map.get(*key), *value);
        }
        let mut stored: Vec<usize> = map.iter().map(|(k, _)| k).collect();
        stored.sort();
        let mut expected: Vec<usize> = reference.keys().copied().collect();
        expected.sort();
        assert_eq!(stored, expected);
    }
}
