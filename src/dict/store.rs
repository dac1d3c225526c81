use std::borrow::Cow;
use std::fmt;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::hasher::{SlotPermutation, TABLE_SIZE};
use crate::error::{DictErrorCode, PslError, Result};

/// Chain node. Every node, including the first one in a slot, is boxed.
struct Node<V> {
    key: String,
    value: V,
    next: Option<Box<Node<V>>>,
}

/// String-keyed hash map with chained collision resolution.
///
/// Slot selection goes through a [`SlotPermutation`] shuffled once when the
/// store is created. Values are owned by the store and dropped with it (or
/// when replaced or removed). A normalized key appears at most once in the
/// whole store.
///
/// The `_nocase` operations ASCII-lowercase the key before hashing and
/// comparing; keys stored through them are therefore lowercase. Case
/// sensitive lookups find keys stored by `set_nocase` only when queried in
/// lowercase.
pub struct DictStore<V> {
    slots: Vec<Option<Box<Node<V>>>>,
    permutation: SlotPermutation,
    len: usize,
    last_error: Mutex<Option<(DictErrorCode, String)>>,
}

impl<V> DictStore<V> {
    /// Create a store whose permutation is drawn from an OS-seeded generator.
    pub fn new() -> Result<Self> {
        Self::with_rng(&mut rand::rng())
    }

    /// Create a store with a reproducible slot layout.
    pub fn with_seed(seed: u64) -> Result<Self> {
        Self::with_rng(&mut StdRng::seed_from_u64(seed))
    }

    /// Create a store drawing its permutation from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(rng: &mut R) -> Result<Self> {
        let permutation = SlotPermutation::new(rng)?;
        let mut slots = Vec::new();
        slots.try_reserve_exact(TABLE_SIZE).map_err(|e| {
            PslError::AllocationFailure(format!("Can not allocate slot table: {}", e))
        })?;
        slots.resize_with(TABLE_SIZE, || None);
        Ok(Self {
            slots,
            permutation,
            len: 0,
            last_error: Mutex::new(None),
        })
    }

    /// Insert or replace the value for `key` (case-sensitive).
    pub fn set(&mut self, key: &str, value: V) -> Result<()> {
        if key.is_empty() {
            return Err(self.record(PslError::NullKey));
        }
        self.insert(key, value);
        Ok(())
    }

    /// Insert or replace the value for the lowercased `key`.
    pub fn set_nocase(&mut self, key: &str, value: V) -> Result<()> {
        if key.is_empty() {
            return Err(self.record(PslError::NullKey));
        }
        let key = lowercase(key);
        self.insert(&key, value);
        Ok(())
    }

    /// Get the value stored under `key` (case-sensitive).
    pub fn get(&self, key: &str) -> Result<&V> {
        if key.is_empty() {
            return Err(self.record(PslError::NullKey));
        }
        self.find(key)
            .ok_or_else(|| PslError::NotFound(key.to_string()))
    }

    /// Get the value stored under the lowercased `key`.
    pub fn get_nocase(&self, key: &str) -> Result<&V> {
        if key.is_empty() {
            return Err(self.record(PslError::NullKey));
        }
        self.find(&lowercase(key))
            .ok_or_else(|| PslError::NotFound(key.to_string()))
    }

    /// Check whether `key` exists (case-sensitive). An empty key records a
    /// `NullKey` error and reports `false`.
    pub fn has_key(&self, key: &str) -> bool {
        if key.is_empty() {
            self.record(PslError::NullKey);
            return false;
        }
        self.find(key).is_some()
    }

    /// Check whether the lowercased `key` exists.
    pub fn has_key_nocase(&self, key: &str) -> bool {
        if key.is_empty() {
            self.record(PslError::NullKey);
            return false;
        }
        self.find(&lowercase(key)).is_some()
    }

    /// Remove `key` and return its value. Removing an absent key is a no-op.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        if key.is_empty() {
            self.record(PslError::NullKey);
            return None;
        }
        let index = self.permutation.slot(key);
        let mut cursor = &mut self.slots[index];
        while cursor.as_ref().is_some_and(|node| node.key != key) {
            cursor = &mut cursor.as_mut()?.next;
        }
        let mut node = cursor.take()?;
        *cursor = node.next.take();
        self.len -= 1;
        Some(node.value)
    }

    /// Every stored key, either duplicated (`clone = true`) or borrowed
    /// from the store.
    pub fn keys(&self, clone: bool) -> Vec<Cow<'_, str>> {
        self.iter()
            .map(|(key, _)| {
                if clone {
                    Cow::Owned(key.to_string())
                } else {
                    Cow::Borrowed(key)
                }
            })
            .collect()
    }

    /// Iterate over `(key, value)` pairs in slot order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            slots: self.slots.iter(),
            node: None,
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slot a key hashes to. Keys are used as given (no lowercasing).
    pub fn slot_index(&self, key: &str) -> usize {
        self.permutation.slot(key)
    }

    /// Last usage or allocation error recorded on this store.
    pub fn last_error(&self) -> Option<(DictErrorCode, String)> {
        self.last_error.lock().clone()
    }

    /// Code of the last recorded error, `DictErrorCode::Ok` when none.
    pub fn last_error_code(&self) -> DictErrorCode {
        self.last_error
            .lock()
            .as_ref()
            .map_or(DictErrorCode::Ok, |(code, _)| *code)
    }

    /// Reset the recorded error.
    pub fn clear_error(&self) {
        *self.last_error.lock() = None;
    }

    fn insert(&mut self, key: &str, value: V) {
        let index = self.permutation.slot(key);
        let mut cursor = &mut self.slots[index];
        while let Some(node) = cursor {
            if node.key == key {
                // existing key is kept, the old value is dropped
                node.value = value;
                return;
            }
            cursor = &mut node.next;
        }
        *cursor = Some(Box::new(Node {
            key: key.to_string(),
            value,
            next: None,
        }));
        self.len += 1;
    }

    fn find(&self, key: &str) -> Option<&V> {
        let mut cursor = self.slots[self.permutation.slot(key)].as_deref();
        while let Some(node) = cursor {
            if node.key == key {
                return Some(&node.value);
            }
            cursor = node.next.as_deref();
        }
        None
    }

    fn record(&self, err: PslError) -> PslError {
        if let Some(code) = err.dict_code() {
            *self.last_error.lock() = Some((code, err.to_string()));
        }
        err
    }
}

impl<V> Drop for DictStore<V> {
    fn drop(&mut self) {
        // Unlink chains iteratively so long chains don't recurse on drop
        for slot in self.slots.iter_mut() {
            let mut next = slot.take();
            while let Some(mut node) = next {
                next = node.next.take();
            }
        }
    }
}

impl<V> fmt::Debug for DictStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictStore")
            .field("len", &self.len)
            .field("last_error", &self.last_error())
            .finish()
    }
}

impl<'a, V> IntoIterator for &'a DictStore<V> {
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of a [`DictStore`].
pub struct Iter<'a, V> {
    slots: std::slice::Iter<'a, Option<Box<Node<V>>>>,
    node: Option<&'a Node<V>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.node {
                self.node = node.next.as_deref();
                return Some((node.key.as_str(), &node.value));
            }
            self.node = self.slots.next()?.as_deref();
        }
    }
}

/// ASCII-lowercase a key, borrowing when it is already lowercase.
fn lowercase(key: &str) -> Cow<'_, str> {
    if key.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(key.to_ascii_lowercase())
    } else {
        Cow::Borrowed(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> DictStore<String> {
        DictStore::with_seed(1).unwrap()
    }

    #[test]
    fn test_set_and_get() {
        let mut dict = store();
        dict.set("com", "com-rule".to_string()).unwrap();
        dict.set("co.uk", "uk-rule".to_string()).unwrap();

        assert_eq!(dict.get("com").unwrap(), "com-rule");
        assert_eq!(dict.get("co.uk").unwrap(), "uk-rule");
        assert_eq!(dict.len(), 2);
        assert!(matches!(dict.get("org"), Err(PslError::NotFound(_))));
    }

    #[test]
    fn test_set_replaces_value_without_new_key() {
        let mut dict = store();
        dict.set("com", "first".to_string()).unwrap();
        dict.set("com", "second".to_string()).unwrap();

        assert_eq!(dict.get("com").unwrap(), "second");
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.keys(false).len(), 1);
    }

    #[test]
    fn test_case_sensitive_get() {
        let mut dict = store();
        dict.set("Example", "v".to_string()).unwrap();

        assert!(dict.get("Example").is_ok());
        assert!(dict.get("example").is_err());
        assert!(dict.has_key("Example"));
        assert!(!dict.has_key("EXAMPLE"));
    }

    #[test]
    fn test_nocase_operations() {
        let mut dict = store();
        dict.set_nocase("GooGle.COM", "v".to_string()).unwrap();

        assert_eq!(dict.get("google.com").unwrap(), "v");
        assert_eq!(dict.get_nocase("GOOGLE.com").unwrap(), "v");
        assert!(dict.has_key_nocase("Google.Com"));
        assert_eq!(dict.keys(true), vec![Cow::<str>::Owned("google.com".into())]);
    }

    #[test]
    fn test_empty_key_is_usage_error() {
        let mut dict = store();
        assert_eq!(dict.last_error_code(), DictErrorCode::Ok);

        assert!(matches!(dict.set("", "v".to_string()), Err(PslError::NullKey)));
        assert_eq!(dict.last_error_code(), DictErrorCode::NullKey);

        dict.clear_error();
        assert!(matches!(dict.get(""), Err(PslError::NullKey)));
        assert!(!dict.has_key_nocase(""));
        assert!(dict.remove("").is_none());
        let (code, message) = dict.last_error().unwrap();
        assert_eq!(code, DictErrorCode::NullKey);
        assert!(message.contains("empty"));
    }

    #[test]
    fn test_not_found_is_not_recorded() {
        let dict = store();
        assert!(dict.get("missing").is_err());
        assert!(!dict.has_key("missing"));
        assert!(dict.last_error().is_none());
    }

    #[test]
    fn test_remove_then_set_again() {
        let mut dict = store();
        dict.set("com", "a".to_string()).unwrap();

        assert_eq!(dict.remove("com"), Some("a".to_string()));
        assert!(!dict.has_key("com"));
        assert!(dict.is_empty());
        assert_eq!(dict.remove("com"), None);

        dict.set("com", "b".to_string()).unwrap();
        assert_eq!(dict.get("com").unwrap(), "b");
    }

    #[test]
    fn test_collisions_in_one_slot() {
        let mut dict = store();
        let keys = ["abc", "acb", "bac", "bca", "cab", "cba"];
        let slot = dict.slot_index(keys[0]);
        for key in keys {
            assert_eq!(dict.slot_index(key), slot);
            dict.set(key, key.to_uppercase()).unwrap();
        }
        assert_eq!(dict.len(), keys.len());

        // remove the first, a middle and the last node of the chain
        assert_eq!(dict.remove("abc"), Some("ABC".to_string()));
        assert_eq!(dict.remove("bca"), Some("BCA".to_string()));
        assert_eq!(dict.remove("cba"), Some("CBA".to_string()));

        for key in ["acb", "bac", "cab"] {
            assert_eq!(dict.get(key).unwrap(), &key.to_uppercase());
        }
        for key in ["abc", "bca", "cba"] {
            assert!(!dict.has_key(key));
        }
        assert_eq!(dict.len(), 3);
    }

    #[test]
    fn test_keys_borrowed_and_cloned() {
        let mut dict = store();
        for key in ["com", "net", "org"] {
            dict.set(key, String::new()).unwrap();
        }
        let mut borrowed: Vec<String> = dict.keys(false).into_iter().map(|k| k.into_owned()).collect();
        borrowed.sort();
        assert_eq!(borrowed, vec!["com", "net", "org"]);

        let cloned = dict.keys(true);
        assert!(cloned.iter().all(|k| matches!(k, Cow::Owned(_))));
        assert_eq!(cloned.len(), 3);
    }

    #[test]
    fn test_iter_visits_every_entry() {
        let mut dict: DictStore<usize> = DictStore::with_seed(9).unwrap();
        for i in 0..500 {
            dict.set(&format!("label{}.example", i), i).unwrap();
        }
        let sum: usize = dict.iter().map(|(_, v)| *v).sum();
        assert_eq!(sum, (0..500).sum::<usize>());
        assert_eq!((&dict).into_iter().count(), 500);
    }

    #[test]
    fn test_long_chain_drop() {
        let mut dict: DictStore<u32> = DictStore::with_seed(3).unwrap();
        // "a" repeated n times folds to 97^n mod p; these share few slots
        for n in 1..2000 {
            dict.set(&"a".repeat(n), n as u32).unwrap();
        }
        assert_eq!(dict.len(), 1999);
        drop(dict);
    }
}
