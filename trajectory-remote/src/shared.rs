//! In-process list store shared between threads.
use crate::store::{resolve_range, ListStore};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};
use trajectory_core::{MemoryError, Result};

/// A [`ListStore`] living in the current process.
///
/// Clones share the same lists, so each collector thread can own a handle.
#[derive(Clone, Default, Debug)]
pub struct SharedListStore {
    lists: Arc<Mutex<HashMap<String, Vec<String>>>>,
}

impl SharedListStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<String>>>> {
        self.lists
            .lock()
            .map_err(|_| MemoryError::RemoteUnavailable("list store lock poisoned".to_string()))
    }
}

impl ListStore for SharedListStore {
    fn rpush(&self, key: &str, values: &[String]) -> Result<usize> {
        let mut lists = self.lock()?;
        let list = lists.entry(key.to_string()).or_default();
        list.extend_from_slice(values);
        Ok(list.len())
    }

    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let lists = self.lock()?;
        Ok(match lists.get(key) {
            Some(list) => list[resolve_range(start, stop, list.len())].to_vec(),
            None => vec![],
        })
    }

    fn llen(&self, key: &str) -> Result<usize> {
        Ok(self.lock()?.get(key).map_or(0, Vec::len))
    }

    fn lindex(&self, key: &str, index: i64) -> Result<Option<String>> {
        let lists = self.lock()?;
        Ok(lists.get(key).and_then(|list| {
            let range = resolve_range(index, index, list.len());
            list[range].first().cloned()
        }))
    }

    fn del(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn strings(vs: &[&str]) -> Vec<String> {
        vs.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_list_commands() -> Result<()> {
        let store = SharedListStore::new();
        assert_eq!(store.llen("k")?, 0);
        assert_eq!(store.rpush("k", &strings(&["a", "b"]))?, 2);
        assert_eq!(store.rpush("k", &strings(&["c"]))?, 3);
        assert_eq!(store.lrange("k", 0, -1)?, strings(&["a", "b", "c"]));
        assert_eq!(store.lrange("k", 1, 1)?, strings(&["b"]));
        assert_eq!(store.lindex("k", -1)?, Some("c".to_string()));
        assert_eq!(store.lindex("k", 3)?, None);
        assert_eq!(store.lrange("other", 0, -1)?, Vec::<String>::new());

        store.del("k")?;
        assert_eq!(store.llen("k")?, 0);
        store.del("k")?;
        Ok(())
    }

    #[test]
    fn test_clones_share_lists() -> Result<()> {
        let store = SharedListStore::new();
        let handles = (0..4)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || -> Result<()> {
                    for j in 0..25 {
                        store.rpush("k", &[format!("{}-{}", i, j)])?;
                    }
                    Ok(())
                })
            })
            .collect::<Vec<_>>();
        for h in handles {
            h.join().expect("writer panicked")?;
        }
        assert_eq!(store.llen("k")?, 100);
        Ok(())
    }
}
