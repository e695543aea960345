use parking_lot::RwLock;
use tracing::debug;

/// Read-through cache of profile names for completion and listing paths.
///
/// Invalidated by every write to the config or credentials store.
#[derive(Debug, Default)]
pub struct ProfileCache {
    names: RwLock<Option<Vec<String>>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return cached names, or populate the cache with `load` on a miss.
    ///
    /// Concurrent misses re-check under the write lock so only one caller
    /// runs `load`. A failed load leaves the cache empty.
    pub fn get_or_load<F, E>(&self, load: F) -> Result<Vec<String>, E>
    where
        F: FnOnce() -> Result<Vec<String>, E>,
    {
        if let Some(names) = self.names.read().as_ref() {
            return Ok(names.clone());
        }

        let mut guard = self.names.write();
        if let Some(names) = guard.as_ref() {
            return Ok(names.clone());
        }

        debug!("Profile name cache miss, loading from store");
        let names = load()?;
        *guard = Some(names.clone());
        Ok(names)
    }

    pub fn invalidate(&self) {
        *self.names.write() = None;
    }

    pub fn is_populated(&self) -> bool {
        self.names.read().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        convert::Infallible,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
    };

    fn names() -> Vec<String> {
        vec!["dev".to_string(), "prod".to_string()]
    }

    #[test]
    fn test_hit_skips_loader() {
        let cache = ProfileCache::new();
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let result = cache.get_or_load(|| {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Infallible>(names())
            });
            assert_eq!(result, Ok(names()));
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let cache = ProfileCache::new();
        let _ = cache.get_or_load(|| Ok::<_, Infallible>(names()));
        assert!(cache.is_populated());

        cache.invalidate();
        assert!(!cache.is_populated());

        let reloaded = cache.get_or_load(|| Ok::<_, Infallible>(vec!["new".to_string()]));
        assert_eq!(reloaded, Ok(vec!["new".to_string()]));
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let cache = ProfileCache::new();
        let result: Result<Vec<String>, &str> = cache.get_or_load(|| Err("unreadable"));
        assert_eq!(result, Err("unreadable"));
        assert!(!cache.is_populated());
    }

    #[test]
    fn test_concurrent_misses_load_once() {
        let cache = Arc::new(ProfileCache::new());
        let loads = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let loads = Arc::clone(&loads);
                thread::spawn(move || {
                    cache
                        .get_or_load(|| {
                            loads.fetch_add(1, Ordering::SeqCst);
                            Ok::<_, Infallible>(names())
                        })
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), names());
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
