use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Arc, RwLock};

use permit_auth::{CacheError, CachedAnswer, QueryCache};

/// In-memory query cache for tests/dev.
///
/// Keys are kept ordered so a group (prefix) invalidation is a range scan.
/// Entries never expire. Answers and group generations share one lock, which
/// makes `put_if_generation` atomic with `forget_group`.
#[derive(Debug, Default)]
pub struct InMemoryQueryCache {
    state: RwLock<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    answers: BTreeMap<String, CachedAnswer>,
    generations: HashMap<String, u64>,
}

impl InMemoryQueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> Result<usize, CacheError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.answers.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    /// Every cached key, in order (test/debug helper).
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.answers.keys().cloned().collect())
    }
}

fn poisoned() -> CacheError {
    CacheError::Unavailable("lock poisoned".to_string())
}

impl QueryCache for InMemoryQueryCache {
    fn get(&self, key: &str) -> Result<Option<CachedAnswer>, CacheError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.answers.get(key).cloned())
    }

    fn put(&self, key: &str, answer: CachedAnswer) -> Result<(), CacheError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        state.answers.insert(key.to_string(), answer);
        Ok(())
    }

    fn generation(&self, group: &str) -> Result<u64, CacheError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.generations.get(group).copied().unwrap_or(0))
    }

    fn put_if_generation(
        &self,
        key: &str,
        answer: CachedAnswer,
        group: &str,
        generation: u64,
    ) -> Result<bool, CacheError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if state.generations.get(group).copied().unwrap_or(0) != generation {
            return Ok(false);
        }
        state.answers.insert(key.to_string(), answer);
        Ok(true)
    }

    fn forget(&self, key: &str) -> Result<bool, CacheError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        Ok(state.answers.remove(key).is_some())
    }

    fn forget_group(&self, prefix: &str) -> Result<usize, CacheError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        *state.generations.entry(prefix.to_string()).or_insert(0) += 1;

        let doomed: Vec<String> = state
            .answers
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            state.answers.remove(key);
        }
        Ok(doomed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_compute_runs_producer_once() {
        let cache = InMemoryQueryCache::new();
        let mut calls = 0;

        for _ in 0..3 {
            let answer = cache
                .get_or_compute("g:k", "g:", || {
                    calls += 1;
                    Ok::<_, CacheError>(CachedAnswer::Flag(true))
                })
                .unwrap();
            assert_eq!(answer, CachedAnswer::Flag(true));
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn producer_errors_are_not_cached() {
        let cache = InMemoryQueryCache::new();
        let result = cache.get_or_compute("g:k", "g:", || Err(CacheError::Unavailable("down".into())));
        assert!(result.is_err());
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn answer_computed_across_a_clear_is_returned_but_not_stored() {
        let cache = InMemoryQueryCache::new();

        let answer = cache
            .get_or_compute("g:k", "g:", || {
                cache.forget_group("g:").unwrap();
                Ok::<_, CacheError>(CachedAnswer::Flag(false))
            })
            .unwrap();

        assert_eq!(answer, CachedAnswer::Flag(false));
        assert_eq!(cache.get("g:k").unwrap(), None);
        assert_eq!(cache.generation("g:").unwrap(), 1);

        cache.get_or_compute("g:k", "g:", || Ok::<_, CacheError>(CachedAnswer::Flag(true))).unwrap();
        assert_eq!(cache.get("g:k").unwrap(), Some(CachedAnswer::Flag(true)));
    }

    #[test]
    fn put_if_generation_rejects_outdated_generation() {
        let cache = InMemoryQueryCache::new();
        let before = cache.generation("a:roles:").unwrap();
        cache.forget_group("a:roles:").unwrap();

        assert!(!cache.put_if_generation("a:roles:", CachedAnswer::Values(vec![]), "a:roles:", before).unwrap());
        assert!(cache.put_if_generation("a:roles:", CachedAnswer::Values(vec![]), "a:roles:", before + 1).unwrap());
        // Other groups keep their own counters.
        assert_eq!(cache.generation("b:roles:").unwrap(), 0);
    }

    #[test]
    fn forget_group_removes_only_prefixed_keys() {
        let cache = InMemoryQueryCache::new();
        for key in ["a:has_role:", "a:has_role:admin", "a:has_role:editor", "a:roles:", "b:has_role:admin"] {
            cache.put(key, CachedAnswer::Flag(true)).unwrap();
        }

        assert_eq!(cache.forget_group("a:has_role:").unwrap(), 3);
        assert_eq!(
            cache.keys().unwrap(),
            vec!["a:roles:".to_string(), "b:has_role:admin".to_string()]
        );
        assert_eq!(cache.forget_group("zzz").unwrap(), 0);
    }

    #[test]
    fn forget_single_key() {
        let cache = InMemoryQueryCache::new();
        cache.put("k", CachedAnswer::Values(vec![])).unwrap();
        assert!(cache.forget("k").unwrap());
        assert!(!cache.forget("k").unwrap());
    }

    #[test]
    fn poisoned_lock_is_reported_not_hidden() {
        let cache = Arc::new(InMemoryQueryCache::new());
        let poisoner = cache.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.state.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(matches!(cache.len(), Err(CacheError::Unavailable(_))));
        assert!(matches!(cache.keys(), Err(CacheError::Unavailable(_))));
        assert!(matches!(cache.get("k"), Err(CacheError::Unavailable(_))));
    }
}
