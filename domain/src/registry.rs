use crate::normalize::{normalize, redirect_target};
use crate::{Clock, CodeGenerator, CoreError, LinkRecord, LinkSet, LinkStore, ShortCode};

/// Outcome of [`LinkRegistry::create_or_reuse`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Created {
    pub record: LinkRecord,
    /// True when an existing record for the same URL was returned.
    pub reused: bool,
}

/// Outcome of [`LinkRegistry::resolve`].
#[derive(Debug)]
pub struct Resolved {
    /// The record as it was before this visit was counted.
    pub record: LinkRecord,
    /// Normalized URL to redirect to.
    pub target: String,
    /// Set when persisting the incremented counter failed. The redirect
    /// still happens; callers only report it.
    pub visit_error: Option<CoreError>,
}

/// Application service orchestrating creation and resolution of short links.
///
/// Every call re-reads the whole set from the store, works on a local copy
/// and writes it back. Nothing here serializes concurrent callers: two
/// overlapping load/save sequences end up last-writer-wins. Callers that
/// share a store across threads should hold the registry behind a lock.
pub struct LinkRegistry<S: LinkStore, G: CodeGenerator, C: Clock> {
    store: S,
    generator: G,
    clock: C,
}

impl<S: LinkStore, G: CodeGenerator, C: Clock> LinkRegistry<S, G, C> {
    pub fn new(store: S, generator: G, clock: C) -> Self {
        Self {
            store,
            generator,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Shorten `raw_url`, reusing the record of an identical normalized URL.
    ///
    /// Reuse performs no write. A failed write of a new record is returned
    /// as an error.
    pub fn create_or_reuse(&self, raw_url: &str) -> Result<Created, CoreError> {
        let url = normalize(raw_url)?;
        let mut links = self.store.load()?;

        if let Some(existing) = links.find_by_url(&url) {
            return Ok(Created {
                record: existing.clone(),
                reused: true,
            });
        }

        let code = self.generator.generate(&links);
        let record = LinkRecord::new(code, url, self.clock.now());
        links.push(record.clone())?;
        self.store.save(&links)?;
        Ok(Created {
            record,
            reused: false,
        })
    }

    /// Look up `code` and count the visit.
    pub fn resolve(&self, code: &str) -> Result<Resolved, CoreError> {
        // Anything that cannot be a code cannot be stored either
        let code = ShortCode::new(code).map_err(|_| CoreError::NotFound)?;
        let mut links = self.store.load()?;

        let entry = links.find_by_code_mut(&code).ok_or(CoreError::NotFound)?;
        let record = entry.clone();
        entry.visit_count = entry.visit_count.saturating_add(1);

        let visit_error = self.store.save(&links).err();
        Ok(Resolved {
            target: redirect_target(&record.original_url),
            record,
            visit_error,
        })
    }

    /// The whole set, oldest first.
    pub fn list(&self) -> Result<LinkSet, CoreError> {
        self.store.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::InMemoryStore;
    use crate::code::RandomCodeGenerator;
    use std::collections::HashSet;
    use std::time::{Duration, SystemTime};

    struct TestClock;
    impl Clock for TestClock {
        fn now(&self) -> SystemTime {
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
        }
    }

    fn registry() -> LinkRegistry<InMemoryStore, RandomCodeGenerator, TestClock> {
        LinkRegistry::new(
            InMemoryStore::new(),
            RandomCodeGenerator::default(),
            TestClock,
        )
    }

    #[test]
    fn create_is_idempotent_per_normalized_url() {
        let reg = registry();
        let first = reg.create_or_reuse("example.com/page").unwrap();
        assert!(!first.reused);
        let second = reg.create_or_reuse("  http://example.com/page ").unwrap();
        assert!(second.reused);
        assert_eq!(first.record.short_code, second.record.short_code);
        assert_eq!(reg.list().unwrap().len(), 1);
    }

    #[test]
    fn new_record_starts_unvisited_with_timestamp() {
        let reg = registry();
        let created = reg.create_or_reuse("https://e.example").unwrap();
        assert_eq!(created.record.visit_count, 0);
        assert_eq!(created.record.created_at, Some(TestClock.now()));
        assert_eq!(created.record.short_code.as_str().len(), 6);
    }

    #[test]
    fn distinct_urls_get_distinct_codes() {
        let reg = registry();
        let mut codes = HashSet::new();
        for i in 0..50 {
            let created = reg.create_or_reuse(&format!("https://e.example/{i}")).unwrap();
            codes.insert(created.record.short_code);
        }
        assert_eq!(codes.len(), 50);
        assert_eq!(reg.list().unwrap().len(), 50);
    }

    #[test]
    fn resolve_round_trips_to_normalized_url() {
        let reg = registry();
        let created = reg.create_or_reuse("example.com/x").unwrap();
        let resolved = reg.resolve(created.record.short_code.as_str()).unwrap();
        assert_eq!(resolved.target, "http://example.com/x");
        assert_eq!(resolved.record.original_url, "http://example.com/x");
        assert!(resolved.visit_error.is_none());
    }

    #[test]
    fn resolve_counts_each_visit() {
        let reg = registry();
        let code = reg
            .create_or_reuse("https://e.example")
            .unwrap()
            .record
            .short_code;
        for k in 0..5u64 {
            let resolved = reg.resolve(code.as_str()).unwrap();
            assert_eq!(resolved.record.visit_count, k);
        }
        let links = reg.list().unwrap();
        assert_eq!(links.find_by_code(&code).map(|r| r.visit_count), Some(5));
    }

    #[test]
    fn resolve_unknown_code_is_not_found() {
        let reg = registry();
        assert!(matches!(reg.resolve("zzzzzz"), Err(CoreError::NotFound)));
        assert!(matches!(reg.resolve("a/b"), Err(CoreError::NotFound)));
    }

    #[test]
    fn invalid_url_is_rejected_without_write() {
        let reg = registry();
        reg.store().set_fail_saves(true);
        let err = reg.create_or_reuse("not a url").unwrap_err();
        assert!(matches!(err, CoreError::InvalidUrl(_)));
    }

    #[test]
    fn create_surfaces_store_failure() {
        let reg = registry();
        reg.store().set_fail_saves(true);
        let err = reg.create_or_reuse("https://e.example").unwrap_err();
        assert!(matches!(err, CoreError::Store(_)));
        assert!(reg.list().unwrap().is_empty());
    }

    #[test]
    fn reuse_does_not_need_a_write() {
        let reg = registry();
        reg.create_or_reuse("https://e.example").unwrap();
        reg.store().set_fail_saves(true);
        let again = reg.create_or_reuse("https://e.example").unwrap();
        assert!(again.reused);
    }

    #[test]
    fn resolve_still_redirects_when_count_write_fails() {
        let reg = registry();
        let code = reg
            .create_or_reuse("https://e.example")
            .unwrap()
            .record
            .short_code;
        reg.store().set_fail_saves(true);
        let resolved = reg.resolve(code.as_str()).unwrap();
        assert_eq!(resolved.target, "https://e.example");
        assert!(matches!(resolved.visit_error, Some(CoreError::Store(_))));

        reg.store().set_fail_saves(false);
        let links = reg.list().unwrap();
        assert_eq!(links.find_by_code(&code).map(|r| r.visit_count), Some(0));
    }

    #[test]
    fn resolve_prefixes_legacy_urls_without_scheme() {
        let legacy: LinkSet = vec![LinkRecord {
            short_code: ShortCode::new("old001").unwrap(),
            original_url: "legacy.example/path".into(),
            created_at: None,
            visit_count: 3,
        }]
        .into_iter()
        .collect();
        let reg = LinkRegistry::new(
            InMemoryStore::with_links(legacy),
            RandomCodeGenerator::default(),
            TestClock,
        );
        let resolved = reg.resolve("old001").unwrap();
        assert_eq!(resolved.target, "http://legacy.example/path");
        assert_eq!(resolved.record.visit_count, 3);
    }
}
