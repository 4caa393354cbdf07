//! Sources of change set descriptions.
//!
//! `CloudFormationProvider` (in `aws`) fetches live descriptions,
//! [`CachedProvider`] keeps them on disk between runs, and
//! [`OfflineProvider`] and [`InMemoryProvider`] never touch the network.

use crate::arn;
use crate::changeset::ChangeSet;
use crate::error::{Error, Result};
use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub trait ChangeSetProvider {
    /// Describe a change set given by name or ARN. `stack_name` is needed
    /// when the change set is given by name.
    fn describe_change_set(&self, change_set: &str, stack_name: Option<&str>) -> Result<ChangeSet>;
}

impl<P: ChangeSetProvider + ?Sized> ChangeSetProvider for &P {
    fn describe_change_set(&self, change_set: &str, stack_name: Option<&str>) -> Result<ChangeSet> {
        (**self).describe_change_set(change_set, stack_name)
    }
}

impl<P: ChangeSetProvider + ?Sized> ChangeSetProvider for Box<P> {
    fn describe_change_set(&self, change_set: &str, stack_name: Option<&str>) -> Result<ChangeSet> {
        (**self).describe_change_set(change_set, stack_name)
    }
}

/// Persistent cache of change set descriptions in a directory, one
/// `<change set name>.json` file each.
#[derive(Debug)]
pub struct CachedProvider<P> {
    inner: P,
    cache_dir: PathBuf,
}

impl<P> CachedProvider<P> {
    pub fn new(inner: P, cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self { inner, cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn cache_path(&self, change_set: &str) -> Result<PathBuf> {
        let name = arn::change_set_name(change_set)?;
        Ok(self.cache_dir.join(format!("{name}.json")))
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: ChangeSetProvider> ChangeSetProvider for CachedProvider<P> {
    fn describe_change_set(&self, change_set: &str, stack_name: Option<&str>) -> Result<ChangeSet> {
        let path = self.cache_path(change_set)?;
        if let Some(cached) = read_cached(&path) {
            info!(change_set = %change_set, path = %path.display(), "using cached change set");
            return Ok(cached);
        }

        let result = self.inner.describe_change_set(change_set, stack_name)?;
        if let Err(err) = write_cached(&path, &result) {
            debug!(path = %path.display(), error = %err, "cannot cache change set");
        }
        Ok(result)
    }
}

fn read_cached(path: &Path) -> Option<ChangeSet> {
    let contents = std::fs::read_to_string(path).ok()?;
    // Unreadable entries are fetched again
    serde_json::from_str(&contents).ok()
}

fn write_cached(path: &Path, change_set: &ChangeSet) -> Result<()> {
    let data = serde_json::to_vec_pretty(change_set)?;
    std::fs::write(path, data)?;
    Ok(())
}

/// Provider for working purely from a cache directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProvider;

impl ChangeSetProvider for OfflineProvider {
    fn describe_change_set(
        &self,
        change_set: &str,
        _stack_name: Option<&str>,
    ) -> Result<ChangeSet> {
        Err(Error::ChangeSetNotFound(change_set.to_string()))
    }
}

/// Change sets held in memory, keyed by change set name.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    change_sets: HashMap<String, ChangeSet>,
    calls: Cell<usize>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, change_set: ChangeSet) {
        self.change_sets.insert(name.into(), change_set);
    }

    pub fn with(mut self, name: impl Into<String>, change_set: ChangeSet) -> Self {
        self.insert(name, change_set);
        self
    }

    /// Number of lookups so far, successful or not.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl ChangeSetProvider for InMemoryProvider {
    fn describe_change_set(
        &self,
        change_set: &str,
        _stack_name: Option<&str>,
    ) -> Result<ChangeSet> {
        self.calls.set(self.calls.get() + 1);
        let name = arn::change_set_name(change_set)?;
        self.change_sets
            .get(&name)
            .cloned()
            .ok_or(Error::ChangeSetNotFound(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change_set(stack: &str) -> ChangeSet {
        ChangeSet {
            stack_name: stack.to_string(),
            ..ChangeSet::default()
        }
    }

    #[test]
    fn in_memory_lookup_accepts_arns() {
        let provider = InMemoryProvider::new().with("cs-1", change_set("app"));
        let found = provider
            .describe_change_set("arn:aws:cloudformation:us-east-1:1:changeSet/cs-1/abc", None)
            .unwrap();
        assert_eq!(found.stack_name, "app");
        assert!(matches!(
            provider.describe_change_set("cs-2", None),
            Err(Error::ChangeSetNotFound(_))
        ));
        assert_eq!(provider.calls(), 2);
    }

    #[test]
    fn cache_hit_skips_the_inner_provider() {
        let dir = tempfile::tempdir().unwrap();
        let inner = InMemoryProvider::new().with("cs-1", change_set("app"));
        let provider = CachedProvider::new(inner, dir.path()).unwrap();

        let first = provider.describe_change_set("cs-1", Some("app")).unwrap();
        assert_eq!(provider.inner().calls(), 1);
        assert!(dir.path().join("cs-1.json").is_file());

        let second = provider
            .describe_change_set("arn:aws:cloudformation:us-east-1:1:changeSet/cs-1/abc", None)
            .unwrap();
        assert_eq!(provider.inner().calls(), 1);
        assert_eq!(first.stack_name, second.stack_name);
    }

    #[test]
    fn unparseable_cache_entries_are_refetched() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cs-1.json"), "{ not json").unwrap();
        let inner = InMemoryProvider::new().with("cs-1", change_set("app"));
        let provider = CachedProvider::new(inner, dir.path()).unwrap();
        let found = provider.describe_change_set("cs-1", None).unwrap();
        assert_eq!(found.stack_name, "app");
        assert_eq!(provider.inner().calls(), 1);
        let cached = std::fs::read_to_string(dir.path().join("cs-1.json")).unwrap();
        assert_eq!(ChangeSet::from_json(&cached).unwrap().stack_name, "app");
    }

    #[test]
    fn cache_rejects_foreign_arns() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CachedProvider::new(OfflineProvider, dir.path()).unwrap();
        let err = provider
            .describe_change_set("arn:aws:cloudformation:us-east-1:1:stack/app/abc", None)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedIdentifier { .. }));
    }

    #[test]
    fn offline_provider_reads_only_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let provider =
            CachedProvider::new(OfflineProvider, dir.path().join("nested/cache")).unwrap();
        assert!(provider.cache_dir().is_dir());
        assert!(matches!(
            provider.describe_change_set("cs-1", None),
            Err(Error::ChangeSetNotFound(_))
        ));
        std::fs::write(
            dir.path().join("nested/cache/cs-1.json"),
            r#"{"StackName": "app", "Changes": []}"#,
        )
        .unwrap();
        assert_eq!(provider.describe_change_set("cs-1", None).unwrap().stack_name, "app");
    }

    #[test]
    fn failing_cache_write_still_returns_the_change_set() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the entry should go makes both read and write fail
        std::fs::create_dir(dir.path().join("cs.json")).unwrap();
        let inner = InMemoryProvider::new().with("cs", change_set("app"));
        let provider = CachedProvider::new(inner, dir.path()).unwrap();

        let found = provider.describe_change_set("cs", Some("app")).unwrap();
        assert_eq!(found.stack_name, "app");
        assert_eq!(provider.inner().calls(), 1);
        assert!(dir.path().join("cs.json").is_dir());
    }
}
