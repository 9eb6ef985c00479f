//! # Ticket Cache
//!
//! Filesystem cache of WSAA login responses, keyed by
//! (taxpayer, service, environment) through the
//! `TA-<cuit>-<service>[-production].xml` naming convention.
//!
//! Writes are whole-file replacements (write to a sibling temp file, then
//! rename), so a concurrent renewal in another process costs at most an
//! extra login round-trip, never a torn cache entry. No locking — the SDK
//! is a single-process client.

use std::path::{Path, PathBuf};

use afip_core::{AfipError, Cuit, Environment};

/// Cache of raw `loginTicketResponse` payloads.
#[derive(Debug, Clone)]
pub struct TicketCache {
    dir: PathBuf,
}

impl TicketCache {
    /// A cache rooted at `dir`. The directory is created on first store.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Deterministic entry path for a (taxpayer, service, environment) key.
    pub fn entry_path(&self, cuit: &Cuit, service: &str, environment: Environment) -> PathBuf {
        self.dir.join(format!(
            "TA-{}-{}{}.xml",
            cuit.as_str(),
            service,
            environment.cache_suffix()
        ))
    }

    /// Read the cached payload for a key.
    ///
    /// Absent entries are `Ok(None)`; an entry that exists but cannot be
    /// read is a File error.
    pub fn load(
        &self,
        cuit: &Cuit,
        service: &str,
        environment: Environment,
    ) -> Result<Option<String>, AfipError> {
        let path = self.entry_path(cuit, service, environment);
        if !path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| AfipError::file(path.display(), &e))
    }

    /// Replace the cached payload for a key.
    pub fn store(
        &self,
        cuit: &Cuit,
        service: &str,
        environment: Environment,
        payload: &str,
    ) -> Result<(), AfipError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| AfipError::file(self.dir.display(), &e))?;
        let path = self.entry_path(cuit, service, environment);
        let tmp = tmp_path(&path);
        std::fs::write(&tmp, payload).map_err(|e| AfipError::file(tmp.display(), &e))?;
        std::fs::rename(&tmp, &path).map_err(|e| AfipError::file(path.display(), &e))
    }

    /// Drop the cached payload for a key, if any.
    pub fn evict(
        &self,
        cuit: &Cuit,
        service: &str,
        environment: Environment,
    ) -> Result<(), AfipError> {
        let path = self.entry_path(cuit, service, environment);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AfipError::file(path.display(), &e)),
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cuit() -> Cuit {
        Cuit::new("20294192345").expect("cuit")
    }

    #[test]
    fn entry_names_follow_the_convention() {
        let cache = TicketCache::new("/var/cache/afip");
        assert_eq!(
            cache.entry_path(&cuit(), "wsfe", Environment::Testing),
            PathBuf::from("/var/cache/afip/TA-20294192345-wsfe.xml")
        );
        assert_eq!(
            cache.entry_path(&cuit(), "wsfe", Environment::Production),
            PathBuf::from("/var/cache/afip/TA-20294192345-wsfe-production.xml")
        );
    }

    #[test]
    fn absent_entry_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = TicketCache::new(dir.path());
        let loaded = cache
            .load(&cuit(), "wsfe", Environment::Testing)
            .expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn store_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = TicketCache::new(dir.path().join("nested"));
        cache
            .store(&cuit(), "wsfe", Environment::Testing, "<ticket/>")
            .expect("store");
        let loaded = cache
            .load(&cuit(), "wsfe", Environment::Testing)
            .expect("load");
        assert_eq!(loaded.as_deref(), Some("<ticket/>"));

        // No stray temp file left behind.
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("nested"))
            .expect("read_dir")
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn environments_do_not_collide() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = TicketCache::new(dir.path());
        cache
            .store(&cuit(), "wsfe", Environment::Testing, "test-ta")
            .expect("store");
        let prod = cache
            .load(&cuit(), "wsfe", Environment::Production)
            .expect("load");
        assert!(prod.is_none());
    }

    #[test]
    fn evict_removes_the_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = TicketCache::new(dir.path());
        cache
            .store(&cuit(), "wsfe", Environment::Testing, "<ticket/>")
            .expect("store");
        cache
            .evict(&cuit(), "wsfe", Environment::Testing)
            .expect("evict");
        assert!(cache
            .load(&cuit(), "wsfe", Environment::Testing)
            .expect("load")
            .is_none());
        // Evicting an absent entry is fine.
        cache
            .evict(&cuit(), "wsfe", Environment::Testing)
            .expect("evict absent");
    }
}
