use bevy::prelude::*;
use std::sync::{Arc, Mutex};

/// Object URLs created for blob fallbacks that have not been revoked yet.
#[derive(Resource, Clone, Default, Debug)]
pub struct PendingObjectUrls(Arc<Mutex<Vec<String>>>);

impl PendingObjectUrls {
    pub fn len(&self) -> usize {
        self.0.lock().map(|urls| urls.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn register(&self, url: &str) {
        if let Ok(mut urls) = self.0.lock() {
            urls.push(url.to_string());
        }
    }

    /// Returns true when the URL was still pending.
    fn release(&self, url: &str) -> bool {
        let Ok(mut urls) = self.0.lock() else {
            return false;
        };
        match urls.iter().position(|u| u == url) {
            Some(index) => {
                urls.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Revoke every outstanding URL. Guards dropped afterwards become no-ops.
    pub fn revoke_all(&self) -> usize {
        let drained = match self.0.lock() {
            Ok(mut urls) => std::mem::take(&mut *urls),
            Err(_) => return 0,
        };
        for url in &drained {
            revoke_object_url(url);
        }
        drained.len()
    }
}

/// Guard around a browser object URL; revoked exactly once on drop.
#[derive(Debug)]
pub struct ObjectUrl {
    url: String,
    pending: PendingObjectUrls,
}

impl ObjectUrl {
    pub fn new(url: String, pending: &PendingObjectUrls) -> Self {
        pending.register(&url);
        Self {
            url,
            pending: pending.clone(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        if self.pending.release(&self.url) {
            revoke_object_url(&self.url);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn revoke_object_url(url: &str) {
    if let Err(e) = web_sys::Url::revoke_object_url(url) {
        warn!("Failed to revoke object URL {}: {:?}", url, e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn revoke_object_url(url: &str) {
    debug!("Released object URL {}", url);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_releases_on_drop() {
        let pending = PendingObjectUrls::default();
        {
            let guard = ObjectUrl::new("blob:model-1".into(), &pending);
            assert_eq!(guard.as_str(), "blob:model-1");
            assert_eq!(pending.len(), 1);
        }
        assert!(pending.is_empty());
    }

    #[test]
    fn test_revoke_all_clears_outstanding_guards() {
        let pending = PendingObjectUrls::default();
        let a = ObjectUrl::new("blob:a".into(), &pending);
        let b = ObjectUrl::new("blob:b".into(), &pending);
        assert_eq!(pending.revoke_all(), 2);
        assert!(pending.is_empty());
        drop(a);
        drop(b);
        assert!(pending.is_empty());
    }
}
