//! Connection-scoped cache of the account's EC2 instances.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::api::{Ec2Api, Instance};
use crate::error::Result;

/// Fetches and caches the set of known instances, paging through multi-page
/// listings. The cache is populated on the first lookup and reused for the
/// lifetime of the connection; stale data is an accepted tradeoff for not
/// re-listing the account on every resolution. The mutex guards the
/// first-populate race when a connection is shared across tasks.
pub struct InstanceDirectory {
    ec2: Arc<dyn Ec2Api>,
    page_size: Option<i32>,
    cache: Mutex<Option<Vec<Instance>>>,
}

impl InstanceDirectory {
    pub fn new(ec2: Arc<dyn Ec2Api>, page_size: Option<i32>) -> Self {
        Self {
            ec2,
            page_size,
            cache: Mutex::new(None),
        }
    }

    /// Return all known instances, in provider listing order. `refresh`
    /// bypasses and replaces the cache.
    pub async fn list(&self, refresh: bool) -> Result<Vec<Instance>> {
        let mut cache = self.cache.lock().await;
        if !refresh {
            if let Some(cached) = cache.as_ref() {
                return Ok(cached.clone());
            }
        }

        let fetched = self.fetch_all().await?;
        *cache = Some(fetched.clone());
        Ok(fetched)
    }

    /// First instance (listing order) whose identity fields contain
    /// `address`, if any.
    pub async fn find_by_address(&self, address: &str) -> Result<Option<Instance>> {
        let instances = self.list(false).await?;
        Ok(instances.into_iter().find(|i| i.has_address(address)))
    }

    async fn fetch_all(&self) -> Result<Vec<Instance>> {
        let mut all = Vec::new();
        let mut token = None;

        loop {
            let page = self.ec2.list_instances(self.page_size, token).await?;
            all.extend(page.instances);
            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        debug!("directory: listed {} instances", all.len());
        Ok(all)
    }
}
