// src/registry/hosts.rs
use super::host::Host;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{0} is already being monitored")]
    AlreadyMonitored(Host),

    #[error("{0} is not in the monitored list")]
    NotFound(Host),
}

/// Insertion-ordered set of monitored hosts.
///
/// Readers get an `Arc` snapshot of the list; writers copy on write, so a
/// snapshot taken by the scheduler never observes a later add or remove.
pub struct HostRegistry {
    hosts: RwLock<Arc<Vec<Host>>>,
    count_tx: watch::Sender<usize>,
}

impl HostRegistry {
    pub fn new() -> Self {
        let (count_tx, _) = watch::channel(0);

        Self {
            hosts: RwLock::new(Arc::new(Vec::new())),
            count_tx,
        }
    }

    pub async fn add(&self, host: Host) -> Result<(), RegistryError> {
        let mut hosts = self.hosts.write().await;

        if hosts.contains(&host) {
            return Err(RegistryError::AlreadyMonitored(host));
        }

        Arc::make_mut(&mut *hosts).push(host.clone());
        self.count_tx.send_replace(hosts.len());

        tracing::info!("Added host {} ({} monitored)", host, hosts.len());
        Ok(())
    }

    pub async fn remove(&self, host: &Host) -> Result<(), RegistryError> {
        let mut hosts = self.hosts.write().await;

        let Some(index) = hosts.iter().position(|h| h == host) else {
            return Err(RegistryError::NotFound(host.clone()));
        };

        Arc::make_mut(&mut *hosts).remove(index);
        self.count_tx.send_replace(hosts.len());

        tracing::info!("Removed host {} ({} monitored)", host, hosts.len());
        Ok(())
    }

    pub async fn list(&self) -> Arc<Vec<Host>> {
        self.hosts.read().await.clone()
    }

    pub async fn contains(&self, host: &Host) -> bool {
        self.hosts.read().await.contains(host)
    }

    pub fn len(&self) -> usize {
        *self.count_tx.borrow()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Watch the number of monitored hosts.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.count_tx.subscribe()
    }
}

impl Default for HostRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_add_then_list_contains_host() {
        let registry = HostRegistry::new();
        registry.add(Host::from("1.1.1.1")).await.unwrap();
        registry.add(Host::from("example.com")).await.unwrap();

        let hosts = registry.list().await;
        assert_eq!(
            hosts.as_slice(),
            &[Host::from("1.1.1.1"), Host::from("example.com")]
        );
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_add_rejected() {
        let registry = HostRegistry::new();
        registry.add(Host::from("1.1.1.1")).await.unwrap();

        let err = registry.add(Host::from("1.1.1.1")).await.unwrap_err();
        assert_eq!(err, RegistryError::AlreadyMonitored(Host::from("1.1.1.1")));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_no_normalisation() {
        let registry = HostRegistry::new();
        registry.add(Host::from("Example.com")).await.unwrap();
        registry.add(Host::from("example.com")).await.unwrap();
        registry.add(Host::from("example.com ")).await.unwrap();

        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn test_remove() {
        let registry = HostRegistry::new();
        registry.add(Host::from("1.1.1.1")).await.unwrap();
        registry.add(Host::from("8.8.8.8")).await.unwrap();

        registry.remove(&Host::from("1.1.1.1")).await.unwrap();

        assert!(!registry.contains(&Host::from("1.1.1.1")).await);
        assert_eq!(registry.list().await.as_slice(), &[Host::from("8.8.8.8")]);
    }

    #[tokio::test]
    async fn test_remove_absent_host_leaves_registry_unchanged() {
        let registry = HostRegistry::new();
        registry.add(Host::from("1.1.1.1")).await.unwrap();
        let before = registry.list().await;

        let err = registry.remove(&Host::from("9.9.9.9")).await.unwrap_err();

        assert_eq!(err, RegistryError::NotFound(Host::from("9.9.9.9")));
        assert_eq!(registry.list().await, before);
    }

    #[tokio::test]
    async fn test_snapshot_isolated_from_mutation() {
        let registry = HostRegistry::new();
        registry.add(Host::from("1.1.1.1")).await.unwrap();

        let snapshot = registry.list().await;
        registry.add(Host::from("8.8.8.8")).await.unwrap();
        registry.remove(&Host::from("1.1.1.1")).await.unwrap();

        assert_eq!(snapshot.as_slice(), &[Host::from("1.1.1.1")]);
        assert_eq!(registry.list().await.as_slice(), &[Host::from("8.8.8.8")]);
    }

    #[tokio::test]
    async fn test_subscribe_tracks_count() {
        let registry = HostRegistry::new();
        let mut rx = registry.subscribe();
        assert_eq!(*rx.borrow_and_update(), 0);

        registry.add(Host::from("1.1.1.1")).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 1);

        registry.remove(&Host::from("1.1.1.1")).await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 0);
    }

    proptest! {
        #[test]
        fn prop_list_has_no_duplicates(ops in prop::collection::vec((any::<bool>(), 0u8..6), 0..40)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let registry = HostRegistry::new();
                let mut model: Vec<Host> = Vec::new();

                for (is_add, n) in ops {
                    let host = Host::new(format!("10.0.0.{}", n));
                    if is_add {
                        let added = registry.add(host.clone()).await.is_ok();
                        prop_assert_eq!(added, !model.contains(&host));
                        if added {
                            model.push(host);
                        }
                    } else {
                        let removed = registry.remove(&host).await.is_ok();
                        prop_assert_eq!(removed, model.contains(&host));
                        model.retain(|h| h != &host);
                    }
                }

                let listed = registry.list().await;
                prop_assert_eq!(listed.as_slice(), model.as_slice());
                Ok(())
            })?;
        }
    }
}
