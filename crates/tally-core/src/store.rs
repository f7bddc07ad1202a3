use async_trait::async_trait;

use crate::{registry::Registry, Result};

/// Port for the remote registry document.
///
/// Both calls move the whole document; there is no partial update, so two
/// writers racing a read-modify-write can drop each other's changes.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    async fn load(&self) -> Result<Registry>;
    async fn save(&self, registry: &Registry) -> Result<()>;
}

/// Store used when no backend credentials are configured: every read is an
/// empty registry and writes go nowhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledStore;

#[async_trait]
impl RegistryStore for DisabledStore {
    async fn load(&self) -> Result<Registry> {
        Ok(Registry::new())
    }

    async fn save(&self, _registry: &Registry) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;

    #[tokio::test]
    async fn disabled_store_forgets_writes() {
        let store = DisabledStore;
        store
            .save(&Registry::from_users([UserId(1)]))
            .await
            .unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }
}
