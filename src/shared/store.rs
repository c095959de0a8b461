use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::{Device, DeviceFields};
use crate::error::StoreError;
use crate::id_generator::{IdGenerator, RandomIdGenerator};
use crate::time::{Clock, SystemClock};
use crate::validators::validate_device_fields;

/// Device persistence behind the views.
///
/// `list` returns every record the backend holds; filtering by owner is the
/// caller's concern.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Device>, StoreError>;
    async fn get(&self, id: &str) -> Result<Option<Device>, StoreError>;
    async fn create(&self, fields: DeviceFields) -> Result<Device, StoreError>;
    async fn update(&self, id: &str, fields: DeviceFields) -> Result<Device, StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: EntityStore + ?Sized> EntityStore for Arc<S> {
    async fn list(&self) -> Result<Vec<Device>, StoreError> {
        (**self).list().await
    }

    async fn get(&self, id: &str) -> Result<Option<Device>, StoreError> {
        (**self).get(id).await
    }

    async fn create(&self, fields: DeviceFields) -> Result<Device, StoreError> {
        (**self).create(fields).await
    }

    async fn update(&self, id: &str, fields: DeviceFields) -> Result<Device, StoreError> {
        (**self).update(id, fields).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        (**self).delete(id).await
    }
}

/// Process-local store, kept in insertion order
pub struct InMemoryStore {
    devices: RwLock<Vec<Device>>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    failures: AtomicUsize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(RandomIdGenerator::new()), Arc::new(SystemClock::new()))
    }
}

impl InMemoryStore {
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            devices: RwLock::new(Vec::new()),
            ids,
            clock,
            failures: AtomicUsize::new(0),
        }
    }

    /// Seed existing records as-is, ids and all
    pub async fn insert_raw(&self, devices: impl IntoIterator<Item = Device>) {
        self.devices.write().await.extend(devices);
    }

    /// Make the next `n` calls fail with a backend error
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.devices.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.devices.read().await.is_empty()
    }

    fn check_injected_failure(&self, op: &str) -> Result<(), StoreError> {
        let consumed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if consumed.is_ok() {
            warn!(operation = op, "Injected store failure");
            return Err(StoreError::Backend("network unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn list(&self) -> Result<Vec<Device>, StoreError> {
        self.check_injected_failure("list")?;
        let devices = self.devices.read().await.clone();
        debug!(count = devices.len(), "Listed devices");
        Ok(devices)
    }

    async fn get(&self, id: &str) -> Result<Option<Device>, StoreError> {
        self.check_injected_failure("get")?;
        let devices = self.devices.read().await;
        Ok(devices.iter().find(|d| d.id == id).cloned())
    }

    async fn create(&self, fields: DeviceFields) -> Result<Device, StoreError> {
        self.check_injected_failure("create")?;
        validate_device_fields(&fields)?;

        let device = Device::from_fields(self.ids.next_id(), self.clock.now(), fields);
        self.devices.write().await.push(device.clone());

        info!(
            device_id = %device.id,
            serial_number = %device.serial_number,
            "Created device"
        );
        Ok(device)
    }

    async fn update(&self, id: &str, fields: DeviceFields) -> Result<Device, StoreError> {
        self.check_injected_failure("update")?;
        validate_device_fields(&fields)?;

        let mut devices = self.devices.write().await;
        let slot = devices
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        *slot = slot.replaced_with(fields);
        info!(device_id = %id, "Updated device");
        Ok(slot.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.check_injected_failure("delete")?;

        let mut devices = self.devices.write().await;
        let before = devices.len();
        devices.retain(|d| d.id != id);
        if devices.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }

        info!(device_id = %id, "Deleted device");
        Ok(())
    }
}
