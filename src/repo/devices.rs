use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use plantpulse::{
    validate_device_fields, Clock, Device, DeviceFields, EntityStore, IdGenerator, StoreError,
};

/// Partition key of the devices table
const KEY_ATTRIBUTE: &str = "id";

/// Device store backed by a single DynamoDB table keyed by `id`
pub struct DynamoDbDeviceStore {
    client: DynamoDbClient,
    table_name: String,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl DynamoDbDeviceStore {
    pub fn new(
        client: DynamoDbClient,
        table_name: impl Into<String>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            ids,
            clock,
        }
    }

    /// Conditional PutItem
    ///
    /// # Arguments
    /// * `device` - Record to write
    /// * `condition` - Condition expression on the key attribute
    ///
    /// # Returns
    /// * `Ok(true)` - Item written
    /// * `Ok(false)` - Condition failed, nothing written
    /// * `Err(StoreError)` - DynamoDB error occurred
    async fn put_device(&self, device: &Device, condition: &str) -> Result<bool, StoreError> {
        let item = device_to_item(device)?;

        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression(condition)
            .expression_attribute_names("#id", KEY_ATTRIBUTE)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e)
                if e.as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false) =>
            {
                Ok(false)
            }
            Err(e) => Err(StoreError::Backend(format!("{:?}", e))),
        }
    }
}

#[async_trait]
impl EntityStore for DynamoDbDeviceStore {
    /// Scan the whole table, following `LastEvaluatedKey` until exhausted
    async fn list(&self) -> Result<Vec<Device>, StoreError> {
        let mut devices = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let result = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| StoreError::Backend(format!("{:?}", e)))?;

            devices.extend(readable_devices(result.items.unwrap_or_default()));

            match result.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        debug!(table = %self.table_name, count = devices.len(), "Scanned devices table");
        Ok(devices)
    }

    async fn get(&self, id: &str) -> Result<Option<Device>, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("{:?}", e)))?;

        // Check if item exists
        match result.item {
            Some(item) => Ok(Some(item_to_device(item)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, fields: DeviceFields) -> Result<Device, StoreError> {
        validate_device_fields(&fields)?;

        let device = Device::from_fields(self.ids.next_id(), self.clock.now(), fields);
        if !self.put_device(&device, "attribute_not_exists(#id)").await? {
            return Err(StoreError::Backend(format!(
                "Device id collision: {}",
                device.id
            )));
        }

        info!(
            device_id = %device.id,
            serial_number = %device.serial_number,
            "Created device"
        );
        Ok(device)
    }

    /// Full-record replace, conditional on the item still existing
    async fn update(&self, id: &str, fields: DeviceFields) -> Result<Device, StoreError> {
        validate_device_fields(&fields)?;

        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let device = existing.replaced_with(fields);

        if !self.put_device(&device, "attribute_exists(#id)").await? {
            return Err(StoreError::NotFound(id.to_string()));
        }

        info!(device_id = %id, "Updated device");
        Ok(device)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, AttributeValue::S(id.to_string()))
            .condition_expression("attribute_exists(#id)")
            .expression_attribute_names("#id", KEY_ATTRIBUTE)
            .send()
            .await;

        match result {
            Ok(_) => {
                info!(device_id = %id, "Deleted device");
                Ok(())
            }
            Err(e)
                if e.as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false) =>
            {
                Err(StoreError::NotFound(id.to_string()))
            }
            Err(e) => Err(StoreError::Backend(format!("{:?}", e))),
        }
    }
}

/// Convert a device into a DynamoDB item. Absent optional fields are left out
/// of the item entirely.
fn device_to_item(device: &Device) -> Result<HashMap<String, AttributeValue>, StoreError> {
    serde_dynamo::to_item(device).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Convert a DynamoDB item into a device
fn item_to_device(item: HashMap<String, AttributeValue>) -> Result<Device, StoreError> {
    serde_dynamo::from_item(item).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Decode a scanned page, skipping records that cannot be read at all
fn readable_devices(items: Vec<HashMap<String, AttributeValue>>) -> Vec<Device> {
    items
        .into_iter()
        .filter_map(|item| {
            let id = item
                .get(KEY_ATTRIBUTE)
                .and_then(|v| v.as_s().ok())
                .cloned()
                .unwrap_or_default();
            match item_to_device(item) {
                Ok(device) => Some(device),
                Err(e) => {
                    warn!(device_id = %id, error = %e, "Skipping unreadable device record");
                    None
                }
            }
        })
        .collect()
}
