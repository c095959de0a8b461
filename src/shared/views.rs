//! Screen controllers for the device list and the plant detail page.
//!
//! State lives behind a `std::sync::Mutex` that is only taken between awaits.
//! A view is mounted until [`DeviceListView::teardown`] (or the detail
//! equivalent) runs; any request resolving after that, or superseded by a newer
//! request of the same kind, is dropped without touching state.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{Device, DeviceFields};
use crate::error::{error_codes, StoreError};
use crate::projection::{project, PlantView};
use crate::pump::{pump_label, PumpState};
use crate::ranges::{MetricReport, OptimalRanges};
use crate::session::Session;
use crate::stats::{aggregate, DashboardStats};
use crate::store::EntityStore;
use crate::telemetry::{plant_week_history, HistoryPoint};
use crate::time::{Clock, DateFormatter};
use crate::validators::{validate_device_fields, ValidationError};

/// Number of plant cards on the dashboard
pub const DASHBOARD_CARD_LIMIT: usize = 6;

pub const DEVICE_ADDED: &str = "Plant device added successfully!";
pub const DEVICE_UPDATED: &str = "Plant device updated successfully!";
pub const DEVICE_REMOVED: &str = "Plant device removed";

/// User-facing outcome message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(msg) | Notice::Error(msg) => msg,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("A submission is already in flight")]
    SubmitInFlight,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("View has been torn down")]
    Unmounted,
}

impl ViewError {
    pub fn code(&self) -> &'static str {
        match self {
            ViewError::SubmitInFlight => error_codes::SUBMIT_IN_FLIGHT,
            ViewError::Store(e) => e.code(),
            ViewError::Validation(e) => e.code,
            ViewError::Unmounted => error_codes::VIEW_CLOSED,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct ListState {
    owner: Option<String>,
    devices: Vec<Device>,
    is_loading: bool,
    is_submitting: bool,
    notices: Vec<Notice>,
}

/// Clears `is_submitting` however the submission ends, including when the
/// future is dropped mid-request
struct SubmitGuard<'a> {
    state: &'a Mutex<ListState>,
}

impl<'a> SubmitGuard<'a> {
    fn acquire(state: &'a Mutex<ListState>) -> Result<Self, ViewError> {
        let mut s = lock(state);
        if s.is_submitting {
            return Err(ViewError::SubmitInFlight);
        }
        s.is_submitting = true;
        Ok(Self { state })
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).is_submitting = false;
    }
}

/// Dashboard and Devices screens: the signed-in user's device list
pub struct DeviceListView<S> {
    store: S,
    clock: Arc<dyn Clock>,
    formatter: Arc<dyn DateFormatter>,
    state: Mutex<ListState>,
    mounted: AtomicBool,
    load_generation: AtomicU64,
}

impl<S: EntityStore> DeviceListView<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>, formatter: Arc<dyn DateFormatter>) -> Self {
        Self {
            store,
            clock,
            formatter,
            state: Mutex::new(ListState::default()),
            mounted: AtomicBool::new(true),
            load_generation: AtomicU64::new(0),
        }
    }

    fn ensure_mounted(&self) -> Result<(), ViewError> {
        if self.mounted.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ViewError::Unmounted)
        }
    }

    /// Fetch the device list and keep the session owner's devices.
    ///
    /// Without a signed-in user the list is emptied and nothing is fetched.
    pub async fn load(&self, session: &Session) -> Result<(), ViewError> {
        self.ensure_mounted()?;

        let Some(email) = session.email().map(str::to_string) else {
            // Outstanding fetches belong to the previous user
            self.load_generation.fetch_add(1, Ordering::SeqCst);
            let mut state = lock(&self.state);
            state.owner = None;
            state.devices.clear();
            state.is_loading = false;
            debug!("No signed-in user, skipping device fetch");
            return Ok(());
        };

        let generation = self.load_generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = lock(&self.state);
            state.owner = Some(email.clone());
            state.is_loading = true;
        }

        let result = self.store.list().await;

        if !self.mounted.load(Ordering::SeqCst) {
            debug!("Discarding device list for torn down view");
            return Err(ViewError::Unmounted);
        }
        if self.load_generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "Discarding superseded device list");
            return Ok(());
        }

        let mut state = lock(&self.state);
        state.is_loading = false;
        match result {
            Ok(all) => {
                state.devices = all.into_iter().filter(|d| d.is_owned_by(&email)).collect();
                info!(owner = %email, count = state.devices.len(), "Loaded devices");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, code = e.code(), "Failed to load devices");
                state
                    .notices
                    .push(Notice::Error(format!("Failed to load devices: {}", e.reason())));
                Err(e.into())
            }
        }
    }

    /// Create a device from the add form.
    ///
    /// The payload is validated before any request. `last_reading` is stamped
    /// with the current time and `created_by` defaults to the list owner.
    pub async fn submit_new(&self, mut fields: DeviceFields) -> Result<Device, ViewError> {
        self.ensure_mounted()?;

        if let Err(e) = validate_device_fields(&fields) {
            self.push_notice(Notice::Error(format!("Failed to add device: {}", e.message)));
            return Err(e.into());
        }

        let _guard = SubmitGuard::acquire(&self.state)?;

        fields.last_reading = Some(self.clock.now());
        if fields.created_by.is_none() {
            fields.created_by = lock(&self.state).owner.clone();
        }

        let result = self.store.create(fields).await;
        self.ensure_mounted()?;

        let mut state = lock(&self.state);
        match result {
            Ok(device) => {
                info!(device_id = %device.id, "Plant device added");
                state.devices.push(device.clone());
                state.notices.push(Notice::Success(DEVICE_ADDED.to_string()));
                Ok(device)
            }
            Err(e) => {
                warn!(error = %e, code = e.code(), "Failed to add device");
                state
                    .notices
                    .push(Notice::Error(format!("Failed to add device: {}", e.reason())));
                Err(e.into())
            }
        }
    }

    /// Full replace of an existing device from the edit form
    pub async fn submit_edit(&self, id: &str, fields: DeviceFields) -> Result<Device, ViewError> {
        self.ensure_mounted()?;

        if let Err(e) = validate_device_fields(&fields) {
            self.push_notice(Notice::Error(format!("Failed to update device: {}", e.message)));
            return Err(e.into());
        }

        let _guard = SubmitGuard::acquire(&self.state)?;

        let result = self.store.update(id, fields).await;
        self.ensure_mounted()?;

        let mut state = lock(&self.state);
        match result {
            Ok(device) => {
                info!(device_id = %id, "Plant device updated");
                if let Some(slot) = state.devices.iter_mut().find(|d| d.id == id) {
                    *slot = device.clone();
                }
                state.notices.push(Notice::Success(DEVICE_UPDATED.to_string()));
                Ok(device)
            }
            Err(e) => {
                warn!(device_id = %id, error = %e, "Failed to update device");
                state.notices.push(Notice::Error(format!(
                    "Failed to update device: {}",
                    e.reason()
                )));
                Err(e.into())
            }
        }
    }

    /// Delete a device. A device the store no longer has is simply dropped
    /// from the list.
    pub async fn remove(&self, id: &str) -> Result<(), ViewError> {
        self.ensure_mounted()?;

        let result = match self.store.delete(id).await {
            Err(StoreError::NotFound(_)) => {
                debug!(device_id = %id, "Device already gone from store");
                Ok(())
            }
            other => other,
        };
        self.ensure_mounted()?;

        let mut state = lock(&self.state);
        match result {
            Ok(()) => {
                state.devices.retain(|d| d.id != id);
                state.notices.push(Notice::Success(DEVICE_REMOVED.to_string()));
                Ok(())
            }
            Err(e) => {
                warn!(device_id = %id, error = %e, "Failed to remove device");
                state.notices.push(Notice::Error(format!(
                    "Failed to remove device: {}",
                    e.reason()
                )));
                Err(e.into())
            }
        }
    }

    /// Projections of the first [`DASHBOARD_CARD_LIMIT`] devices
    pub fn plant_cards(&self) -> Vec<PlantView> {
        let state = lock(&self.state);
        state
            .devices
            .iter()
            .take(DASHBOARD_CARD_LIMIT)
            .map(|d| project(d, self.formatter.as_ref()))
            .collect()
    }

    /// Projections of every loaded device
    pub fn all_cards(&self) -> Vec<PlantView> {
        let state = lock(&self.state);
        state
            .devices
            .iter()
            .map(|d| project(d, self.formatter.as_ref()))
            .collect()
    }

    pub fn stats(&self) -> DashboardStats {
        aggregate(&lock(&self.state).devices)
    }

    pub fn devices(&self) -> Vec<Device> {
        lock(&self.state).devices.clone()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).is_loading
    }

    pub fn is_submitting(&self) -> bool {
        lock(&self.state).is_submitting
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Drain pending notices, oldest first
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut lock(&self.state).notices)
    }

    pub fn teardown(&self) {
        self.mounted.store(false, Ordering::SeqCst);
        debug!("Device list view torn down");
    }

    fn push_notice(&self, notice: Notice) {
        lock(&self.state).notices.push(notice);
    }
}

/// Per-plant notification toggles
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertSettings {
    pub low_moisture: bool,
    pub auto_watering: bool,
    pub light_reminder: bool,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            low_moisture: true,
            auto_watering: true,
            light_reminder: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowMoisture,
    AutoWatering,
    LightReminder,
}

impl AlertSettings {
    pub fn get(&self, kind: AlertKind) -> bool {
        match kind {
            AlertKind::LowMoisture => self.low_moisture,
            AlertKind::AutoWatering => self.auto_watering,
            AlertKind::LightReminder => self.light_reminder,
        }
    }

    pub fn toggle(&mut self, kind: AlertKind) {
        let flag = match kind {
            AlertKind::LowMoisture => &mut self.low_moisture,
            AlertKind::AutoWatering => &mut self.auto_watering,
            AlertKind::LightReminder => &mut self.light_reminder,
        };
        *flag = !*flag;
    }
}

/// Everything the plant detail screen renders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantDetail {
    pub plant: PlantView,
    pub readings: Vec<MetricReport>,
    pub pump: PumpState,
    pub alerts: AlertSettings,
    pub history: Vec<HistoryPoint>,
}

impl PlantDetail {
    /// Pump card status and button text
    pub fn pump_label(&self) -> (&'static str, &'static str) {
        pump_label(&self.pump)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading,
    NotFound,
    /// The first fetch failed; `reload` retries it
    Failed(String),
    Ready(Box<PlantDetail>),
}

impl DetailState {
    pub fn detail(&self) -> Option<&PlantDetail> {
        match self {
            DetailState::Ready(detail) => Some(&**detail),
            _ => None,
        }
    }
}

struct DetailInner {
    device_id: Option<String>,
    state: DetailState,
    notices: Vec<Notice>,
}

/// Plant Details screen for a single device
pub struct PlantDetailView<S> {
    store: S,
    formatter: Arc<dyn DateFormatter>,
    ranges: OptimalRanges,
    inner: Mutex<DetailInner>,
    mounted: AtomicBool,
    generation: AtomicU64,
}

impl<S: EntityStore> PlantDetailView<S> {
    pub fn new(store: S, formatter: Arc<dyn DateFormatter>) -> Self {
        Self::with_ranges(store, formatter, OptimalRanges::default())
    }

    pub fn with_ranges(store: S, formatter: Arc<dyn DateFormatter>, ranges: OptimalRanges) -> Self {
        Self {
            store,
            formatter,
            ranges,
            inner: Mutex::new(DetailInner {
                device_id: None,
                state: DetailState::Loading,
                notices: Vec::new(),
            }),
            mounted: AtomicBool::new(true),
            generation: AtomicU64::new(0),
        }
    }

    /// Load the device with `id`. A blank id is not found without a fetch.
    pub async fn open(&self, id: &str) -> Result<(), ViewError> {
        if !self.mounted.load(Ordering::SeqCst) {
            return Err(ViewError::Unmounted);
        }

        if id.trim().is_empty() {
            self.generation.fetch_add(1, Ordering::SeqCst);
            let mut inner = lock(&self.inner);
            inner.device_id = None;
            inner.state = DetailState::NotFound;
            return Ok(());
        }

        {
            let mut inner = lock(&self.inner);
            inner.device_id = Some(id.to_string());
            inner.state = DetailState::Loading;
        }
        self.fetch(id).await
    }

    /// Re-read the current device; the pump follows the fresh record
    pub async fn reload(&self) -> Result<(), ViewError> {
        if !self.mounted.load(Ordering::SeqCst) {
            return Err(ViewError::Unmounted);
        }

        let id = lock(&self.inner).device_id.clone();
        match id {
            Some(id) => self.fetch(&id).await,
            None => Ok(()),
        }
    }

    /// Local toggles made while the request is out are read back from the
    /// current state, not from a copy taken before it.
    async fn fetch(&self, id: &str) -> Result<(), ViewError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.store.get(id).await;

        if !self.mounted.load(Ordering::SeqCst) {
            debug!(device_id = %id, "Discarding detail fetch for torn down view");
            return Err(ViewError::Unmounted);
        }
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(device_id = %id, "Discarding superseded detail fetch");
            return Ok(());
        }

        let mut inner = lock(&self.inner);
        match result {
            Ok(Some(device)) => {
                let detail = self.build_detail(&device, inner.state.detail());
                debug!(device_id = %id, pump = %detail.pump.displayed().as_str(), "Plant detail ready");
                inner.state = DetailState::Ready(Box::new(detail));
                Ok(())
            }
            Ok(None) => {
                info!(device_id = %id, "Plant not found");
                inner.state = DetailState::NotFound;
                Ok(())
            }
            Err(e) => {
                warn!(device_id = %id, error = %e, "Failed to load plant");
                if inner.state.detail().is_none() {
                    inner.state = DetailState::Failed(e.reason());
                }
                inner
                    .notices
                    .push(Notice::Error(format!("Failed to load plant: {}", e.reason())));
                Err(e.into())
            }
        }
    }

    fn build_detail(&self, device: &Device, current: Option<&PlantDetail>) -> PlantDetail {
        let plant = project(device, self.formatter.as_ref());
        let readings = self.ranges.classify_all(&plant.readings);

        match current {
            Some(current) => PlantDetail {
                pump: current.pump.reconcile(device.pump_status),
                alerts: current.alerts,
                history: current.history.clone(),
                plant,
                readings,
            },
            None => PlantDetail {
                pump: PumpState::synced(device.pump_status),
                alerts: AlertSettings::default(),
                history: plant_week_history(&mut rand::thread_rng()),
                plant,
                readings,
            },
        }
    }

    /// Flip the pump optimistically. `None` until a plant is shown.
    pub fn toggle_pump(&self) -> Option<PumpState> {
        let mut inner = lock(&self.inner);
        match &mut inner.state {
            DetailState::Ready(detail) => {
                detail.pump = detail.pump.toggle();
                info!(
                    device_id = %detail.plant.id,
                    pump = %detail.pump.displayed().as_str(),
                    "Pump toggled"
                );
                Some(detail.pump)
            }
            _ => None,
        }
    }

    pub fn toggle_alert(&self, kind: AlertKind) -> Option<AlertSettings> {
        let mut inner = lock(&self.inner);
        match &mut inner.state {
            DetailState::Ready(detail) => {
                detail.alerts.toggle(kind);
                Some(detail.alerts)
            }
            _ => None,
        }
    }

    pub fn state(&self) -> DetailState {
        lock(&self.inner).state.clone()
    }

    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut lock(&self.inner).notices)
    }

    pub fn teardown(&self) {
        self.mounted.store(false, Ordering::SeqCst);
        debug!("Plant detail view torn down");
    }
}
