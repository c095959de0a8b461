// Dashboard binary entry point

mod config;
mod repo;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use config::{Config, StoreBackend};
use plantpulse::{
    dashboard_trend, Clock, DashboardStats, DateFormatter, DetailState, DeviceListView,
    EntityStore, FileSessionStore, HistoryPoint, MetricReport, MockTelemetry, PlantDetailView,
    PlantView, RandomIdGenerator, Session, SystemClock, UsDateFormatter,
};
use repo::devices::DynamoDbDeviceStore;

/// What the dashboard prints for the signed-in user
#[derive(Debug, Serialize)]
struct DashboardSnapshot {
    greeting: String,
    initial: char,
    avatar_color: String,
    stats: DashboardStats,
    plants: Vec<PlantView>,
    featured: Option<FeaturedPlant>,
    trend: Vec<HistoryPoint>,
}

#[derive(Debug, Serialize)]
struct FeaturedPlant {
    id: String,
    pump: &'static str,
    readings: Vec<MetricReport>,
}

/// Detail of the first card. A failed fetch leaves the snapshot without one.
async fn featured_plant<S: EntityStore>(
    store: S,
    formatter: Arc<dyn DateFormatter>,
    id: &str,
) -> Option<FeaturedPlant> {
    let detail = PlantDetailView::new(store, formatter);
    if let Err(e) = detail.open(id).await {
        warn!(device_id = %id, error = %e, code = e.code(), "Plant detail unavailable");
    }
    let featured = match detail.state() {
        DetailState::Ready(d) => Some(FeaturedPlant {
            id: d.plant.id.clone(),
            pump: d.pump_label().0,
            readings: d.readings.clone(),
        }),
        _ => None,
    };
    detail.teardown();
    featured
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = Config::from_env()
        .await
        .context("Failed to load configuration")?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let ids = Arc::new(RandomIdGenerator::new());

    let mut session = Session::initialize(Arc::new(FileSessionStore::new(&config.session_dir)));
    if !session.is_signed_in() {
        if let Some(user) = config.sign_in_as.clone() {
            session.sign_in(user).context("Failed to save session")?;
        }
    }

    let store: Arc<dyn EntityStore> = match config.backend {
        StoreBackend::DynamoDb { client, table } => {
            info!(table = %table, "Using DynamoDB device store");
            Arc::new(DynamoDbDeviceStore::new(client, table, ids, clock.clone()))
        }
        StoreBackend::Mock { device_count } => {
            info!(device_count, "Using mock telemetry");
            let telemetry = MockTelemetry::new(ids, clock.clone());
            if let Some(email) = session.email() {
                let mut rng = StdRng::from_entropy();
                telemetry
                    .seed(email, device_count, clock.as_ref(), &mut rng)
                    .await
                    .context("Failed to seed mock devices")?;
            }
            Arc::new(telemetry)
        }
    };

    if !session.is_signed_in() {
        warn!("No signed-in user; set PLANTPULSE_EMAIL to sign in");
    }

    let formatter = Arc::new(UsDateFormatter);
    let list = DeviceListView::new(store.clone(), clock.clone(), formatter.clone());
    if let Err(e) = list.load(&session).await {
        warn!(error = %e, code = e.code(), "Dashboard loaded without devices");
    }
    for notice in list.take_notices() {
        info!(notice = %notice.message(), "Notice");
    }

    let plants = list.plant_cards();
    let featured = match plants.first() {
        Some(plant) => featured_plant(store.clone(), formatter.clone(), &plant.id).await,
        None => None,
    };

    let snapshot = DashboardSnapshot {
        greeting: format!("Welcome back, {}", session.first_name()),
        initial: session.initial(),
        avatar_color: session.avatar_color().to_string(),
        stats: list.stats(),
        plants,
        featured,
        trend: dashboard_trend(&mut StdRng::from_entropy()),
    };
    list.teardown();

    info!(
        total_plants = snapshot.stats.total_plants,
        online = snapshot.stats.online,
        "Dashboard ready"
    );
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantpulse::{DeviceFields, InMemoryStore, SequentialIdGenerator};

    #[tokio::test]
    async fn test_featured_plant_survives_failed_fetch() {
        let clock = Arc::new(SystemClock::new());
        let store = Arc::new(InMemoryStore::new(
            Arc::new(SequentialIdGenerator::default()),
            clock,
        ));
        let device = store
            .create(DeviceFields::new("Monstera", "PP-2024-A7B3C9D2"))
            .await
            .unwrap();

        store.fail_next(1);
        assert!(featured_plant(store.clone(), Arc::new(UsDateFormatter), &device.id)
            .await
            .is_none());

        let featured = featured_plant(store, Arc::new(UsDateFormatter), &device.id)
            .await
            .unwrap();
        assert_eq!(featured.id, device.id);
        assert_eq!(featured.pump, "Inactive");
        assert_eq!(featured.readings.len(), 4);
    }
}
