// Walks one booking through the wizard against a catalog file and prints the
// price breakdown and the share snapshot.
//
// Usage: plan_safari [catalog.json] [category-id]
// With SAFARI_CATALOG_URL set, the ride's availability is fetched from the site.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use safari_booking::catalog::SAMPLE_CATALOG_PATH;
use safari_booking::time_slots::{slots_for_date, upcoming_dates, PICKER_DAYS};
use safari_booking::{
    BookingConfig, BookingStep, BookingStore, Catalog, CatalogApi, CatalogClientConfig,
    HttpCatalogClient, InMemorySnapshotVault, Ride, SnapshotVault,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "safari_booking=debug,plan_safari=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let catalog_path = args.next().unwrap_or_else(|| SAMPLE_CATALOG_PATH.to_string());
    let category_id = args.next();

    let catalog = Catalog::load(&catalog_path)
        .with_context(|| format!("failed to load catalog from {}", catalog_path))?;
    let catalog = Arc::new(catalog);
    let config = BookingConfig::from_env();
    tracing::info!(
        path = %catalog_path,
        rides = catalog.rides().len(),
        "catalog loaded"
    );

    let mut store = BookingStore::with_config(Arc::clone(&catalog), config);

    // Experience
    let category_id = match category_id {
        Some(id) => id,
        None => catalog
            .categories()
            .first()
            .map(|category| category.id.clone())
            .context("catalog has no categories")?,
    };
    store.select_category(&category_id);
    let ride = store
        .state()
        .selected_ride
        .clone()
        .with_context(|| format!("category {} has no rides", category_id))?;
    store.next_step();

    // Route
    if let Some(point) = catalog.routes().first() {
        store.select_starting_point(point.clone());
    }
    store.next_step();

    // When: first published or default slot of the first picker day
    let today = Utc::now().date_naive();
    let dates = upcoming_dates(today, PICKER_DAYS);
    let date = dates.first().copied().unwrap_or(today);
    let live_ride = match CatalogClientConfig::from_env() {
        Some(client_config) => fetch_live_ride(client_config, &ride, date).await,
        None => None,
    };
    let ride_for_slots = live_ride.as_ref().or_else(|| catalog.find_ride_by_id(&ride));
    let slots = slots_for_date(ride_for_slots, Some(category_id.as_str()), date);
    let time = slots
        .iter()
        .find(|slot| slot.available > 0)
        .map(|slot| slot.time.clone())
        .unwrap_or_default();
    store.set_date_time(&date.to_string(), &time);
    store.next_step();

    // Party
    store.set_party_size(2, 2);
    if let Some(addon) = catalog.addons().first() {
        store.toggle_addon(&addon.id);
    }
    store.set_step(BookingStep::Summary);

    let state = store.state();
    println!("=== Safari booking ===");
    println!("Ride:     {}", ride);
    println!(
        "When:     {} {}",
        state.selected_date.as_deref().unwrap_or("-"),
        state.selected_time.as_deref().unwrap_or("-")
    );
    println!(
        "Step:     {} ({:.0}% complete)",
        state.current_step.label(),
        store.progress() * 100.0
    );
    println!();
    for (label, amount) in store.price_breakdown().display_lines() {
        println!("{:<40} {:>10}", label, amount);
    }

    let snapshot = store.create_snapshot();
    let vault = InMemorySnapshotVault::default();
    vault.store(snapshot.clone());
    let shared = vault
        .get(&snapshot.id, Utc::now())
        .context("snapshot could not be resolved from the vault")?;

    println!();
    println!("Share link: {}", shared.share_url);
    println!("{}", shared.to_json_pretty()?);

    Ok(())
}

// The ride with its availability for the picker window replaced by the site's
// answer. Falls back to the local catalog on any client error.
async fn fetch_live_ride(
    config: CatalogClientConfig,
    ride_id: &str,
    from: NaiveDate,
) -> Option<Ride> {
    let base_url = config.base_url.clone();
    let client = match HttpCatalogClient::new(config) {
        Ok(client) => client,
        Err(err) => {
            tracing::warn!(error = %err, "catalog client unavailable, using local catalog");
            return None;
        }
    };

    let until = from + Duration::days(i64::from(PICKER_DAYS) - 1);
    let ride = client.ride(ride_id).await;
    let availability = client.availability(ride_id, Some(from), Some(until)).await;
    match (ride, availability) {
        (Ok(Some(mut ride)), Ok(availability)) => {
            tracing::info!(
                url = %base_url,
                ride = ride_id,
                dates = availability.availability.len(),
                "live availability fetched"
            );
            ride.availability = availability.availability;
            Some(ride)
        }
        (Ok(None), _) => {
            tracing::warn!(ride = ride_id, "ride not listed by the site, using local catalog");
            None
        }
        (Err(err), _) | (_, Err(err)) => {
            tracing::warn!(error = %err, "live catalog fetch failed, using local catalog");
            None
        }
    }
}
