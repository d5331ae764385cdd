// Safari booking flow: catalog, wizard steps, pricing and shareable snapshots

pub mod catalog;
pub mod catalog_client;
pub mod config;
pub mod pricing;
pub mod snapshot;
pub mod snapshot_vault;
pub mod steps;
pub mod store;
pub mod time_slots;

// Re-export key types for convenience
pub use catalog::{
    Addon, AvailabilityDate, Catalog, CatalogError, Difficulty, Ride, RideCategory, RideFilter,
    RoutePoint, TimeSlot,
};
pub use catalog_client::{CatalogApi, ClientError, HttpCatalogClient, RideAvailability};
pub use config::{BookingConfig, CatalogClientConfig, RetryConfig, VaultConfig};
pub use pricing::{PriceBreakdown, PricingPolicy};
pub use snapshot::{BookingSnapshot, SnapshotError};
pub use snapshot_vault::{InMemorySnapshotVault, SnapshotVault, VaultStatsReport};
pub use steps::{BookingStep, StepError};
pub use store::{BookingState, BookingStore};
