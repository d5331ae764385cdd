// Booking state store: the in-progress selection, wizard navigation and the running total.
// Every mutator that can change the price recomputes it before returning.

use crate::catalog::{AddonId, Catalog, CategoryId, RideId, RoutePoint};
use crate::config::BookingConfig;
use crate::pricing::{self, PriceBreakdown};
use crate::snapshot::BookingSnapshot;
use crate::steps::BookingStep;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

pub const DEFAULT_ADULTS: u32 = 2;
pub const MIN_ADULTS: u32 = 1;
// Upper bound for each party counter
pub const MAX_PARTY_COUNT: u32 = 99;

// Selection + navigation, the unit captured by snapshots
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingState {
    // Step 1: category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_category: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_ride: Option<RideId>,

    // Step 2: route
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_point: Option<RoutePoint>,

    // Step 3: date and time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_date: Option<String>, // ISO date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_time: Option<String>, // "05:00"
    #[serde(default)]
    pub flexible_time: bool,

    // Step 4: party and add-ons
    pub adults: u32,
    pub children: u32,
    #[serde(default)]
    pub addons: Vec<AddonId>,

    // Derived
    pub total_price: f64,
    #[serde(default)]
    pub estimated_duration: String,

    pub current_step: BookingStep,
    #[serde(default)]
    pub completed_steps: BTreeSet<BookingStep>,
}

impl Default for BookingState {
    fn default() -> Self {
        Self {
            selected_category: None,
            selected_ride: None,
            starting_point: None,
            selected_date: None,
            selected_time: None,
            flexible_time: false,
            adults: DEFAULT_ADULTS,
            children: 0,
            addons: Vec::new(),
            total_price: 0.0,
            estimated_duration: String::new(),
            current_step: BookingStep::Category,
            completed_steps: BTreeSet::new(),
        }
    }
}

impl BookingState {
    pub fn travelers(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }

    pub fn has_addon(&self, addon_id: &str) -> bool {
        self.addons.iter().any(|id| id == addon_id)
    }
}

/// Session-scoped booking context.
///
/// Owns the single active [`BookingState`] and a shared handle to the
/// read-only [`Catalog`]. Mutators return the updated state so callers can
/// render (or assert on) it directly.
pub struct BookingStore {
    state: BookingState,
    catalog: Arc<Catalog>,
    config: BookingConfig,
}

impl BookingStore {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_config(catalog, BookingConfig::default())
    }

    pub fn with_config(catalog: Arc<Catalog>, config: BookingConfig) -> Self {
        Self {
            state: BookingState::default(),
            catalog,
            config,
        }
    }

    pub fn state(&self) -> &BookingState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    // --- Navigation ---

    // Leaving a step forward marks it completed. Jumping several steps ahead only marks
    // the step being left; skipped steps stay incomplete.
    pub fn set_step(&mut self, target: BookingStep) -> &BookingState {
        let current = self.state.current_step;
        if target.index() > current.index() {
            self.state.completed_steps.insert(current);
        }
        self.state.current_step = target;

        tracing::debug!(from = %current, to = %target, "step changed");
        &self.state
    }

    pub fn next_step(&mut self) -> &BookingState {
        match self.state.current_step.next() {
            Some(step) => self.set_step(step),
            None => &self.state,
        }
    }

    pub fn previous_step(&mut self) -> &BookingState {
        match self.state.current_step.previous() {
            Some(step) => self.set_step(step),
            None => &self.state,
        }
    }

    // Fraction of the wizard reached, in (0, 1]
    pub fn progress(&self) -> f64 {
        (self.state.current_step.index() + 1) as f64 / BookingStep::ALL.len() as f64
    }

    pub fn is_step_completed(&self, step: BookingStep) -> bool {
        self.state.completed_steps.contains(&step)
    }

    // --- Selection ---

    // Picks the category and auto-selects its first ride in catalog order
    pub fn select_category(&mut self, category_id: &str) -> &BookingState {
        let first_ride = self.catalog.first_ride_in_category(category_id);

        self.state.selected_category = Some(category_id.to_string());
        self.state.selected_ride = first_ride.map(|ride| ride.id.clone());
        self.state.estimated_duration = first_ride
            .map(|ride| ride.duration.clone())
            .unwrap_or_default();

        tracing::debug!(
            category = category_id,
            ride = ?self.state.selected_ride,
            "category selected"
        );
        self.recompute_price()
    }

    // Picks a ride and back-fills its category. An unknown ride clears the category.
    pub fn select_ride(&mut self, ride_id: &str) -> &BookingState {
        let ride = self.catalog.find_ride_by_id(ride_id);

        self.state.selected_ride = Some(ride_id.to_string());
        self.state.selected_category = ride.map(|ride| ride.category_id.clone());
        self.state.estimated_duration = ride.map(|ride| ride.duration.clone()).unwrap_or_default();

        if ride.is_none() {
            tracing::warn!(ride = ride_id, "selected ride is not in the catalog");
        } else {
            tracing::debug!(ride = ride_id, "ride selected");
        }
        self.recompute_price()
    }

    pub fn select_starting_point(&mut self, point: RoutePoint) -> &BookingState {
        tracing::debug!(route = %point.id, "starting point selected");
        self.state.starting_point = Some(point);
        &self.state
    }

    // Date and time are always set together; an empty string clears the field
    pub fn set_date_time(&mut self, date: &str, time: &str) -> &BookingState {
        self.state.selected_date = non_empty(date);
        self.state.selected_time = non_empty(time);

        tracing::debug!(date, time, "date and time set");
        &self.state
    }

    pub fn set_flexible_time(&mut self, flexible: bool) -> &BookingState {
        self.state.flexible_time = flexible;
        &self.state
    }

    // Out-of-range counts are clamped: adults to 1..=99, children to 0..=99
    pub fn set_party_size(&mut self, adults: i64, children: i64) -> &BookingState {
        let clamped_adults = clamp_count(adults, MIN_ADULTS);
        let clamped_children = clamp_count(children, 0);
        if i64::from(clamped_adults) != adults || i64::from(clamped_children) != children {
            tracing::debug!(adults, children, "party size clamped");
        }

        self.state.adults = clamped_adults;
        self.state.children = clamped_children;

        tracing::debug!(
            adults = clamped_adults,
            children = clamped_children,
            "party size set"
        );
        self.recompute_price()
    }

    pub fn increment_adults(&mut self) -> &BookingState {
        let (adults, children) = self.party();
        self.set_party_size(adults + 1, children)
    }

    pub fn decrement_adults(&mut self) -> &BookingState {
        let (adults, children) = self.party();
        self.set_party_size(adults - 1, children)
    }

    pub fn increment_children(&mut self) -> &BookingState {
        let (adults, children) = self.party();
        self.set_party_size(adults, children + 1)
    }

    pub fn decrement_children(&mut self) -> &BookingState {
        let (adults, children) = self.party();
        self.set_party_size(adults, children - 1)
    }

    // Adds the add-on if absent, removes it if present
    pub fn toggle_addon(&mut self, addon_id: &str) -> &BookingState {
        match self.state.addons.iter().position(|id| id == addon_id) {
            Some(index) => {
                self.state.addons.remove(index);
                tracing::debug!(addon = addon_id, "add-on removed");
            }
            None => {
                self.state.addons.push(addon_id.to_string());
                tracing::debug!(addon = addon_id, "add-on added");
            }
        }
        self.recompute_price()
    }

    // --- Pricing ---

    // Detailed breakdown of the current selection, from the same engine as `total_price`
    pub fn price_breakdown(&self) -> PriceBreakdown {
        let ride = self
            .state
            .selected_ride
            .as_deref()
            .and_then(|id| self.catalog.find_ride_by_id(id));
        pricing::price_breakdown(
            ride,
            self.state.adults,
            self.state.children,
            &self.state.addons,
            &self.catalog,
            &self.config.pricing,
        )
    }

    fn recompute_price(&mut self) -> &BookingState {
        self.state.total_price = pricing::recompute_price(
            self.state.selected_ride.as_deref(),
            self.state.adults,
            self.state.children,
            &self.state.addons,
            &self.catalog,
            &self.config.pricing,
        );

        tracing::debug!(total = self.state.total_price, "price recomputed");
        &self.state
    }

    // --- Snapshots ---

    pub fn create_snapshot(&self) -> BookingSnapshot {
        self.create_snapshot_at(Utc::now())
    }

    pub fn create_snapshot_at(&self, now: DateTime<Utc>) -> BookingSnapshot {
        let snapshot = BookingSnapshot::capture(&self.state, &self.config, now);
        tracing::info!(
            snapshot = %snapshot.id,
            expires_at = %snapshot.expires_at,
            "snapshot created"
        );
        snapshot
    }

    /// Replaces the live state with the snapshot's state.
    ///
    /// Expiry is not checked here. Party counts are clamped and the total is
    /// re-derived against the live catalog.
    pub fn load_snapshot(&mut self, snapshot: &BookingSnapshot) -> &BookingState {
        self.state = snapshot.state.clone();
        self.state.adults = self.state.adults.clamp(MIN_ADULTS, MAX_PARTY_COUNT);
        self.state.children = self.state.children.min(MAX_PARTY_COUNT);

        tracing::info!(snapshot = %snapshot.id, "snapshot loaded");
        self.recompute_price()
    }

    pub fn reset(&mut self) -> &BookingState {
        self.state = BookingState::default();
        tracing::debug!("booking reset");
        &self.state
    }

    fn party(&self) -> (i64, i64) {
        (
            i64::from(self.state.adults),
            i64::from(self.state.children),
        )
    }
}

fn clamp_count(value: i64, min: u32) -> u32 {
    let clamped = value.clamp(i64::from(min), i64::from(MAX_PARTY_COUNT));
    u32::try_from(clamped).unwrap_or(MAX_PARTY_COUNT)
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
