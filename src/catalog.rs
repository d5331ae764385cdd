// Catalog reference data: rides, categories, routes, add-ons and reviews.
// Loaded once per session and never mutated by the booking core.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub type CategoryId = String;
pub type RideId = String;
pub type AddonId = String;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideCategory {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub time: String, // "05:00"
    pub available: u32,
    // Dynamic per-slot pricing, display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityDate {
    pub date: NaiveDate,
    #[serde(default)]
    pub slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
    Challenging,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Moderate => "moderate",
            Difficulty::Challenging => "challenging",
        }
    }
}

impl FromStr for Difficulty {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "moderate" => Ok(Difficulty::Moderate),
            "challenging" => Ok(Difficulty::Challenging),
            _ => Err(CatalogError::UnknownDifficulty(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesLikelihood {
    pub name: String,
    pub icon: String,
    pub probability: u8, // 0-100
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: RideId,
    pub category_id: CategoryId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub duration: String, // "4h"
    // Per-adult base fare
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glb: Option<String>,
    #[serde(default)]
    pub availability: Vec<AvailabilityDate>,
    pub max_group_size: u32,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excludes: Option<Vec<String>>,
    #[serde(default)]
    pub cancellation_policy: String,
    #[serde(default)]
    pub species_likelihood: Vec<SpeciesLikelihood>,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddonCategory {
    Experience,
    Comfort,
    Documentation,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Addon {
    pub id: AddonId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub category: AddonCategory,
}

// Pickup point / route chosen on the route step
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePoint {
    pub id: String,
    pub name: String,
    pub coordinates: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popular_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub ride_id: RideId,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar: Option<String>,
    pub rating: u8,
    pub date: NaiveDate,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<String>>,
}

// Raw fixture shape, as served by the site's mock data
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogData {
    pub categories: Vec<RideCategory>,
    pub rides: Vec<Ride>,
    pub routes: Vec<RoutePoint>,
    pub addons: Vec<Addon>,
    pub reviews: Vec<Review>,
}

// Query parameters accepted by the rides listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RideFilter {
    pub category: Option<CategoryId>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub difficulty: Option<Difficulty>,
}

impl RideFilter {
    pub fn matches(&self, ride: &Ride) -> bool {
        self.category
            .as_ref()
            .map_or(true, |category| &ride.category_id == category)
            && self.min_price.map_or(true, |min| ride.price >= min)
            && self.max_price.map_or(true, |max| ride.price <= max)
            && self.difficulty.map_or(true, |d| ride.difficulty == d)
    }
}

/// Read-only catalog with id indexes over the fixture collections.
///
/// Rides keep their fixture order so "first ride in a category" is stable.
#[derive(Debug, Default)]
pub struct Catalog {
    data: CatalogData,
    ride_index: HashMap<RideId, usize>,
    addon_index: HashMap<AddonId, usize>,
}

impl Catalog {
    pub fn new(data: CatalogData) -> Result<Self, CatalogError> {
        let ride_index = build_index("ride", data.rides.iter().map(|r| r.id.as_str()))?;
        let addon_index = build_index("addon", data.addons.iter().map(|a| a.id.as_str()))?;

        tracing::debug!(
            rides = data.rides.len(),
            addons = data.addons.len(),
            categories = data.categories.len(),
            routes = data.routes.len(),
            "catalog indexed"
        );

        Ok(Self {
            data,
            ride_index,
            addon_index,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = serde_json::from_str(json)?;
        Self::new(data)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    // Fixture catalog shipped with the crate
    pub fn load_sample() -> Result<Self, CatalogError> {
        Self::load(SAMPLE_CATALOG_PATH)
    }

    pub fn find_ride_by_id(&self, id: &str) -> Option<&Ride> {
        self.ride_index.get(id).map(|&i| &self.data.rides[i])
    }

    pub fn find_rides_by_category<'a, 'b>(
        &'a self,
        category_id: &'b str,
    ) -> impl Iterator<Item = &'a Ride> + 'b
    where
        'a: 'b,
    {
        self.data
            .rides
            .iter()
            .filter(move |ride| ride.category_id == category_id)
    }

    pub fn first_ride_in_category(&self, category_id: &str) -> Option<&Ride> {
        self.data.rides.iter().find(|ride| ride.category_id == category_id)
    }

    pub fn find_addon_by_id(&self, id: &str) -> Option<&Addon> {
        self.addon_index.get(id).map(|&i| &self.data.addons[i])
    }

    pub fn find_category_by_id(&self, id: &str) -> Option<&RideCategory> {
        self.data.categories.iter().find(|c| c.id == id)
    }

    pub fn find_route_by_id(&self, id: &str) -> Option<&RoutePoint> {
        self.data.routes.iter().find(|r| r.id == id)
    }

    pub fn reviews_for_ride<'a, 'b>(
        &'a self,
        ride_id: &'b str,
    ) -> impl Iterator<Item = &'a Review> + 'b
    where
        'a: 'b,
    {
        self.data.reviews.iter().filter(move |r| r.ride_id == ride_id)
    }

    pub fn rides(&self) -> &[Ride] {
        &self.data.rides
    }

    pub fn categories(&self) -> &[RideCategory] {
        &self.data.categories
    }

    pub fn routes(&self) -> &[RoutePoint] {
        &self.data.routes
    }

    pub fn addons(&self) -> &[Addon] {
        &self.data.addons
    }

    // Rides matching every populated field of the filter, in catalog order
    pub fn filter_rides(&self, filter: &RideFilter) -> Vec<&Ride> {
        self.data
            .rides
            .iter()
            .filter(|ride| filter.matches(ride))
            .collect()
    }

    // Availability dates for a ride. The range only applies when both bounds are given.
    pub fn availability_for(
        &self,
        ride_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Option<Vec<&AvailabilityDate>> {
        let ride = self.find_ride_by_id(ride_id)?;
        let dates = match (start, end) {
            (Some(start), Some(end)) => ride
                .availability
                .iter()
                .filter(|a| a.date >= start && a.date <= end)
                .collect(),
            _ => ride.availability.iter().collect(),
        };
        Some(dates)
    }
}

fn build_index<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<HashMap<String, usize>, CatalogError> {
    let mut index = HashMap::new();
    for (position, id) in ids.enumerate() {
        if index.insert(id.to_string(), position).is_some() {
            return Err(CatalogError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(index)
}

pub const SAMPLE_CATALOG_PATH: &str = "samples/mock_catalog.json";

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn ride(id: &str, category_id: &str, price: f64, duration: &str) -> Ride {
        Ride {
            id: id.to_string(),
            category_id: category_id.to_string(),
            title: format!("Ride {}", id),
            description: String::new(),
            duration: duration.to_string(),
            price,
            currency: "USD".to_string(),
            highlights: vec![],
            rating: 4.5,
            review_count: 0,
            images: vec![],
            glb: None,
            availability: vec![],
            max_group_size: 8,
            difficulty: Difficulty::Easy,
            includes: vec![],
            excludes: None,
            cancellation_policy: String::new(),
            species_likelihood: vec![],
        }
    }

    pub fn addon(id: &str, price: f64) -> Addon {
        Addon {
            id: id.to_string(),
            name: format!("Addon {}", id),
            description: String::new(),
            price,
            icon: None,
            category: AddonCategory::Experience,
        }
    }

    // Small catalog used across the crate's unit tests:
    // two sunrise rides (120, 95), one night ride (110), add-ons x=45, y=30.
    pub fn test_catalog() -> Catalog {
        let data = CatalogData {
            categories: vec![],
            rides: vec![
                ride("sunrise-big-five", "sunrise", 120.0, "4h"),
                ride("sunrise-river-loop", "sunrise", 95.0, "3h"),
                ride("night-spotlight", "night", 110.0, "3h"),
            ],
            routes: vec![RoutePoint {
                id: "north-gate".to_string(),
                name: "North Gate".to_string(),
                coordinates: vec![-1.4061, 35.0081],
                description: None,
                popular_time: Some("05:30".to_string()),
            }],
            addons: vec![addon("x", 45.0), addon("y", 30.0)],
            reviews: vec![],
        };
        Catalog::new(data).unwrap()
    }
}
