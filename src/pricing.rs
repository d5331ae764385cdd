// Price engine: a pure derivation from (ride, party, add-ons, catalog) to a total.
// Both the running total and the detailed breakdown come from `price_breakdown`.

use crate::catalog::{Catalog, Ride};
use serde::{Deserialize, Serialize};

// Pricing knobs. Defaults are the published rates.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PricingPolicy {
    // Fraction of the adult fare charged per child
    pub child_rate: f64,
    pub group_discount_rate: f64,
    pub group_discount_min_travelers: u32,
    pub tax_rate: f64,
    pub currency: String,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            child_rate: 0.5,
            group_discount_rate: 0.1,
            group_discount_min_travelers: 4,
            tax_rate: 0.08,
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBreakdown {
    pub adults: u32,
    pub children: u32,
    pub base_price: f64,
    pub addon_total: f64,
    pub group_discount: f64,
    pub subtotal: f64,
    pub taxes_and_fees: f64,
    pub total: f64,
    pub currency: String,
}

impl PriceBreakdown {
    pub fn travelers(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }

    pub fn has_group_discount(&self) -> bool {
        self.group_discount > 0.0
    }

    // Whole currency units, as held in the store's `total_price`
    pub fn rounded_total(&self) -> f64 {
        self.total.round()
    }

    // Two-decimal display lines for the summary view
    pub fn display_lines(&self) -> Vec<(String, String)> {
        let mut lines = vec![(
            format!(
                "Base Price ({} adults, {} children)",
                self.adults, self.children
            ),
            format_amount(self.base_price),
        )];
        if self.addon_total > 0.0 {
            lines.push(("Add-ons".to_string(), format_amount(self.addon_total)));
        }
        if self.has_group_discount() {
            lines.push((
                "Group Discount".to_string(),
                format!("-{}", format_amount(self.group_discount)),
            ));
        }
        lines.push(("Taxes & Fees".to_string(), format_amount(self.taxes_and_fees)));
        lines.push(("Total".to_string(), format_amount(self.total)));
        lines
    }
}

pub fn format_amount(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Computes the full breakdown for a selection.
///
/// A missing ride contributes a base price of zero and add-on ids with no
/// catalog entry contribute nothing; neither is an error.
pub fn price_breakdown<'a>(
    ride: Option<&Ride>,
    adults: u32,
    children: u32,
    addons: impl IntoIterator<Item = &'a String>,
    catalog: &Catalog,
    policy: &PricingPolicy,
) -> PriceBreakdown {
    let base_price = match ride {
        Some(ride) => {
            ride.price * f64::from(adults) + ride.price * policy.child_rate * f64::from(children)
        }
        None => 0.0,
    };

    let addon_total: f64 = addons
        .into_iter()
        .map(|id| match catalog.find_addon_by_id(id) {
            Some(addon) => addon.price,
            None => 0.0,
        })
        .sum();

    let travelers = adults.saturating_add(children);
    let group_discount = if travelers >= policy.group_discount_min_travelers {
        base_price * policy.group_discount_rate
    } else {
        0.0
    };

    let subtotal = base_price + addon_total - group_discount;
    let taxes_and_fees = subtotal * policy.tax_rate;

    PriceBreakdown {
        adults,
        children,
        base_price,
        addon_total,
        group_discount,
        subtotal,
        taxes_and_fees,
        total: subtotal + taxes_and_fees,
        currency: policy.currency.clone(),
    }
}

// The value stored as `total_price` after every price-affecting mutation
pub fn recompute_price<'a>(
    ride_id: Option<&str>,
    adults: u32,
    children: u32,
    addons: impl IntoIterator<Item = &'a String>,
    catalog: &Catalog,
    policy: &PricingPolicy,
) -> f64 {
    let ride = ride_id.and_then(|id| catalog.find_ride_by_id(id));
    price_breakdown(ride, adults, children, addons, catalog, policy).rounded_total()
}
