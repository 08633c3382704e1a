use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap};

use crate::{
    error::{AppError, AppResult},
    models::{
        pricing::{PricingEntry, PricingValue, BASE_PRICE_KEY, DEFAULT_BASE_PRICE},
        room::{RoomListing, RoomType, ViewingRoom, VIEWING_ROOMS},
    },
};

/// Snapshot of the live base price and per-tier multipliers.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSheet {
    pub base_price: f64,
    pub multipliers: HashMap<RoomType, f64>,
}

impl Default for PriceSheet {
    fn default() -> Self {
        Self {
            base_price: DEFAULT_BASE_PRICE,
            multipliers: RoomType::ALL.iter().map(|t| (*t, t.default_multiplier())).collect(),
        }
    }
}

impl PriceSheet {
    pub fn multiplier(&self, room_type: RoomType) -> f64 {
        self.multipliers
            .get(&room_type)
            .copied()
            .unwrap_or_else(|| room_type.default_multiplier())
    }

    /// Ticket price of a room tier, rounded to whole pesos.
    pub fn room_price(&self, room_type: RoomType) -> i64 {
        (self.base_price * self.multiplier(room_type)).round() as i64
    }

    pub fn listing(&self, room: &'static ViewingRoom) -> RoomListing {
        RoomListing {
            room,
            price_multiplier: self.multiplier(room.room_type),
            price: self.room_price(room.room_type),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPricing {
    pub base_price: f64,
    pub rooms: BTreeMap<&'static str, i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkUpdateOutcome {
    pub results: BTreeMap<String, f64>,
    pub errors: Vec<String>,
}

fn usable(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Reads the pricing table. Missing, zero or negative entries fall back to the defaults.
pub async fn price_sheet(pool: &SqlitePool) -> AppResult<PriceSheet> {
    let values: HashMap<String, f64> = PricingEntry::list(pool)
        .await?
        .into_iter()
        .map(|e| (e.config_key, e.config_value))
        .collect();

    let mut sheet = PriceSheet::default();
    if let Some(base) = values.get(BASE_PRICE_KEY).copied().and_then(usable) {
        sheet.base_price = base;
    }
    for tier in RoomType::ALL {
        if let Some(m) = values.get(&tier.multiplier_key()).copied().and_then(usable) {
            sheet.multipliers.insert(tier, m);
        }
    }
    Ok(sheet)
}

pub async fn room_price(pool: &SqlitePool, room_type: RoomType) -> AppResult<i64> {
    Ok(price_sheet(pool).await?.room_price(room_type))
}

pub async fn public_pricing(pool: &SqlitePool) -> AppResult<PublicPricing> {
    let sheet = price_sheet(pool).await?;
    Ok(PublicPricing {
        base_price: sheet.base_price,
        rooms: VIEWING_ROOMS
            .iter()
            .map(|r| (r.room_type.as_str(), sheet.room_price(r.room_type)))
            .collect(),
    })
}

pub async fn all_entries(pool: &SqlitePool) -> AppResult<BTreeMap<String, PricingValue>> {
    Ok(PricingEntry::list(pool)
        .await?
        .into_iter()
        .map(|e| {
            (
                e.config_key,
                PricingValue { value: e.config_value, description: e.description, id: e.id },
            )
        })
        .collect())
}

pub async fn get(pool: &SqlitePool, key: &str) -> AppResult<f64> {
    PricingEntry::value(pool, key)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Pricing key \"{key}\" not found")))
}

pub async fn update(pool: &SqlitePool, key: &str, value: f64) -> AppResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::validation("Invalid pricing value. Must be a positive number."));
    }
    if !PricingEntry::set(pool, key, value).await? {
        return Err(AppError::not_found(format!("Pricing key \"{key}\" not found")));
    }
    tracing::info!("Pricing {} set to {}", key, value);
    Ok(value)
}

/// Applies every entry on its own; failures are collected rather than aborting the batch.
/// Values arrive as raw JSON so a non-number only fails its own key.
pub async fn update_many(
    pool: &SqlitePool,
    values: BTreeMap<String, serde_json::Value>,
) -> AppResult<BulkUpdateOutcome> {
    let mut outcome = BulkUpdateOutcome::default();
    for (key, raw) in values {
        let Some(value) = raw.as_f64() else {
            outcome.errors.push(format!("Invalid value for {key}: must be a positive number"));
            continue;
        };
        match update(pool, &key, value).await {
            Ok(v) => {
                outcome.results.insert(key, v);
            }
            Err(AppError::Validation(_)) => {
                outcome.errors.push(format!("Invalid value for {key}: must be a positive number"));
            }
            Err(AppError::NotFound(msg)) => {
                outcome.errors.push(format!("Error updating {key}: {msg}"));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(outcome)
}
