use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    common::{ONE_HUNDRED, entities::app_errors::CoreError, generate_timestamp},
    offer::validity::{ValidityLabel, validity_label},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub discount_percentage: Decimal,
    pub valid_till: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OfferConfig {
    pub title: String,
    pub description: Option<String>,
    pub discount_percentage: Decimal,
    pub valid_till: DateTime<Utc>,
}

impl Offer {
    pub fn new(config: OfferConfig) -> Result<Self, CoreError> {
        let title = config.title.trim().to_string();
        if title.is_empty() {
            return Err(CoreError::validation("offer title must not be empty"));
        }
        if config.discount_percentage <= Decimal::ZERO || config.discount_percentage > ONE_HUNDRED {
            return Err(CoreError::validation(
                "discount percentage must be in (0, 100]",
            ));
        }

        let (now, timestamp) = generate_timestamp();

        Ok(Self {
            id: Uuid::new_v7(timestamp),
            title,
            description: config.description,
            discount_percentage: config.discount_percentage,
            valid_till: config.valid_till,
            is_active: true,
            created_at: now,
        })
    }

    pub fn validity(&self, now: DateTime<Utc>, zone: &FixedOffset) -> ValidityLabel {
        validity_label(self.valid_till, now, zone)
    }

    /// Active and not past its last valid day in `zone`.
    pub fn is_redeemable(&self, now: DateTime<Utc>, zone: &FixedOffset) -> bool {
        self.is_active && self.validity(now, zone) != ValidityLabel::Expired
    }
}
