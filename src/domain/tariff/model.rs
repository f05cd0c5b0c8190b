//! Grid-operator tariff

use chrono::{DateTime, Utc};

/// Electricity tariff offered by a grid operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Tariff {
    pub id: i32,
    pub operator_id: i32,
    pub name: String,
    /// Price per kWh in cents
    pub price_per_kwh_cents: i64,
    /// Yearly base fee in cents
    pub base_fee_cents: i64,
    pub term_months: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tariff {
    pub fn new(
        operator_id: i32,
        name: String,
        price_per_kwh_cents: i64,
        base_fee_cents: i64,
        term_months: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            operator_id,
            name,
            price_per_kwh_cents,
            base_fee_cents,
            term_months,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Annual base charge for a given yearly consumption:
    /// base fee plus price times consumption.
    pub fn annual_charge_cents(&self, consumption_kwh: u32) -> i64 {
        self.base_fee_cents + self.price_per_kwh_cents * i64::from(consumption_kwh)
    }
}
