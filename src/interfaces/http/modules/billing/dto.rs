use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::services::BillingRunSummary;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BillingRunRequest {
    /// Reference date of the run; today when omitted
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BillingRunResponse {
    pub date: NaiveDate,
    /// Open contracts looked at
    pub scanned: usize,
    pub invoiced: usize,
    /// Not due yet or already billed for the period
    pub skipped: usize,
    pub failed: usize,
}

impl BillingRunResponse {
    pub fn new(date: NaiveDate, s: BillingRunSummary) -> Self {
        Self {
            date,
            scanned: s.scanned,
            invoiced: s.invoiced,
            skipped: s.skipped,
            failed: s.failed,
        }
    }
}
