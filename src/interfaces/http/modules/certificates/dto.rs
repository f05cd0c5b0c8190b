//! Energy certificate DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::services::{IssuedCertificate, MeasureInput};
use crate::domain::{EfficiencyMeasure, EnergyCertificate};
use crate::interfaces::http::modules::invoices::InvoiceResponse;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CertificateResponse {
    pub id: i32,
    pub household_id: i32,
    pub consultant_id: Option<i32>,
    /// Requested | AdditionalDataEntered | Issued
    pub status: String,
    pub measure_id: Option<i32>,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub price_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EnergyCertificate> for CertificateResponse {
    fn from(c: EnergyCertificate) -> Self {
        Self {
            id: c.id,
            household_id: c.household_id,
            consultant_id: c.consultant_id,
            status: c.status.to_string(),
            measure_id: c.measure_id,
            valid_from: c.valid_from,
            valid_until: c.valid_until,
            price_cents: c.price_cents,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdditionalDataRequest {
    #[validate(length(min = 1, max = 2000, message = "Beschreibung ist erforderlich"))]
    pub description: String,
    #[validate(range(min = 0.0, message = "Einsparung darf nicht negativ sein"))]
    pub estimated_savings_kwh: f64,
}

impl From<AdditionalDataRequest> for MeasureInput {
    fn from(r: AdditionalDataRequest) -> Self {
        Self {
            description: r.description,
            estimated_savings_kwh: r.estimated_savings_kwh,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeasureResponse {
    pub id: i32,
    pub certificate_id: i32,
    pub description: String,
    pub estimated_savings_kwh: f64,
}

impl From<EfficiencyMeasure> for MeasureResponse {
    fn from(m: EfficiencyMeasure) -> Self {
        Self {
            id: m.id,
            certificate_id: m.certificate_id,
            description: m.description,
            estimated_savings_kwh: m.estimated_savings_kwh,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IssuedCertificateResponse {
    pub certificate: CertificateResponse,
    pub invoice: InvoiceResponse,
    /// Installation requests moved to AusweisIssued
    pub updated_requests: usize,
}

impl From<IssuedCertificate> for IssuedCertificateResponse {
    fn from(i: IssuedCertificate) -> Self {
        Self {
            certificate: i.certificate.into(),
            invoice: i.invoice.into(),
            updated_requests: i.updated_requests,
        }
    }
}
