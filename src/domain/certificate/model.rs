//! Energy-efficiency certificate ("Energieausweis")

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

/// Validity of an issued certificate in years.
pub const VALIDITY_YEARS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificateStatus {
    Requested,
    AdditionalDataEntered,
    Issued,
}

impl CertificateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "Requested",
            Self::AdditionalDataEntered => "AdditionalDataEntered",
            Self::Issued => "Issued",
        }
    }
}

impl std::fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CertificateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Requested" => Ok(Self::Requested),
            "AdditionalDataEntered" => Ok(Self::AdditionalDataEntered),
            "Issued" => Ok(Self::Issued),
            other => Err(format!("unknown certificate status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnergyCertificate {
    pub id: i32,
    pub household_id: i32,
    pub consultant_id: Option<i32>,
    pub status: CertificateStatus,
    pub measure_id: Option<i32>,
    /// Set only at issuance
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub price_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EnergyCertificate {
    pub fn new(household_id: i32) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            household_id,
            consultant_id: None,
            status: CertificateStatus::Requested,
            measure_id: None,
            valid_from: None,
            valid_until: None,
            price_cents: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn expect_consultant(&self, consultant_id: i32) -> DomainResult<()> {
        match self.consultant_id {
            Some(assigned) if assigned != consultant_id => Err(DomainError::Forbidden(format!(
                "Ausweis {} wird von einem anderen Energieberater bearbeitet",
                self.id
            ))),
            _ => Ok(()),
        }
    }

    /// Checks caller and status for the additional-data step without
    /// changing anything.
    pub fn ensure_accepts_additional_data(&self, consultant_id: i32) -> DomainResult<()> {
        self.expect_consultant(consultant_id)?;
        if self.status != CertificateStatus::Requested {
            return Err(DomainError::wrong_status(
                &self.status,
                &[CertificateStatus::Requested],
            ));
        }
        Ok(())
    }

    pub fn enter_additional_data(&mut self, consultant_id: i32, measure_id: i32) -> DomainResult<()> {
        self.ensure_accepts_additional_data(consultant_id)?;
        self.consultant_id = Some(consultant_id);
        self.measure_id = Some(measure_id);
        self.status = CertificateStatus::AdditionalDataEntered;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Issues the certificate for ten years from `today`.
    ///
    /// `linked_request_waiting` is true when any request linked to this
    /// certificate is still in `AusweisRequested`; that alone allows issuance.
    pub fn issue(
        &mut self,
        consultant_id: i32,
        today: NaiveDate,
        price_cents: i64,
        linked_request_waiting: bool,
    ) -> DomainResult<()> {
        self.expect_consultant(consultant_id)?;
        let open = matches!(
            self.status,
            CertificateStatus::Requested | CertificateStatus::AdditionalDataEntered
        );
        if !open && !linked_request_waiting {
            return Err(DomainError::wrong_status(
                &self.status,
                &[
                    CertificateStatus::Requested,
                    CertificateStatus::AdditionalDataEntered,
                ],
            ));
        }
        let valid_until = today
            .checked_add_months(Months::new(VALIDITY_YEARS * 12))
            .ok_or_else(|| DomainError::Internal(format!("validity overflow from {}", today)))?;

        self.consultant_id = Some(consultant_id);
        self.valid_from = Some(today);
        self.valid_until = Some(valid_until);
        self.price_cents = Some(price_cents);
        self.status = CertificateStatus::Issued;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Efficiency measure recommended by the consultant.
#[derive(Debug, Clone, PartialEq)]
pub struct EfficiencyMeasure {
    pub id: i32,
    pub certificate_id: i32,
    pub description: String,
    pub estimated_savings_kwh: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn issue_sets_ten_year_validity() {
        let mut c = EnergyCertificate::new(1);
        c.issue(4, today(), 25_000, false).unwrap();
        assert_eq!(c.status, CertificateStatus::Issued);
        assert_eq!(c.valid_from, Some(today()));
        assert_eq!(c.valid_until, NaiveDate::from_ymd_opt(2035, 6, 1));
        assert_eq!(c.consultant_id, Some(4));
    }

    #[test]
    fn additional_data_then_issue() {
        let mut c = EnergyCertificate::new(1);
        c.enter_additional_data(4, 9).unwrap();
        assert_eq!(c.status, CertificateStatus::AdditionalDataEntered);
        assert!(matches!(
            c.enter_additional_data(4, 9),
            Err(DomainError::PreconditionFailed { .. })
        ));
        assert!(matches!(
            c.issue(5, today(), 100, false),
            Err(DomainError::Forbidden(_))
        ));
        c.issue(4, today(), 100, false).unwrap();
    }

    #[test]
    fn reissue_needs_waiting_request() {
        let mut c = EnergyCertificate::new(1);
        c.issue(4, today(), 100, false).unwrap();
        assert!(matches!(
            c.issue(4, today(), 100, false),
            Err(DomainError::PreconditionFailed { .. })
        ));
        c.issue(4, today(), 100, true).unwrap();
    }
}
