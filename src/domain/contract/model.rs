//! Supply contract between a household and a tariff

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::tariff::Tariff;
use crate::domain::{DomainError, DomainResult};

/// Contract lifecycle. Only moves forward, except that a rejected
/// cancellation returns to `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractStatus {
    Running,
    CancellationPending,
    Cancelled,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::CancellationPending => "CancellationPending",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContractStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Running" => Ok(Self::Running),
            "CancellationPending" => Ok(Self::CancellationPending),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown contract status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    pub id: i32,
    pub household_id: i32,
    pub tariff_id: i32,
    /// Grid operator owning the tariff; issuer of the contract's invoices
    pub operator_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub annual_charge_cents: i64,
    pub status: ContractStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// New running contract starting on `start`, ending after the tariff term.
    pub fn new(
        household_id: i32,
        tariff: &Tariff,
        start: NaiveDate,
        annual_consumption_kwh: u32,
    ) -> DomainResult<Self> {
        let end_date = start
            .checked_add_months(Months::new(tariff.term_months))
            .ok_or_else(|| {
                DomainError::BadRequest(format!(
                    "term of {} months is out of range",
                    tariff.term_months
                ))
            })?;
        let now = Utc::now();
        Ok(Self {
            id: 0,
            household_id,
            tariff_id: tariff.id,
            operator_id: tariff.operator_id,
            start_date: start,
            end_date,
            annual_charge_cents: tariff.annual_charge_cents(annual_consumption_kwh),
            status: ContractStatus::Running,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_open(&self) -> bool {
        self.status != ContractStatus::Cancelled
    }

    pub fn request_cancellation(&mut self) -> DomainResult<()> {
        match self.status {
            ContractStatus::Running => {
                self.status = ContractStatus::CancellationPending;
                self.updated_at = Utc::now();
                Ok(())
            }
            ContractStatus::CancellationPending => Err(DomainError::Conflict(format!(
                "Kündigung für Vertrag {} ist bereits beantragt",
                self.id
            ))),
            ContractStatus::Cancelled => Err(DomainError::Conflict(format!(
                "Vertrag {} ist bereits gekündigt",
                self.id
            ))),
        }
    }

    fn expect_pending(&self) -> DomainResult<()> {
        if self.status == ContractStatus::CancellationPending {
            Ok(())
        } else {
            Err(DomainError::wrong_status(
                &self.status,
                &[ContractStatus::CancellationPending],
            ))
        }
    }

    pub fn confirm_cancellation(&mut self) -> DomainResult<()> {
        self.expect_pending()?;
        self.status = ContractStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn reject_cancellation(&mut self) -> DomainResult<()> {
        self.expect_pending()?;
        self.status = ContractStatus::Running;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// One cancellation attempt for a contract.
#[derive(Debug, Clone, PartialEq)]
pub struct CancellationRequest {
    pub id: i32,
    pub contract_id: i32,
    pub requested_by: i32,
    pub replacement_tariff_id: Option<i32>,
    /// `None` while pending, then whether the operator confirmed it
    pub confirmed: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl CancellationRequest {
    pub fn new(contract_id: i32, requested_by: i32, replacement_tariff_id: Option<i32>) -> Self {
        Self {
            id: 0,
            contract_id,
            requested_by,
            replacement_tariff_id,
            confirmed: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }
}

/// Operator decision on a pending cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationAction {
    Confirm,
    Reject,
}

impl std::str::FromStr for CancellationAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "confirm" => Ok(Self::Confirm),
            "reject" => Ok(Self::Reject),
            other => Err(DomainError::BadRequest(format!(
                "unknown cancellation action '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tariff() -> Tariff {
        let mut t = Tariff::new(3, "Basis".into(), 30, 12_000, 24);
        t.id = 7;
        t
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
    }

    #[test]
    fn new_contract_derives_dates_and_charge() {
        let c = Contract::new(1, &tariff(), start(), 3500).unwrap();
        assert_eq!(c.end_date, NaiveDate::from_ymd_opt(2027, 1, 31).unwrap());
        assert_eq!(c.annual_charge_cents, 12_000 + 30 * 3500);
        assert_eq!(c.operator_id, 3);
        assert_eq!(c.tariff_id, 7);
        assert_eq!(c.status, ContractStatus::Running);
    }

    #[test]
    fn cancellation_lifecycle() {
        let mut c = Contract::new(1, &tariff(), start(), 3500).unwrap();
        c.request_cancellation().unwrap();
        assert_eq!(c.status, ContractStatus::CancellationPending);
        assert!(matches!(c.request_cancellation(), Err(DomainError::Conflict(_))));

        c.reject_cancellation().unwrap();
        assert_eq!(c.status, ContractStatus::Running);

        c.request_cancellation().unwrap();
        c.confirm_cancellation().unwrap();
        assert_eq!(c.status, ContractStatus::Cancelled);
        assert!(!c.is_open());
        assert!(matches!(c.request_cancellation(), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn resolving_without_pending_request_fails() {
        let mut c = Contract::new(1, &tariff(), start(), 3500).unwrap();
        assert!(matches!(
            c.confirm_cancellation(),
            Err(DomainError::PreconditionFailed { .. })
        ));
    }

    #[test]
    fn action_parsing() {
        assert_eq!("confirm".parse::<CancellationAction>(), Ok(CancellationAction::Confirm));
        assert_eq!("Reject".parse::<CancellationAction>(), Ok(CancellationAction::Reject));
        assert!(matches!(
            "postpone".parse::<CancellationAction>(),
            Err(DomainError::BadRequest(_))
        ));
    }
}
