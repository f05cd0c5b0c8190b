//! Delimited text export

use csv::WriterBuilder;

use crate::domain::{DomainError, DomainResult, Invoice};

const INVOICE_HEADER: [&str; 11] = [
    "id",
    "kategorie",
    "aussteller_id",
    "empfaenger_id",
    "betrag_eur",
    "rechnungsdatum",
    "faellig_am",
    "status",
    "zeitraum_von",
    "zeitraum_bis",
    "vertrag_id",
];

fn euros(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, cents / 100, cents % 100)
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Renders invoices as semicolon-separated rows with a header line.
pub fn invoices_to_csv(invoices: &[Invoice]) -> DomainResult<String> {
    let csv_err = |e: csv::Error| DomainError::Internal(format!("csv export failed: {}", e));

    let mut writer = WriterBuilder::new().delimiter(b';').from_writer(Vec::new());
    writer.write_record(INVOICE_HEADER).map_err(csv_err)?;
    for inv in invoices {
        writer
            .write_record([
                inv.id.to_string(),
                inv.category.to_string(),
                inv.issuer_id.to_string(),
                inv.recipient_id.to_string(),
                euros(inv.amount_cents),
                inv.issue_date.to_string(),
                inv.due_date.to_string(),
                inv.payment_status.to_string(),
                opt(inv.period_start),
                opt(inv.period_end),
                opt(inv.contract_id),
            ])
            .map_err(csv_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DomainError::Internal(format!("csv export failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| DomainError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::InvoiceCategory;

    #[test]
    fn formats_euros() {
        assert_eq!(euros(0), "0.00");
        assert_eq!(euros(5), "0.05");
        assert_eq!(euros(123_456), "1234.56");
        assert_eq!(euros(-250), "-2.50");
    }

    #[test]
    fn header_and_row() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let e = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        let mut inv = Invoice::new(3, 1, InvoiceCategory::GridOperatorInvoice, 117_000, d, 30)
            .for_contract(4)
            .with_period(d, e);
        inv.id = 9;

        let out = invoices_to_csv(&[inv]).unwrap();
        let mut lines = out.lines();
        assert!(lines.next().unwrap().starts_with("id;kategorie;"));
        assert_eq!(
            lines.next().unwrap(),
            "9;GridOperatorInvoice;3;1;1170.00;2025-03-01;2025-03-31;Open;2025-03-01;2026-02-28;4"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn empty_export_has_header_only() {
        let out = invoices_to_csv(&[]).unwrap();
        assert_eq!(out.lines().count(), 1);
    }
}
