//! Accounting-period closer
//!
//! Aggregates pending subscription charges into an immutable report and
//! settles them. Report insert and charge settlement run inside one
//! transaction so the charges included in a report are exactly the ones
//! marked settled.

use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    configuration::{AppState, State},
    error::Error,
    model::{Accounting_Report, Subscription_Charge},
    types::Plan,
};

/// Tax withheld on the gross of every period, 6%.
pub fn tax_on(gross: &BigDecimal) -> BigDecimal {
    (gross * BigDecimal::from(6) / BigDecimal::from(100))
        .with_scale_round(2, RoundingMode::HalfUp)
}

/// Net after tax, 94% of gross.
pub fn net_of(gross: &BigDecimal) -> BigDecimal {
    (gross * BigDecimal::from(94) / BigDecimal::from(100))
        .with_scale_round(2, RoundingMode::HalfUp)
}

/// Builds the period report from the pending charges. Pure; the id is
/// assigned on insert.
pub fn build_report(
    charges: &[Subscription_Charge],
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
) -> Result<Accounting_Report, Error> {
    let mut monthly_count = 0_i64;
    let mut monthly_total = BigDecimal::from(0);
    let mut quarterly_count = 0_i64;
    let mut quarterly_total = BigDecimal::from(0);
    let mut yearly_count = 0_i64;
    let mut yearly_total = BigDecimal::from(0);
    let mut gross = BigDecimal::from(0);

    for charge in charges {
        match Plan::from_str(&charge.plan)? {
            Plan::Monthly => {
                monthly_count += 1;
                monthly_total += &charge.amount;
            },
            Plan::Quarterly => {
                quarterly_count += 1;
                quarterly_total += &charge.amount;
            },
            Plan::Yearly => {
                yearly_count += 1;
                yearly_total += &charge.amount;
            },
        }
        gross += &charge.amount;
    }

    let tax = tax_on(&gross);
    let net = net_of(&gross);

    Ok(Accounting_Report {
        id: 0,
        closed_at: period_end,
        period_start,
        period_end,
        monthly_count,
        monthly_total,
        quarterly_count,
        quarterly_total,
        yearly_count,
        yearly_total,
        gross,
        tax,
        net,
    })
}

/// Closes the current accounting period: everything pending since the last
/// report (or the epoch, on the first close) up to now.
pub async fn close_period(
    state: &AppState<State>,
) -> Result<Accounting_Report, Error> {
    let period_start = state
        .database
        .accounting_report
        .get_latest()
        .await?
        .map(|report| report.period_end)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let period_end = Utc::now();

    let charges = state.database.subscription_charge.get_pending().await?;
    let report = build_report(&charges, period_start, period_end)?;
    let charge_ids: Vec<i64> = charges.iter().map(|c| c.id).collect();

    let mut transaction = state.database.pool.begin().await?;

    let report = state
        .database
        .accounting_report
        .insert(report, &mut transaction)
        .await?;

    if !charge_ids.is_empty() {
        state
            .database
            .subscription_charge
            .mark_settled(charge_ids, &mut transaction)
            .await?;
    }

    transaction.commit().await?;

    info!(
        "accounting period closed: {} charges, gross {}",
        charges.len(),
        report.gross
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    fn charge(plan: &str, amount: &str) -> Subscription_Charge {
        Subscription_Charge {
            id: 1,
            user_id: 42,
            plan: String::from(plan),
            amount: BigDecimal::from_str(amount).unwrap(),
            payment_reference: String::from("pay_001"),
            created_at: Utc::now(),
            settled: false,
        }
    }

    #[test]
    fn tax_and_net_split_gross() {
        let gross = BigDecimal::from_str("1234.50").unwrap();
        assert_eq!(tax_on(&gross), BigDecimal::from_str("74.07").unwrap());
        assert_eq!(net_of(&gross), BigDecimal::from_str("1160.43").unwrap());
    }

    #[test]
    fn report_breaks_down_by_plan() {
        let charges = vec![
            charge("monthly", "49.90"),
            charge("monthly", "49.90"),
            charge("quarterly", "129.90"),
            charge("yearly", "499.00"),
        ];

        let report = build_report(
            &charges,
            DateTime::<Utc>::UNIX_EPOCH,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(report.monthly_count, 2);
        assert_eq!(
            report.monthly_total,
            BigDecimal::from_str("99.80").unwrap()
        );
        assert_eq!(report.quarterly_count, 1);
        assert_eq!(report.yearly_count, 1);
        assert_eq!(report.gross, BigDecimal::from_str("728.70").unwrap());
        assert_eq!(report.tax, BigDecimal::from_str("43.72").unwrap());
        assert_eq!(report.net, BigDecimal::from_str("684.98").unwrap());
    }

    #[test]
    fn empty_period_yields_zero_report() {
        let report =
            build_report(&[], DateTime::<Utc>::UNIX_EPOCH, Utc::now())
                .unwrap();

        assert_eq!(report.gross, BigDecimal::from(0));
        assert_eq!(report.tax.with_scale(0), BigDecimal::from(0));
        assert_eq!(report.net.with_scale(0), BigDecimal::from(0));
        assert_eq!(report.monthly_count, 0);
    }

    #[test]
    fn unknown_plan_is_rejected() {
        let charges = vec![charge("weekly", "9.90")];
        let err = build_report(
            &charges,
            DateTime::<Utc>::UNIX_EPOCH,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
