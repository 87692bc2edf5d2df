//! Cross-carrier portfolio rollup.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{
    CarrierShare, PeriodGrowth, PortfolioSummary, ReconciliationResult, TopCarrier,
};
use crate::money::Money;

/// Roll one run's per-carrier results into portfolio totals, each
/// carrier's share, the top performer and growth between the two most
/// recent statement periods.
pub fn aggregate_portfolio(
    results: &BTreeMap<String, ReconciliationResult>,
) -> PortfolioSummary {
    let total: Money = results.values().map(|r| r.summary.total_commission).sum();

    let mut breakdown = BTreeMap::new();
    for (code, result) in results {
        let amount = result.summary.total_commission;
        let percentage = if total.0 != 0 {
            amount.0 as f64 / total.0 as f64 * 100.0
        } else {
            0.0
        };
        breakdown.insert(code.clone(), CarrierShare { amount, percentage });
    }

    // Strictly greater keeps the alphabetically first carrier on ties.
    let mut top: Option<TopCarrier> = None;
    for (code, result) in results {
        let amount = result.summary.total_commission;
        if top.as_ref().map_or(true, |t| amount > t.amount) {
            top = Some(TopCarrier {
                carrier: code.clone(),
                amount,
            });
        }
    }

    let mut periods: BTreeMap<NaiveDate, Money> = BTreeMap::new();
    for result in results.values() {
        if let Some(date) = result.statement_date {
            let entry = periods.entry(date).or_insert(Money(0));
            *entry = *entry + result.summary.total_commission;
        }
    }
    let growth = period_growth(&periods);

    PortfolioSummary {
        total_all_carriers: total,
        carrier_breakdown: breakdown,
        top_performing_carrier: top,
        period_growth: growth,
    }
}

fn period_growth(periods: &BTreeMap<NaiveDate, Money>) -> Option<PeriodGrowth> {
    if periods.len() < 2 {
        return None;
    }
    let entries: Vec<(NaiveDate, Money)> =
        periods.iter().map(|(d, m)| (*d, *m)).collect();
    let (previous_period, previous_total) = entries[entries.len() - 2];
    let (current_period, current_total) = entries[entries.len() - 1];
    if previous_total.0 == 0 {
        return None;
    }
    Some(PeriodGrowth {
        previous_period,
        current_period,
        previous_total,
        current_total,
        growth_rate: (current_total.0 - previous_total.0) as f64 / previous_total.0 as f64,
    })
}
