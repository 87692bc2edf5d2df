//! Plain-text run summary for the notification channel.

use crate::model::ReconReport;
use crate::money::Money;

/// Qualitative read of a match rate.
pub fn assessment(match_percentage: f64) -> &'static str {
    if match_percentage >= 90.0 {
        "excellent"
    } else if match_percentage >= 75.0 {
        "good"
    } else if match_percentage >= 50.0 {
        "moderate"
    } else {
        "critical"
    }
}

/// Ready-to-send notification content.
#[derive(Debug, Clone)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Render the run into subject and body text. Carriers below a 90%
/// match rate are singled out for review.
pub fn notification(report: &ReconReport, run_date: &str) -> Notification {
    let carriers = &report.carriers;
    let total_entries: usize = carriers.values().map(|c| c.summary.total_extracted).sum();
    let total_matched: usize = carriers.values().map(|c| c.summary.total_matched).sum();
    let total_unmatched: usize = carriers.values().map(|c| c.summary.total_unmatched).sum();
    let match_rate = if total_entries > 0 {
        total_matched as f64 / total_entries as f64 * 100.0
    } else {
        0.0
    };
    let total_commission: Money = carriers.values().map(|c| c.summary.total_commission).sum();

    let subject =
        format!("Commission Reconciliation Report - {run_date} - {match_rate:.1}% Match Rate");

    let mut body = String::new();
    body.push_str("Commission Reconciliation Report\n");
    body.push_str(&"=".repeat(50));
    body.push('\n');
    body.push_str(&format!("Report Date: {run_date}\n\n"));
    body.push_str("OVERALL SUMMARY:\n");
    body.push_str(&format!("- Carriers Processed: {}\n", carriers.len()));
    body.push_str(&format!("- Total Commission Entries: {total_entries}\n"));
    body.push_str(&format!("- Successfully Matched: {total_matched}\n"));
    body.push_str(&format!("- Unmatched Entries: {total_unmatched}\n"));
    body.push_str(&format!("- Overall Match Rate: {match_rate:.1}%\n"));
    body.push_str(&format!("- Total Commission Amount: {total_commission}\n\n"));

    body.push_str("CARRIER BREAKDOWN:\n");
    for result in carriers.values() {
        let s = &result.summary;
        body.push_str(&format!("{}:\n", result.carrier_name));
        body.push_str(&format!("  - Entries: {}\n", s.total_extracted));
        body.push_str(&format!(
            "  - Matched: {} ({:.1}%)\n",
            s.total_matched, s.match_percentage
        ));
        body.push_str(&format!("  - Commission: {}\n\n", s.total_commission));
    }

    let needs_attention: Vec<_> = carriers
        .values()
        .filter(|c| c.summary.match_percentage < 90.0)
        .collect();
    if needs_attention.is_empty() {
        body.push_str("STATUS: All carriers show excellent match rates (>90%)\n");
    } else {
        body.push_str("ISSUES REQUIRING ATTENTION:\n");
        for result in &needs_attention {
            body.push_str(&format!(
                "- {}: {:.1}% match rate ({})\n",
                result.carrier_name,
                result.summary.match_percentage,
                assessment(result.summary.match_percentage)
            ));
        }
        body.push_str("\nPlease review detailed reports for investigation steps.\n");
    }

    Notification { subject, body }
}
