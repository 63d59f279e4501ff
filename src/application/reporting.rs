use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{MonthlyTotal, PurposeTotal, Summary};

/// Everything the analytics view shows, in one serializable report.
#[derive(Debug, Clone, Serialize)]
pub struct InvestmentReport {
    pub generated_at: DateTime<Utc>,
    pub summary: Summary,
    pub by_purpose: Vec<PurposeTotal>,
    pub by_month: Vec<MonthlyTotal>,
}
