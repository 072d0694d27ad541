//! KPI aggregation over a narrowed lead/investment pair.

use crate::attribution::ClassifiedLead;
use leadboard_core::types::{Channel, InvestmentRecord, LeadStatus};
use serde::{Deserialize, Serialize};

/// Which spend column a view sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendFocus {
    /// Total investment, including channels not broken out.
    Total,
    /// Spend booked against one channel. Organic channels sum to zero.
    Channel(Channel),
}

impl SpendFocus {
    pub fn spend_of(&self, row: &InvestmentRecord) -> f64 {
        match self {
            Self::Total => row.total_spend,
            Self::Channel(channel) => row.channel_spend(*channel),
        }
    }
}

/// Funnel counts and financial ratios for one view. Every ratio is 0 when
/// its denominator is 0; percentages are on a 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub label: String,
    pub leads: u64,
    pub trials: u64,
    pub won: u64,
    pub invalid: u64,
    pub lost: u64,
    pub revenue: f64,
    pub spend: f64,
    pub conversion_rate: f64,
    pub trial_rate: f64,
    pub trial_to_win_rate: f64,
    pub cost_per_lead: f64,
    pub cost_per_acquisition: f64,
    pub roas: f64,
    pub average_ticket: f64,
}

impl Metrics {
    /// Aggregate `leads` and `investment`. Pure: identical inputs always
    /// produce identical output, summed in slice order.
    pub fn compute(
        label: impl Into<String>,
        leads: &[&ClassifiedLead],
        investment: &[&InvestmentRecord],
        focus: SpendFocus,
    ) -> Self {
        let mut trials = 0u64;
        let mut won = 0u64;
        let mut invalid = 0u64;
        let mut lost = 0u64;
        let mut revenue = 0.0;

        for l in leads {
            if l.lead.trial {
                trials += 1;
            }
            match l.lead.status {
                LeadStatus::Won => won += 1,
                LeadStatus::Lost => lost += 1,
                LeadStatus::Invalid => invalid += 1,
                LeadStatus::InProgress(_) => {}
            }
            revenue += l.lead.value;
        }

        let spend: f64 = investment.iter().map(|row| focus.spend_of(row)).sum();
        let n_leads = leads.len() as u64;

        Self {
            label: label.into(),
            leads: n_leads,
            trials,
            won,
            invalid,
            lost,
            revenue,
            spend,
            conversion_rate: ratio(won as f64, n_leads as f64) * 100.0,
            trial_rate: ratio(trials as f64, n_leads as f64) * 100.0,
            trial_to_win_rate: ratio(won as f64, trials as f64) * 100.0,
            cost_per_lead: ratio(spend, n_leads as f64),
            cost_per_acquisition: ratio(spend, won as f64),
            roas: ratio(revenue, spend),
            average_ticket: ratio(revenue, won as f64),
        }
    }
}

/// `num / den`, or 0 when `den` is 0.
pub(crate) fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}
