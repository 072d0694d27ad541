//! Grouped projections feeding the dashboard charts.

use crate::attribution::ClassifiedLead;
use crate::metrics::SpendFocus;
use chrono::{Datelike, Weekday};
use leadboard_core::types::{InvestmentRecord, LeadStatus, Period};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Leads sharing one value of a grouping field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub key: String,
    pub leads: u64,
    pub won: u64,
    pub revenue: f64,
}

impl BreakdownRow {
    fn empty(key: String) -> Self {
        Self {
            key,
            leads: 0,
            won: 0,
            revenue: 0.0,
        }
    }

    fn add(&mut self, lead: &ClassifiedLead) {
        self.leads += 1;
        if lead.lead.status == LeadStatus::Won {
            self.won += 1;
        }
        self.revenue += lead.lead.value;
    }
}

/// One month of activity under the view's spend focus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: Period,
    pub leads: u64,
    pub won: u64,
    pub revenue: f64,
    pub spend: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdowns {
    pub by_center: Vec<BreakdownRow>,
    pub by_channel: Vec<BreakdownRow>,
    pub by_lost_reason: Vec<BreakdownRow>,
    pub by_weekday: Vec<BreakdownRow>,
    pub by_contact_method: Vec<BreakdownRow>,
    pub by_discovery_source: Vec<BreakdownRow>,
    pub trend: Vec<TrendPoint>,
}

impl Breakdowns {
    pub fn compute(
        leads: &[&ClassifiedLead],
        investment: &[&InvestmentRecord],
        focus: SpendFocus,
    ) -> Self {
        Self {
            by_center: group_by(leads, |l| Some(l.lead.center.clone())),
            by_channel: group_by(leads, |l| Some(l.channel.to_string())),
            by_lost_reason: group_by(leads, |l| match l.lead.status {
                LeadStatus::Lost => l.lead.lost_reason.clone(),
                _ => None,
            }),
            by_weekday: by_weekday(leads),
            by_contact_method: group_by(leads, |l| l.lead.contact_method.clone()),
            by_discovery_source: group_by(leads, |l| l.lead.discovery_source.clone()),
            trend: monthly_trend(leads, investment, focus),
        }
    }
}

/// Group leads by `key`, skipping leads without one. Ordered by lead count
/// descending, then key ascending.
pub fn group_by<F>(leads: &[&ClassifiedLead], key: F) -> Vec<BreakdownRow>
where
    F: Fn(&ClassifiedLead) -> Option<String>,
{
    let mut groups: BTreeMap<String, BreakdownRow> = BTreeMap::new();
    for &lead in leads {
        if let Some(k) = key(lead) {
            groups
                .entry(k.clone())
                .or_insert_with(|| BreakdownRow::empty(k))
                .add(lead);
        }
    }
    let mut rows: Vec<BreakdownRow> = groups.into_values().collect();
    rows.sort_by(|a, b| b.leads.cmp(&a.leads));
    rows
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Leads per day of the week, always seven rows from Monday to Sunday.
pub fn by_weekday(leads: &[&ClassifiedLead]) -> Vec<BreakdownRow> {
    let mut rows: Vec<BreakdownRow> = WEEK
        .iter()
        .map(|d| BreakdownRow::empty(weekday_name(*d).to_string()))
        .collect();
    for &lead in leads {
        let idx = lead.lead.date.weekday().num_days_from_monday() as usize;
        rows[idx].add(lead);
    }
    rows
}

/// Activity per month across both tables, oldest first.
pub fn monthly_trend(
    leads: &[&ClassifiedLead],
    investment: &[&InvestmentRecord],
    focus: SpendFocus,
) -> Vec<TrendPoint> {
    let mut points: BTreeMap<Period, TrendPoint> = BTreeMap::new();

    for &lead in leads {
        let p = trend_point(&mut points, lead.lead.period());
        p.leads += 1;
        if lead.lead.status == LeadStatus::Won {
            p.won += 1;
        }
        p.revenue += lead.lead.value;
    }
    for &row in investment {
        trend_point(&mut points, row.period()).spend += focus.spend_of(row);
    }
    points.into_values().collect()
}

fn trend_point(points: &mut BTreeMap<Period, TrendPoint>, period: Period) -> &mut TrendPoint {
    points.entry(period).or_insert_with(|| TrendPoint {
        period,
        leads: 0,
        won: 0,
        revenue: 0.0,
        spend: 0.0,
    })
}
