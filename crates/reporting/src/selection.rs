//! Narrows the lead and investment tables for one view.

use crate::attribution::ClassifiedLead;
use leadboard_core::error::{LeadboardError, LeadboardResult};
use leadboard_core::types::{Channel, InvestmentRecord, Period};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Inclusive period range. `All` is a sentinel rather than the data's
/// min/max so rows arriving later are still included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodRange {
    All,
    Between { from: Period, to: Period },
}

impl PeriodRange {
    pub fn single(period: Period) -> Self {
        Self::Between {
            from: period,
            to: period,
        }
    }

    pub fn between(from: Period, to: Period) -> LeadboardResult<Self> {
        if from > to {
            return Err(LeadboardError::InvalidInput(format!(
                "period range starts after it ends ({from} > {to})"
            )));
        }
        Ok(Self::Between { from, to })
    }

    pub fn contains(&self, period: Period) -> bool {
        match self {
            Self::All => true,
            Self::Between { from, to } => *from <= period && period <= *to,
        }
    }
}

impl FromStr for PeriodRange {
    type Err = LeadboardError;

    /// Accepts `all`, a single `YYYY-MM`, or `YYYY-MM..YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") || s.eq_ignore_ascii_case("todos") {
            return Ok(Self::All);
        }
        match s.split_once("..") {
            Some((from, to)) => Self::between(from.parse()?, to.parse()?),
            None => Ok(Self::single(s.parse()?)),
        }
    }
}

impl std::fmt::Display for PeriodRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Between { from, to } if from == to => write!(f, "{from}"),
            Self::Between { from, to } => write!(f, "{from}..{to}"),
        }
    }
}

/// Period, center and channel predicate for one view. An empty center or
/// channel set selects nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub periods: PeriodRange,
    pub centers: BTreeSet<String>,
    pub channels: BTreeSet<Channel>,
}

/// Rows of both tables that survive a selection, in table order.
#[derive(Debug, Clone, Default)]
pub struct Narrowed<'a> {
    pub leads: Vec<&'a ClassifiedLead>,
    pub investment: Vec<&'a InvestmentRecord>,
}

impl FilterSelection {
    pub fn new(
        periods: PeriodRange,
        centers: impl IntoIterator<Item = String>,
        channels: impl IntoIterator<Item = Channel>,
    ) -> Self {
        Self {
            periods,
            centers: centers.into_iter().collect(),
            channels: channels.into_iter().collect(),
        }
    }

    pub fn matches_lead(&self, lead: &ClassifiedLead) -> bool {
        self.periods.contains(lead.lead.period())
            && self.centers.contains(&lead.lead.center)
            && self.channels.contains(&lead.channel)
    }

    /// Investment rows are not per lead, so only the period applies.
    pub fn matches_investment(&self, row: &InvestmentRecord) -> bool {
        self.periods.contains(row.period())
    }

    pub fn narrow<'a>(
        &self,
        leads: &'a [ClassifiedLead],
        investment: &'a [InvestmentRecord],
    ) -> Narrowed<'a> {
        Narrowed {
            leads: leads.iter().filter(|l| self.matches_lead(l)).collect(),
            investment: investment
                .iter()
                .filter(|r| self.matches_investment(r))
                .collect(),
        }
    }
}

impl<'a> Narrowed<'a> {
    /// Keep only leads attributed to `channel`.
    pub fn only_channel(&self, channel: Channel) -> Narrowed<'a> {
        Narrowed {
            leads: self
                .leads
                .iter()
                .copied()
                .filter(|l| l.channel == channel)
                .collect(),
            investment: self.investment.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use leadboard_core::types::{Lead, LeadStatus};

    fn period(s: &str) -> Period {
        s.parse().unwrap()
    }

    fn lead(id: &str, date: (i32, u32), center: &str, channel: Channel) -> ClassifiedLead {
        ClassifiedLead {
            lead: Lead {
                id: id.into(),
                date: NaiveDate::from_ymd_opt(date.0, date.1, 1).unwrap(),
                center: center.into(),
                status: LeadStatus::Won,
                trial: false,
                lost_reason: None,
                contact_method: None,
                discovery_source: None,
                landing_url: None,
                contact_log: None,
                click_id: None,
                marketing_tag: None,
                value: 0.0,
            },
            channel,
        }
    }

    fn investment(date: (i32, u32)) -> InvestmentRecord {
        InvestmentRecord {
            date: NaiveDate::from_ymd_opt(date.0, date.1, 1).unwrap(),
            total_spend: 10.0,
            google_ads_spend: 5.0,
            meta_ads_spend: 0.0,
        }
    }

    fn tables() -> (Vec<ClassifiedLead>, Vec<InvestmentRecord>) {
        (
            vec![
                lead("a", (2024, 1), "Madrid", Channel::GoogleAds),
                lead("b", (2025, 6), "Sevilla", Channel::Seo),
            ],
            vec![investment((2024, 1)), investment((2025, 6))],
        )
    }

    fn all_of(periods: PeriodRange) -> FilterSelection {
        FilterSelection::new(
            periods,
            ["Madrid".to_string(), "Sevilla".to_string()],
            Channel::ALL,
        )
    }

    #[test]
    fn test_all_periods_keeps_everything() {
        let (leads, inv) = tables();
        let narrowed = all_of(PeriodRange::All).narrow(&leads, &inv);
        assert_eq!(narrowed.leads.len(), 2);
        assert_eq!(narrowed.investment.len(), 2);
    }

    #[test]
    fn test_single_period_narrows_both_tables() {
        let (leads, inv) = tables();
        let narrowed = all_of(PeriodRange::single(period("2024-01"))).narrow(&leads, &inv);
        assert_eq!(narrowed.leads.len(), 1);
        assert_eq!(narrowed.leads[0].lead.id, "a");
        assert_eq!(narrowed.investment.len(), 1);
        assert_eq!(narrowed.investment[0].period(), period("2024-01"));
    }

    #[test]
    fn test_range_is_inclusive() {
        let range = PeriodRange::between(period("2024-01"), period("2024-03")).unwrap();
        assert!(range.contains(period("2024-01")));
        assert!(range.contains(period("2024-03")));
        assert!(!range.contains(period("2024-04")));
        assert!(!range.contains(period("2023-12")));
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(PeriodRange::between(period("2024-05"), period("2024-01")).is_err());
    }

    #[test]
    fn test_empty_center_set_selects_nothing() {
        let (leads, inv) = tables();
        let selection = FilterSelection::new(PeriodRange::All, Vec::<String>::new(), Channel::ALL);
        let narrowed = selection.narrow(&leads, &inv);
        assert!(narrowed.leads.is_empty());
        // investment is narrowed by period only
        assert_eq!(narrowed.investment.len(), 2);
    }

    #[test]
    fn test_channel_filter_applies_to_leads_only() {
        let (leads, inv) = tables();
        let selection = FilterSelection::new(
            PeriodRange::All,
            ["Madrid".to_string(), "Sevilla".to_string()],
            [Channel::Seo],
        );
        let narrowed = selection.narrow(&leads, &inv);
        assert_eq!(narrowed.leads.len(), 1);
        assert_eq!(narrowed.leads[0].channel, Channel::Seo);
        assert_eq!(narrowed.investment.len(), 2);
    }

    #[test]
    fn test_only_channel() {
        let (leads, inv) = tables();
        let narrowed = all_of(PeriodRange::All).narrow(&leads, &inv);
        let google = narrowed.only_channel(Channel::GoogleAds);
        assert_eq!(google.leads.len(), 1);
        assert_eq!(google.investment.len(), 2);
    }

    #[test]
    fn test_period_range_from_str() {
        assert_eq!("all".parse::<PeriodRange>().unwrap(), PeriodRange::All);
        assert_eq!("Todos".parse::<PeriodRange>().unwrap(), PeriodRange::All);
        assert_eq!(
            "2024-01".parse::<PeriodRange>().unwrap(),
            PeriodRange::single(period("2024-01"))
        );
        let range: PeriodRange = "2024-01..2024-06".parse().unwrap();
        assert_eq!(range.to_string(), "2024-01..2024-06");
        assert!("2024-06..2024-01".parse::<PeriodRange>().is_err());
        assert!("last month".parse::<PeriodRange>().is_err());
    }
}
