//! Lead performance dashboard — classified tables plus per-view assembly.
//!
//! Each [`DashboardView`] is computed in full and returned by value, so a
//! consumer never observes a partially updated set of figures.

use crate::attribution::{ChannelClassifier, ClassifiedLead};
use crate::breakdown::Breakdowns;
use crate::funnel::FunnelResult;
use crate::metrics::{Metrics, SpendFocus};
use crate::selection::{FilterSelection, PeriodRange};
use leadboard_core::types::{Channel, Dataset, InvestmentRecord, Period};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Everything one dashboard tab renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub label: String,
    pub focus: SpendFocus,
    pub selection: FilterSelection,
    pub metrics: Metrics,
    pub funnel: FunnelResult,
    pub breakdowns: Breakdowns,
}

pub struct LeadDashboard {
    leads: Vec<ClassifiedLead>,
    investment: Vec<InvestmentRecord>,
}

impl LeadDashboard {
    /// Classify every lead once and keep the investment table alongside.
    pub fn new(dataset: &Dataset, classifier: &ChannelClassifier) -> Self {
        let leads = classifier.classify_all(&dataset.leads);
        info!(
            leads = leads.len(),
            investment_rows = dataset.investment.len(),
            "Dashboard initialized"
        );
        Self {
            leads,
            investment: dataset.investment.clone(),
        }
    }

    pub fn leads(&self) -> &[ClassifiedLead] {
        &self.leads
    }

    pub fn investment(&self) -> &[InvestmentRecord] {
        &self.investment
    }

    /// Distinct lead periods, newest first.
    pub fn available_periods(&self) -> Vec<Period> {
        let periods: BTreeSet<Period> = self.leads.iter().map(|l| l.lead.period()).collect();
        periods.into_iter().rev().collect()
    }

    /// Distinct centers of origin, sorted.
    pub fn available_centers(&self) -> Vec<String> {
        let centers: BTreeSet<&str> = self.leads.iter().map(|l| l.lead.center.as_str()).collect();
        centers.into_iter().map(str::to_string).collect()
    }

    /// All periods, every known center and every channel.
    pub fn default_selection(&self) -> FilterSelection {
        FilterSelection::new(PeriodRange::All, self.available_centers(), Channel::ALL)
    }

    /// Assemble one view. A channel focus also restricts the leads to that
    /// channel so that cost ratios compare like with like.
    pub fn view(
        &self,
        selection: &FilterSelection,
        focus: SpendFocus,
        label: impl Into<String>,
    ) -> DashboardView {
        let label = label.into();
        let mut narrowed = selection.narrow(&self.leads, &self.investment);
        if let SpendFocus::Channel(channel) = focus {
            narrowed = narrowed.only_channel(channel);
        }

        let metrics = Metrics::compute(label.clone(), &narrowed.leads, &narrowed.investment, focus);
        let funnel = FunnelResult::from_metrics(&metrics);
        let breakdowns = Breakdowns::compute(&narrowed.leads, &narrowed.investment, focus);

        debug!(
            label = %label,
            periods = %selection.periods,
            leads = metrics.leads,
            spend = metrics.spend,
            "View assembled"
        );

        DashboardView {
            label,
            focus,
            selection: selection.clone(),
            metrics,
            funnel,
            breakdowns,
        }
    }

    /// The standard tab set: global, Google Ads, Meta Ads and SEO.
    pub fn channel_views(&self, selection: &FilterSelection) -> Vec<DashboardView> {
        let mut views = vec![self.view(selection, SpendFocus::Total, "Global")];
        for channel in [Channel::GoogleAds, Channel::MetaAds, Channel::Seo] {
            views.push(self.view(
                selection,
                SpendFocus::Channel(channel),
                channel.display_name(),
            ));
        }
        views
    }

    /// Leads attributed to `channel` under `selection`.
    pub fn channel_count(&self, selection: &FilterSelection, channel: Channel) -> u64 {
        self.leads
            .iter()
            .filter(|l| l.channel == channel && selection.matches_lead(l))
            .count() as u64
    }
}
