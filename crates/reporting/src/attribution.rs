//! Channel attribution — credits every lead to exactly one marketing channel
//! using an ordered rule chain where the first matching rule wins:
//!
//! 1. Google Ads: a click identifier is present, or the marketing tag contains
//!    the paid-search marker.
//! 2. Meta Ads: the landing URL mentions a Meta property, or the contact log
//!    mentions Facebook.
//! 3. SEO: no click identifier, no paid-platform marker in the landing URL,
//!    and the marketing tag equals the organic marker.
//! 4. Other: everything else.
//!
//! Missing fields never match. All text comparisons ignore case.

use leadboard_core::config::AttributionConfig;
use leadboard_core::types::{Channel, Lead};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A lead paired with the channel it was attributed to at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedLead {
    #[serde(flatten)]
    pub lead: Lead,
    pub channel: Channel,
}

/// Rule chain with its markers pre-lowercased.
#[derive(Debug, Clone)]
pub struct ChannelClassifier {
    paid_search_marker: Option<String>,
    organic_marker: String,
    meta_url_markers: Vec<String>,
    meta_log_markers: Vec<String>,
    paid_platform_markers: Vec<String>,
}

impl ChannelClassifier {
    pub fn new(config: &AttributionConfig) -> Self {
        let lowered = |markers: &[String]| -> Vec<String> {
            markers
                .iter()
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect()
        };
        let paid_search = config.paid_search_marker.trim().to_lowercase();

        Self {
            paid_search_marker: (!paid_search.is_empty()).then_some(paid_search),
            organic_marker: config.organic_marker.trim().to_lowercase(),
            meta_url_markers: lowered(&config.meta_url_markers),
            meta_log_markers: lowered(&config.meta_log_markers),
            paid_platform_markers: lowered(&config.paid_platform_markers),
        }
    }

    /// Attribute a single lead. Total and deterministic.
    pub fn classify(&self, lead: &Lead) -> Channel {
        if self.is_google_ads(lead) {
            Channel::GoogleAds
        } else if self.is_meta_ads(lead) {
            Channel::MetaAds
        } else if self.is_seo(lead) {
            Channel::Seo
        } else {
            Channel::Other
        }
    }

    /// Attribute every lead in a table, preserving order.
    pub fn classify_all(&self, leads: &[Lead]) -> Vec<ClassifiedLead> {
        let classified: Vec<ClassifiedLead> = leads
            .iter()
            .map(|lead| ClassifiedLead {
                channel: self.classify(lead),
                lead: lead.clone(),
            })
            .collect();

        let mut counts: BTreeMap<Channel, usize> = BTreeMap::new();
        for c in &classified {
            *counts.entry(c.channel).or_default() += 1;
        }
        debug!(total = classified.len(), ?counts, "Leads classified");
        classified
    }

    fn is_google_ads(&self, lead: &Lead) -> bool {
        has_click_id(lead)
            || self
                .paid_search_marker
                .as_ref()
                .is_some_and(|m| contains(lead.marketing_tag.as_deref(), m))
    }

    fn is_meta_ads(&self, lead: &Lead) -> bool {
        contains_any(lead.landing_url.as_deref(), &self.meta_url_markers)
            || contains_any(lead.contact_log.as_deref(), &self.meta_log_markers)
    }

    fn is_seo(&self, lead: &Lead) -> bool {
        !has_click_id(lead)
            && !contains_any(lead.landing_url.as_deref(), &self.paid_platform_markers)
            && lead
                .marketing_tag
                .as_deref()
                .is_some_and(|tag| tag.trim().to_lowercase() == self.organic_marker)
    }
}

impl Default for ChannelClassifier {
    fn default() -> Self {
        Self::new(&AttributionConfig::default())
    }
}

fn has_click_id(lead: &Lead) -> bool {
    lead.click_id.as_deref().is_some_and(|id| !id.trim().is_empty())
}

/// `needle` must already be lowercase.
fn contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

fn contains_any(haystack: Option<&str>, needles: &[String]) -> bool {
    let Some(h) = haystack else {
        return false;
    };
    let h = h.to_lowercase();
    needles.iter().any(|n| h.contains(n.as_str()))
}
