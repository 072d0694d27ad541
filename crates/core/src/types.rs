//! Lead and investment tables as consumed by attribution and reporting.

use crate::config::StatusConfig;
use crate::error::{LeadboardError, LeadboardResult};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tolerance applied when checking investment totals against their parts.
const SPEND_TOLERANCE: f64 = 1e-6;

// ─── Period ─────────────────────────────────────────────────────────────────

/// Calendar month used as the reporting granularity for both tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> LeadboardResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(LeadboardError::InvalidInput(format!(
                "month {month} out of range in period {year}"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = LeadboardError;

    /// Parses a `YYYY-MM` month key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LeadboardError::InvalidInput(format!("malformed period '{s}'"));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if year.len() != 4 || month.len() != 2 || !digits(year) || !digits(month) {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

impl TryFrom<String> for Period {
    type Error = LeadboardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ─── Channel ────────────────────────────────────────────────────────────────

/// Marketing source credited with a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    GoogleAds,
    MetaAds,
    Seo,
    Other,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::GoogleAds,
        Channel::MetaAds,
        Channel::Seo,
        Channel::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoogleAds => "google_ads",
            Self::MetaAds => "meta_ads",
            Self::Seo => "seo",
            Self::Other => "other",
        }
    }

    /// Human-facing name used for dashboard tabs.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::GoogleAds => "Google Ads",
            Self::MetaAds => "Meta Ads",
            Self::Seo => "SEO",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = LeadboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LeadboardError::InvalidInput(format!("unknown channel '{s}'")))
    }
}

// ─── Lead ───────────────────────────────────────────────────────────────────

/// Pipeline state of a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    Won,
    Lost,
    Invalid,
    InProgress(String),
}

impl LeadStatus {
    /// Maps a raw status literal through the configured vocabulary. Literals
    /// outside the vocabulary are a data-contract violation.
    pub fn parse(literal: &str, vocabulary: &StatusConfig) -> LeadboardResult<Self> {
        let literal = literal.trim();
        if literal == vocabulary.won {
            Ok(Self::Won)
        } else if literal == vocabulary.lost {
            Ok(Self::Lost)
        } else if literal == vocabulary.invalid {
            Ok(Self::Invalid)
        } else if vocabulary.in_progress.iter().any(|s| s == literal) {
            Ok(Self::InProgress(literal.to_string()))
        } else {
            Err(LeadboardError::InvalidInput(format!(
                "unrecognized status '{literal}'"
            )))
        }
    }
}

/// One inbound inquiry as exported from the CRM sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub date: NaiveDate,
    pub center: String,
    pub status: LeadStatus,
    pub trial: bool,
    pub lost_reason: Option<String>,
    pub contact_method: Option<String>,
    pub discovery_source: Option<String>,
    pub landing_url: Option<String>,
    pub contact_log: Option<String>,
    /// Paid click tracking token (GCLID).
    pub click_id: Option<String>,
    /// SEM / SEO marker.
    pub marketing_tag: Option<String>,
    pub value: f64,
}

impl Lead {
    pub fn period(&self) -> Period {
        Period::from_date(self.date)
    }
}

// ─── Investment ─────────────────────────────────────────────────────────────

/// Ad spend for one period. `total_spend` may include channels that are not
/// broken out individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentRecord {
    pub date: NaiveDate,
    pub total_spend: f64,
    pub google_ads_spend: f64,
    pub meta_ads_spend: f64,
}

impl InvestmentRecord {
    pub fn period(&self) -> Period {
        Period::from_date(self.date)
    }

    /// Spend booked directly against `channel`. Organic channels carry none.
    pub fn channel_spend(&self, channel: Channel) -> f64 {
        match channel {
            Channel::GoogleAds => self.google_ads_spend,
            Channel::MetaAds => self.meta_ads_spend,
            Channel::Seo | Channel::Other => 0.0,
        }
    }

    /// Checks that the total covers every broken-out channel.
    pub fn check_totals(&self) -> LeadboardResult<()> {
        let broken_out = self.google_ads_spend + self.meta_ads_spend;
        if self.google_ads_spend < 0.0 || self.meta_ads_spend < 0.0 || self.total_spend < 0.0 {
            return Err(LeadboardError::InvalidInput(format!(
                "negative spend in period {}",
                self.period()
            )));
        }
        if self.total_spend + SPEND_TOLERANCE < broken_out {
            return Err(LeadboardError::InvalidInput(format!(
                "total spend {} below channel spend {} in period {}",
                self.total_spend,
                broken_out,
                self.period()
            )));
        }
        Ok(())
    }
}

/// The two source tables, immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub leads: Vec<Lead>,
    pub investment: Vec<InvestmentRecord>,
}
