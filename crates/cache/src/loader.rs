//! Reads the record-oriented JSON exports of the leads and investment sheets
//! into typed tables. Every data-contract violation is reported with the
//! table and row it occurred in.

use chrono::{NaiveDate, NaiveDateTime};
use leadboard_core::config::StatusConfig;
use leadboard_core::error::{LeadboardError, LeadboardResult};
use leadboard_core::types::{Dataset, InvestmentRecord, Lead, LeadStatus, Period};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info};

const LEADS_TABLE: &str = "leads";
const INVESTMENT_TABLE: &str = "investment";

/// Column headers of the leads sheet.
pub mod lead_columns {
    pub const ID: &str = "ID";
    pub const PERIOD: &str = "PERIODO";
    pub const CENTER: &str = "Centro origen";
    pub const STATUS: &str = "Situacion actual";
    pub const TRIAL: &str = "Prueba";
    pub const LOST_REASON: &str = "Causa perdido";
    pub const CONTACT_METHOD: &str = "Forma de contacto";
    pub const DISCOVERY_SOURCE: &str = "Como nos conocio";
    pub const LANDING_URL: &str = "URL";
    pub const CONTACT_LOG: &str = "Registro de contacto";
    pub const CLICK_ID: &str = "GCLID";
    pub const MARKETING_TAG: &str = "SEM / SEO";
    pub const VALUE: &str = "Valor total";
}

/// Column headers of the investment sheet.
pub mod investment_columns {
    pub const PERIOD: &str = "PERIODO";
    pub const TOTAL: &str = "INVERSIÓN TOTAL";
    pub const GOOGLE_ADS: &str = "INVERSIÓN EN G ADS";
    pub const META_ADS: &str = "INVERSIÓN EN META";
}

/// Locations of the two source tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetSource {
    pub leads_path: PathBuf,
    pub investment_path: PathBuf,
}

impl DatasetSource {
    pub fn new(leads_path: impl Into<PathBuf>, investment_path: impl Into<PathBuf>) -> Self {
        Self {
            leads_path: leads_path.into(),
            investment_path: investment_path.into(),
        }
    }
}

/// Parses raw sheet exports using the configured status vocabulary.
#[derive(Debug, Clone, Default)]
pub struct TableLoader {
    statuses: StatusConfig,
}

impl TableLoader {
    pub fn new(mut statuses: StatusConfig) -> Self {
        statuses.trial_affirmative = statuses.trial_affirmative.trim().to_string();
        Self { statuses }
    }

    /// Parse both tables from their raw bytes.
    pub fn parse_dataset(&self, leads: &[u8], investment: &[u8]) -> LeadboardResult<Dataset> {
        let dataset = Dataset {
            leads: self.parse_leads(leads)?,
            investment: self.parse_investment(investment)?,
        };
        info!(
            leads = dataset.leads.len(),
            investment_rows = dataset.investment.len(),
            "Dataset parsed"
        );
        Ok(dataset)
    }

    pub fn parse_leads(&self, bytes: &[u8]) -> LeadboardResult<Vec<Lead>> {
        use lead_columns::*;

        let rows = rows(LEADS_TABLE, bytes)?;
        let mut seen: HashSet<String> = HashSet::with_capacity(rows.len());
        let mut leads = Vec::with_capacity(rows.len());

        for (index, fields) in rows.iter().enumerate() {
            let row = Row::new(LEADS_TABLE, index, fields);
            let id = row.required_text(ID)?;
            if !seen.insert(id.clone()) {
                return Err(row.invalid(format!("duplicate ID '{id}'")));
            }
            let status = LeadStatus::parse(&row.required_text(STATUS)?, &self.statuses)
                .map_err(|e| row.context(e))?;
            let trial = row
                .text(TRIAL)
                .is_some_and(|t| t == self.statuses.trial_affirmative);

            leads.push(Lead {
                id,
                date: row.date(PERIOD)?,
                center: row.required_text(CENTER)?,
                status,
                trial,
                lost_reason: row.text(LOST_REASON),
                contact_method: row.text(CONTACT_METHOD),
                discovery_source: row.text(DISCOVERY_SOURCE),
                landing_url: row.text(LANDING_URL),
                contact_log: row.text(CONTACT_LOG),
                click_id: row.text(CLICK_ID),
                marketing_tag: row.text(MARKETING_TAG),
                value: row.amount(VALUE)?,
            });
        }
        Ok(leads)
    }

    pub fn parse_investment(&self, bytes: &[u8]) -> LeadboardResult<Vec<InvestmentRecord>> {
        use investment_columns::*;

        rows(INVESTMENT_TABLE, bytes)?
            .iter()
            .enumerate()
            .map(|(index, fields)| {
                let row = Row::new(INVESTMENT_TABLE, index, fields);
                let record = InvestmentRecord {
                    date: row.date(PERIOD)?,
                    total_spend: row.amount(TOTAL)?,
                    google_ads_spend: row.optional_amount(GOOGLE_ADS)?,
                    meta_ads_spend: row.optional_amount(META_ADS)?,
                };
                record.check_totals().map_err(|e| row.context(e))?;
                Ok(record)
            })
            .collect()
    }
}

fn rows(table: &'static str, bytes: &[u8]) -> LeadboardResult<Vec<Map<String, Value>>> {
    let value: Value = serde_json::from_slice(bytes)?;
    let Value::Array(items) = value else {
        return Err(LeadboardError::InvalidInput(format!(
            "{table} table must be a JSON array of rows"
        )));
    };
    debug!(table, rows = items.len(), "Decoding table");
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => Ok(fields),
            _ => Err(LeadboardError::InvalidInput(format!(
                "{table} row {index} is not an object"
            ))),
        })
        .collect()
}

/// Parses a `PERIODO` cell. Accepts plain dates, sheet datetimes and bare
/// `YYYY-MM` keys (pinned to the first of the month).
pub fn parse_period_date(raw: &str) -> LeadboardResult<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts.date());
        }
    }
    let period: Period = raw.parse()?;
    NaiveDate::from_ymd_opt(period.year(), period.month(), 1)
        .ok_or_else(|| LeadboardError::InvalidInput(format!("malformed period '{raw}'")))
}

/// Column accessor over one decoded row.
struct Row<'a> {
    table: &'static str,
    index: usize,
    fields: &'a Map<String, Value>,
}

impl<'a> Row<'a> {
    fn new(table: &'static str, index: usize, fields: &'a Map<String, Value>) -> Self {
        Self {
            table,
            index,
            fields,
        }
    }

    fn context(&self, err: LeadboardError) -> LeadboardError {
        match err {
            LeadboardError::InvalidInput(msg) => LeadboardError::InvalidInput(format!(
                "{} row {}: {msg}",
                self.table, self.index
            )),
            other => other,
        }
    }

    fn invalid(&self, msg: String) -> LeadboardError {
        self.context(LeadboardError::InvalidInput(msg))
    }

    fn column(&self, column: &str) -> LeadboardResult<&'a Value> {
        self.fields
            .get(column)
            .ok_or_else(|| LeadboardError::MissingColumn {
                table: self.table,
                column: column.to_string(),
            })
    }

    /// Optional text cell. Absent, null and blank cells are all `None`.
    fn text(&self, column: &str) -> Option<String> {
        self.fields.get(column).and_then(cell_text)
    }

    fn required_text(&self, column: &str) -> LeadboardResult<String> {
        cell_text(self.column(column)?)
            .ok_or_else(|| self.invalid(format!("empty value in required column '{column}'")))
    }

    fn date(&self, column: &str) -> LeadboardResult<NaiveDate> {
        let raw = self.required_text(column)?;
        parse_period_date(&raw).map_err(|e| self.context(e))
    }

    /// Amount in a column that must exist; null counts as zero.
    fn amount(&self, column: &str) -> LeadboardResult<f64> {
        self.parse_amount(column, self.column(column)?)
    }

    /// Amount in a column that may be missing entirely.
    fn optional_amount(&self, column: &str) -> LeadboardResult<f64> {
        match self.fields.get(column) {
            Some(value) => self.parse_amount(column, value),
            None => Ok(0.0),
        }
    }

    fn parse_amount(&self, column: &str, value: &Value) -> LeadboardResult<f64> {
        let amount = match value {
            Value::Null => Some(0.0),
            Value::Number(n) => n.as_f64(),
            Value::String(s) if s.trim().is_empty() => Some(0.0),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match amount {
            Some(a) if a.is_finite() => Ok(a),
            _ => Err(self.invalid(format!("non-numeric amount {value} in column '{column}'"))),
        }
    }
}

fn cell_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadboard_core::types::LeadStatus;

    fn loader() -> TableLoader {
        TableLoader::default()
    }

    #[test]
    fn test_parse_leads_full_row() {
        let json = br#"[{
            "ID": 1001,
            "PERIODO": "2024-01-15T00:00:00",
            "Centro origen": "Madrid",
            "Situacion actual": "CLIENTE CAPTADO",
            "Prueba": "SI",
            "Causa perdido": null,
            "Forma de contacto": "Formulario",
            "Como nos conocio": "Google",
            "URL": "https://example.com/?gclid=abc",
            "Registro de contacto": "",
            "GCLID": "abc",
            "SEM / SEO": "SEM",
            "Valor total": 500
        }]"#;
        let leads = loader().parse_leads(json).unwrap();
        assert_eq!(leads.len(), 1);
        let lead = &leads[0];
        assert_eq!(lead.id, "1001");
        assert_eq!(lead.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(lead.status, LeadStatus::Won);
        assert!(lead.trial);
        assert_eq!(lead.lost_reason, None);
        assert_eq!(lead.contact_log, None);
        assert_eq!(lead.click_id.as_deref(), Some("abc"));
        assert!((lead.value - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let json = br#"[{
            "ID": "L-1",
            "PERIODO": "2024-02",
            "Centro origen": "Sevilla",
            "Situacion actual": "LEAD NO VALIDO",
            "Valor total": null
        }]"#;
        let leads = loader().parse_leads(json).unwrap();
        let lead = &leads[0];
        assert!(!lead.trial);
        assert_eq!(lead.click_id, None);
        assert_eq!(lead.marketing_tag, None);
        assert_eq!(lead.value, 0.0);
        assert_eq!(lead.period().to_string(), "2024-02");
    }

    #[test]
    fn test_trial_requires_exact_affirmative() {
        let json = br#"[
            {"ID": 1, "PERIODO": "2024-01-01", "Centro origen": "A", "Situacion actual": "NUEVO", "Prueba": "si", "Valor total": 0},
            {"ID": 2, "PERIODO": "2024-01-01", "Centro origen": "A", "Situacion actual": "NUEVO", "Prueba": "NO", "Valor total": 0},
            {"ID": 3, "PERIODO": "2024-01-01", "Centro origen": "A", "Situacion actual": "NUEVO", "Prueba": " SI ", "Valor total": 0}
        ]"#;
        let leads = loader().parse_leads(json).unwrap();
        let trials: Vec<bool> = leads.iter().map(|l| l.trial).collect();
        assert_eq!(trials, vec![false, false, true]);
    }

    #[test]
    fn test_missing_value_column_is_reported() {
        let json = br#"[{"ID": 1, "PERIODO": "2024-01-01", "Centro origen": "A", "Situacion actual": "NUEVO"}]"#;
        let err = loader().parse_leads(json).unwrap_err();
        assert!(matches!(
            err,
            LeadboardError::MissingColumn { table: "leads", ref column } if column == "Valor total"
        ));
    }

    #[test]
    fn test_malformed_period_is_invalid_input() {
        let json = br#"[{"ID": 1, "PERIODO": "enero 2024", "Centro origen": "A", "Situacion actual": "NUEVO", "Valor total": 0}]"#;
        let err = loader().parse_leads(json).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("leads row 0"));
    }

    #[test]
    fn test_unknown_status_is_invalid_input() {
        let json = br#"[{"ID": 1, "PERIODO": "2024-01-01", "Centro origen": "A", "Situacion actual": "GANADO", "Valor total": 0}]"#;
        let err = loader().parse_leads(json).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("GANADO"));
    }

    #[test]
    fn test_duplicate_lead_id_rejected() {
        let json = br#"[
            {"ID": 1, "PERIODO": "2024-01-01", "Centro origen": "A", "Situacion actual": "CLIENTE CAPTADO", "Valor total": 500},
            {"ID": 2, "PERIODO": "2024-01-01", "Centro origen": "A", "Situacion actual": "NUEVO", "Valor total": 0},
            {"ID": 1, "PERIODO": "2024-01-01", "Centro origen": "A", "Situacion actual": "CLIENTE CAPTADO", "Valor total": 500}
        ]"#;
        let err = loader().parse_leads(json).unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(err.to_string(), "Invalid input: leads row 2: duplicate ID '1'");
    }

    #[test]
    fn test_configured_trial_literal_is_trimmed() {
        let statuses = StatusConfig {
            trial_affirmative: " SI ".into(),
            ..StatusConfig::default()
        };
        let json = br#"[{"ID": 1, "PERIODO": "2024-01-01", "Centro origen": "A", "Situacion actual": "NUEVO", "Prueba": "SI", "Valor total": 0}]"#;
        let leads = TableLoader::new(statuses).parse_leads(json).unwrap();
        assert!(leads[0].trial);
    }

    #[test]
    fn test_non_array_table_rejected() {
        let err = loader().parse_leads(br#"{"ID": 1}"#).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_parse_investment() {
        let json = r#"[
            {"PERIODO": "2024-01-01", "INVERSIÓN TOTAL": 100, "INVERSIÓN EN G ADS": 80, "INVERSIÓN EN META": "15.5"},
            {"PERIODO": "2024-02-01 00:00:00", "INVERSIÓN TOTAL": 40}
        ]"#;
        let rows = loader().parse_investment(json.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!((rows[0].meta_ads_spend - 15.5).abs() < f64::EPSILON);
        assert_eq!(rows[1].google_ads_spend, 0.0);
        assert_eq!(rows[1].period().to_string(), "2024-02");
    }

    #[test]
    fn test_investment_total_below_channels_rejected() {
        let json = r#"[{"PERIODO": "2024-01-01", "INVERSIÓN TOTAL": 50, "INVERSIÓN EN G ADS": 80}]"#;
        let err = loader().parse_investment(json.as_bytes()).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("investment row 0"));
    }

    #[test]
    fn test_non_numeric_amount_rejected() {
        let json = r#"[{"PERIODO": "2024-01-01", "INVERSIÓN TOTAL": "mucho"}]"#;
        let err = loader().parse_investment(json.as_bytes()).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_parse_period_date_formats() {
        let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(parse_period_date("2024-01-01").unwrap(), jan);
        assert_eq!(parse_period_date("2024-01-01T00:00:00.000").unwrap(), jan);
        assert_eq!(parse_period_date("2024-01-01 00:00:00").unwrap(), jan);
        assert_eq!(parse_period_date("2024-01").unwrap(), jan);
        assert!(parse_period_date("01/01/2024").is_err());
    }
}
