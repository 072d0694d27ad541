use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `LEADBOARD__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub attribution: AttributionConfig,
    #[serde(default)]
    pub statuses: StatusConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_leads_path")]
    pub leads_path: String,
    #[serde(default = "default_investment_path")]
    pub investment_path: String,
}

/// Markers driving the channel rule chain. Text matches are case-insensitive.
#[derive(Debug, Clone, Deserialize)]
pub struct AttributionConfig {
    #[serde(default = "default_paid_search_marker")]
    pub paid_search_marker: String,
    #[serde(default = "default_organic_marker")]
    pub organic_marker: String,
    #[serde(default = "default_meta_url_markers")]
    pub meta_url_markers: Vec<String>,
    #[serde(default = "default_meta_log_markers")]
    pub meta_log_markers: Vec<String>,
    #[serde(default = "default_paid_platform_markers")]
    pub paid_platform_markers: Vec<String>,
}

/// Status literals recognised in the leads sheet. Matching is exact after
/// trimming surrounding whitespace.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusConfig {
    #[serde(default = "default_won")]
    pub won: String,
    #[serde(default = "default_lost")]
    pub lost: String,
    #[serde(default = "default_invalid")]
    pub invalid: String,
    #[serde(default = "default_in_progress")]
    pub in_progress: Vec<String>,
    #[serde(default = "default_trial_affirmative")]
    pub trial_affirmative: String,
}

// Default functions
fn default_leads_path() -> String {
    "data/leads.json".to_string()
}
fn default_investment_path() -> String {
    "data/investment.json".to_string()
}
fn default_paid_search_marker() -> String {
    "SEM".to_string()
}
fn default_organic_marker() -> String {
    "SEO".to_string()
}
fn default_meta_url_markers() -> Vec<String> {
    vec!["meta".into(), "facebook".into(), "instagram".into()]
}
fn default_meta_log_markers() -> Vec<String> {
    vec!["facebook".into()]
}
fn default_paid_platform_markers() -> Vec<String> {
    vec![
        "meta".into(),
        "tiktok".into(),
        "gads".into(),
        "gad_".into(),
        "gbraid".into(),
        "wbraid".into(),
    ]
}
fn default_won() -> String {
    "CLIENTE CAPTADO".to_string()
}
fn default_lost() -> String {
    "CLIENTE PERDIDO".to_string()
}
fn default_invalid() -> String {
    "LEAD NO VALIDO".to_string()
}
fn default_in_progress() -> Vec<String> {
    vec![
        "NUEVO".into(),
        "EN SEGUIMIENTO".into(),
        "PRUEBA PROGRAMADA".into(),
        "PENDIENTE DECISION".into(),
    ]
}
fn default_trial_affirmative() -> String {
    "SI".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            leads_path: default_leads_path(),
            investment_path: default_investment_path(),
        }
    }
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            paid_search_marker: default_paid_search_marker(),
            organic_marker: default_organic_marker(),
            meta_url_markers: default_meta_url_markers(),
            meta_log_markers: default_meta_log_markers(),
            paid_platform_markers: default_paid_platform_markers(),
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            won: default_won(),
            lost: default_lost(),
            invalid: default_invalid(),
            in_progress: default_in_progress(),
            trial_affirmative: default_trial_affirmative(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `leadboard.toml` (if present) and environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, reading `path` instead of the default file name.
    /// An explicit path must exist; the default file is optional.
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        debug!(
            file = %path.map_or_else(|| "leadboard.toml".into(), |p| p.display().to_string()),
            required = path.is_some(),
            "Loading configuration"
        );
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name("leadboard").required(false),
        };

        let builder = config::Config::builder().add_source(file).add_source(
            config::Environment::with_prefix("LEADBOARD")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("attribution.meta_url_markers")
                .with_list_parse_key("attribution.meta_log_markers")
                .with_list_parse_key("attribution.paid_platform_markers")
                .with_list_parse_key("statuses.in_progress"),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.attribution.paid_search_marker, "SEM");
        assert_eq!(config.attribution.organic_marker, "SEO");
        assert!(config
            .attribution
            .paid_platform_markers
            .iter()
            .any(|m| m == "gbraid"));
        assert_eq!(config.statuses.won, "CLIENTE CAPTADO");
        assert_eq!(config.statuses.trial_affirmative, "SI");
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let json = r#"{ "attribution": { "organic_marker": "ORGANICO" } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.attribution.organic_marker, "ORGANICO");
        assert_eq!(config.attribution.paid_search_marker, "SEM");
        assert_eq!(config.data.leads_path, "data/leads.json");
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let missing = std::env::temp_dir().join("leadboard-does-not-exist.toml");
        assert!(AppConfig::load_from(Some(&missing)).is_err());
    }
}
