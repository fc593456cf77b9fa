use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub subgraph: SubgraphConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

// ============================================================
// Subgraph Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct SubgraphConfig {
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    pub subgraph_id: Option<String>,
    /// Full endpoint URL, used as-is instead of the gateway URL. No API key is
    /// spliced into it.
    pub endpoint: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    #[serde(default = "default_max_records")]
    pub max_records: usize,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    pub request_timeout_secs: Option<u64>,
}

fn default_gateway_url() -> String {
    "https://gateway.thegraph.com/api".to_string()
}

fn default_api_key_env() -> String {
    "GRAPH_API_KEY".to_string()
}

fn default_batch_size() -> u32 {
    100
}

fn default_max_records() -> usize {
    1000
}

fn default_request_delay_ms() -> u64 {
    1000
}

impl SubgraphConfig {
    /// Resolve the GraphQL endpoint. The gateway form needs the API key from the
    /// environment variable named by `api_key_env`.
    pub fn resolve_endpoint(&self) -> eyre::Result<String> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.clone());
        }

        let subgraph_id = self
            .subgraph_id
            .as_deref()
            .ok_or_else(|| eyre::eyre!("subgraph.subgraph_id or subgraph.endpoint must be set"))?;

        let api_key = std::env::var(&self.api_key_env).map_err(|_| {
            eyre::eyre!(
                "API key not found: set the {} environment variable",
                self.api_key_env
            )
        })?;

        Ok(gateway_endpoint(&self.gateway_url, &api_key, subgraph_id))
    }

    /// Endpoint description safe to log (never contains the key).
    pub fn display_target(&self) -> String {
        match (&self.endpoint, &self.subgraph_id) {
            (Some(endpoint), _) => endpoint.clone(),
            (None, Some(id)) => format!("{}/<key>/subgraphs/id/{}", self.gateway_url, id),
            (None, None) => "<unconfigured>".to_string(),
        }
    }
}

fn gateway_endpoint(gateway_url: &str, api_key: &str, subgraph_id: &str) -> String {
    format!(
        "{}/{}/subgraphs/id/{}",
        gateway_url.trim_end_matches('/'),
        api_key,
        subgraph_id
    )
}

// ============================================================
// Storage Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            table: default_table(),
            csv_path: default_csv_path(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://uniswap.db".to_string()
}

fn default_table() -> String {
    "swaps".to_string()
}

fn default_csv_path() -> String {
    "uniswap_data.csv".to_string()
}

// ============================================================
// Report Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_pdf_path")]
    pub pdf_path: String,
    #[serde(default = "default_correlation_chart_path")]
    pub correlation_chart_path: String,
    #[serde(default = "default_distribution_chart_path")]
    pub distribution_chart_path: String,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            pdf_path: default_pdf_path(),
            correlation_chart_path: default_correlation_chart_path(),
            distribution_chart_path: default_distribution_chart_path(),
            preview_rows: default_preview_rows(),
            histogram_bins: default_histogram_bins(),
        }
    }
}

fn default_pdf_path() -> String {
    "Uniswap_Report_Landscape.pdf".to_string()
}

fn default_correlation_chart_path() -> String {
    "correlation_plot.png".to_string()
}

fn default_distribution_chart_path() -> String {
    "price_distribution.png".to_string()
}

fn default_preview_rows() -> usize {
    10
}

fn default_histogram_bins() -> usize {
    50
}

// ============================================================
// Dashboard Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_dashboard_host")]
    pub host: String,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: default_dashboard_host(),
            port: default_dashboard_port(),
        }
    }
}

fn default_dashboard_host() -> String {
    "127.0.0.1".to_string()
}

fn default_dashboard_port() -> u16 {
    8501
}

impl Config {
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read config file '{}': {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("Failed to parse config file '{}': {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        let subgraph = &self.subgraph;
        if subgraph.endpoint.is_none() && subgraph.subgraph_id.is_none() {
            return Err(eyre::eyre!(
                "Either subgraph.subgraph_id or subgraph.endpoint must be configured"
            ));
        }
        if subgraph.batch_size == 0 || subgraph.batch_size > 1000 {
            return Err(eyre::eyre!(
                "subgraph.batch_size must be between 1 and 1000, got {}",
                subgraph.batch_size
            ));
        }
        if subgraph.max_records == 0 {
            return Err(eyre::eyre!("subgraph.max_records must be at least 1"));
        }
        if !is_sql_identifier(&self.storage.table) {
            return Err(eyre::eyre!(
                "Invalid table name '{}': use letters, digits and underscores only",
                self.storage.table
            ));
        }
        if self.report.histogram_bins == 0 {
            return Err(eyre::eyre!("report.histogram_bins must be at least 1"));
        }
        Ok(())
    }
}

/// The table name is spliced into DDL, so only plain identifiers are allowed.
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> Config {
        toml::from_str(
            r#"
[subgraph]
subgraph_id = "5zvR82QoaXYFyDEKLZ9t6v9adgnptxYpKpSbxtgVENFV"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
[subgraph]
subgraph_id = "5zvR82QoaXYFyDEKLZ9t6v9adgnptxYpKpSbxtgVENFV"
batch_size = 50
max_records = 200

[storage]
database_url = "sqlite://test.db"
table = "uniswap_swaps"

[dashboard]
port = 9000
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.subgraph.batch_size, 50);
        assert_eq!(config.subgraph.max_records, 200);
        assert_eq!(config.subgraph.request_delay_ms, 1000); // default
        assert_eq!(config.subgraph.api_key_env, "GRAPH_API_KEY"); // default
        assert_eq!(config.storage.table, "uniswap_swaps");
        assert_eq!(config.storage.csv_path, "uniswap_data.csv"); // default
        assert_eq!(config.report.histogram_bins, 50); // default
        assert_eq!(config.dashboard.port, 9000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = minimal_config();
        assert_eq!(config.subgraph.batch_size, 100);
        assert_eq!(config.subgraph.max_records, 1000);
        assert_eq!(config.storage.database_url, "sqlite://uniswap.db");
        assert_eq!(config.storage.table, "swaps");
        assert_eq!(config.report.pdf_path, "Uniswap_Report_Landscape.pdf");
        assert_eq!(config.report.preview_rows, 10);
    }

    #[test]
    fn test_validate_missing_target() {
        let mut config = minimal_config();
        config.subgraph.subgraph_id = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_batch_size_bounds() {
        let mut config = minimal_config();
        config.subgraph.batch_size = 0;
        assert!(config.validate().is_err());
        config.subgraph.batch_size = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_table_name() {
        let mut config = minimal_config();
        config.storage.table = "swaps; DROP TABLE x".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sql_identifier() {
        assert!(is_sql_identifier("swaps"));
        assert!(is_sql_identifier("_swaps_2024"));
        assert!(!is_sql_identifier("2024_swaps"));
        assert!(!is_sql_identifier(""));
        assert!(!is_sql_identifier("swap-data"));
    }

    #[test]
    fn test_endpoint_override_skips_api_key() {
        let mut config = minimal_config();
        config.subgraph.endpoint = Some("http://localhost:8000/subgraphs/name/uniswap".to_string());
        config.subgraph.api_key_env = "SWAPWATCH_TEST_UNSET_KEY".to_string();
        assert_eq!(
            config.subgraph.resolve_endpoint().unwrap(),
            "http://localhost:8000/subgraphs/name/uniswap"
        );
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let mut config = minimal_config();
        config.subgraph.api_key_env = "SWAPWATCH_TEST_DEFINITELY_UNSET".to_string();
        let err = config.subgraph.resolve_endpoint().unwrap_err();
        assert!(err.to_string().contains("SWAPWATCH_TEST_DEFINITELY_UNSET"));
    }

    #[test]
    fn test_gateway_endpoint_format() {
        assert_eq!(
            gateway_endpoint("https://gateway.thegraph.com/api/", "k3y", "abc"),
            "https://gateway.thegraph.com/api/k3y/subgraphs/id/abc"
        );
    }

    #[test]
    fn test_display_target_hides_key() {
        let config = minimal_config();
        let target = config.subgraph.display_target();
        assert!(target.contains("<key>"));
        assert!(target.ends_with("5zvR82QoaXYFyDEKLZ9t6v9adgnptxYpKpSbxtgVENFV"));
    }
}
