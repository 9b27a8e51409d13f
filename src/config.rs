/// OpenAQ country id for the United Kingdom.
const DEFAULT_COUNTRY_ID: u32 = 79;
/// Page size for both upstream queries; one page covers every UK location.
const DEFAULT_PAGE_LIMIT: u32 = 1000;

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openaq_api_key: String,
    pub openaq_base_url: String,
    pub country_id: u32,
    pub page_limit: u32,
    pub port: u16,
    /// JSON file holding the user's selected cities; empty keeps them in memory.
    pub selections_path: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            openaq_api_key: std::env::var("OPENAQ_API_KEY").expect("OPENAQ_API_KEY must be set"),
            openaq_base_url: std::env::var("OPENAQ_BASE_URL")
                .unwrap_or_else(|_| "https://api.openaq.org/v3".to_string()),
            country_id: std::env::var("OPENAQ_COUNTRY_ID")
                .map(|v| v.parse().expect("OPENAQ_COUNTRY_ID must be a valid u32"))
                .unwrap_or(DEFAULT_COUNTRY_ID),
            page_limit: std::env::var("OPENAQ_PAGE_LIMIT")
                .map(|v| v.parse().expect("OPENAQ_PAGE_LIMIT must be a valid u32"))
                .unwrap_or(DEFAULT_PAGE_LIMIT),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid u16"),
            selections_path: std::env::var("SELECTIONS_PATH")
                .unwrap_or_else(|_| "./data/selections.json".to_string()),
        }
    }
}
