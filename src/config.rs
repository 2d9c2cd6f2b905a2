use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Generative AI service credential
    #[serde(default)]
    pub api_key: Option<String>,

    /// Generative AI service base URL
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// Model used for recommendations and post enhancement
    #[serde(default = "default_text_model")]
    pub text_model: String,

    /// Model used for bottle artwork generation
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// SQLite URL of the on-device durable store
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Optional Redis URL; the response cache stays in-process when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Fill AI-sourced likes/dislikes with demo numbers instead of zero
    #[serde(default = "default_synthesize_social_counters")]
    pub synthesize_social_counters: bool,

    #[serde(default = "default_image_probe_timeout_secs")]
    pub image_probe_timeout_secs: u64,

    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// Affiliate tag used for purchase links when an item carries none
    #[serde(default = "default_affiliate_tag")]
    pub default_affiliate_tag: String,
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_text_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_database_url() -> String {
    "sqlite://fragranceverse.db?mode=rwc".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_synthesize_social_counters() -> bool {
    true
}

fn default_image_probe_timeout_secs() -> u64 {
    10
}

fn default_provider_timeout_secs() -> u64 {
    60
}

fn default_affiliate_tag() -> String {
    "coxabling0e-21".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            gemini_api_url: default_gemini_api_url(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            database_url: default_database_url(),
            redis_url: None,
            host: default_host(),
            port: default_port(),
            synthesize_social_counters: default_synthesize_social_counters(),
            image_probe_timeout_secs: default_image_probe_timeout_secs(),
            provider_timeout_secs: default_provider_timeout_secs(),
            default_affiliate_tag: default_affiliate_tag(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_iter(std::env::vars())
    }

    fn from_iter<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        // An empty API_KEY is the same as none at all
        config.api_key = config.api_key.filter(|key| !key.trim().is_empty());
        Ok(config)
    }
}
