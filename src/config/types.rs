use serde::Deserialize;

/// Desktop Chrome user agent presented to search backends and target pages
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Main configuration structure for Lead Harvester
///
/// Every section is optional in the TOML file; missing sections fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub search: SearchConfig,
    pub browser: BrowserConfig,
    pub extractor: ExtractorConfig,
    pub capture: CaptureConfig,
    pub output: OutputConfig,
}

/// Crawl loop behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of leads collected before the run stops early
    #[serde(rename = "max-leads")]
    pub max_leads: u32,

    /// Number of concurrent browser sessions
    pub workers: u32,

    /// Hard cap on the time spent per URL (seconds)
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,

    /// Pause after navigation before reading rendered content (milliseconds)
    #[serde(rename = "settle-delay-ms")]
    pub settle_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_leads: 50,
            workers: 1,
            fetch_timeout_secs: 10,
            settle_delay_ms: 1000,
        }
    }
}

/// Search backend used for seed discovery
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search endpoint; the keyword is appended as the `q` query parameter
    pub endpoint: String,

    /// CSS selector matching result anchors
    #[serde(rename = "result-selector")]
    pub result_selector: String,

    /// Query parameter carrying the destination of redirect-wrapped links
    #[serde(rename = "redirect-param")]
    pub redirect_param: String,

    /// Request timeout for the search query (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://html.duckduckgo.com/html/".to_string(),
            result_selector: "a.result__a".to_string(),
            redirect_param: "uddg".to_string(),
            timeout_secs: 20,
        }
    }
}

/// Headless browser launch options
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "window-width")]
    pub window_width: u32,

    #[serde(rename = "window-height")]
    pub window_height: u32,

    pub headless: bool,

    /// Explicit Chrome/Chromium executable; searched for when absent
    pub executable: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            window_width: 1280,
            window_height: 720,
            headless: true,
            executable: None,
        }
    }
}

/// Entity extraction patterns and filters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Substrings that disqualify an email match (asset names, placeholders)
    #[serde(rename = "email-blacklist")]
    pub email_blacklist: Vec<String>,

    /// Mobile number pattern; capture group 1 is the normalized number
    #[serde(rename = "phone-pattern")]
    pub phone_pattern: String,

    /// Messaging link pattern over raw markup; capture group 1 is the handle
    #[serde(rename = "handle-pattern")]
    pub handle_pattern: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            email_blacklist: vec![
                ".png".to_string(),
                ".jpg".to_string(),
                "wix".to_string(),
                "example".to_string(),
            ],
            phone_pattern: r"(?:\+88|88)?(01[3-9]\d{8})".to_string(),
            handle_pattern: r"wa\.me/(\d+)".to_string(),
        }
    }
}

/// Frame capture and replay video
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub enabled: bool,

    /// Directory holding `frame_<n>.png` files; cleared at the start of a run
    #[serde(rename = "frames-dir")]
    pub frames_dir: String,

    #[serde(rename = "video-path")]
    pub video_path: String,

    #[serde(rename = "frame-rate")]
    pub frame_rate: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            frames_dir: "temp_frames".to_string(),
            video_path: "mission_recording.mp4".to_string(),
            frame_rate: 2,
        }
    }
}

/// Output artifacts
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the CSV lead table
    #[serde(rename = "leads-path")]
    pub leads_path: String,

    /// Path to the markdown run summary
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            leads_path: "leads_database.csv".to_string(),
            summary_path: "leads_summary.md".to_string(),
        }
    }
}
