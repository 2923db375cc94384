use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("retries exhausted after {attempts} attempts: {url}")]
    RetryExhausted { url: String, attempts: u32 },

    #[error("renderer session could not be started: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    #[error("page render failed: {0}")]
    Render(#[from] fantoccini::error::CmdError),

    #[error("page render timed out after {seconds}s: {url}")]
    RenderTimeout { url: String, seconds: u64 },

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("missing required configuration field: {field}")]
    MissingConfig { field: String },

    #[error("data processing error: {message}")]
    Processing { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Render,
    Storage,
    Configuration,
    Processing,
}

impl ScrapeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http(_) | Self::HttpStatus { .. } | Self::RetryExhausted { .. } => {
                ErrorCategory::Network
            }
            Self::Session(_) | Self::Render(_) | Self::RenderTimeout { .. } => {
                ErrorCategory::Render
            }
            Self::Csv(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Config { .. }
            | Self::InvalidConfigValue { .. }
            | Self::MissingConfig { .. }
            | Self::Url(_) => ErrorCategory::Configuration,
            Self::Serialization(_) | Self::Processing { .. } => ErrorCategory::Processing,
        }
    }

    /// Severity as seen from main: per-listing failures never reach here,
    /// so anything that does took a whole phase down with it.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Http(_) | Self::HttpStatus { .. } | Self::RetryExhausted { .. } => {
                ErrorSeverity::Medium
            }
            Self::Render(_) | Self::RenderTimeout { .. } => ErrorSeverity::Medium,
            Self::Session(_) => ErrorSeverity::Critical,
            Self::Csv(_) | Self::Io(_) | Self::Serialization(_) | Self::Processing { .. } => {
                ErrorSeverity::High
            }
            Self::Config { .. }
            | Self::InvalidConfigValue { .. }
            | Self::MissingConfig { .. }
            | Self::Url(_) => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Network problem while crawling: {}", self),
            ErrorCategory::Render => format!("Search page rendering failed: {}", self),
            ErrorCategory::Storage => format!("Could not read or write run artifacts: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Processing => format!("Data processing failed: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check connectivity and rate limits; transient failures are retried automatically"
            }
            ErrorCategory::Render => {
                "Make sure a WebDriver (chromedriver) is running at the configured --webdriver-url"
            }
            ErrorCategory::Storage => "Check that the output directory exists and is writable",
            ErrorCategory::Configuration => "Review the CLI flags and the --config TOML file",
            ErrorCategory::Processing => "Inspect the logs for the offending record",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
