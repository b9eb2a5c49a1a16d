use std::fmt::{Display, Formatter, Result as FmtResult};

/// Root error type for the chart panel
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    Feed(FeedError),
    EngineState(EngineStateError),
    Config(ConfigError),
    Browser(String),
}

/// Failures while talking to the bar feed.
///
/// None of these ever escape `BarFeed::fetch_bars`: they are reported and the
/// caller receives an empty batch instead.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedError {
    /// Network or HTTP status failure
    Transport(String),
    /// Parallel arrays disagree in length, the body is not the expected JSON,
    /// or not a single bar in the batch survived parsing
    MalformedPayload(String),
    /// Some bars were dropped; the rest of the batch was kept
    PartialParse { dropped: usize, kept: usize },
    /// The feed answered with `s: "error"`
    FeedStatus(String),
}

/// Lifecycle contract violations against the chart engine.
///
/// These indicate a bug in the caller, so the adapter panics with them
/// instead of returning them.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineStateError {
    Disposed { session: u64 },
    ForeignSession { expected: Option<u64>, actual: u64 },
    NotMounted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Parse(String),
    InvalidParameter(String),
    MissingElement(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AppError::Feed(e) => write!(f, "Feed Error: {}", e),
            AppError::EngineState(e) => write!(f, "Engine State Error: {}", e),
            AppError::Config(e) => write!(f, "Config Error: {}", e),
            AppError::Browser(msg) => write!(f, "Browser Error: {}", msg),
        }
    }
}

impl Display for FeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FeedError::Transport(msg) => write!(f, "transport failure: {}", msg),
            FeedError::MalformedPayload(msg) => write!(f, "malformed payload: {}", msg),
            FeedError::PartialParse { dropped, kept } => {
                write!(f, "dropped {} unparseable bars, kept {}", dropped, kept)
            }
            FeedError::FeedStatus(msg) => write!(f, "feed reported error: {}", msg),
        }
    }
}

impl Display for EngineStateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            EngineStateError::Disposed { session } => {
                write!(f, "operation issued against disposed session #{}", session)
            }
            EngineStateError::ForeignSession { expected: Some(expected), actual } => {
                write!(f, "session #{} is not the live session #{}", actual, expected)
            }
            EngineStateError::ForeignSession { expected: None, actual } => {
                write!(f, "session #{} issued while no session is live", actual)
            }
            EngineStateError::NotMounted => write!(f, "chart engine is not mounted"),
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ConfigError::Parse(msg) => write!(f, "cannot parse config: {}", msg),
            ConfigError::InvalidParameter(msg) => write!(f, "invalid parameter: {}", msg),
            ConfigError::MissingElement(id) => write!(f, "config element '{}' not found", id),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for FeedError {}
impl std::error::Error for EngineStateError {}
impl std::error::Error for ConfigError {}

impl From<FeedError> for AppError {
    fn from(error: FeedError) -> Self {
        AppError::Feed(error)
    }
}

impl From<EngineStateError> for AppError {
    fn from(error: EngineStateError) -> Self {
        AppError::EngineState(error)
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        AppError::Config(error)
    }
}

impl From<AppError> for wasm_bindgen::JsValue {
    fn from(error: AppError) -> Self {
        wasm_bindgen::JsValue::from_str(&error.to_string())
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
pub type AppResult<T> = Result<T, AppError>;
