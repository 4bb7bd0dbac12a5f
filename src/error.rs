use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Shown for both transport/payload failures and too-short price series.
pub const FETCH_FAILED_MESSAGE: &str =
    "Failed to fetch data from CoinGecko or too little data was returned.";
pub const TOO_LITTLE_TRAINING_DATA_MESSAGE: &str = "Too little data to train the model.";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("CoinGecko returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed market chart payload: {0}")]
    Payload(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Payload(e.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("cannot fit a regression on an empty sample")]
    Empty,

    #[error("feature rows ({rows}) and targets ({targets}) differ in length")]
    LengthMismatch { rows: usize, targets: usize },

    #[error("sample contains non-finite values")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("insufficient raw data: got {got} price points, need at least {required}")]
    InsufficientRawData { got: usize, required: usize },

    #[error("insufficient training data: {usable} usable rows, need more than {required}")]
    InsufficientTrainingData { usable: usize, required: usize },

    #[error("model fit failed: {0}")]
    Model(#[from] FitError),
}

impl ForecastError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::InsufficientTrainingData { .. } => Severity::Warning,
            Self::Fetch(_) | Self::InsufficientRawData { .. } | Self::Model(_) => Severity::Error,
        }
    }

    /// Text for the page banner. Fetch failures and short series are
    /// deliberately indistinguishable here; the log carries the detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Fetch(_) | Self::InsufficientRawData { .. } => FETCH_FAILED_MESSAGE,
            Self::InsufficientTrainingData { .. } => TOO_LITTLE_TRAINING_DATA_MESSAGE,
            Self::Model(_) => "The model could not be fitted to the fetched data.",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch_failed",
            Self::InsufficientRawData { .. } => "insufficient_raw_data",
            Self::InsufficientTrainingData { .. } => "insufficient_training_data",
            Self::Model(_) => "model_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Fetch(_) => StatusCode::BAD_GATEWAY,
            Self::InsufficientRawData { .. } | Self::InsufficientTrainingData { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ForecastError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.code(),
            "severity": self.severity(),
            "message": self.user_message(),
        });
        (self.status(), axum::Json(body)).into_response()
    }
}
