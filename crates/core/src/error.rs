#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("invalid extraction pattern for {field}: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("text generation request failed: {0}")]
    GenerationRequest(reqwest::Error),
    #[error("text generation service returned {status}: {body}")]
    GenerationStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("text generation response had no text")]
    GenerationEmpty,
    #[error("text generation timed out after {0:?}")]
    GenerationTimeout(std::time::Duration),
    #[error("text generation is not configured")]
    GenerationUnconfigured,

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("backend append timed out after {0:?}")]
    BackendTimeout(std::time::Duration),
    #[error("failed to write backend file: {0}")]
    BackendWrite(std::io::Error),
    #[error("backend request failed: {0}")]
    BackendRequest(reqwest::Error),

    #[error("failed to serialize CSV: {0}")]
    CsvSerialization(csv::Error),
    #[error("CSV output was not UTF-8: {0}")]
    CsvEncoding(std::string::FromUtf8Error),

    #[error("record {0} is already pending review")]
    AlreadyPending(uuid::Uuid),
    #[error("no pending record with id {0}")]
    PendingRecordNotFound(uuid::Uuid),
    #[error("no session record named {0:?}")]
    SessionRecordNotFound(String),

    #[error("invalid text: {0}")]
    Text(#[from] scout_types::TextError),
}

impl ScoutError {
    /// Whether this error came from the durable backend rather than the caller's input.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            ScoutError::BackendUnavailable(_)
                | ScoutError::BackendTimeout(_)
                | ScoutError::BackendWrite(_)
                | ScoutError::BackendRequest(_)
        )
    }
}

pub type ScoutResult<T> = std::result::Result<T, ScoutError>;
