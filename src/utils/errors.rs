use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("Chunking produced no translatable text")]
    EmptyInputError,

    #[error("Document has {words} words; the maximum is {max}")]
    InputTooLarge { words: usize, max: usize },

    #[error("Network error while contacting the translation service: {0}")]
    TransportError(String),

    #[error("Translation service returned {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("Malformed response from translation service: {0}")]
    MalformedResponseError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Translation cancelled")]
    Cancelled,

    #[error("Chunk {chunk_index} failed after {attempts} attempts: {last_error}")]
    RetriesExhaustedError {
        chunk_index: usize,
        attempts: usize,
        last_error: String,
    },

    #[error("Translation incomplete: missing chunks {missing:?}")]
    IncompleteTranslationError { missing: Vec<usize> },

    #[error(
        "Translation results inconsistent: duplicate chunks {duplicates:?}, unknown chunks {out_of_range:?}"
    )]
    InconsistentResultsError {
        duplicates: Vec<usize>,
        out_of_range: Vec<usize>,
    },

    #[error("Chunk task failed internally: {0}")]
    InternalError(String),

    #[error("Unsupported target language: {0}")]
    UnsupportedLanguage(String),

    #[error("A translation is already in progress (job {0})")]
    JobAlreadyRunning(String),

    #[error("No translation job found")]
    JobNotFound,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl TranslatorError {
    /// Failures the retry policy may attempt again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TranslatorError::TransportError(_)
                | TranslatorError::HttpError { .. }
                | TranslatorError::MalformedResponseError(_)
        )
    }

    /// Failures that make the endpoint unusable for every remaining chunk.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TranslatorError::AuthenticationError(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TranslatorError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, TranslatorError>;
