use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Queue payload failed to deserialize: {source} (payload: {payload})")]
    QueueDeserialize {
        payload: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing required configuration: {name}")]
    MissingConfig { name: &'static str },

    #[error("Secondary source '{path}' is missing required column '{column}'")]
    MissingColumn { path: String, column: &'static str },

    #[error("Secondary source '{path}': {detail}")]
    BadSource { path: String, detail: String },

    #[error("Non-finite amount on transaction '{transaction_id}'")]
    NonFiniteAmount { transaction_id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
