/// An error looking up or reading a model introspection document
#[derive(Debug, thiserror::Error)]
pub enum IntrospectionError {
    #[error("Model '{0}' not found")]
    ModelNotFound(String),

    #[error("Invalid model introspection document: {0}")]
    Json(#[from] serde_json::Error),
}
