pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid analysis JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("analysis contains duplicate node id: {id}")]
    DuplicateNode { id: String },

    #[error("analysis contains a node with an empty id")]
    EmptyNodeId,
}
