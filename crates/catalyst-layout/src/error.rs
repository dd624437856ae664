#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("graph contains duplicate entity id: {id}")]
    DuplicateEntity { id: String },

    #[error("graph contains an entity with an empty id")]
    EmptyEntityId,
}

pub type Result<T> = std::result::Result<T, Error>;
