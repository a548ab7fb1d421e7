#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("{0} identifier must not be empty")]
    EmptyIdentifier(&'static str),
    #[error("rating must be between 0 and 100, got {0}")]
    RatingOutOfRange(i64),
    #[error("book title must not be empty")]
    EmptyTitle,
    #[error("entry needs text or at least one image")]
    EmptyEntry,
    #[error("unknown sort field: {0}")]
    UnknownSortField(String),
}
