use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid page index. Must be 0 <= page < {count}")]
    PageOutOfRange { index: i64, count: usize },
}

impl DomainError {
    pub fn page_out_of_range(index: i64, count: usize) -> Self {
        Self::PageOutOfRange { index, count }
    }
}
