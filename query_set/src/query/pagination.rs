use crate::validation::ValidationError;

/// Limit/offset window of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pagination {
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Pagination {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self, ValidationError> {
        if let Some(limit) = limit.filter(|l| *l < 0) {
            return Err(ValidationError::InvalidLimit(limit.to_string()));
        }

        if let Some(offset) = offset.filter(|o| *o < 0) {
            return Err(ValidationError::InvalidOffset(offset.to_string()));
        }

        Ok(Self { limit, offset })
    }

    /// Parse textual arguments; only unsigned decimal digits are accepted
    pub fn parse(limit: Option<&str>, offset: Option<&str>) -> Result<Self, ValidationError> {
        let limit = limit
            .map(|l| parse_count(l).ok_or_else(|| ValidationError::InvalidLimit(l.to_string())))
            .transpose()?;
        let offset = offset
            .map(|o| parse_count(o).ok_or_else(|| ValidationError::InvalidOffset(o.to_string())))
            .transpose()?;

        Self::new(limit, offset)
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.offset.is_none()
    }
}

fn parse_count(text: &str) -> Option<i64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
