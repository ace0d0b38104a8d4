//! Conversion between string ids and store ObjectIds.

use mongodb::bson::oid::ObjectId;

use crate::ports::{RepositoryError, RepositoryResult};

pub fn generate() -> String {
    ObjectId::new().to_hex()
}

pub fn parse(id: &str) -> RepositoryResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| RepositoryError::InvalidId(id.to_string()))
}

/// Like [`parse`], but an absent or empty id yields `None`.
pub fn parse_optional(id: Option<&str>) -> RepositoryResult<Option<ObjectId>> {
    match id {
        Some(id) if !id.is_empty() => parse(id).map(Some),
        _ => Ok(None),
    }
}
