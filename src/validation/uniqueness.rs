//! Shared uniqueness primitive

use async_trait::async_trait;

use super::RuleViolation;
use crate::{error::AppResult, models::EntityKind};

/// Value of one key column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValue {
    Text(String),
    Id(i32),
}

/// One column of a candidate key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyField {
    /// Name reported to clients
    pub field: &'static str,
    /// Backing column
    pub column: &'static str,
    pub value: KeyValue,
}

impl KeyField {
    pub fn text(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            column: field,
            value: KeyValue::Text(value.into()),
        }
    }

    pub fn id(field: &'static str, column: &'static str, value: i32) -> Self {
        Self {
            field,
            column,
            value: KeyValue::Id(value),
        }
    }
}

/// Read access to existing rows, used only to detect key collisions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UniquenessGateway: Send + Sync {
    /// Whether a row of `kind` other than `exclude_id` matches every field of `key` exactly
    async fn exists(
        &self,
        kind: EntityKind,
        key: &[KeyField],
        exclude_id: Option<i32>,
    ) -> AppResult<bool>;
}

/// Returns the duplicate violation for `key`, if another row holds it
pub async fn check_unique(
    gateway: &dyn UniquenessGateway,
    kind: EntityKind,
    key: &[KeyField],
    exclude_id: Option<i32>,
) -> AppResult<Option<RuleViolation>> {
    if gateway.exists(kind, key, exclude_id).await? {
        tracing::debug!("Duplicate {} key rejected", kind);
        return Ok(Some(RuleViolation::DuplicateEntity {
            kind,
            fields: key.iter().map(|f| f.field).collect(),
        }));
    }
    Ok(None)
}
