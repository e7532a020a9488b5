//! Audit records for conversions.

use serde::{Deserialize, Serialize};

use super::{ConversionQuery, RegimenConversion};

/// A conversion together with the reference data it was computed against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversionAudit {
    /// Unique record ID
    pub id: String,
    /// When the conversion was computed (RFC 3339)
    pub computed_at: String,
    /// SHA-256 of the reference table used
    pub table_digest: String,
    /// Queries exactly as received
    pub queries: Vec<ConversionQuery>,
    pub conversion: RegimenConversion,
}

impl ConversionAudit {
    pub fn new(
        table_digest: impl Into<String>,
        queries: Vec<ConversionQuery>,
        conversion: RegimenConversion,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            computed_at: chrono::Utc::now().to_rfc3339(),
            table_digest: table_digest.into(),
            queries,
            conversion,
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
