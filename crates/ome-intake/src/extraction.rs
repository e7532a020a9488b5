//! Regimen extraction from language-service output.

use ome_core::ConversionQuery;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extraction errors.
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
}

pub type IntakeResult<T> = Result<T, IntakeError>;

/// Structured regimen as returned by the language service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedRegimen {
    pub medications: Vec<ParsedMedication>,
}

/// One medication as returned by the language service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedMedication {
    pub drug: String,
    pub route: String,
    pub dose: f64,
    pub units: String,
    #[serde(default)]
    pub frequency: Option<String>,
}

impl ParsedMedication {
    /// Engine query for this medication, unvalidated.
    pub fn to_query(&self) -> ConversionQuery {
        ConversionQuery {
            drug: self.drug.clone(),
            route: self.route.clone(),
            dose: self.dose,
            unit: self.units.clone(),
            frequency: self.frequency.clone(),
        }
    }
}

impl ParsedRegimen {
    /// Engine queries in regimen order.
    pub fn to_queries(&self) -> Vec<ConversionQuery> {
        self.medications.iter().map(ParsedMedication::to_query).collect()
    }
}

/// A conversion request as submitted by a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversionRequest {
    pub regimen: ParsedRegimen,
    pub target_drug: String,
    #[serde(default = "default_target_route")]
    pub target_route: String,
}

fn default_target_route() -> String {
    "po".into()
}

/// Parse the language service's response into a regimen.
pub fn parse_regimen_output(json: &str) -> IntakeResult<ParsedRegimen> {
    // The service sometimes wraps the object in prose
    let json_start = json.find('{').ok_or_else(|| {
        IntakeError::InvalidFormat("No JSON object found in response".into())
    })?;
    let json_end = json.rfind('}').ok_or_else(|| {
        IntakeError::InvalidFormat("No closing brace found in response".into())
    })?;
    if json_end < json_start {
        return Err(IntakeError::InvalidFormat(
            "Closing brace precedes opening brace".into(),
        ));
    }

    let regimen: ParsedRegimen = serde_json::from_str(&json[json_start..=json_end])?;
    Ok(regimen)
}
