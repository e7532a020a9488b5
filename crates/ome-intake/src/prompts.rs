//! Prompts and response schema for regimen parsing.
//!
//! The language-understanding service only structures what the clinician
//! wrote. It must never convert or total doses; the engine does that.

use ome_core::{ConversionTable, Route};
use serde_json::{json, Value};

/// System prompt for regimen parsing.
pub const SYSTEM_PROMPT: &str = r#"You are a medical assistant that parses opioid medication descriptions into structured data.
Extract medications, routes, doses, units, and frequencies from natural language.

CRITICAL: Only parse what is explicitly stated. DO NOT perform any calculations or conversions.

Example: "0.2mg hydromorphone every 6 hours" should parse as:
- dose: 0.2 (not 0.8)
- units: "mg" (not "mg/day")
- frequency: "every 6 hours"

Return JSON with a "medications" array containing drug, route, dose, units, and frequency fields."#;

/// Unit spellings the service may emit.
pub const UNITS: &[&str] = &["mg", "mcg", "mg/hr", "mcg/hr"];

/// Frequency phrases the service may emit.
pub const FREQUENCIES: &[&str] = &[
    "daily",
    "twice daily",
    "three times daily",
    "four times daily",
    "every 4 hours",
    "every 6 hours",
    "every 8 hours",
    "every 12 hours",
    "q4h",
    "q6h",
    "q8h",
    "q12h",
    "bid",
    "tid",
    "qid",
    "prn",
    "as needed",
];

/// User prompt for one free-text regimen.
pub fn make_parse_prompt(text: &str) -> String {
    format!("Parse this opioid regimen: {}", text)
}

/// JSON schema constraining the service's output.
///
/// The drug and route enums come from `table`, so the service cannot name
/// anything the engine would reject as unknown.
pub fn response_schema(table: &ConversionTable) -> Value {
    let routes: Vec<&str> = Route::ALL.iter().map(|r| r.code()).collect();

    json!({
        "name": "opioid_regimen",
        "schema": {
            "type": "object",
            "properties": {
                "medications": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "drug": { "type": "string", "enum": table.drugs() },
                            "route": { "type": "string", "enum": routes },
                            "dose": { "type": "number" },
                            "units": { "type": "string", "enum": UNITS },
                            "frequency": { "type": "string", "enum": FREQUENCIES }
                        },
                        "required": ["drug", "route", "dose", "units"]
                    }
                }
            },
            "required": ["medications"]
        }
    })
}
