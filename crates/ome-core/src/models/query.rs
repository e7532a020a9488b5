//! Conversion queries as received from upstream parsing.

use serde::{Deserialize, Serialize};

/// One opioid order, as handed over by the parsing collaborator.
///
/// Fields are kept as received. Nothing here is trusted until the engine has
/// matched it against the reference table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversionQuery {
    /// Drug name (e.g., "morphine", " Oxycodone ")
    pub drug: String,
    /// Route as written (e.g., "po", "oral", "transdermal")
    pub route: String,
    /// Dose per administration, or the delivery rate for rate units
    pub dose: f64,
    /// Dose unit (e.g., "mg", "mcg", "mcg/hr")
    pub unit: String,
    /// Dosing frequency (e.g., "q6h", "twice daily"); absent means `dose` is the 24h total
    #[serde(default)]
    pub frequency: Option<String>,
}

impl ConversionQuery {
    /// Create a query for a 24-hour total dose.
    pub fn new(drug: impl Into<String>, route: impl Into<String>, dose: f64, unit: impl Into<String>) -> Self {
        Self {
            drug: drug.into(),
            route: route.into(),
            dose,
            unit: unit.into(),
            frequency: None,
        }
    }

    /// Attach a dosing frequency.
    pub fn with_frequency(mut self, frequency: impl Into<String>) -> Self {
        self.frequency = Some(frequency.into());
        self
    }

    /// Same order at a different dose.
    pub fn with_dose(&self, dose: f64) -> Self {
        Self {
            dose,
            ..self.clone()
        }
    }
}
