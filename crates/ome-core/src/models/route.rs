//! Administration routes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Route of administration. Closed set, fixed when the table is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Route {
    #[serde(rename = "po")]
    Oral,
    #[serde(rename = "iv")]
    Intravenous,
    #[serde(rename = "im")]
    Intramuscular,
    #[serde(rename = "sc")]
    Subcutaneous,
    #[serde(rename = "transdermal")]
    Transdermal,
    #[serde(rename = "buc_sublingual")]
    BuccalSublingual,
    #[serde(rename = "rectal")]
    Rectal,
}

impl Route {
    /// Every route the engine knows about.
    pub const ALL: [Route; 7] = [
        Route::Oral,
        Route::Intravenous,
        Route::Intramuscular,
        Route::Subcutaneous,
        Route::Transdermal,
        Route::BuccalSublingual,
        Route::Rectal,
    ];

    /// Short code used in the reference data and on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Route::Oral => "po",
            Route::Intravenous => "iv",
            Route::Intramuscular => "im",
            Route::Subcutaneous => "sc",
            Route::Transdermal => "transdermal",
            Route::BuccalSublingual => "buc_sublingual",
            Route::Rectal => "rectal",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
