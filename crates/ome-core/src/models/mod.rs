//! Domain models for the OME conversion engine.

mod audit;
mod conversion;
mod query;
mod route;
mod unit;

pub use audit::*;
pub use conversion::*;
pub use query::*;
pub use route::*;
pub use unit::*;
