pub mod error;
pub mod order;
pub mod params;
pub mod translate;
pub mod types;

pub use error::QueryError;
pub use params::QueryParams;
pub use translate::translate;
pub use types::*;
