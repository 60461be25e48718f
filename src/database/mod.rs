pub mod manager;
pub mod memory;
pub mod nested;
pub mod postgres;
pub mod sql;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use nested::{ChildCreate, CreateInput};
pub use postgres::PgStore;
pub use store::{EntityStore, ResourceTenant, StoreError};
