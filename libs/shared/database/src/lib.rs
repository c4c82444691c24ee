pub mod error;
pub mod memory;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use store::{BookingChange, BookingStore, CatalogStore, ScheduleStore, Store};
