pub use self::error::StoreError;
pub use self::manager::StateStore;
pub use self::models::{EventRecord, EventRecords, EventStatus, Subscription};

pub mod error;
pub mod manager;
pub mod models;
