#![forbid(unsafe_code)]

pub mod repository;

pub use repository::{
    InMemorySessionStore, ItemRecord, SessionRecord, SessionStore, StatisticsRecord, StorageError,
};
