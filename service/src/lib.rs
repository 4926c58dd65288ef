pub mod catalog_sync;
pub mod clipboard;
pub mod config;
pub mod dto;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod merge;
pub mod mutation;
pub mod normalize;
pub mod query;
pub mod resolver;
pub mod sync;

pub use mutation::*;
pub use query::*;

pub use sea_orm;
