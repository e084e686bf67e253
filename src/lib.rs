pub mod bidding;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod query;
pub mod report;
pub mod store;
pub mod tag;
pub mod winners;
