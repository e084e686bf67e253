//! Persistence seam
//!
//! Commands, reports and HTTP handlers only talk to [`AuctionStore`]. The
//! server wires in [`PostgresAuctionStore`]; tests use [`InMemoryAuctionStore`].
// region:    --- Imports
use crate::bidding::model::{
    Bid, Bidder, Category, Event, Item, NewBid, NewBidder, NewCategory, NewEvent, NewItem,
    UpdateEvent, UpdateItem,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
// endregion: --- Imports

// region:    --- Modules
mod in_memory;
mod postgres;

pub use in_memory::InMemoryAuctionStore;
pub use postgres::PostgresAuctionStore;
// endregion: --- Modules

// region:    --- Errors
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    /// A uniqueness rule was violated; carries the constraint name.
    #[error("conflict on {0}")]
    Conflict(String),
    /// A referential or check rule was violated; carries the constraint name.
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => return Self::Conflict(constraint),
                Some(FOREIGN_KEY_VIOLATION) | Some(CHECK_VIOLATION) => {
                    return Self::Constraint(constraint)
                }
                _ => {}
            }
        }
        Self::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
// endregion: --- Errors

// region:    --- Store Trait
/// Storage operations of the auction.
///
/// Lookups by id fail with [`StoreError::NotFound`]. Writes that break a
/// uniqueness rule fail with [`StoreError::Conflict`]; in particular a bidder
/// gets one bid per item, named `uq_bids_event_bidder_item`.
#[async_trait]
pub trait AuctionStore: Send + Sync {
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn get_category(&self, category_id: i64) -> StoreResult<Category>;
    async fn create_category(&self, input: &NewCategory) -> StoreResult<Category>;

    async fn list_events(&self) -> StoreResult<Vec<Event>>;
    async fn get_event(&self, event_id: i64) -> StoreResult<Event>;
    async fn create_event(&self, input: &NewEvent) -> StoreResult<Event>;
    async fn update_event(&self, event_id: i64, changes: UpdateEvent) -> StoreResult<Event>;

    /// Items of an event in insertion order.
    async fn list_items(&self, event_id: i64) -> StoreResult<Vec<Item>>;
    async fn get_item(&self, item_id: i64) -> StoreResult<Item>;
    async fn create_item(&self, event_id: i64, input: &NewItem) -> StoreResult<Item>;
    async fn update_item(&self, item_id: i64, changes: UpdateItem) -> StoreResult<Item>;
    async fn set_item_disqualified(
        &self,
        item_id: i64,
        disqualified: bool,
        reason: Option<String>,
    ) -> StoreResult<Item>;

    async fn create_bidder(&self, input: &NewBidder) -> StoreResult<Bidder>;
    async fn get_bidder(&self, bidder_id: i64) -> StoreResult<Bidder>;

    async fn insert_bid(&self, input: &NewBid, created_at: DateTime<Utc>) -> StoreResult<Bid>;
    async fn set_bid_disqualified(&self, bid_id: i64, disqualified: bool) -> StoreResult<Bid>;
    /// A bidder's bids in an event, oldest first, disqualified ones included.
    async fn list_bidder_bids(&self, event_id: i64, bidder_id: i64) -> StoreResult<Vec<Bid>>;
    /// Eligible bids of an event ordered by `(item_id asc, bid_amount desc, created_at asc)`.
    ///
    /// Disqualified bids and bids on disqualified items are left out.
    async fn list_ranked_bids(&self, event_id: i64) -> StoreResult<Vec<Bid>>;
}

pub type SharedStore = Arc<dyn AuctionStore>;
// endregion: --- Store Trait
