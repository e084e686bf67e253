use super::{AuctionStore, StoreError, StoreResult};
use crate::bidding::model::{
    Bid, Bidder, Category, Event, Item, NewBid, NewBidder, NewCategory, NewEvent, NewItem,
    UpdateEvent, UpdateItem,
};
use crate::database::DatabaseManager;
use crate::query::handlers as query;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// [`AuctionStore`] backed by the Postgres query handlers.
pub struct PostgresAuctionStore {
    db_manager: Arc<DatabaseManager>,
}

impl PostgresAuctionStore {
    pub fn new(db_manager: Arc<DatabaseManager>) -> Self {
        Self { db_manager }
    }
}

fn found<T>(row: Option<T>, entity: &'static str, id: i64) -> StoreResult<T> {
    row.ok_or(StoreError::not_found(entity, id))
}

#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        Ok(query::get_categories(&self.db_manager).await?)
    }

    async fn get_category(&self, category_id: i64) -> StoreResult<Category> {
        let row = query::get_category(&self.db_manager, category_id).await?;
        found(row, "category", category_id)
    }

    async fn create_category(&self, input: &NewCategory) -> StoreResult<Category> {
        Ok(query::insert_category(&self.db_manager, input).await?)
    }

    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        Ok(query::get_events(&self.db_manager).await?)
    }

    async fn get_event(&self, event_id: i64) -> StoreResult<Event> {
        let row = query::get_event(&self.db_manager, event_id).await?;
        found(row, "event", event_id)
    }

    async fn create_event(&self, input: &NewEvent) -> StoreResult<Event> {
        Ok(query::insert_event(&self.db_manager, input).await?)
    }

    async fn update_event(&self, event_id: i64, changes: UpdateEvent) -> StoreResult<Event> {
        let row = query::update_event(&self.db_manager, event_id, changes).await?;
        found(row, "event", event_id)
    }

    async fn list_items(&self, event_id: i64) -> StoreResult<Vec<Item>> {
        Ok(query::get_event_items(&self.db_manager, event_id).await?)
    }

    async fn get_item(&self, item_id: i64) -> StoreResult<Item> {
        let row = query::get_item(&self.db_manager, item_id).await?;
        found(row, "item", item_id)
    }

    async fn create_item(&self, event_id: i64, input: &NewItem) -> StoreResult<Item> {
        Ok(query::insert_item(&self.db_manager, event_id, input).await?)
    }

    async fn update_item(&self, item_id: i64, changes: UpdateItem) -> StoreResult<Item> {
        let row = query::update_item(&self.db_manager, item_id, changes).await?;
        found(row, "item", item_id)
    }

    async fn set_item_disqualified(
        &self,
        item_id: i64,
        disqualified: bool,
        reason: Option<String>,
    ) -> StoreResult<Item> {
        let row =
            query::update_item_disqualification(&self.db_manager, item_id, disqualified, reason)
                .await?;
        found(row, "item", item_id)
    }

    async fn create_bidder(&self, input: &NewBidder) -> StoreResult<Bidder> {
        Ok(query::insert_bidder(&self.db_manager, input).await?)
    }

    async fn get_bidder(&self, bidder_id: i64) -> StoreResult<Bidder> {
        let row = query::get_bidder(&self.db_manager, bidder_id).await?;
        found(row, "bidder", bidder_id)
    }

    async fn insert_bid(&self, input: &NewBid, created_at: DateTime<Utc>) -> StoreResult<Bid> {
        Ok(query::insert_bid(&self.db_manager, input, created_at).await?)
    }

    async fn set_bid_disqualified(&self, bid_id: i64, disqualified: bool) -> StoreResult<Bid> {
        let row = query::update_bid_disqualification(&self.db_manager, bid_id, disqualified).await?;
        found(row, "bid", bid_id)
    }

    async fn list_bidder_bids(&self, event_id: i64, bidder_id: i64) -> StoreResult<Vec<Bid>> {
        Ok(query::get_bidder_bids(&self.db_manager, event_id, bidder_id).await?)
    }

    async fn list_ranked_bids(&self, event_id: i64) -> StoreResult<Vec<Bid>> {
        Ok(query::get_ranked_bids(&self.db_manager, event_id).await?)
    }
}
