// region:    --- Imports
use super::queries;
use crate::bidding::model::{
    Bid, Bidder, Category, Event, Item, NewBid, NewBidder, NewCategory, NewEvent, NewItem,
    UpdateEvent, UpdateItem,
};
use crate::database::DatabaseManager;
use chrono::{DateTime, Utc};
use sqlx::Error as SqlxError;
use tracing::info;

// endregion: --- Imports

// region:    --- Categories

/// All categories
pub async fn get_categories(db_manager: &DatabaseManager) -> Result<Vec<Category>, SqlxError> {
    info!("{:<12} --> get categories", "Query");
    sqlx::query_as::<_, Category>(queries::GET_CATEGORIES)
        .fetch_all(db_manager.pool())
        .await
}

/// Single category
pub async fn get_category(
    db_manager: &DatabaseManager,
    category_id: i64,
) -> Result<Option<Category>, SqlxError> {
    info!("{:<12} --> get category id: {}", "Query", category_id);
    sqlx::query_as::<_, Category>(queries::GET_CATEGORY)
        .bind(category_id)
        .fetch_optional(db_manager.pool())
        .await
}

/// Insert a category
pub async fn insert_category(
    db_manager: &DatabaseManager,
    input: &NewCategory,
) -> Result<Category, SqlxError> {
    info!("{:<12} --> insert category {:?}", "Query", input.prefix);
    sqlx::query_as::<_, Category>(queries::INSERT_CATEGORY)
        .bind(&input.prefix)
        .bind(&input.description)
        .fetch_one(db_manager.pool())
        .await
}

// endregion: --- Categories

// region:    --- Events

/// All events
pub async fn get_events(db_manager: &DatabaseManager) -> Result<Vec<Event>, SqlxError> {
    info!("{:<12} --> get events", "Query");
    sqlx::query_as::<_, Event>(queries::GET_EVENTS)
        .fetch_all(db_manager.pool())
        .await
}

/// Single event
pub async fn get_event(
    db_manager: &DatabaseManager,
    event_id: i64,
) -> Result<Option<Event>, SqlxError> {
    info!("{:<12} --> get event id: {}", "Query", event_id);
    sqlx::query_as::<_, Event>(queries::GET_EVENT)
        .bind(event_id)
        .fetch_optional(db_manager.pool())
        .await
}

/// Insert an event
pub async fn insert_event(
    db_manager: &DatabaseManager,
    input: &NewEvent,
) -> Result<Event, SqlxError> {
    info!("{:<12} --> insert event {:?}", "Query", input.name);
    sqlx::query_as::<_, Event>(queries::INSERT_EVENT)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.start_at)
        .bind(input.end_at)
        .bind(input.enabled)
        .bind(input.release_winners)
        .fetch_one(db_manager.pool())
        .await
}

/// Apply a partial update under a row lock. `None` when the event does not exist.
pub async fn update_event(
    db_manager: &DatabaseManager,
    event_id: i64,
    changes: UpdateEvent,
) -> Result<Option<Event>, SqlxError> {
    info!("{:<12} --> update event id: {}", "Query", event_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let current = sqlx::query_as::<_, Event>(queries::GET_EVENT_FOR_UPDATE)
                    .bind(event_id)
                    .fetch_optional(&mut **tx)
                    .await?;
                let Some(mut event) = current else {
                    return Ok(None);
                };
                changes.apply(&mut event);

                sqlx::query_as::<_, Event>(queries::UPDATE_EVENT)
                    .bind(event.id)
                    .bind(&event.name)
                    .bind(&event.description)
                    .bind(event.start_at)
                    .bind(event.end_at)
                    .bind(event.enabled)
                    .bind(event.release_winners)
                    .fetch_one(&mut **tx)
                    .await
                    .map(Some)
            })
        })
        .await
}

// endregion: --- Events

// region:    --- Items

/// Items of an event
pub async fn get_event_items(
    db_manager: &DatabaseManager,
    event_id: i64,
) -> Result<Vec<Item>, SqlxError> {
    info!("{:<12} --> get items of event id: {}", "Query", event_id);
    sqlx::query_as::<_, Item>(queries::GET_EVENT_ITEMS)
        .bind(event_id)
        .fetch_all(db_manager.pool())
        .await
}

/// Single item
pub async fn get_item(
    db_manager: &DatabaseManager,
    item_id: i64,
) -> Result<Option<Item>, SqlxError> {
    info!("{:<12} --> get item id: {}", "Query", item_id);
    sqlx::query_as::<_, Item>(queries::GET_ITEM)
        .bind(item_id)
        .fetch_optional(db_manager.pool())
        .await
}

/// Insert an item into an event
pub async fn insert_item(
    db_manager: &DatabaseManager,
    event_id: i64,
    input: &NewItem,
) -> Result<Item, SqlxError> {
    info!(
        "{:<12} --> insert item {} into event id: {}",
        "Query", input.item_number, event_id
    );
    sqlx::query_as::<_, Item>(queries::INSERT_ITEM)
        .bind(event_id)
        .bind(input.category_id)
        .bind(input.item_number)
        .bind(&input.description)
        .bind(input.minimum_bid)
        .fetch_one(db_manager.pool())
        .await
}

/// Apply a partial update under a row lock. `None` when the item does not exist.
pub async fn update_item(
    db_manager: &DatabaseManager,
    item_id: i64,
    changes: UpdateItem,
) -> Result<Option<Item>, SqlxError> {
    info!("{:<12} --> update item id: {}", "Query", item_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let current = sqlx::query_as::<_, Item>(queries::GET_ITEM_FOR_UPDATE)
                    .bind(item_id)
                    .fetch_optional(&mut **tx)
                    .await?;
                let Some(mut item) = current else {
                    return Ok(None);
                };
                changes.apply(&mut item);

                sqlx::query_as::<_, Item>(queries::UPDATE_ITEM)
                    .bind(item.id)
                    .bind(item.category_id)
                    .bind(item.item_number)
                    .bind(&item.description)
                    .bind(item.minimum_bid)
                    .fetch_one(&mut **tx)
                    .await
                    .map(Some)
            })
        })
        .await
}

/// Set or clear an item's disqualification
pub async fn update_item_disqualification(
    db_manager: &DatabaseManager,
    item_id: i64,
    disqualified: bool,
    reason: Option<String>,
) -> Result<Option<Item>, SqlxError> {
    info!(
        "{:<12} --> item id: {} disqualified: {}",
        "Query", item_id, disqualified
    );
    sqlx::query_as::<_, Item>(queries::UPDATE_ITEM_DISQUALIFICATION)
        .bind(item_id)
        .bind(disqualified)
        .bind(reason)
        .fetch_optional(db_manager.pool())
        .await
}

// endregion: --- Items

// region:    --- Bidders

/// Insert a bidder
pub async fn insert_bidder(
    db_manager: &DatabaseManager,
    input: &NewBidder,
) -> Result<Bidder, SqlxError> {
    info!("{:<12} --> insert bidder", "Query");
    sqlx::query_as::<_, Bidder>(queries::INSERT_BIDDER)
        .bind(&input.name)
        .bind(&input.email)
        .fetch_one(db_manager.pool())
        .await
}

/// Single bidder
pub async fn get_bidder(
    db_manager: &DatabaseManager,
    bidder_id: i64,
) -> Result<Option<Bidder>, SqlxError> {
    info!("{:<12} --> get bidder id: {}", "Query", bidder_id);
    sqlx::query_as::<_, Bidder>(queries::GET_BIDDER)
        .bind(bidder_id)
        .fetch_optional(db_manager.pool())
        .await
}

// endregion: --- Bidders

// region:    --- Bids

/// Insert a bid. A second bid by the same bidder on the same item violates
/// `uq_bids_event_bidder_item`.
pub async fn insert_bid(
    db_manager: &DatabaseManager,
    input: &NewBid,
    created_at: DateTime<Utc>,
) -> Result<Bid, SqlxError> {
    info!(
        "{:<12} --> insert bid item id: {} bidder id: {} amount: {}",
        "Query", input.item_id, input.bidder_id, input.bid_amount
    );
    sqlx::query_as::<_, Bid>(queries::INSERT_BID)
        .bind(input.event_id)
        .bind(input.item_id)
        .bind(input.bidder_id)
        .bind(input.bid_amount)
        .bind(created_at)
        .fetch_one(db_manager.pool())
        .await
}

/// Set or clear a bid's disqualification
pub async fn update_bid_disqualification(
    db_manager: &DatabaseManager,
    bid_id: i64,
    disqualified: bool,
) -> Result<Option<Bid>, SqlxError> {
    info!(
        "{:<12} --> bid id: {} disqualified: {}",
        "Query", bid_id, disqualified
    );
    sqlx::query_as::<_, Bid>(queries::UPDATE_BID_DISQUALIFICATION)
        .bind(bid_id)
        .bind(disqualified)
        .fetch_optional(db_manager.pool())
        .await
}

/// One bidder's bids in an event
pub async fn get_bidder_bids(
    db_manager: &DatabaseManager,
    event_id: i64,
    bidder_id: i64,
) -> Result<Vec<Bid>, SqlxError> {
    info!(
        "{:<12} --> get bids of bidder id: {} in event id: {}",
        "Query", bidder_id, event_id
    );
    sqlx::query_as::<_, Bid>(queries::GET_BIDDER_BIDS)
        .bind(event_id)
        .bind(bidder_id)
        .fetch_all(db_manager.pool())
        .await
}

/// Eligible bids of an event in winner order
pub async fn get_ranked_bids(
    db_manager: &DatabaseManager,
    event_id: i64,
) -> Result<Vec<Bid>, SqlxError> {
    info!("{:<12} --> get ranked bids of event id: {}", "Query", event_id);
    sqlx::query_as::<_, Bid>(queries::GET_RANKED_BIDS)
        .bind(event_id)
        .fetch_all(db_manager.pool())
        .await
}

// endregion: --- Bids
