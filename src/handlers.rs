// region:    --- Imports
use crate::bidding::commands::{self, DisqualifyCommand, PlaceBidCommand};
use crate::bidding::model::{
    Bid, Bidder, Category, Event, Item, NewBidder, NewCategory, NewEvent, NewItem, UpdateEvent,
    UpdateItem,
};
use crate::error::{AppError, AppResult};
use crate::report::{self, BidSheet, TaggedItem, WinnerReport};
use crate::store::SharedStore;
use crate::winners::WinnerFilter;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

// endregion: --- Imports

// region:    --- Router

/// All routes over a shared store. Layers (CORS, tracing) are added by the caller.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route(
            "/categories",
            get(handle_get_categories).post(handle_create_category),
        )
        .route("/events", get(handle_get_events).post(handle_create_event))
        .route("/events/:id", get(handle_get_event).put(handle_update_event))
        .route(
            "/events/:id/items",
            get(handle_get_event_items).post(handle_create_item),
        )
        .route(
            "/events/:id/bidders/:bidder_id/bids",
            get(handle_get_bid_sheet),
        )
        .route("/events/:id/winners", get(handle_get_winners))
        .route("/events/:id/report", get(handle_get_report))
        .route("/items/:id", get(handle_get_item).put(handle_update_item))
        .route("/items/:id/disqualify", post(handle_disqualify_item))
        .route("/bidders", post(handle_create_bidder))
        .route("/bidders/:id", get(handle_get_bidder))
        .route("/bids", post(handle_place_bid))
        .route("/bids/:id/disqualify", post(handle_disqualify_bid))
        .with_state(store)
}

/// Liveness
async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// endregion: --- Router

// region:    --- Command Handlers

/// Place a bid
pub async fn handle_place_bid(
    State(store): State<SharedStore>,
    Json(cmd): Json<PlaceBidCommand>,
) -> AppResult<(StatusCode, Json<Bid>)> {
    let bid = commands::handle_place_bid(cmd, store.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(bid)))
}

/// An empty body disqualifies; a body that does not parse is rejected.
fn disqualify_command(body: &[u8]) -> AppResult<DisqualifyCommand> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(DisqualifyCommand::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Disqualify or reinstate a bid
pub async fn handle_disqualify_bid(
    State(store): State<SharedStore>,
    Path(bid_id): Path<i64>,
    body: Bytes,
) -> AppResult<Json<Bid>> {
    let cmd = disqualify_command(&body)?;
    let bid = commands::handle_disqualify_bid(store.as_ref(), bid_id, cmd).await?;
    Ok(Json(bid))
}

/// Disqualify or reinstate an item
pub async fn handle_disqualify_item(
    State(store): State<SharedStore>,
    Path(item_id): Path<i64>,
    body: Bytes,
) -> AppResult<Json<Item>> {
    let cmd = disqualify_command(&body)?;
    let item = commands::handle_disqualify_item(store.as_ref(), item_id, cmd).await?;
    Ok(Json(item))
}

pub async fn handle_create_category(
    State(store): State<SharedStore>,
    Json(input): Json<NewCategory>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let category = commands::handle_create_category(store.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn handle_create_event(
    State(store): State<SharedStore>,
    Json(input): Json<NewEvent>,
) -> AppResult<(StatusCode, Json<Event>)> {
    let event = commands::handle_create_event(store.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn handle_update_event(
    State(store): State<SharedStore>,
    Path(event_id): Path<i64>,
    Json(changes): Json<UpdateEvent>,
) -> AppResult<Json<Event>> {
    let event = commands::handle_update_event(store.as_ref(), event_id, changes).await?;
    Ok(Json(event))
}

pub async fn handle_create_item(
    State(store): State<SharedStore>,
    Path(event_id): Path<i64>,
    Json(input): Json<NewItem>,
) -> AppResult<(StatusCode, Json<Item>)> {
    let item = commands::handle_create_item(store.as_ref(), event_id, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn handle_update_item(
    State(store): State<SharedStore>,
    Path(item_id): Path<i64>,
    Json(changes): Json<UpdateItem>,
) -> AppResult<Json<Item>> {
    let item = commands::handle_update_item(store.as_ref(), item_id, changes).await?;
    Ok(Json(item))
}

pub async fn handle_create_bidder(
    State(store): State<SharedStore>,
    Json(input): Json<NewBidder>,
) -> AppResult<(StatusCode, Json<Bidder>)> {
    let bidder = commands::handle_create_bidder(store.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(bidder)))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// All categories
pub async fn handle_get_categories(
    State(store): State<SharedStore>,
) -> AppResult<Json<Vec<Category>>> {
    info!("{:<12} --> get categories", "HandlerQuery");
    Ok(Json(store.list_categories().await?))
}

/// All events
pub async fn handle_get_events(State(store): State<SharedStore>) -> AppResult<Json<Vec<Event>>> {
    info!("{:<12} --> get events", "HandlerQuery");
    Ok(Json(store.list_events().await?))
}

/// Single event
pub async fn handle_get_event(
    State(store): State<SharedStore>,
    Path(event_id): Path<i64>,
) -> AppResult<Json<Event>> {
    info!("{:<12} --> get event id: {}", "HandlerQuery", event_id);
    Ok(Json(store.get_event(event_id).await?))
}

/// Items of an event in tag order
pub async fn handle_get_event_items(
    State(store): State<SharedStore>,
    Path(event_id): Path<i64>,
) -> AppResult<Json<Vec<TaggedItem>>> {
    info!("{:<12} --> get items of event id: {}", "HandlerQuery", event_id);
    Ok(Json(report::item_listing(store.as_ref(), event_id).await?))
}

/// Single item
pub async fn handle_get_item(
    State(store): State<SharedStore>,
    Path(item_id): Path<i64>,
) -> AppResult<Json<Item>> {
    info!("{:<12} --> get item id: {}", "HandlerQuery", item_id);
    Ok(Json(store.get_item(item_id).await?))
}

/// Single bidder
pub async fn handle_get_bidder(
    State(store): State<SharedStore>,
    Path(bidder_id): Path<i64>,
) -> AppResult<Json<Bidder>> {
    info!("{:<12} --> get bidder id: {}", "HandlerQuery", bidder_id);
    Ok(Json(store.get_bidder(bidder_id).await?))
}

/// A bidder's bid sheet
pub async fn handle_get_bid_sheet(
    State(store): State<SharedStore>,
    Path((event_id, bidder_id)): Path<(i64, i64)>,
) -> AppResult<Json<BidSheet>> {
    info!(
        "{:<12} --> get bid sheet event id: {} bidder id: {}",
        "HandlerQuery", event_id, bidder_id
    );
    Ok(Json(report::bid_sheet(store.as_ref(), event_id, bidder_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct WinnersQuery {
    pub item_id: Option<i64>,
    pub bidder_id: Option<i64>,
}

/// Released winners, optionally narrowed to one item or one bidder
pub async fn handle_get_winners(
    State(store): State<SharedStore>,
    Path(event_id): Path<i64>,
    Query(params): Query<WinnersQuery>,
) -> AppResult<Json<WinnerReport>> {
    info!(
        "{:<12} --> get winners event id: {} {:?}",
        "HandlerQuery", event_id, params
    );
    let filter = WinnerFilter::from_parts(event_id, params.item_id, params.bidder_id)?;
    let event = store.get_event(event_id).await?;
    if !event.release_winners {
        return Err(AppError::Forbidden(format!(
            "winners of event {event_id} have not been released"
        )));
    }
    Ok(Json(report::winner_report(store.as_ref(), &event, &filter).await?))
}

/// Full winner report, regardless of release
pub async fn handle_get_report(
    State(store): State<SharedStore>,
    Path(event_id): Path<i64>,
) -> AppResult<Json<WinnerReport>> {
    info!("{:<12} --> get report event id: {}", "HandlerQuery", event_id);
    let event = store.get_event(event_id).await?;
    let filter = WinnerFilter::event(event_id);
    Ok(Json(report::winner_report(store.as_ref(), &event, &filter).await?))
}

// endregion: --- Query Handlers
