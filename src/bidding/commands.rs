//! Bidding and catalogue commands
//! 1. Place a bid
//! 2. Disqualify a bid or an item
//! 3. Create and edit events, items, categories and bidders
// region:    --- Imports
use crate::bidding::model::{
    Bid, Bidder, Category, Cents, Event, Item, NewBid, NewBidder, NewCategory, NewEvent, NewItem,
    UpdateEvent, UpdateItem,
};
use crate::store::{AuctionStore, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Commands
/// Bid placement command
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub event_id: i64,
    pub item_id: i64,
    pub bidder_id: i64,
    pub bid_amount: Cents,
}

/// Disqualification toggle. `disqualified` defaults to `true`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DisqualifyCommand {
    #[serde(default = "default_true")]
    pub disqualified: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Default for DisqualifyCommand {
    fn default() -> Self {
        Self {
            disqualified: true,
            reason: None,
        }
    }
}

fn default_true() -> bool {
    true
}
// endregion: --- Commands

// region:    --- Errors
/// Why a bid was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BidRejection {
    #[error("event is not enabled for bidding")]
    EventDisabled,
    #[error("event has not started yet")]
    NotStarted,
    #[error("event has already ended")]
    AlreadyEnded,
    #[error("item {item_id} does not belong to event {event_id}")]
    ItemNotInEvent { item_id: i64, event_id: i64 },
    #[error("item is disqualified")]
    ItemDisqualified,
    #[error("bid amount must be positive")]
    InvalidAmount,
    #[error("bid of {bid_amount} is below the minimum bid of {minimum_bid}")]
    BelowMinimum { bid_amount: Cents, minimum_bid: Cents },
    #[error("bidder already has a bid on this item")]
    DuplicateBid,
}

impl BidRejection {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EventDisabled => "EVENT_DISABLED",
            Self::NotStarted => "NOT_STARTED",
            Self::AlreadyEnded => "ALREADY_ENDED",
            Self::ItemNotInEvent { .. } => "ITEM_NOT_IN_EVENT",
            Self::ItemDisqualified => "ITEM_DISQUALIFIED",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::BelowMinimum { .. } => "BELOW_MINIMUM",
            Self::DuplicateBid => "CONFLICT",
        }
    }
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Rejected(#[from] BidRejection),
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn invalid(message: impl Into<String>) -> CommandError {
    CommandError::Invalid(message.into())
}
// endregion: --- Errors

// region:    --- Bids
/// Checks a bid against its event and item at `now`.
pub fn validate_bid(
    event: &Event,
    item: &Item,
    bid_amount: Cents,
    now: DateTime<Utc>,
) -> Result<(), BidRejection> {
    if !event.enabled {
        return Err(BidRejection::EventDisabled);
    }
    if now < event.start_at {
        return Err(BidRejection::NotStarted);
    }
    if now > event.end_at {
        return Err(BidRejection::AlreadyEnded);
    }
    if item.event_id != event.id {
        return Err(BidRejection::ItemNotInEvent {
            item_id: item.id,
            event_id: event.id,
        });
    }
    if item.disqualified {
        return Err(BidRejection::ItemDisqualified);
    }
    if bid_amount <= 0 {
        return Err(BidRejection::InvalidAmount);
    }
    match item.minimum_bid {
        Some(minimum_bid) if bid_amount < minimum_bid => Err(BidRejection::BelowMinimum {
            bid_amount,
            minimum_bid,
        }),
        _ => Ok(()),
    }
}

/// 1. Place a bid
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    store: &dyn AuctionStore,
) -> Result<Bid, CommandError> {
    info!("{:<12} --> place bid: {:?}", "Command", cmd);

    let event = store.get_event(cmd.event_id).await?;
    let item = store.get_item(cmd.item_id).await?;
    store.get_bidder(cmd.bidder_id).await?;

    let now = Utc::now();
    if let Err(rejection) = validate_bid(&event, &item, cmd.bid_amount, now) {
        warn!(
            "{:<12} --> bid rejected ({}): {:?}",
            "Command",
            rejection.code(),
            cmd
        );
        return Err(rejection.into());
    }

    let new_bid = NewBid {
        event_id: cmd.event_id,
        item_id: cmd.item_id,
        bidder_id: cmd.bidder_id,
        bid_amount: cmd.bid_amount,
    };
    match store.insert_bid(&new_bid, now).await {
        Ok(bid) => {
            info!("{:<12} --> bid {} confirmed", "Command", bid.id);
            Ok(bid)
        }
        Err(StoreError::Conflict(_)) => {
            warn!("{:<12} --> duplicate bid: {:?}", "Command", cmd);
            Err(BidRejection::DuplicateBid.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// 2. Disqualify (or reinstate) a bid
pub async fn handle_disqualify_bid(
    store: &dyn AuctionStore,
    bid_id: i64,
    cmd: DisqualifyCommand,
) -> Result<Bid, CommandError> {
    info!(
        "{:<12} --> bid {} disqualified: {}",
        "Command", bid_id, cmd.disqualified
    );
    Ok(store.set_bid_disqualified(bid_id, cmd.disqualified).await?)
}

/// 2. Disqualify (or reinstate) an item. Reinstating clears the reason.
pub async fn handle_disqualify_item(
    store: &dyn AuctionStore,
    item_id: i64,
    cmd: DisqualifyCommand,
) -> Result<Item, CommandError> {
    info!(
        "{:<12} --> item {} disqualified: {}",
        "Command", item_id, cmd.disqualified
    );
    let reason = if cmd.disqualified { cmd.reason } else { None };
    Ok(store
        .set_item_disqualified(item_id, cmd.disqualified, reason)
        .await?)
}
// endregion: --- Bids

// region:    --- Catalogue
fn check_window(start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Result<(), CommandError> {
    if start_at >= end_at {
        return Err(invalid("event must start before it ends"));
    }
    Ok(())
}

fn check_item_fields(
    item_number: i32,
    description: &str,
    minimum_bid: Option<Cents>,
) -> Result<(), CommandError> {
    if item_number <= 0 {
        return Err(invalid("item_number must be positive"));
    }
    if description.trim().is_empty() {
        return Err(invalid("item description is required"));
    }
    if matches!(minimum_bid, Some(m) if m < 0) {
        return Err(invalid("minimum_bid cannot be negative"));
    }
    Ok(())
}

/// 3. Create a category. Prefixes are alphabetic so tags can be parsed back.
pub async fn handle_create_category(
    store: &dyn AuctionStore,
    input: NewCategory,
) -> Result<Category, CommandError> {
    info!("{:<12} --> create category {:?}", "Command", input.prefix);
    let prefix = input.prefix.trim();
    if prefix.is_empty() || !prefix.chars().all(char::is_alphabetic) {
        return Err(invalid("category prefix must be non-empty and alphabetic"));
    }
    let input = NewCategory {
        prefix: prefix.to_string(),
        description: input.description,
    };
    Ok(store.create_category(&input).await?)
}

/// 3. Create an event
pub async fn handle_create_event(
    store: &dyn AuctionStore,
    input: NewEvent,
) -> Result<Event, CommandError> {
    info!("{:<12} --> create event {:?}", "Command", input.name);
    if input.name.trim().is_empty() {
        return Err(invalid("event name is required"));
    }
    check_window(input.start_at, input.end_at)?;
    Ok(store.create_event(&input).await?)
}

/// 3. Update an event; the merged window is validated before writing.
pub async fn handle_update_event(
    store: &dyn AuctionStore,
    event_id: i64,
    changes: UpdateEvent,
) -> Result<Event, CommandError> {
    info!("{:<12} --> update event {}: {:?}", "Command", event_id, changes);
    let mut merged = store.get_event(event_id).await?;
    changes.clone().apply(&mut merged);
    if merged.name.trim().is_empty() {
        return Err(invalid("event name is required"));
    }
    check_window(merged.start_at, merged.end_at)?;
    Ok(store.update_event(event_id, changes).await?)
}

/// 3. Add an item to an event
pub async fn handle_create_item(
    store: &dyn AuctionStore,
    event_id: i64,
    input: NewItem,
) -> Result<Item, CommandError> {
    info!(
        "{:<12} --> create item {} in event {}",
        "Command", input.item_number, event_id
    );
    store.get_event(event_id).await?;
    store.get_category(input.category_id).await?;
    check_item_fields(input.item_number, &input.description, input.minimum_bid)?;
    Ok(store.create_item(event_id, &input).await?)
}

/// 3. Update an item
pub async fn handle_update_item(
    store: &dyn AuctionStore,
    item_id: i64,
    changes: UpdateItem,
) -> Result<Item, CommandError> {
    info!("{:<12} --> update item {}: {:?}", "Command", item_id, changes);
    let mut merged = store.get_item(item_id).await?;
    changes.clone().apply(&mut merged);
    if changes.category_id.is_some() {
        store.get_category(merged.category_id).await?;
    }
    check_item_fields(merged.item_number, &merged.description, merged.minimum_bid)?;
    Ok(store.update_item(item_id, changes).await?)
}

/// 3. Register a bidder
pub async fn handle_create_bidder(
    store: &dyn AuctionStore,
    input: NewBidder,
) -> Result<Bidder, CommandError> {
    info!("{:<12} --> create bidder", "Command");
    if input.name.trim().is_empty() {
        return Err(invalid("bidder name is required"));
    }
    let email = input.email.trim();
    if !email.contains('@') {
        return Err(invalid("bidder email is not valid"));
    }
    let input = NewBidder {
        name: input.name,
        email: email.to_string(),
    };
    Ok(store.create_bidder(&input).await?)
}
// endregion: --- Catalogue

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryAuctionStore;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap()
    }

    fn event() -> Event {
        Event {
            id: 1,
            name: "Spring Gala".into(),
            description: String::new(),
            start_at: start(),
            end_at: start() + Duration::hours(2),
            enabled: true,
            release_winners: false,
            created_at: start(),
        }
    }

    fn item(minimum_bid: Option<Cents>) -> Item {
        Item {
            id: 10,
            event_id: 1,
            category_id: 1,
            item_number: 1,
            description: "Quilt".into(),
            minimum_bid,
            disqualified: false,
            disqualification_reason: None,
            created_at: start(),
        }
    }

    fn during() -> DateTime<Utc> {
        start() + Duration::minutes(30)
    }

    #[test]
    fn open_event_accepts_bid_at_minimum() {
        assert_eq!(validate_bid(&event(), &item(Some(2500)), 2500, during()), Ok(()));
        assert_eq!(validate_bid(&event(), &item(None), 1, during()), Ok(()));
    }

    #[test]
    fn event_state_rejections() {
        let mut disabled = event();
        disabled.enabled = false;
        assert_eq!(
            validate_bid(&disabled, &item(None), 100, during()),
            Err(BidRejection::EventDisabled)
        );
        assert_eq!(
            validate_bid(&event(), &item(None), 100, start() - Duration::seconds(1)),
            Err(BidRejection::NotStarted)
        );
        assert_eq!(
            validate_bid(&event(), &item(None), 100, start() + Duration::hours(3)),
            Err(BidRejection::AlreadyEnded)
        );
    }

    #[test]
    fn item_and_amount_rejections() {
        let mut foreign = item(None);
        foreign.event_id = 2;
        let rejection = validate_bid(&event(), &foreign, 100, during()).unwrap_err();
        assert_eq!(rejection.code(), "ITEM_NOT_IN_EVENT");

        let mut withdrawn = item(None);
        withdrawn.disqualified = true;
        assert_eq!(
            validate_bid(&event(), &withdrawn, 100, during()),
            Err(BidRejection::ItemDisqualified)
        );

        assert_eq!(
            validate_bid(&event(), &item(None), 0, during()),
            Err(BidRejection::InvalidAmount)
        );
        assert_eq!(
            validate_bid(&event(), &item(Some(2500)), 2499, during()),
            Err(BidRejection::BelowMinimum {
                bid_amount: 2499,
                minimum_bid: 2500
            })
        );
    }

    async fn open_auction(store: &InMemoryAuctionStore) -> (Event, Item, Bidder) {
        let now = Utc::now();
        let category = handle_create_category(
            store,
            NewCategory {
                prefix: " A ".into(),
                description: "Art".into(),
            },
        )
        .await
        .unwrap();
        let event = handle_create_event(
            store,
            NewEvent {
                name: "Gala".into(),
                description: String::new(),
                start_at: now - Duration::hours(1),
                end_at: now + Duration::hours(1),
                enabled: true,
                release_winners: false,
            },
        )
        .await
        .unwrap();
        let item = handle_create_item(
            store,
            event.id,
            NewItem {
                category_id: category.id,
                item_number: 1,
                description: "Vase".into(),
                minimum_bid: Some(1000),
            },
        )
        .await
        .unwrap();
        let bidder = handle_create_bidder(
            store,
            NewBidder {
                name: "Ada".into(),
                email: "ada@example.com".into(),
            },
        )
        .await
        .unwrap();
        (event, item, bidder)
    }

    fn place(event: &Event, item: &Item, bidder: &Bidder, bid_amount: Cents) -> PlaceBidCommand {
        PlaceBidCommand {
            event_id: event.id,
            item_id: item.id,
            bidder_id: bidder.id,
            bid_amount,
        }
    }

    #[tokio::test]
    async fn second_bid_on_same_item_is_a_duplicate() {
        let store = InMemoryAuctionStore::new();
        let (event, item, bidder) = open_auction(&store).await;

        let bid = handle_place_bid(place(&event, &item, &bidder, 1500), &store)
            .await
            .unwrap();
        assert_eq!(bid.bid_amount, 1500);

        let err = handle_place_bid(place(&event, &item, &bidder, 3000), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Rejected(BidRejection::DuplicateBid)));
    }

    #[tokio::test]
    async fn below_minimum_is_rejected_before_storing() {
        let store = InMemoryAuctionStore::new();
        let (event, item, bidder) = open_auction(&store).await;

        let err = handle_place_bid(place(&event, &item, &bidder, 999), &store)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CommandError::Rejected(BidRejection::BelowMinimum { .. })
        ));
        assert!(store
            .list_bidder_bids(event.id, bidder.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn unknown_bidder_is_not_found() {
        let store = InMemoryAuctionStore::new();
        let (event, item, bidder) = open_auction(&store).await;
        let mut cmd = place(&event, &item, &bidder, 1500);
        cmd.bidder_id = 404;

        let err = handle_place_bid(cmd, &store).await.unwrap_err();

        assert!(matches!(
            err,
            CommandError::Store(StoreError::NotFound { entity: "bidder", .. })
        ));
    }

    #[tokio::test]
    async fn catalogue_validation() {
        let store = InMemoryAuctionStore::new();
        let (event, item, _) = open_auction(&store).await;

        let bad_prefix = handle_create_category(
            &store,
            NewCategory {
                prefix: "A1".into(),
                description: String::new(),
            },
        )
        .await;
        assert!(matches!(bad_prefix, Err(CommandError::Invalid(_))));

        let inverted = handle_update_event(
            &store,
            event.id,
            UpdateEvent {
                end_at: Some(event.start_at - Duration::minutes(1)),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(inverted, Err(CommandError::Invalid(_))));

        let renumbered = handle_update_item(
            &store,
            item.id,
            UpdateItem {
                item_number: Some(0),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(renumbered, Err(CommandError::Invalid(_))));
    }

    #[tokio::test]
    async fn reinstating_an_item_clears_its_reason() {
        let store = InMemoryAuctionStore::new();
        let (_, item, _) = open_auction(&store).await;

        let withdrawn = handle_disqualify_item(
            &store,
            item.id,
            DisqualifyCommand {
                disqualified: true,
                reason: Some("donor withdrew".into()),
            },
        )
        .await
        .unwrap();
        assert!(withdrawn.disqualified);
        assert_eq!(withdrawn.disqualification_reason.as_deref(), Some("donor withdrew"));

        let reinstated = handle_disqualify_item(
            &store,
            item.id,
            DisqualifyCommand {
                disqualified: false,
                reason: Some("ignored".into()),
            },
        )
        .await
        .unwrap();
        assert!(!reinstated.disqualified);
        assert_eq!(reinstated.disqualification_reason, None);
    }
}
// endregion: --- Tests
