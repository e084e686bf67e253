use super::{AuctionStore, StoreError, StoreResult};
use crate::bidding::model::{
    Bid, Bidder, Category, Event, Item, NewBid, NewBidder, NewCategory, NewEvent, NewItem,
    UpdateEvent, UpdateItem,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Tables {
    next_id: i64,
    categories: Vec<Category>,
    events: Vec<Event>,
    items: Vec<Item>,
    bidders: Vec<Bidder>,
    bids: Vec<Bid>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn event_mut(&mut self, event_id: i64) -> StoreResult<&mut Event> {
        self.events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or(StoreError::not_found("event", event_id))
    }

    fn item_mut(&mut self, item_id: i64) -> StoreResult<&mut Item> {
        self.items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(StoreError::not_found("item", item_id))
    }

    fn bid_mut(&mut self, bid_id: i64) -> StoreResult<&mut Bid> {
        self.bids
            .iter_mut()
            .find(|b| b.id == bid_id)
            .ok_or(StoreError::not_found("bid", bid_id))
    }

    // Mirrors the foreign keys and uq_items_event_category_number of the schema.
    fn check_item(
        &self,
        item_id: Option<i64>,
        event_id: i64,
        category_id: i64,
        item_number: i32,
    ) -> StoreResult<()> {
        if !self.events.iter().any(|e| e.id == event_id) {
            return Err(StoreError::Constraint("items_event_id_fkey".into()));
        }
        if !self.categories.iter().any(|c| c.id == category_id) {
            return Err(StoreError::Constraint("items_category_id_fkey".into()));
        }
        let taken = self.items.iter().any(|i| {
            Some(i.id) != item_id
                && i.event_id == event_id
                && i.category_id == category_id
                && i.item_number == item_number
        });
        if taken {
            return Err(StoreError::Conflict("uq_items_event_category_number".into()));
        }
        Ok(())
    }
}

/// [`AuctionStore`] held in process memory with the same uniqueness and
/// ranking rules as the Postgres schema.
#[derive(Default)]
pub struct InMemoryAuctionStore {
    tables: Mutex<Tables>,
}

impl InMemoryAuctionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AuctionStore for InMemoryAuctionStore {
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        Ok(self.tables().categories.clone())
    }

    async fn get_category(&self, category_id: i64) -> StoreResult<Category> {
        self.tables()
            .categories
            .iter()
            .find(|c| c.id == category_id)
            .cloned()
            .ok_or(StoreError::not_found("category", category_id))
    }

    async fn create_category(&self, input: &NewCategory) -> StoreResult<Category> {
        let mut tables = self.tables();
        if tables.categories.iter().any(|c| c.prefix == input.prefix) {
            return Err(StoreError::Conflict("uq_categories_prefix".into()));
        }
        let category = Category {
            id: tables.next_id(),
            prefix: input.prefix.clone(),
            description: input.description.clone(),
        };
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        let mut events = self.tables().events.clone();
        events.sort_by(|a, b| b.start_at.cmp(&a.start_at).then_with(|| b.id.cmp(&a.id)));
        Ok(events)
    }

    async fn get_event(&self, event_id: i64) -> StoreResult<Event> {
        Ok(self.tables().event_mut(event_id)?.clone())
    }

    async fn create_event(&self, input: &NewEvent) -> StoreResult<Event> {
        let mut tables = self.tables();
        let event = Event {
            id: tables.next_id(),
            name: input.name.clone(),
            description: input.description.clone(),
            start_at: input.start_at,
            end_at: input.end_at,
            enabled: input.enabled,
            release_winners: input.release_winners,
            created_at: Utc::now(),
        };
        tables.events.push(event.clone());
        Ok(event)
    }

    async fn update_event(&self, event_id: i64, changes: UpdateEvent) -> StoreResult<Event> {
        let mut tables = self.tables();
        let event = tables.event_mut(event_id)?;
        changes.apply(event);
        Ok(event.clone())
    }

    async fn list_items(&self, event_id: i64) -> StoreResult<Vec<Item>> {
        Ok(self
            .tables()
            .items
            .iter()
            .filter(|i| i.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn get_item(&self, item_id: i64) -> StoreResult<Item> {
        Ok(self.tables().item_mut(item_id)?.clone())
    }

    async fn create_item(&self, event_id: i64, input: &NewItem) -> StoreResult<Item> {
        let mut tables = self.tables();
        tables.check_item(None, event_id, input.category_id, input.item_number)?;
        let item = Item {
            id: tables.next_id(),
            event_id,
            category_id: input.category_id,
            item_number: input.item_number,
            description: input.description.clone(),
            minimum_bid: input.minimum_bid,
            disqualified: false,
            disqualification_reason: None,
            created_at: Utc::now(),
        };
        tables.items.push(item.clone());
        Ok(item)
    }

    async fn update_item(&self, item_id: i64, changes: UpdateItem) -> StoreResult<Item> {
        let mut tables = self.tables();
        let mut updated = tables.item_mut(item_id)?.clone();
        changes.apply(&mut updated);
        tables.check_item(
            Some(item_id),
            updated.event_id,
            updated.category_id,
            updated.item_number,
        )?;
        *tables.item_mut(item_id)? = updated.clone();
        Ok(updated)
    }

    async fn set_item_disqualified(
        &self,
        item_id: i64,
        disqualified: bool,
        reason: Option<String>,
    ) -> StoreResult<Item> {
        let mut tables = self.tables();
        let item = tables.item_mut(item_id)?;
        item.disqualified = disqualified;
        item.disqualification_reason = reason;
        Ok(item.clone())
    }

    async fn create_bidder(&self, input: &NewBidder) -> StoreResult<Bidder> {
        let mut tables = self.tables();
        if tables.bidders.iter().any(|b| b.email == input.email) {
            return Err(StoreError::Conflict("uq_bidders_email".into()));
        }
        let bidder = Bidder {
            id: tables.next_id(),
            name: input.name.clone(),
            email: input.email.clone(),
            created_at: Utc::now(),
        };
        tables.bidders.push(bidder.clone());
        Ok(bidder)
    }

    async fn get_bidder(&self, bidder_id: i64) -> StoreResult<Bidder> {
        self.tables()
            .bidders
            .iter()
            .find(|b| b.id == bidder_id)
            .cloned()
            .ok_or(StoreError::not_found("bidder", bidder_id))
    }

    async fn insert_bid(&self, input: &NewBid, created_at: DateTime<Utc>) -> StoreResult<Bid> {
        let mut tables = self.tables();
        if !tables.items.iter().any(|i| i.id == input.item_id) {
            return Err(StoreError::Constraint("bids_item_id_fkey".into()));
        }
        if !tables.bidders.iter().any(|b| b.id == input.bidder_id) {
            return Err(StoreError::Constraint("bids_bidder_id_fkey".into()));
        }
        let duplicate = tables.bids.iter().any(|b| {
            b.event_id == input.event_id
                && b.bidder_id == input.bidder_id
                && b.item_id == input.item_id
        });
        if duplicate {
            return Err(StoreError::Conflict("uq_bids_event_bidder_item".into()));
        }
        let bid = Bid {
            id: tables.next_id(),
            event_id: input.event_id,
            item_id: input.item_id,
            bidder_id: input.bidder_id,
            bid_amount: input.bid_amount,
            created_at,
            disqualified: false,
        };
        tables.bids.push(bid.clone());
        Ok(bid)
    }

    async fn set_bid_disqualified(&self, bid_id: i64, disqualified: bool) -> StoreResult<Bid> {
        let mut tables = self.tables();
        let bid = tables.bid_mut(bid_id)?;
        bid.disqualified = disqualified;
        Ok(bid.clone())
    }

    async fn list_bidder_bids(&self, event_id: i64, bidder_id: i64) -> StoreResult<Vec<Bid>> {
        let mut bids: Vec<Bid> = self
            .tables()
            .bids
            .iter()
            .filter(|b| b.event_id == event_id && b.bidder_id == bidder_id)
            .cloned()
            .collect();
        bids.sort_by_key(|b| (b.created_at, b.id));
        Ok(bids)
    }

    async fn list_ranked_bids(&self, event_id: i64) -> StoreResult<Vec<Bid>> {
        let tables = self.tables();
        let mut bids: Vec<Bid> = tables
            .bids
            .iter()
            .filter(|b| b.event_id == event_id && !b.disqualified)
            .filter(|b| {
                tables
                    .items
                    .iter()
                    .any(|i| i.id == b.item_id && !i.disqualified)
            })
            .cloned()
            .collect();
        bids.sort_by(|a, b| {
            a.item_id
                .cmp(&b.item_id)
                .then_with(|| b.bid_amount.cmp(&a.bid_amount))
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(bids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap()
    }

    async fn seeded() -> (InMemoryAuctionStore, Event, Item, Item, Bidder, Bidder) {
        let store = InMemoryAuctionStore::new();
        let category = store
            .create_category(&NewCategory {
                prefix: "A".into(),
                description: "Art".into(),
            })
            .await
            .unwrap();
        let event = store
            .create_event(&NewEvent {
                name: "Spring Gala".into(),
                description: String::new(),
                start_at: start(),
                end_at: start() + Duration::hours(3),
                enabled: true,
                release_winners: false,
            })
            .await
            .unwrap();
        let mut items = Vec::new();
        for item_number in [1, 2] {
            let item = store
                .create_item(
                    event.id,
                    &NewItem {
                        category_id: category.id,
                        item_number,
                        description: format!("Painting {item_number}"),
                        minimum_bid: None,
                    },
                )
                .await
                .unwrap();
            items.push(item);
        }
        let mut bidders = Vec::new();
        for name in ["ada", "bo"] {
            let bidder = store
                .create_bidder(&NewBidder {
                    name: name.into(),
                    email: format!("{name}@example.com"),
                })
                .await
                .unwrap();
            bidders.push(bidder);
        }
        let second_item = items.pop().unwrap();
        let first_item = items.pop().unwrap();
        let bo = bidders.pop().unwrap();
        let ada = bidders.pop().unwrap();
        (store, event, first_item, second_item, ada, bo)
    }

    fn new_bid(event: &Event, item: &Item, bidder: &Bidder, bid_amount: i64) -> NewBid {
        NewBid {
            event_id: event.id,
            item_id: item.id,
            bidder_id: bidder.id,
            bid_amount,
        }
    }

    #[tokio::test]
    async fn second_bid_by_same_bidder_on_item_conflicts() {
        let (store, event, item, _, ada, _) = seeded().await;

        store
            .insert_bid(&new_bid(&event, &item, &ada, 1000), start())
            .await
            .unwrap();
        let err = store
            .insert_bid(&new_bid(&event, &item, &ada, 2000), start())
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict(name) if name == "uq_bids_event_bidder_item"));
    }

    #[tokio::test]
    async fn duplicate_item_number_in_category_conflicts() {
        let (store, event, item, _, _, _) = seeded().await;

        let err = store
            .create_item(
                event.id,
                &NewItem {
                    category_id: item.category_id,
                    item_number: item.item_number,
                    description: "Copy".into(),
                    minimum_bid: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn ranked_bids_order_and_exclusions() {
        let (store, event, first, second, ada, bo) = seeded().await;
        let early = start() + Duration::minutes(5);
        let late = start() + Duration::minutes(10);

        let tie_late = store
            .insert_bid(&new_bid(&event, &first, &bo, 5000), late)
            .await
            .unwrap();
        let tie_early = store
            .insert_bid(&new_bid(&event, &first, &ada, 5000), early)
            .await
            .unwrap();
        let dropped = store
            .insert_bid(&new_bid(&event, &second, &ada, 9000), early)
            .await
            .unwrap();
        let kept = store
            .insert_bid(&new_bid(&event, &second, &bo, 100), late)
            .await
            .unwrap();
        store.set_bid_disqualified(dropped.id, true).await.unwrap();

        let ranked: Vec<i64> = store
            .list_ranked_bids(event.id)
            .await
            .unwrap()
            .iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ranked, vec![tie_early.id, tie_late.id, kept.id]);

        store
            .set_item_disqualified(second.id, true, Some("withdrawn".into()))
            .await
            .unwrap();
        let ranked = store.list_ranked_bids(event.id).await.unwrap();
        assert!(ranked.iter().all(|b| b.item_id == first.id));
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let store = InMemoryAuctionStore::new();

        assert!(matches!(
            store.get_event(99).await,
            Err(StoreError::NotFound { entity: "event", id: 99 })
        ));
        assert!(matches!(
            store.set_bid_disqualified(5, true).await,
            Err(StoreError::NotFound { entity: "bid", .. })
        ));
    }
}
