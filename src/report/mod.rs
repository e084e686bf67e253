//! Reports
//!
//! Read models built on top of the store: the tagged item listing, a bidder's
//! bid sheet and the winner report. The `build_*` functions are pure; the
//! async wrappers only load their inputs.
// region:    --- Imports
use crate::bidding::model::{Bid, Bidder, Cents, Event, Item};
use crate::store::{AuctionStore, StoreError};
use crate::tag::{CategoryLookup, TagError, TagNumbered};
use crate::winners::{resolve_winners, WinnerFilter};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::info;
// endregion: --- Imports

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Tag(#[from] TagError),
    #[error("bid references item {0} which is not part of the event")]
    UnknownItem(i64),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// `$1,234.50`; negative amounts read `-$1.00`.
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let digits = (abs / 100).to_string();

    let mut dollars = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            dollars.push(',');
        }
        dollars.push(ch);
    }

    format!("{sign}${dollars}.{:02}", abs % 100)
}

// region:    --- Views
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedItem {
    pub tag: String,
    #[serde(flatten)]
    pub item: Item,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinnerRow {
    pub tag: String,
    pub item_id: i64,
    pub description: String,
    pub bid_id: i64,
    pub bidder_id: i64,
    pub bid_amount: Cents,
    pub formatted_amount: String,
    #[serde(skip)]
    category_id: i64,
    #[serde(skip)]
    item_number: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BidderSummary {
    pub bidder_id: i64,
    pub items_won: usize,
    pub total: Cents,
    pub formatted_total: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinnerReport {
    pub event_id: i64,
    pub event_name: String,
    /// One row per won item, in tag order.
    pub rows: Vec<WinnerRow>,
    /// Ordered by bidder id.
    pub bidders: Vec<BidderSummary>,
    pub gross: Cents,
    pub formatted_gross: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BidSheetRow {
    pub tag: String,
    pub item_id: i64,
    pub description: String,
    pub bid_id: i64,
    pub bid_amount: Cents,
    pub formatted_amount: String,
    pub created_at: DateTime<Utc>,
    pub disqualified: bool,
    #[serde(skip)]
    category_id: i64,
    #[serde(skip)]
    item_number: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BidSheet {
    pub event_id: i64,
    pub bidder_id: i64,
    pub bidder_name: String,
    pub rows: Vec<BidSheetRow>,
}

impl TagNumbered for WinnerRow {
    fn category_id(&self) -> i64 {
        self.category_id
    }

    fn item_number(&self) -> i32 {
        self.item_number
    }
}

impl TagNumbered for BidSheetRow {
    fn category_id(&self) -> i64 {
        self.category_id
    }

    fn item_number(&self) -> i32 {
        self.item_number
    }
}
// endregion: --- Views

// region:    --- Builders
/// Items with their tags, in tag order.
pub fn tag_items(lookup: &CategoryLookup, items: Vec<Item>) -> Result<Vec<TaggedItem>, TagError> {
    lookup
        .sort_items(items)?
        .into_iter()
        .map(|item| {
            Ok(TaggedItem {
                tag: lookup.tag_of(&item)?,
                item,
            })
        })
        .collect()
}

pub fn build_winner_report(
    event: &Event,
    items: &[Item],
    lookup: &CategoryLookup,
    ranked_bids: &[Bid],
    filter: &WinnerFilter,
) -> Result<WinnerReport, ReportError> {
    let items_by_id: HashMap<i64, &Item> = items.iter().map(|i| (i.id, i)).collect();

    let mut rows = Vec::new();
    for bid in resolve_winners(ranked_bids, filter) {
        let item = items_by_id
            .get(&bid.item_id)
            .ok_or(ReportError::UnknownItem(bid.item_id))?;
        rows.push(WinnerRow {
            tag: lookup.tag_of(*item)?,
            item_id: item.id,
            description: item.description.clone(),
            bid_id: bid.id,
            bidder_id: bid.bidder_id,
            bid_amount: bid.bid_amount,
            formatted_amount: format_cents(bid.bid_amount),
            category_id: item.category_id,
            item_number: item.item_number,
        });
    }
    let rows = lookup.sort_items(rows)?;

    let mut per_bidder: BTreeMap<i64, (usize, Cents)> = BTreeMap::new();
    for row in &rows {
        let entry = per_bidder.entry(row.bidder_id).or_default();
        entry.0 += 1;
        entry.1 += row.bid_amount;
    }
    let bidders = per_bidder
        .into_iter()
        .map(|(bidder_id, (items_won, total))| BidderSummary {
            bidder_id,
            items_won,
            total,
            formatted_total: format_cents(total),
        })
        .collect();

    let gross: Cents = rows.iter().map(|r| r.bid_amount).sum();
    Ok(WinnerReport {
        event_id: event.id,
        event_name: event.name.clone(),
        rows,
        bidders,
        gross,
        formatted_gross: format_cents(gross),
    })
}

/// A bidder's bids in tag order, disqualified bids included and flagged.
pub fn build_bid_sheet(
    event_id: i64,
    bidder: &Bidder,
    items: &[Item],
    lookup: &CategoryLookup,
    bids: &[Bid],
) -> Result<BidSheet, ReportError> {
    let items_by_id: HashMap<i64, &Item> = items.iter().map(|i| (i.id, i)).collect();

    let rows = bids
        .iter()
        .map(|bid| {
            let item = items_by_id
                .get(&bid.item_id)
                .ok_or(ReportError::UnknownItem(bid.item_id))?;
            Ok(BidSheetRow {
                tag: lookup.tag_of(*item)?,
                item_id: item.id,
                description: item.description.clone(),
                bid_id: bid.id,
                bid_amount: bid.bid_amount,
                formatted_amount: format_cents(bid.bid_amount),
                created_at: bid.created_at,
                disqualified: bid.disqualified,
                category_id: item.category_id,
                item_number: item.item_number,
            })
        })
        .collect::<Result<Vec<_>, ReportError>>()?;

    Ok(BidSheet {
        event_id,
        bidder_id: bidder.id,
        bidder_name: bidder.name.clone(),
        rows: lookup.sort_items(rows)?,
    })
}
// endregion: --- Builders

// region:    --- Loaders
async fn categories(store: &dyn AuctionStore) -> Result<CategoryLookup, StoreError> {
    Ok(CategoryLookup::new(store.list_categories().await?))
}

/// Tagged item listing of an event.
pub async fn item_listing(
    store: &dyn AuctionStore,
    event_id: i64,
) -> Result<Vec<TaggedItem>, ReportError> {
    info!("{:<12} --> item listing of event {}", "Report", event_id);
    store.get_event(event_id).await?;
    let lookup = categories(store).await?;
    let items = store.list_items(event_id).await?;
    Ok(tag_items(&lookup, items)?)
}

/// Winner report of `event`, narrowed by `filter`.
pub async fn winner_report(
    store: &dyn AuctionStore,
    event: &Event,
    filter: &WinnerFilter,
) -> Result<WinnerReport, ReportError> {
    info!(
        "{:<12} --> winner report of event {} ({:?})",
        "Report", event.id, filter.scope
    );
    let lookup = categories(store).await?;
    let items = store.list_items(event.id).await?;
    let ranked_bids = store.list_ranked_bids(event.id).await?;
    build_winner_report(event, &items, &lookup, &ranked_bids, filter)
}

pub async fn bid_sheet(
    store: &dyn AuctionStore,
    event_id: i64,
    bidder_id: i64,
) -> Result<BidSheet, ReportError> {
    info!(
        "{:<12} --> bid sheet of bidder {} in event {}",
        "Report", bidder_id, event_id
    );
    store.get_event(event_id).await?;
    let bidder = store.get_bidder(bidder_id).await?;
    let lookup = categories(store).await?;
    let items = store.list_items(event_id).await?;
    let bids = store.list_bidder_bids(event_id, bidder_id).await?;
    build_bid_sheet(event_id, &bidder, &items, &lookup, &bids)
}
// endregion: --- Loaders

// endregion: --- Tests
