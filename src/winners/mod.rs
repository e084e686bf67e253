//! Winner resolution
//!
//! Picks one winning bid per item from a bid list that is already ranked by
//! `(item_id asc, bid_amount desc, created_at asc)`. The ranking is the
//! store's job (see `query::queries::GET_RANKED_BIDS`); this module never
//! re-sorts, so the first eligible bid seen for an item is its winner.
// region:    --- Imports
use crate::bidding::model::Bid;
use std::collections::HashSet;
use thiserror::Error;
// endregion: --- Imports

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterError {
    #[error("item_id and bidder_id cannot be combined")]
    ConflictingFilters,
}

// region:    --- Filter
/// Narrows the winners returned for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinnerScope {
    /// Every item of the event.
    Event,
    /// A single item.
    Item(i64),
    /// Only the items this bidder won.
    Bidder(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinnerFilter {
    pub event_id: i64,
    pub scope: WinnerScope,
}

impl WinnerFilter {
    pub fn event(event_id: i64) -> Self {
        Self {
            event_id,
            scope: WinnerScope::Event,
        }
    }

    pub fn item(event_id: i64, item_id: i64) -> Self {
        Self {
            event_id,
            scope: WinnerScope::Item(item_id),
        }
    }

    pub fn bidder(event_id: i64, bidder_id: i64) -> Self {
        Self {
            event_id,
            scope: WinnerScope::Bidder(bidder_id),
        }
    }

    /// Builds a filter from optional query parameters.
    pub fn from_parts(
        event_id: i64,
        item_id: Option<i64>,
        bidder_id: Option<i64>,
    ) -> Result<Self, FilterError> {
        match (item_id, bidder_id) {
            (None, None) => Ok(Self::event(event_id)),
            (Some(item_id), None) => Ok(Self::item(event_id, item_id)),
            (None, Some(bidder_id)) => Ok(Self::bidder(event_id, bidder_id)),
            (Some(_), Some(_)) => Err(FilterError::ConflictingFilters),
        }
    }

    fn admits(&self, winner: &Bid) -> bool {
        match self.scope {
            WinnerScope::Event => true,
            WinnerScope::Item(item_id) => winner.item_id == item_id,
            WinnerScope::Bidder(bidder_id) => winner.bidder_id == bidder_id,
        }
    }
}
// endregion: --- Filter

// region:    --- Resolution
/// Winning bids in the order their items first appear in `ranked_bids`.
///
/// Bids from other events and disqualified bids are skipped, so the next
/// eligible bid for the item takes its place. An item's winner is settled by
/// its first eligible bid even when the filter then leaves it out: a bidder
/// filter never promotes that bidder's lower bid on an item someone else won.
pub fn resolve_winners<'a>(ranked_bids: &'a [Bid], filter: &WinnerFilter) -> Vec<&'a Bid> {
    let mut settled: HashSet<i64> = HashSet::new();
    let mut winners = Vec::new();

    for bid in ranked_bids {
        if bid.event_id != filter.event_id || bid.disqualified {
            continue;
        }
        if !settled.insert(bid.item_id) {
            continue;
        }
        if filter.admits(bid) {
            winners.push(bid);
        }
    }

    winners
}
// endregion: --- Resolution

// endregion: --- Tests
