use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Monetary amounts are whole cents.
pub type Cents = i64;

// region:    --- Records

// Category model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub prefix: String,
    pub description: String,
}

// Event model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub enabled: bool,
    pub release_winners: bool,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Whether the event accepts bids at `now`.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.start_at <= now && now <= self.end_at
    }
}

// Item model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: i64,
    pub event_id: i64,
    pub category_id: i64,
    pub item_number: i32,
    pub description: String,
    pub minimum_bid: Option<Cents>,
    pub disqualified: bool,
    pub disqualification_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Bidder model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bidder {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// Bid model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub event_id: i64,
    pub item_id: i64,
    pub bidder_id: i64,
    pub bid_amount: Cents,
    pub created_at: DateTime<Utc>,
    pub disqualified: bool,
}

// endregion: --- Records

// region:    --- Inputs

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub prefix: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub release_winners: bool,
}

/// Partial event update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEvent {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub enabled: Option<bool>,
    pub release_winners: Option<bool>,
}

impl UpdateEvent {
    pub fn apply(self, event: &mut Event) {
        if let Some(name) = self.name {
            event.name = name;
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(start_at) = self.start_at {
            event.start_at = start_at;
        }
        if let Some(end_at) = self.end_at {
            event.end_at = end_at;
        }
        if let Some(enabled) = self.enabled {
            event.enabled = enabled;
        }
        if let Some(release_winners) = self.release_winners {
            event.release_winners = release_winners;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub category_id: i64,
    pub item_number: i32,
    pub description: String,
    pub minimum_bid: Option<Cents>,
}

/// Partial item update. `minimum_bid: Some(None)` clears the minimum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateItem {
    pub category_id: Option<i64>,
    pub item_number: Option<i32>,
    pub description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "double_option"
    )]
    pub minimum_bid: Option<Option<Cents>>,
}

impl UpdateItem {
    pub fn apply(self, item: &mut Item) {
        if let Some(category_id) = self.category_id {
            item.category_id = category_id;
        }
        if let Some(item_number) = self.item_number {
            item.item_number = item_number;
        }
        if let Some(description) = self.description {
            item.description = description;
        }
        if let Some(minimum_bid) = self.minimum_bid {
            item.minimum_bid = minimum_bid;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBidder {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBid {
    pub event_id: i64,
    pub item_id: i64,
    pub bidder_id: i64,
    pub bid_amount: Cents,
}

// endregion: --- Inputs

// Distinguishes an absent field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
