// region:    --- Categories

/// All categories
pub const GET_CATEGORIES: &str = "SELECT id, prefix, description FROM categories ORDER BY id";

/// New category
pub const INSERT_CATEGORY: &str =
    "INSERT INTO categories (prefix, description) VALUES ($1, $2) RETURNING id, prefix, description";

/// Single category
pub const GET_CATEGORY: &str = "SELECT id, prefix, description FROM categories WHERE id = $1";

// endregion: --- Categories

// region:    --- Events

/// All events, newest window first
pub const GET_EVENTS: &str = r#"
    SELECT id, name, description, start_at, end_at, enabled, release_winners, created_at
    FROM events
    ORDER BY start_at DESC, id DESC
"#;

/// Single event
pub const GET_EVENT: &str = r#"
    SELECT id, name, description, start_at, end_at, enabled, release_winners, created_at
    FROM events
    WHERE id = $1
"#;

/// Single event, locked for update
pub const GET_EVENT_FOR_UPDATE: &str = r#"
    SELECT id, name, description, start_at, end_at, enabled, release_winners, created_at
    FROM events
    WHERE id = $1
    FOR UPDATE
"#;

/// New event
pub const INSERT_EVENT: &str = r#"
    INSERT INTO events (name, description, start_at, end_at, enabled, release_winners)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING id, name, description, start_at, end_at, enabled, release_winners, created_at
"#;

/// Overwrite every mutable event column
pub const UPDATE_EVENT: &str = r#"
    UPDATE events
    SET name = $2, description = $3, start_at = $4, end_at = $5, enabled = $6, release_winners = $7
    WHERE id = $1
    RETURNING id, name, description, start_at, end_at, enabled, release_winners, created_at
"#;

// endregion: --- Events

// region:    --- Items

/// Items of an event in insertion order; callers sort by tag
pub const GET_EVENT_ITEMS: &str = r#"
    SELECT id, event_id, category_id, item_number, description, minimum_bid,
           disqualified, disqualification_reason, created_at
    FROM items
    WHERE event_id = $1
    ORDER BY id
"#;

/// Single item
pub const GET_ITEM: &str = r#"
    SELECT id, event_id, category_id, item_number, description, minimum_bid,
           disqualified, disqualification_reason, created_at
    FROM items
    WHERE id = $1
"#;

/// Single item, locked for update
pub const GET_ITEM_FOR_UPDATE: &str = r#"
    SELECT id, event_id, category_id, item_number, description, minimum_bid,
           disqualified, disqualification_reason, created_at
    FROM items
    WHERE id = $1
    FOR UPDATE
"#;

/// New item
pub const INSERT_ITEM: &str = r#"
    INSERT INTO items (event_id, category_id, item_number, description, minimum_bid)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, event_id, category_id, item_number, description, minimum_bid,
              disqualified, disqualification_reason, created_at
"#;

/// Overwrite the editable item columns
pub const UPDATE_ITEM: &str = r#"
    UPDATE items
    SET category_id = $2, item_number = $3, description = $4, minimum_bid = $5
    WHERE id = $1
    RETURNING id, event_id, category_id, item_number, description, minimum_bid,
              disqualified, disqualification_reason, created_at
"#;

/// Set or clear item disqualification
pub const UPDATE_ITEM_DISQUALIFICATION: &str = r#"
    UPDATE items
    SET disqualified = $2, disqualification_reason = $3
    WHERE id = $1
    RETURNING id, event_id, category_id, item_number, description, minimum_bid,
              disqualified, disqualification_reason, created_at
"#;

// endregion: --- Items

// region:    --- Bidders

/// New bidder
pub const INSERT_BIDDER: &str =
    "INSERT INTO bidders (name, email) VALUES ($1, $2) RETURNING id, name, email, created_at";

/// Single bidder
pub const GET_BIDDER: &str = "SELECT id, name, email, created_at FROM bidders WHERE id = $1";

// endregion: --- Bidders

// region:    --- Bids

/// New bid
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (event_id, item_id, bidder_id, bid_amount, created_at)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, event_id, item_id, bidder_id, bid_amount, created_at, disqualified
"#;

/// Set or clear bid disqualification
pub const UPDATE_BID_DISQUALIFICATION: &str = r#"
    UPDATE bids
    SET disqualified = $2
    WHERE id = $1
    RETURNING id, event_id, item_id, bidder_id, bid_amount, created_at, disqualified
"#;

/// One bidder's bids in an event, disqualified ones included
pub const GET_BIDDER_BIDS: &str = r#"
    SELECT id, event_id, item_id, bidder_id, bid_amount, created_at, disqualified
    FROM bids
    WHERE event_id = $1 AND bidder_id = $2
    ORDER BY created_at ASC, id ASC
"#;

/// Eligible bids of an event in winner order: per item, highest first, earliest on ties.
/// Disqualified bids and bids on disqualified items are excluded.
pub const GET_RANKED_BIDS: &str = r#"
    SELECT b.id, b.event_id, b.item_id, b.bidder_id, b.bid_amount, b.created_at, b.disqualified
    FROM bids b
    JOIN items i ON i.id = b.item_id
    WHERE b.event_id = $1
      AND b.disqualified = FALSE
      AND i.disqualified = FALSE
    ORDER BY b.item_id ASC, b.bid_amount DESC, b.created_at ASC, b.id ASC
"#;

// endregion: --- Bids
