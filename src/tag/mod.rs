//! Tag numbers
//!
//! A tag number is the display label of an item: its category prefix followed
//! directly by its item number (`A12`). Tags are derived on demand and never
//! stored. Every listing that shows items or bids uses [`CategoryLookup::sort_items`]
//! so that tags read `A1, A2, ..., A10, B1` instead of insertion order.
// region:    --- Imports
use crate::bidding::model::{Category, Item};
use std::cmp::Ordering;
use std::collections::HashMap;
use thiserror::Error;
// endregion: --- Imports

// region:    --- Errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    #[error("unknown category: {0}")]
    UnknownCategory(i64),
    #[error("no category with prefix {0:?}")]
    UnknownPrefix(String),
    #[error("malformed tag number: {0:?}")]
    Malformed(String),
    #[error("item number cannot be negative: {0}")]
    NegativeItemNumber(i32),
}
// endregion: --- Errors

// region:    --- Tag Numbered Records
/// A record that can be labelled with a tag number.
pub trait TagNumbered {
    fn category_id(&self) -> i64;
    fn item_number(&self) -> i32;
}

impl TagNumbered for Item {
    fn category_id(&self) -> i64 {
        self.category_id
    }

    fn item_number(&self) -> i32 {
        self.item_number
    }
}

impl<T: TagNumbered + ?Sized> TagNumbered for &T {
    fn category_id(&self) -> i64 {
        (**self).category_id()
    }

    fn item_number(&self) -> i32 {
        (**self).item_number()
    }
}
// endregion: --- Tag Numbered Records

// region:    --- Category Lookup
/// Category table keyed by id.
#[derive(Debug, Clone, Default)]
pub struct CategoryLookup {
    by_id: HashMap<i64, Category>,
}

impl CategoryLookup {
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            by_id: categories.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    pub fn get(&self, category_id: i64) -> Result<&Category, TagError> {
        self.by_id
            .get(&category_id)
            .ok_or(TagError::UnknownCategory(category_id))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Tag for `(category_id, item_number)`, e.g. `("A", 12)` gives `"A12"`.
    ///
    /// Negative numbers are refused since `parse_tag` could not read them back.
    pub fn tag(&self, category_id: i64, item_number: i32) -> Result<String, TagError> {
        if item_number < 0 {
            return Err(TagError::NegativeItemNumber(item_number));
        }
        let category = self.get(category_id)?;
        Ok(format!("{}{}", category.prefix, item_number))
    }

    pub fn tag_of<T: TagNumbered>(&self, record: &T) -> Result<String, TagError> {
        self.tag(record.category_id(), record.item_number())
    }

    /// Stable sort by category prefix, then item number.
    ///
    /// Fails without sorting if any record references an unknown category.
    pub fn sort_items<T: TagNumbered>(&self, items: Vec<T>) -> Result<Vec<T>, TagError> {
        let mut keyed = items
            .into_iter()
            .map(|item| {
                let prefix = self.get(item.category_id())?.prefix.as_str();
                Ok((prefix, item))
            })
            .collect::<Result<Vec<_>, TagError>>()?;

        keyed.sort_by(|(prefix_a, a), (prefix_b, b)| {
            compare_prefixes(prefix_a, prefix_b)
                .then_with(|| a.item_number().cmp(&b.item_number()))
        });

        Ok(keyed.into_iter().map(|(_, item)| item).collect())
    }

    /// Inverse of [`CategoryLookup::tag`] for prefixes without digits.
    pub fn parse_tag(&self, tag: &str) -> Result<(i64, i32), TagError> {
        let tag = tag.trim();
        let split = tag.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        let (prefix, digits) = tag.split_at(split);

        // generated tags never carry leading zeros
        if prefix.is_empty() || digits.is_empty() || (digits.len() > 1 && digits.starts_with('0'))
        {
            return Err(TagError::Malformed(tag.to_string()));
        }
        let item_number: i32 = digits
            .parse()
            .map_err(|_| TagError::Malformed(tag.to_string()))?;

        let category = self
            .by_id
            .values()
            .find(|c| c.prefix == prefix)
            .ok_or_else(|| TagError::UnknownPrefix(prefix.to_string()))?;

        Ok((category.id, item_number))
    }
}
// endregion: --- Category Lookup

/// Case-insensitive ordering; on a tie lowercase sorts first.
pub fn compare_prefixes(a: &str, b: &str) -> Ordering {
    let folded_a = a.chars().flat_map(char::to_lowercase);
    let folded_b = b.chars().flat_map(char::to_lowercase);
    folded_a.cmp(folded_b).then_with(|| b.cmp(a))
}

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Tagged {
        category_id: i64,
        item_number: i32,
    }

    impl TagNumbered for Tagged {
        fn category_id(&self) -> i64 {
            self.category_id
        }

        fn item_number(&self) -> i32 {
            self.item_number
        }
    }

    fn category(id: i64, prefix: &str) -> Category {
        Category {
            id,
            prefix: prefix.to_string(),
            description: format!("{prefix} category"),
        }
    }

    fn lookup() -> CategoryLookup {
        CategoryLookup::new(vec![category(1, "A"), category(2, "B"), category(3, "Jw")])
    }

    fn tagged(category_id: i64, item_number: i32) -> Tagged {
        Tagged {
            category_id,
            item_number,
        }
    }

    fn tags(lookup: &CategoryLookup, items: &[Tagged]) -> Vec<String> {
        items.iter().map(|i| lookup.tag_of(i).unwrap()).collect()
    }

    #[test]
    fn tag_concatenates_prefix_and_number() {
        let lookup = lookup();
        assert_eq!(lookup.tag(1, 12).unwrap(), "A12");
        assert_eq!(lookup.tag(3, 7).unwrap(), "Jw7");
        assert_eq!(lookup.tag(2, 0).unwrap(), "B0");
    }

    #[test]
    fn tag_for_unknown_category_fails() {
        assert_eq!(lookup().tag(42, 1), Err(TagError::UnknownCategory(42)));
    }

    #[test]
    fn tag_rejects_negative_item_numbers() {
        let lookup = lookup();
        assert_eq!(lookup.tag(1, -5), Err(TagError::NegativeItemNumber(-5)));
        assert_eq!(
            lookup.tag_of(&tagged(2, -1)),
            Err(TagError::NegativeItemNumber(-1))
        );
        let tag = lookup.tag(1, 5).unwrap();
        assert_eq!(lookup.parse_tag(&tag).unwrap(), (1, 5));
    }

    #[test]
    fn sorts_by_prefix_then_numeric_item_number() {
        let lookup = lookup();
        let items = vec![tagged(2, 2), tagged(1, 10), tagged(1, 2), tagged(2, 1)];

        let sorted = lookup.sort_items(items).unwrap();

        assert_eq!(tags(&lookup, &sorted), vec!["A2", "A10", "B1", "B2"]);
    }

    #[test]
    fn sorting_is_idempotent() {
        let lookup = lookup();
        let items = vec![tagged(3, 1), tagged(1, 3), tagged(2, 11), tagged(1, 1)];

        let once = lookup.sort_items(items).unwrap();
        let twice = lookup.sort_items(once.clone()).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn sorting_is_stable_for_equal_tags() {
        #[derive(Debug, Clone, PartialEq)]
        struct Row(Tagged, &'static str);
        impl TagNumbered for Row {
            fn category_id(&self) -> i64 {
                self.0.category_id
            }
            fn item_number(&self) -> i32 {
                self.0.item_number
            }
        }

        let rows = vec![
            Row(tagged(2, 1), "first"),
            Row(tagged(1, 1), "a"),
            Row(tagged(2, 1), "second"),
        ];
        let sorted = lookup().sort_items(rows).unwrap();

        let labels: Vec<_> = sorted.iter().map(|r| r.1).collect();
        assert_eq!(labels, vec!["a", "first", "second"]);
    }

    #[test]
    fn sorting_fails_on_unknown_category() {
        let result = lookup().sort_items(vec![tagged(1, 1), tagged(9, 1)]);
        assert_eq!(result, Err(TagError::UnknownCategory(9)));
    }

    #[test]
    fn prefix_comparison_ignores_case_first() {
        assert_eq!(compare_prefixes("a", "B"), Ordering::Less);
        assert_eq!(compare_prefixes("B", "a"), Ordering::Greater);
        assert_eq!(compare_prefixes("a", "A"), Ordering::Less);
        assert_eq!(compare_prefixes("Jw", "JW"), Ordering::Less);
        assert_eq!(compare_prefixes("A", "A"), Ordering::Equal);
        assert_eq!(compare_prefixes("A", "AB"), Ordering::Less);
    }

    #[test]
    fn parse_reverses_generated_tags() {
        let lookup = lookup();
        for (category_id, item_number) in [(1, 1), (1, 10), (2, 305), (3, 0)] {
            let tag = lookup.tag(category_id, item_number).unwrap();
            assert_eq!(lookup.parse_tag(&tag).unwrap(), (category_id, item_number));
        }
    }

    #[test]
    fn parse_rejects_malformed_and_unknown_tags() {
        let lookup = lookup();
        assert_eq!(
            lookup.parse_tag("12"),
            Err(TagError::Malformed("12".to_string()))
        );
        assert_eq!(
            lookup.parse_tag("A"),
            Err(TagError::Malformed("A".to_string()))
        );
        assert_eq!(
            lookup.parse_tag("A012"),
            Err(TagError::Malformed("A012".to_string()))
        );
        assert_eq!(
            lookup.parse_tag("Z3"),
            Err(TagError::UnknownPrefix("Z".to_string()))
        );
    }
}
// endregion: --- Tests
