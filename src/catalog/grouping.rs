//! Sorting and month/year grouping of catalog items.

use crate::types::{CatalogItem, ItemId};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Group key for items whose release date cannot be parsed
pub const UNKNOWN_GROUP: &str = "Unknown";

/// Internal ordering key: dated months chronologically, then the fallback group
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum GroupKey {
    Month { year: i32, month: u32 },
    Unknown,
}

impl GroupKey {
    fn for_date(date: Option<DateTime<Utc>>) -> Self {
        match date {
            Some(date) => GroupKey::Month {
                year: date.year(),
                month: date.month(),
            },
            None => GroupKey::Unknown,
        }
    }

    fn label(self) -> String {
        match self {
            GroupKey::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1)
                .map(|first| first.format("%B %Y").to_string())
                .unwrap_or_else(|| UNKNOWN_GROUP.to_string()),
            GroupKey::Unknown => UNKNOWN_GROUP.to_string(),
        }
    }
}

/// One display section: a month/year label and its items in release order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogGroup {
    /// Section label, e.g. "January 2020", or [`UNKNOWN_GROUP`]
    pub key: String,
    /// Items ascending by release date
    pub items: Vec<CatalogItem>,
}

/// The catalog as published to the UI
///
/// Sections are in chronological order with the [`UNKNOWN_GROUP`] section, if any,
/// last. Every input item appears in exactly one section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogGrouping {
    groups: Vec<CatalogGroup>,
}

impl CatalogGrouping {
    /// Sort and group `items`
    pub fn from_items(mut items: Vec<CatalogItem>) -> Self {
        sort_by_release_date(&mut items);

        let mut buckets: BTreeMap<GroupKey, Vec<CatalogItem>> = BTreeMap::new();
        for item in items {
            buckets
                .entry(GroupKey::for_date(item.release_date()))
                .or_default()
                .push(item);
        }

        let groups = buckets
            .into_iter()
            .map(|(key, items)| CatalogGroup {
                key: key.label(),
                items,
            })
            .collect();

        Self { groups }
    }

    /// Sections in display order
    pub fn groups(&self) -> &[CatalogGroup] {
        &self.groups
    }

    /// `(label, items)` pairs in display order
    pub fn sections(&self) -> impl Iterator<Item = (&str, &[CatalogItem])> {
        self.groups
            .iter()
            .map(|group| (group.key.as_str(), group.items.as_slice()))
    }

    /// Section labels in display order
    pub fn keys(&self) -> Vec<&str> {
        self.groups.iter().map(|group| group.key.as_str()).collect()
    }

    /// Items of the section labelled `key`
    pub fn get(&self, key: &str) -> Option<&[CatalogItem]> {
        self.groups
            .iter()
            .find(|group| group.key == key)
            .map(|group| group.items.as_slice())
    }

    /// Look up an item by ID
    pub fn find(&self, id: ItemId) -> Option<&CatalogItem> {
        self.items().find(|item| item.id == id)
    }

    /// Whether the catalog contains `id`
    pub fn contains(&self, id: ItemId) -> bool {
        self.find(id).is_some()
    }

    /// All items, section by section
    pub fn items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.groups.iter().flat_map(|group| group.items.iter())
    }

    /// Number of sections
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether nothing has been published yet (or the catalog is empty)
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of items across all sections
    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|group| group.items.len()).sum()
    }
}

/// Stable sort by release date, undated items last in their original order
pub fn sort_by_release_date(items: &mut Vec<CatalogItem>) {
    // Parse each date once rather than on every comparison
    let mut keyed: Vec<(Option<DateTime<Utc>>, CatalogItem)> = items
        .drain(..)
        .map(|item| (item.release_date(), item))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    items.extend(keyed.into_iter().map(|(_, item)| item));
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, date: &str) -> CatalogItem {
        CatalogItem {
            id: ItemId(id),
            title: format!("Issue {id}"),
            image_url: format!("https://example.com/{id}.png"),
            release_date_raw: date.to_string(),
            asset_url: format!("https://example.com/{id}.pdf"),
        }
    }

    fn ids(items: &[CatalogItem]) -> Vec<i64> {
        items.iter().map(|item| item.id.0).collect()
    }

    #[test]
    fn two_months_produce_two_groups() {
        let grouping =
            CatalogGrouping::from_items(vec![item(2, "2020-07-23"), item(1, "2020-01-15")]);

        assert_eq!(grouping.keys(), vec!["January 2020", "July 2020"]);
        assert_eq!(ids(grouping.get("January 2020").unwrap()), vec![1]);
        assert_eq!(ids(grouping.get("July 2020").unwrap()), vec![2]);
        assert_eq!(grouping.item_count(), 2);
    }

    #[test]
    fn items_ascend_within_group() {
        let grouping = CatalogGrouping::from_items(vec![
            item(3, "2021-03-28T09:00:00Z"),
            item(1, "2021-03-02T09:00:00Z"),
            item(2, "2021-03-15T09:00:00Z"),
        ]);

        assert_eq!(grouping.len(), 1);
        assert_eq!(ids(grouping.get("March 2021").unwrap()), vec![1, 2, 3]);
    }

    #[test]
    fn sections_are_chronological_not_alphabetical() {
        let grouping = CatalogGrouping::from_items(vec![
            item(1, "2021-01-10"),
            item(2, "2020-12-10"),
            item(3, "2020-04-10"),
            item(4, "2020-08-10"),
        ]);

        assert_eq!(
            grouping.keys(),
            vec!["April 2020", "August 2020", "December 2020", "January 2021"]
        );
    }

    #[test]
    fn undated_items_go_last_in_fallback_group() {
        let grouping = CatalogGrouping::from_items(vec![
            item(10, "garbage"),
            item(1, "2020-05-01"),
            item(11, ""),
            item(2, "2019-05-01"),
            item(12, "2020-99-99"),
        ]);

        assert_eq!(grouping.keys(), vec!["May 2019", "May 2020", UNKNOWN_GROUP]);
        // Original relative order among undated items is kept
        assert_eq!(ids(grouping.get(UNKNOWN_GROUP).unwrap()), vec![10, 11, 12]);
        assert_eq!(grouping.item_count(), 5);
    }

    #[test]
    fn no_item_lost_or_duplicated() {
        let input: Vec<CatalogItem> = (0..50)
            .map(|i| {
                let date = if i % 7 == 0 {
                    "not-a-date".to_string()
                } else {
                    format!("20{:02}-{:02}-{:02}", 10 + i % 5, 1 + i % 12, 1 + i % 28)
                };
                item(i, &date)
            })
            .collect();

        let grouping = CatalogGrouping::from_items(input.clone());
        assert_eq!(grouping.item_count(), input.len());

        let mut seen: Vec<i64> = grouping.items().map(|item| item.id.0).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());

        for (_, items) in grouping.sections() {
            let dates: Vec<_> = items.iter().map(|item| item.release_date()).collect();
            assert!(dates.windows(2).all(|pair| pair[0] <= pair[1]));
        }
    }

    #[test]
    fn sort_is_stable_for_equal_dates() {
        let mut items = vec![
            item(1, "2020-01-01"),
            item(2, "2020-01-01"),
            item(3, "2019-01-01"),
            item(4, "2020-01-01"),
        ];
        sort_by_release_date(&mut items);
        assert_eq!(ids(&items), vec![3, 1, 2, 4]);
    }

    #[test]
    fn find_and_contains() {
        let grouping = CatalogGrouping::from_items(vec![item(1, "2020-01-01"), item(2, "x")]);
        assert_eq!(grouping.find(ItemId(2)).unwrap().title, "Issue 2");
        assert!(grouping.contains(ItemId(1)));
        assert!(!grouping.contains(ItemId(3)));
    }

    #[test]
    fn empty_input_is_empty_grouping() {
        let grouping = CatalogGrouping::from_items(vec![]);
        assert!(grouping.is_empty());
        assert_eq!(grouping.item_count(), 0);
        assert_eq!(grouping, CatalogGrouping::default());
    }
}
