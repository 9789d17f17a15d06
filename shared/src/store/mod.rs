//! Slot store abstraction.
//!
//! Models the single logical table the service persists to: items are keyed by
//! a partition value (the service id) and a sort key (`slot:<id>`,
//! `patient:<name>`), and every attribute is a string.
//!
//! Queries are paginated. [`query_all`] follows continuation tokens with a
//! plain loop until the store reports no more pages. A token that was already
//! followed is an error, so a misbehaving store cannot keep the loop alive.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::{Error, Result};

pub mod dynamo;
pub mod memory;

pub use dynamo::DynamoSlotStore;
pub use memory::InMemorySlotStore;

/// Partition key attribute name.
pub const PARTITION_ATTR: &str = "ServiceId";

/// Sort key attribute name.
pub const SORT_ATTR: &str = "Slot";

/// Attributes of one stored item.
pub type Item = HashMap<String, String>;

/// Composite primary key of an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub partition: String,
    pub sort: String,
}

impl ItemKey {
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }

    /// Key attributes as they appear on a stored item.
    pub fn attributes(&self) -> Item {
        HashMap::from([
            (PARTITION_ATTR.to_string(), self.partition.clone()),
            (SORT_ATTR.to_string(), self.sort.clone()),
        ])
    }

    /// Recover a key from the key attributes of an item.
    pub fn from_attributes(item: &Item) -> Option<Self> {
        Some(Self::new(item.get(PARTITION_ATTR)?, item.get(SORT_ATTR)?))
    }
}

/// Opaque marker returned by a paginated query when more results remain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationToken(Item);

impl ContinuationToken {
    pub(crate) fn from_key_attributes(attributes: Item) -> Self {
        Self(attributes)
    }

    pub(crate) fn into_key_attributes(self) -> Item {
        self.0
    }
}

/// One page of query results.
#[derive(Debug, Default)]
pub struct Page {
    pub items: Vec<Item>,
    pub next: Option<ContinuationToken>,
}

/// Guard on an update. The write only happens if the guard holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The attribute currently holds exactly this value.
    Equals { attribute: String, value: String },
}

impl Condition {
    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Condition::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

/// Persistence operations required by the slot lifecycle.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Insert or overwrite an item. Key attributes are added by the store.
    async fn put_item(&self, key: &ItemKey, attributes: Item) -> Result<()>;

    /// Point lookup. An empty projection returns every attribute.
    async fn get_item(&self, key: &ItemKey, projection: &[&str]) -> Result<Option<Item>>;

    /// Overwrite the given attributes of an existing item, returning its new attributes.
    ///
    /// Fails with [`Error::ConditionFailed`] if the item is missing or the
    /// condition does not hold.
    async fn update_item(
        &self,
        key: &ItemKey,
        updates: Item,
        condition: Option<Condition>,
    ) -> Result<Item>;

    /// Fetch one page of items in `partition` whose sort key starts with `prefix`.
    async fn query_page(
        &self,
        partition: &str,
        prefix: &str,
        projection: &[&str],
        start: Option<ContinuationToken>,
    ) -> Result<Page>;
}

/// Run a prefix query to completion, accumulating every page in store order.
pub async fn query_all(
    store: &dyn SlotStore,
    partition: &str,
    prefix: &str,
    projection: &[&str],
) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    let mut start: Option<ContinuationToken> = None;
    // Tokens are not hashable; a query spans few pages.
    let mut followed: Vec<ContinuationToken> = Vec::new();

    loop {
        let page = store
            .query_page(partition, prefix, projection, start.take())
            .await?;
        items.extend(page.items);

        match page.next {
            None => break,
            Some(next) if followed.contains(&next) => {
                return Err(Error::Persistence(format!(
                    "Query for '{}' returned an already followed continuation token",
                    prefix
                )));
            }
            Some(next) => {
                followed.push(next.clone());
                start = Some(next);
            }
        }
    }

    tracing::debug!(prefix, pages = followed.len() + 1, items = items.len(), "Query complete");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn slot_item(sort: &str) -> Item {
        let mut item = ItemKey::new("svc", sort).attributes();
        item.insert("State".to_string(), "pending".to_string());
        item
    }

    /// Store that always hands back the same continuation token.
    struct StuckStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SlotStore for StuckStore {
        async fn put_item(&self, _key: &ItemKey, _attributes: Item) -> Result<()> {
            Ok(())
        }

        async fn get_item(&self, _key: &ItemKey, _projection: &[&str]) -> Result<Option<Item>> {
            Ok(None)
        }

        async fn update_item(
            &self,
            _key: &ItemKey,
            _updates: Item,
            _condition: Option<Condition>,
        ) -> Result<Item> {
            Err(Error::ConditionFailed("missing".to_string()))
        }

        async fn query_page(
            &self,
            _partition: &str,
            _prefix: &str,
            _projection: &[&str],
            _start: Option<ContinuationToken>,
        ) -> Result<Page> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Page {
                items: vec![slot_item("slot:a")],
                next: Some(ContinuationToken::from_key_attributes(
                    ItemKey::new("svc", "slot:a").attributes(),
                )),
            })
        }
    }

    /// Store whose tokens alternate between two keys and never run out.
    struct CyclingStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SlotStore for CyclingStore {
        async fn put_item(&self, _key: &ItemKey, _attributes: Item) -> Result<()> {
            Ok(())
        }

        async fn get_item(&self, _key: &ItemKey, _projection: &[&str]) -> Result<Option<Item>> {
            Ok(None)
        }

        async fn update_item(
            &self,
            _key: &ItemKey,
            _updates: Item,
            _condition: Option<Condition>,
        ) -> Result<Item> {
            Err(Error::ConditionFailed("missing".to_string()))
        }

        async fn query_page(
            &self,
            _partition: &str,
            _prefix: &str,
            _projection: &[&str],
            _start: Option<ContinuationToken>,
        ) -> Result<Page> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call > 10 {
                return Ok(Page::default());
            }
            let sort = if call % 2 == 0 { "slot:a" } else { "slot:b" };
            Ok(Page {
                items: vec![slot_item(sort)],
                next: Some(ContinuationToken::from_key_attributes(
                    ItemKey::new("svc", sort).attributes(),
                )),
            })
        }
    }

    #[test]
    fn test_item_key_round_trips_through_attributes() {
        let key = ItemKey::new("svc", "slot:123");
        assert_eq!(ItemKey::from_attributes(&key.attributes()), Some(key));
        assert_eq!(ItemKey::from_attributes(&Item::new()), None);
    }

    #[tokio::test]
    async fn test_query_all_follows_every_page() {
        let store = InMemorySlotStore::with_page_size(2);
        for sort in ["slot:a", "slot:b", "slot:c", "slot:d", "slot:e"] {
            store
                .put_item(&ItemKey::new("svc", sort), slot_item(sort))
                .await
                .unwrap();
        }

        let items = query_all(&store, "svc", "slot:", &[SORT_ATTR]).await.unwrap();

        let sorts: Vec<&str> = items.iter().map(|i| i[SORT_ATTR].as_str()).collect();
        assert_eq!(sorts, vec!["slot:a", "slot:b", "slot:c", "slot:d", "slot:e"]);
        assert_eq!(store.query_calls(), 3);
    }

    #[tokio::test]
    async fn test_query_all_rejects_repeated_token() {
        let store = StuckStore {
            calls: AtomicUsize::new(0),
        };

        let err = query_all(&store, "svc", "slot:", &[]).await.unwrap_err();

        assert!(matches!(err, Error::Persistence(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_query_all_rejects_cycling_tokens() {
        let store = CyclingStore {
            calls: AtomicUsize::new(0),
        };

        let err = query_all(&store, "svc", "slot:", &[]).await.unwrap_err();

        assert!(matches!(err, Error::Persistence(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }
}
