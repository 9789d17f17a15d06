//! In-memory slot store for tests and local runs.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::{Condition, ContinuationToken, Item, ItemKey, Page, SlotStore};
use crate::{Error, Result};

/// Ordered map standing in for the appointments table.
///
/// Query results come back in sort-key order, split into pages of
/// `page_size` items, with the last returned key as continuation token.
pub struct InMemorySlotStore {
    items: RwLock<BTreeMap<ItemKey, Item>>,
    page_size: usize,
    fail_writes: AtomicBool,
    query_calls: AtomicUsize,
}

impl InMemorySlotStore {
    /// Create a store that returns every query in a single page.
    pub fn new() -> Self {
        Self::with_page_size(usize::MAX)
    }

    /// Create a store that splits query results into pages of `page_size` items.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            page_size: page_size.max(1),
            fail_writes: AtomicBool::new(false),
            query_calls: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent put/update fail with a persistence error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `query_page` calls served so far.
    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    /// Number of stored items.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Persistence("In-memory store is read-only".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemorySlotStore {
    fn default() -> Self {
        Self::new()
    }
}

fn project(item: &Item, projection: &[&str]) -> Item {
    if projection.is_empty() {
        return item.clone();
    }
    item.iter()
        .filter(|(name, _)| projection.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

#[async_trait]
impl SlotStore for InMemorySlotStore {
    async fn put_item(&self, key: &ItemKey, mut attributes: Item) -> Result<()> {
        self.check_writable()?;
        attributes.extend(key.attributes());
        self.items.write().await.insert(key.clone(), attributes);
        Ok(())
    }

    async fn get_item(&self, key: &ItemKey, projection: &[&str]) -> Result<Option<Item>> {
        let items = self.items.read().await;
        Ok(items.get(key).map(|item| project(item, projection)))
    }

    async fn update_item(
        &self,
        key: &ItemKey,
        updates: Item,
        condition: Option<Condition>,
    ) -> Result<Item> {
        self.check_writable()?;
        let mut items = self.items.write().await;
        let item = items
            .get_mut(key)
            .ok_or_else(|| Error::ConditionFailed(format!("No item at {}", key.sort)))?;

        if let Some(Condition::Equals { attribute, value }) = condition {
            if item.get(&attribute) != Some(&value) {
                return Err(Error::ConditionFailed(format!(
                    "{} on {} is no longer '{}'",
                    attribute, key.sort, value
                )));
            }
        }

        item.extend(updates);
        Ok(item.clone())
    }

    async fn query_page(
        &self,
        partition: &str,
        prefix: &str,
        projection: &[&str],
        start: Option<ContinuationToken>,
    ) -> Result<Page> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);

        let start_key = match start {
            Some(token) => Some(
                ItemKey::from_attributes(&token.into_key_attributes()).ok_or_else(|| {
                    Error::Persistence("Malformed continuation token".to_string())
                })?,
            ),
            None => None,
        };

        let items = self.items.read().await;
        let mut matching = items
            .iter()
            .filter(|(key, _)| key.partition == partition && key.sort.starts_with(prefix))
            .filter(|(key, _)| start_key.as_ref().map_or(true, |start| *key > start));

        let page: Vec<(&ItemKey, &Item)> = matching.by_ref().take(self.page_size).collect();
        let next = match (page.last(), matching.next()) {
            (Some((last, _)), Some(_)) => {
                Some(ContinuationToken::from_key_attributes(last.attributes()))
            }
            _ => None,
        };

        Ok(Page {
            items: page.iter().map(|(_, item)| project(item, projection)).collect(),
            next,
        })
    }
}
