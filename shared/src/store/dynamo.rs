//! DynamoDB-backed slot store.

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::{Condition, ContinuationToken, Item, ItemKey, Page, SlotStore, PARTITION_ATTR, SORT_ATTR};
use crate::{Error, Result};

/// Slot store over a DynamoDB table with a `ServiceId` hash key and `Slot` range key.
pub struct DynamoSlotStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoSlotStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

fn to_attribute_map(item: Item) -> HashMap<String, AttributeValue> {
    item.into_iter()
        .map(|(name, value)| (name, AttributeValue::S(value)))
        .collect()
}

/// Non-string attributes are never written by this service and are skipped.
fn from_attribute_map(map: &HashMap<String, AttributeValue>) -> Item {
    map.iter()
        .filter_map(|(name, value)| value.as_s().ok().map(|s| (name.clone(), s.clone())))
        .collect()
}

/// Build a projection expression. Attribute names always go through
/// placeholders since `State` is a reserved word.
fn projection_expression(projection: &[&str]) -> Option<(String, HashMap<String, String>)> {
    if projection.is_empty() {
        return None;
    }

    let names: HashMap<String, String> = projection
        .iter()
        .enumerate()
        .map(|(i, name)| (format!("#p{}", i), name.to_string()))
        .collect();
    let expression = (0..projection.len())
        .map(|i| format!("#p{}", i))
        .collect::<Vec<_>>()
        .join(", ");

    Some((expression, names))
}

/// Build a `SET` expression for the given updates and optional guard.
///
/// The item must already exist: `attribute_exists` on the sort key keeps an
/// update from creating a partial item.
fn update_expression(
    updates: Item,
    condition: Option<Condition>,
) -> (
    String,
    String,
    HashMap<String, String>,
    HashMap<String, AttributeValue>,
) {
    let mut names = HashMap::from([("#sk".to_string(), SORT_ATTR.to_string())]);
    let mut values = HashMap::new();
    let mut assignments = Vec::with_capacity(updates.len());

    for (i, (name, value)) in updates.into_iter().enumerate() {
        names.insert(format!("#u{}", i), name);
        values.insert(format!(":u{}", i), AttributeValue::S(value));
        assignments.push(format!("#u{i} = :u{i}"));
    }

    let mut condition_expression = "attribute_exists(#sk)".to_string();
    if let Some(Condition::Equals { attribute, value }) = condition {
        names.insert("#c0".to_string(), attribute);
        values.insert(":c0".to_string(), AttributeValue::S(value));
        condition_expression.push_str(" AND #c0 = :c0");
    }

    (
        format!("SET {}", assignments.join(", ")),
        condition_expression,
        names,
        values,
    )
}

#[async_trait]
impl SlotStore for DynamoSlotStore {
    async fn put_item(&self, key: &ItemKey, mut attributes: Item) -> Result<()> {
        attributes.extend(key.attributes());

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_attribute_map(attributes)))
            .send()
            .await
            .map_err(|e| Error::Persistence(format!("Failed to put item {}: {}", key.sort, e)))?;

        Ok(())
    }

    async fn get_item(&self, key: &ItemKey, projection: &[&str]) -> Result<Option<Item>> {
        let mut request = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(to_attribute_map(key.attributes())));

        if let Some((expression, names)) = projection_expression(projection) {
            request = request
                .projection_expression(expression)
                .set_expression_attribute_names(Some(names));
        }

        let output = request
            .send()
            .await
            .map_err(|e| Error::Persistence(format!("Failed to get item {}: {}", key.sort, e)))?;

        Ok(output.item().map(from_attribute_map))
    }

    async fn update_item(
        &self,
        key: &ItemKey,
        updates: Item,
        condition: Option<Condition>,
    ) -> Result<Item> {
        if updates.is_empty() {
            return Err(Error::Validation("Update has no attributes".to_string()));
        }

        let (expression, condition_expression, names, values) =
            update_expression(updates, condition);

        let output = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(to_attribute_map(key.attributes())))
            .update_expression(expression)
            .condition_expression(condition_expression)
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(UpdateItemError::ConditionalCheckFailedException(_)) => {
                    Error::ConditionFailed(format!("Update of {} rejected by condition", key.sort))
                }
                _ => Error::Persistence(format!("Failed to update item {}: {}", key.sort, e)),
            })?;

        Ok(output.attributes().map(from_attribute_map).unwrap_or_default())
    }

    async fn query_page(
        &self,
        partition: &str,
        prefix: &str,
        projection: &[&str],
        start: Option<ContinuationToken>,
    ) -> Result<Page> {
        let mut names = HashMap::from([
            ("#pk".to_string(), PARTITION_ATTR.to_string()),
            ("#sk".to_string(), SORT_ATTR.to_string()),
        ]);

        let mut request = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("#pk = :pk AND begins_with(#sk, :prefix)")
            .expression_attribute_values(":pk", AttributeValue::S(partition.to_string()))
            .expression_attribute_values(":prefix", AttributeValue::S(prefix.to_string()))
            .set_exclusive_start_key(
                start.map(|token| to_attribute_map(token.into_key_attributes())),
            );

        if let Some((expression, projection_names)) = projection_expression(projection) {
            names.extend(projection_names);
            request = request.projection_expression(expression);
        }

        let output = request
            .set_expression_attribute_names(Some(names))
            .send()
            .await
            .map_err(|e| Error::Persistence(format!("Failed to query '{}': {}", prefix, e)))?;

        Ok(Page {
            items: output.items().iter().map(from_attribute_map).collect(),
            next: output
                .last_evaluated_key()
                .map(|key| ContinuationToken::from_key_attributes(from_attribute_map(key))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_uses_placeholders() {
        let (expression, names) = projection_expression(&["Slot", "State"]).unwrap();
        assert_eq!(expression, "#p0, #p1");
        assert_eq!(names["#p1"], "State");
        assert!(projection_expression(&[]).is_none());
    }

    #[test]
    fn test_update_expression_with_condition() {
        let updates = Item::from([("State".to_string(), "connected".to_string())]);
        let (expression, condition, names, values) =
            update_expression(updates, Some(Condition::equals("State", "pending")));

        assert_eq!(expression, "SET #u0 = :u0");
        assert_eq!(condition, "attribute_exists(#sk) AND #c0 = :c0");
        assert_eq!(names["#c0"], "State");
        assert_eq!(values[":c0"], AttributeValue::S("pending".to_string()));
        assert_eq!(values[":u0"], AttributeValue::S("connected".to_string()));
    }

    #[test]
    fn test_attribute_maps_skip_non_string_values() {
        let map = HashMap::from([
            ("Slot".to_string(), AttributeValue::S("slot:1".to_string())),
            ("Count".to_string(), AttributeValue::N("3".to_string())),
        ]);
        let item = from_attribute_map(&map);
        assert_eq!(item.len(), 1);
        assert_eq!(item["Slot"], "slot:1");
    }
}
