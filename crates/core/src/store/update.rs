//! Field-level document updates.

use serde::Serialize;
use serde_json::{Map, Value};

use super::{StoreError, StoreResult};

/// One field-level modification.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Replace the field (creating intermediate objects as needed).
    Set(Value),
    /// Append each value that is not already present in the array field.
    ArrayUnion(Vec<Value>),
    /// Remove every element equal to one of the values.
    ArrayRemove(Vec<Value>),
    /// Remove the field.
    Delete,
}

/// An ordered list of field updates applied atomically to one document.
///
/// # Example
///
/// ```rust
/// use rentacam_core::store::Updates;
/// use serde_json::json;
///
/// let updates = Updates::new()
///     .set("stock", json!(4))
///     .array_union("wishlist", vec![json!("prod-1")]);
/// assert_eq!(updates.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Updates(Vec<(String, FieldUpdate)>);

impl Updates {
    /// An empty update list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field to a JSON value.
    #[must_use]
    pub fn set(mut self, path: impl Into<String>, value: Value) -> Self {
        self.0.push((path.into(), FieldUpdate::Set(value)));
        self
    }

    /// Set a field to any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the value cannot be serialized.
    pub fn set_serialized<T: Serialize>(self, path: impl Into<String>, value: &T) -> StoreResult<Self> {
        Ok(self.set(path, serde_json::to_value(value)?))
    }

    /// Union values into an array field.
    #[must_use]
    pub fn array_union(mut self, path: impl Into<String>, values: Vec<Value>) -> Self {
        self.0.push((path.into(), FieldUpdate::ArrayUnion(values)));
        self
    }

    /// Remove values from an array field.
    #[must_use]
    pub fn array_remove(mut self, path: impl Into<String>, values: Vec<Value>) -> Self {
        self.0.push((path.into(), FieldUpdate::ArrayRemove(values)));
        self
    }

    /// Delete a field.
    #[must_use]
    pub fn delete(mut self, path: impl Into<String>) -> Self {
        self.0.push((path.into(), FieldUpdate::Delete));
        self
    }

    /// Number of field updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no updates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply every update to a document body in order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidDocument` when a path is empty or walks
    /// through a non-object value, or when an array operation targets a
    /// non-array field. The body is left unmodified on error.
    pub fn apply(&self, data: &Value) -> StoreResult<Value> {
        let mut result = data.clone();
        for (path, update) in &self.0 {
            apply_one(&mut result, path, update)?;
        }
        Ok(result)
    }
}

fn apply_one(data: &mut Value, path: &str, update: &FieldUpdate) -> StoreResult<()> {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(StoreError::InvalidDocument("empty field path".to_owned()));
    };
    if last.is_empty() || parents.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidDocument(format!(
            "invalid field path: {path}"
        )));
    }

    let mut current = as_object_mut(data, path)?;
    for segment in parents {
        let next = current
            .entry((*segment).to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        current = as_object_mut(next, path)?;
    }

    match update {
        FieldUpdate::Set(value) => {
            current.insert((*last).to_owned(), value.clone());
        }
        FieldUpdate::Delete => {
            current.remove(*last);
        }
        FieldUpdate::ArrayUnion(values) => {
            let field = current
                .entry((*last).to_owned())
                .or_insert_with(|| Value::Array(Vec::new()));
            let items = as_array_mut(field, path)?;
            for value in values {
                if !items.contains(value) {
                    items.push(value.clone());
                }
            }
        }
        FieldUpdate::ArrayRemove(values) => {
            if let Some(field) = current.get_mut(*last) {
                as_array_mut(field, path)?.retain(|item| !values.contains(item));
            }
        }
    }
    Ok(())
}

fn as_object_mut<'a>(value: &'a mut Value, path: &str) -> StoreResult<&'a mut Map<String, Value>> {
    value
        .as_object_mut()
        .ok_or_else(|| StoreError::InvalidDocument(format!("{path}: parent is not an object")))
}

fn as_array_mut<'a>(value: &'a mut Value, path: &str) -> StoreResult<&'a mut Vec<Value>> {
    value
        .as_array_mut()
        .ok_or_else(|| StoreError::InvalidDocument(format!("{path}: field is not an array")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_nested_creates_parents() {
        let updated = Updates::new()
            .set("idVerification.verified", json!(true))
            .apply(&json!({ "fullName": "Ana" }))
            .unwrap();
        assert_eq!(
            updated,
            json!({ "fullName": "Ana", "idVerification": { "verified": true } })
        );
    }

    #[test]
    fn test_array_union_skips_existing() {
        let updated = Updates::new()
            .array_union("wishlist", vec![json!("p1"), json!("p2")])
            .apply(&json!({ "wishlist": ["p1"] }))
            .unwrap();
        assert_eq!(updated, json!({ "wishlist": ["p1", "p2"] }));
    }

    #[test]
    fn test_array_union_creates_missing_array() {
        let updated = Updates::new()
            .array_union("wishlist", vec![json!("p1")])
            .apply(&json!({}))
            .unwrap();
        assert_eq!(updated, json!({ "wishlist": ["p1"] }));
    }

    #[test]
    fn test_array_remove_removes_all_copies() {
        let updated = Updates::new()
            .array_remove("wishlist", vec![json!("p1")])
            .apply(&json!({ "wishlist": ["p1", "p2", "p1"] }))
            .unwrap();
        assert_eq!(updated, json!({ "wishlist": ["p2"] }));
    }

    #[test]
    fn test_array_remove_on_missing_field_is_noop() {
        let updated = Updates::new()
            .array_remove("wishlist", vec![json!("p1")])
            .apply(&json!({ "name": "x" }))
            .unwrap();
        assert_eq!(updated, json!({ "name": "x" }));
    }

    #[test]
    fn test_array_op_on_scalar_fails() {
        let result = Updates::new()
            .array_union("stock", vec![json!(1)])
            .apply(&json!({ "stock": 3 }));
        assert!(matches!(result, Err(StoreError::InvalidDocument(_))));
    }

    #[test]
    fn test_delete_field() {
        let updated = Updates::new()
            .delete("imageUrl")
            .apply(&json!({ "imageUrl": "x", "name": "y" }))
            .unwrap();
        assert_eq!(updated, json!({ "name": "y" }));
    }

    #[test]
    fn test_invalid_path() {
        let result = Updates::new().set("a..b", json!(1)).apply(&json!({}));
        assert!(result.is_err());
    }
}
