//! Provenance records for datasets and their elements
//!
//! Both records are key/value maps with a fixed set of required keys plus
//! any number of extension keys. Required keys only have to be present; their
//! values may be any JSON value, except `coremodel_common` which must be a
//! boolean. The validated constructor (`from_fields`) enforces the schema;
//! `from_stored` (and serde deserialization) is the reload path used when
//! reading a stored dataset and skips validation.

use crate::error::{DofError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys every dataset record must carry
pub const DATASET_REQUIRED_KEYS: [&str; 10] = [
    "coremodel_family",
    "coremodel_type",
    "coremodel_common",
    "original_author",
    "original_source",
    "original_license",
    "dof_author",
    "dof_author_contact",
    "dof_source",
    "dof_license",
];

/// Keys additionally required when `coremodel_common` is false
pub const UNCOMMON_COREMODEL_KEYS: [&str; 2] = [
    "coremodel_source_architecture",
    "coremodel_source_weightsandbiases",
];

/// Keys every element record must carry
pub const ELEMENT_REQUIRED_KEYS: [&str; 4] = ["author", "author_contact", "source", "license"];

fn require_keys(fields: &Map<String, Value>, keys: &[&str], record: &str) -> Result<()> {
    for key in keys {
        if !fields.contains_key(*key) {
            return Err(DofError::schema(format!(
                "{}: required key \"{}\" is not set",
                record, key
            )));
        }
    }
    Ok(())
}

/// Dataset-level provenance record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetInfo {
    fields: Map<String, Value>,
}

impl DatasetInfo {
    /// Start building a record key by key
    pub fn builder() -> DatasetInfoBuilder {
        DatasetInfoBuilder::default()
    }

    /// Validate a key/value map into a record
    ///
    /// Fails with [`DofError::Schema`] if a required key is missing, if
    /// `coremodel_common` is not a boolean, or if `coremodel_common` is false
    /// and either source key is missing.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self> {
        require_keys(&fields, &DATASET_REQUIRED_KEYS, "DatasetInfo")?;

        let coremodel_common = match fields.get("coremodel_common") {
            Some(Value::Bool(common)) => *common,
            _ => {
                return Err(DofError::schema(
                    "DatasetInfo: coremodel_common must be bool",
                ))
            }
        };

        if !coremodel_common {
            for key in UNCOMMON_COREMODEL_KEYS {
                if !fields.contains_key(key) {
                    return Err(DofError::schema(format!(
                        "DatasetInfo: key \"{}\" is required when coremodel is not common",
                        key
                    )));
                }
            }
        }

        Ok(Self { fields })
    }

    /// Wrap a previously stored record without validating it
    pub fn from_stored(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// All keys, required and extension
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Value of `key` if it is a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Set a key and re-validate; the record is unchanged on error
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let mut fields = self.fields.clone();
        fields.insert(key.into(), value.into());
        *self = Self::from_fields(fields)?;
        Ok(())
    }

    /// `None` only for stored records that were never validated
    pub fn coremodel_common(&self) -> Option<bool> {
        self.fields.get("coremodel_common").and_then(Value::as_bool)
    }

    /// Keys outside the schema
    pub fn extra(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter().filter(|(key, _)| {
            !DATASET_REQUIRED_KEYS.contains(&key.as_str())
                && !UNCOMMON_COREMODEL_KEYS.contains(&key.as_str())
        })
    }
}

impl TryFrom<Map<String, Value>> for DatasetInfo {
    type Error = DofError;

    fn try_from(fields: Map<String, Value>) -> Result<Self> {
        Self::from_fields(fields)
    }
}

/// Key-by-key builder for [`DatasetInfo`]
#[derive(Debug, Clone, Default)]
pub struct DatasetInfoBuilder {
    fields: Map<String, Value>,
}

impl DatasetInfoBuilder {
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<DatasetInfo> {
        DatasetInfo::from_fields(self.fields)
    }
}

/// Per-element provenance record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementInfo {
    fields: Map<String, Value>,
}

impl ElementInfo {
    pub fn new(
        author: impl Into<Value>,
        author_contact: impl Into<Value>,
        source: impl Into<Value>,
        license: impl Into<Value>,
    ) -> Self {
        let mut fields = Map::new();
        fields.insert("author".to_string(), author.into());
        fields.insert("author_contact".to_string(), author_contact.into());
        fields.insert("source".to_string(), source.into());
        fields.insert("license".to_string(), license.into());
        Self { fields }
    }

    /// Validate a key/value map into a record
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self> {
        require_keys(&fields, &ELEMENT_REQUIRED_KEYS, "ElementInfo")?;
        Ok(Self { fields })
    }

    /// Wrap a previously stored record without validating it
    pub fn from_stored(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Set a key and re-validate; the record is unchanged on error
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let mut fields = self.fields.clone();
        fields.insert(key.into(), value.into());
        *self = Self::from_fields(fields)?;
        Ok(())
    }
}

impl TryFrom<Map<String, Value>> for ElementInfo {
    type Error = DofError;

    fn try_from(fields: Map<String, Value>) -> Result<Self> {
        Self::from_fields(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn common_fields() -> Map<String, Value> {
        object(json!({
            "coremodel_family": "resnet",
            "coremodel_type": "classifier",
            "coremodel_common": true,
            "original_author": "A. Author",
            "original_source": "https://example.org/data",
            "original_license": "CC-BY-4.0",
            "dof_author": "D. Packer",
            "dof_author_contact": "packer@example.org",
            "dof_source": "https://example.org/dof",
            "dof_license": "MIT",
        }))
    }

    #[test]
    fn test_common_coremodel_needs_no_source_keys() {
        let info = DatasetInfo::from_fields(common_fields()).unwrap();
        assert_eq!(info.coremodel_common(), Some(true));
        assert_eq!(info.get_str("coremodel_family"), Some("resnet"));
        assert_eq!(info.get("coremodel_source_architecture"), None);
    }

    #[test]
    fn test_each_required_key_enforced() {
        for key in DATASET_REQUIRED_KEYS {
            let mut fields = common_fields();
            fields.remove(key);
            let err = DatasetInfo::from_fields(fields).unwrap_err();
            assert!(matches!(err, DofError::Schema(_)), "missing {}", key);
        }
    }

    #[test]
    fn test_required_values_may_be_any_json() {
        let mut fields = common_fields();
        fields.insert("original_author".into(), json!(["A", "B"]));
        fields.insert("dof_license".into(), json!(3));
        fields.insert("coremodel_type".into(), Value::Null);

        let info = DatasetInfo::from_fields(fields).unwrap();
        assert_eq!(info.get("original_author"), Some(&json!(["A", "B"])));
        assert_eq!(info.get_str("original_author"), None);
        assert_eq!(info.get("dof_license"), Some(&json!(3)));
    }

    #[test]
    fn test_coremodel_common_must_be_bool() {
        let mut fields = common_fields();
        fields.insert("coremodel_common".into(), json!("yes"));
        assert!(matches!(
            DatasetInfo::from_fields(fields),
            Err(DofError::Schema(_))
        ));
    }

    #[test]
    fn test_uncommon_coremodel_requires_both_source_keys() {
        let mut fields = common_fields();
        fields.insert("coremodel_common".into(), json!(false));
        assert!(DatasetInfo::from_fields(fields.clone()).is_err());

        fields.insert("coremodel_source_architecture".into(), json!("arch.json"));
        assert!(DatasetInfo::from_fields(fields.clone()).is_err());

        fields.insert("coremodel_source_weightsandbiases".into(), json!(["w1.h5", "w2.h5"]));
        let info = DatasetInfo::from_fields(fields).unwrap();
        assert_eq!(info.get_str("coremodel_source_architecture"), Some("arch.json"));
        assert_eq!(info.extra().count(), 0);
    }

    #[test]
    fn test_extra_keys_preserved_through_json() {
        let mut fields = common_fields();
        fields.insert("samples_per_class".into(), json!(500));
        let info = DatasetInfo::from_fields(fields).unwrap();
        assert_eq!(info.get("samples_per_class"), Some(&json!(500)));
        assert_eq!(info.extra().count(), 1);

        let text = serde_json::to_string(&info).unwrap();
        let reloaded: DatasetInfo = serde_json::from_str(&text).unwrap();
        assert_eq!(reloaded, info);
    }

    #[test]
    fn test_stored_record_skips_validation() {
        let stored = object(json!({"coremodel_family": "f", "original_author": ["A", "B"]}));
        let info = DatasetInfo::from_stored(stored.clone());
        assert_eq!(info.fields(), &stored);
        assert_eq!(info.coremodel_common(), None);

        let reloaded: DatasetInfo = serde_json::from_value(Value::Object(stored)).unwrap();
        assert_eq!(reloaded, info);
    }

    #[test]
    fn test_set_revalidates() {
        let mut info = DatasetInfo::from_fields(common_fields()).unwrap();
        info.set("notes", "first release").unwrap();
        assert_eq!(info.get_str("notes"), Some("first release"));

        let before = info.clone();
        assert!(info.set("coremodel_common", false).is_err());
        assert_eq!(info, before);
    }

    #[test]
    fn test_builder() {
        let mut builder = DatasetInfo::builder();
        for (key, value) in common_fields() {
            builder = builder.field(key, value);
        }
        assert!(builder.build().is_ok());
        assert!(DatasetInfo::builder().field("coremodel_family", "x").build().is_err());
    }

    #[test]
    fn test_element_info_fails_only_on_missing_keys() {
        let fields = object(json!({
            "author": ["Alice", "Bob"],
            "author_contact": "a@example.org",
            "source": 42,
            "license": "CC0",
            "frame": 12,
        }));

        let info = ElementInfo::from_fields(fields.clone()).unwrap();
        assert_eq!(info.get("author"), Some(&json!(["Alice", "Bob"])));
        assert_eq!(info.get("source"), Some(&json!(42)));
        assert_eq!(info.get("frame"), Some(&json!(12)));

        for key in ELEMENT_REQUIRED_KEYS {
            let mut partial = fields.clone();
            partial.remove(key);
            assert!(matches!(
                ElementInfo::from_fields(partial),
                Err(DofError::Schema(_))
            ));
        }
    }
}
