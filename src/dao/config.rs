//! Engine configuration
//!
//! Configuration is JSON:
//!
//! ```json
//! {
//!   "primary_key": "id",
//!   "indexes": ["age", ["city", "age"]],
//!   "honor_remove_all_filters": false,
//!   "log_plans": false
//! }
//! ```
//!
//! A string in `indexes` is a single-property index, a list is a composite
//! index ordered by its properties in turn.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{MdaoError, MdaoResult};
use super::mdao::Mdao;
use crate::index::{PropertyDescriptor, Record};
use crate::observability::{log_event, Event};

fn default_primary_key() -> String {
    "id".to_string()
}

/// One secondary index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexDefinition {
    Single(String),
    Composite(Vec<String>),
}

impl IndexDefinition {
    /// Indexed properties, outermost first
    pub fn properties(&self) -> Vec<&str> {
        match self {
            IndexDefinition::Single(name) => vec![name.as_str()],
            IndexDefinition::Composite(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MdaoConfig {
    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,

    /// Make `remove_all` remove only the records its query selects
    #[serde(default)]
    pub honor_remove_all_filters: bool,

    /// Emit QUERY_PLANNED for every select
    #[serde(default)]
    pub log_plans: bool,
}

impl Default for MdaoConfig {
    fn default() -> Self {
        Self {
            primary_key: default_primary_key(),
            indexes: Vec::new(),
            honor_remove_all_filters: false,
            log_plans: false,
        }
    }
}

impl MdaoConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> MdaoResult<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let result = fs::read_to_string(path)
            .map_err(|source| MdaoError::ConfigIo {
                path: display.clone(),
                source,
            })
            .and_then(|content| Self::from_json_str(&content));

        match &result {
            Ok(config) => {
                let indexes = config.indexes.len().to_string();
                log_event(
                    Event::ConfigLoaded,
                    &[("indexes", indexes.as_str()), ("path", display.as_str())],
                );
            }
            Err(err) => {
                let message = err.to_string();
                log_event(
                    Event::ConfigRejected,
                    &[
                        ("code", err.code()),
                        ("error", message.as_str()),
                        ("path", display.as_str()),
                    ],
                );
            }
        }
        result
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json_str(content: &str) -> MdaoResult<Self> {
        let config: MdaoConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> MdaoResult<()> {
        if self.primary_key.is_empty() {
            return Err(MdaoError::invalid("primary_key must not be empty"));
        }

        let mut seen = HashSet::new();
        for definition in &self.indexes {
            let properties = definition.properties();
            if properties.is_empty() {
                return Err(MdaoError::invalid("index definition must name at least one property"));
            }
            if properties.iter().any(|name| name.is_empty()) {
                return Err(MdaoError::invalid("index property names must not be empty"));
            }
            if properties == [self.primary_key.as_str()] {
                return Err(MdaoError::invalid(format!(
                    "index on primary key '{}' is implicit",
                    self.primary_key
                )));
            }
            if !seen.insert(properties.clone()) {
                return Err(MdaoError::invalid(format!(
                    "duplicate index [{}]",
                    properties.join(", ")
                )));
            }
        }

        Ok(())
    }

    /// Builds an engine, resolving property names through `resolve`
    pub fn build_dao<R, F>(&self, resolve: F) -> MdaoResult<Mdao<R>>
    where
        R: Record,
        F: Fn(&str) -> Option<PropertyDescriptor<R>>,
    {
        self.validate()?;

        let lookup = |name: &str| {
            resolve(name).ok_or_else(|| MdaoError::invalid(format!("unknown property '{}'", name)))
        };

        let primary_key = lookup(&self.primary_key)?;
        let mut definitions = Vec::with_capacity(self.indexes.len());
        for definition in &self.indexes {
            let properties = definition
                .properties()
                .into_iter()
                .map(lookup)
                .collect::<MdaoResult<Vec<_>>>()?;
            definitions.push(properties);
        }

        let dao = Mdao::with_config(primary_key, self.clone());
        for properties in definitions {
            dao.add_composite_index(properties);
        }
        Ok(dao)
    }

    /// Builds an engine over JSON documents
    pub fn build_json_dao(&self) -> MdaoResult<Mdao<serde_json::Value>> {
        self.build_dao(|name| Some(PropertyDescriptor::field(name)))
    }
}
