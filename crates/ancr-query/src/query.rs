//! # Tag Query Tree
//!
//! A boolean query over a record's string tags. Serializes to the WQL
//! shape wallets understand (`{"tag": "value"}`, `{"$and": [...]}`,
//! `{"$or": [...]}`, `{"$not": {...}}`) and evaluates directly against a
//! tag map for in-memory stores.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A boolean query over string tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Query {
    /// Tag `name` has exactly `value`.
    Eq {
        /// Tag name.
        name: String,
        /// Required value.
        value: String,
    },
    /// Every sub-query holds. Empty is true.
    And(Vec<Query>),
    /// At least one sub-query holds. Empty is false.
    Or(Vec<Query>),
    /// The sub-query does not hold.
    Not(Box<Query>),
}

impl Query {
    /// `name = value`.
    pub fn eq(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq { name: name.into(), value: value.into() }
    }

    /// Negation.
    #[allow(clippy::should_implement_trait)]
    pub fn not(query: Query) -> Self {
        Self::Not(Box::new(query))
    }

    /// Evaluate against a record's tags.
    pub fn matches(&self, tags: &BTreeMap<String, String>) -> bool {
        match self {
            Self::Eq { name, value } => tags.get(name) == Some(value),
            Self::And(queries) => queries.iter().all(|q| q.matches(tags)),
            Self::Or(queries) => queries.iter().any(|q| q.matches(tags)),
            Self::Not(query) => !query.matches(tags),
        }
    }

    /// WQL representation.
    pub fn to_wql(&self) -> Value {
        match self {
            Self::Eq { name, value } => {
                let mut map = Map::new();
                map.insert(name.clone(), Value::String(value.clone()));
                Value::Object(map)
            }
            Self::And(queries) => json!({ "$and": queries.iter().map(Query::to_wql).collect::<Vec<_>>() }),
            Self::Or(queries) => json!({ "$or": queries.iter().map(Query::to_wql).collect::<Vec<_>>() }),
            Self::Not(query) => json!({ "$not": query.to_wql() }),
        }
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let list = |f: &mut std::fmt::Formatter<'_>, op: &str, queries: &[Query]| {
            write!(f, "{op}(")?;
            for (i, q) in queries.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{q}")?;
            }
            f.write_str(")")
        };
        match self {
            Self::Eq { name, value } => write!(f, "{name}={value}"),
            Self::And(queries) => list(f, "AND", queries),
            Self::Or(queries) => list(f, "OR", queries),
            Self::Not(query) => write!(f, "NOT({query})"),
        }
    }
}
