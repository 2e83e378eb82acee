use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How one index column gets its value.
///
/// In configuration files a rule is written as `false` (omit), `true`
/// (derive via the source type's [`FieldMapper`](crate::FieldMapper)) or a
/// string naming the source field to copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRule {
    /// Never written by the synchronizer.
    Omit,
    /// Derived by the source type's field mapper.
    Callback,
    /// Copied from the named source field when present.
    SourceField(String),
}

impl ColumnRule {
    pub fn field(name: impl Into<String>) -> Self {
        Self::SourceField(name.into())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawRule {
    Flag(bool),
    Field(String),
}

impl Serialize for ColumnRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = match self {
            ColumnRule::Omit => RawRule::Flag(false),
            ColumnRule::Callback => RawRule::Flag(true),
            ColumnRule::SourceField(name) => RawRule::Field(name.clone()),
        };
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ColumnRule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawRule::deserialize(deserializer)? {
            RawRule::Flag(false) => ColumnRule::Omit,
            RawRule::Flag(true) => ColumnRule::Callback,
            RawRule::Field(name) => ColumnRule::SourceField(name),
        })
    }
}

/// Per-column rules for one source type, keyed by index column name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    rules: BTreeMap<String, ColumnRule>,
}

impl FieldMapping {
    /// Maps every column to the source field of the same name.
    pub fn identity<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rules = columns
            .into_iter()
            .map(|c| {
                let c = c.into();
                (c.clone(), ColumnRule::SourceField(c))
            })
            .collect();
        Self { rules }
    }

    /// Overlays `overrides` on top of this mapping; overrides win per column.
    pub fn merged(mut self, overrides: &BTreeMap<String, ColumnRule>) -> Self {
        for (column, rule) in overrides {
            self.rules.insert(column.clone(), rule.clone());
        }
        self
    }

    pub fn get(&self, column: &str) -> Option<&ColumnRule> {
        self.rules.get(column)
    }

    /// Iterates rules in column-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnRule)> {
        self.rules.iter().map(|(c, r)| (c.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<(String, ColumnRule)> for FieldMapping {
    fn from_iter<T: IntoIterator<Item = (String, ColumnRule)>>(iter: T) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
