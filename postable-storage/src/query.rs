use serde_json::Value;

/// Conjunction of `column = value` conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    conditions: Vec<(String, Value)>,
}

impl Criteria {
    /// Matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds an equality condition, compared the way SQL `=` compares:
    /// null never matches and booleans compare as `0` / `1`.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluates the criteria against a row. A missing column never matches.
    pub fn matches(&self, row: &postable_model::Row) -> bool {
        self.conditions
            .iter()
            .all(|(column, expected)| row.get(column).is_some_and(|v| values_equal(v, expected)))
    }
}

// Mirrors SQL equality: 1 = 1.0, true = 1, NULL = anything is false.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => !a.is_null() && !b.is_null() && a == b,
    }
}

fn as_number(value: &Value) -> Option<serde_json::Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::Bool(b) => Some(i64::from(*b).into()),
        _ => None,
    }
}

/// A filtered, paginated lookup. Results are always ordered by `id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub criteria: Criteria,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Query {
    pub fn new(criteria: Criteria) -> Self {
        Self {
            criteria,
            ..Self::default()
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}
