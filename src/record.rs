//! Flat, header-keyed rows loaded from the dashboard datasets.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A single cell. Cells that parse as a finite number become [`Value::Number`],
/// everything else (including empty cells) stays [`Value::Text`].
///
/// A numeric cell keeps its trimmed source text, so identifiers such as `09`
/// or `007` render exactly as they were written.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number { value: f64, raw: String },
}

impl Value {
    /// Types a raw CSV cell.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Value::Number {
                value,
                raw: trimmed.to_string(),
            },
            _ => Value::Text(trimmed.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number { value, .. } => Some(*value),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Text(s) if s.is_empty())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number { raw, .. } => f.write_str(raw),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Text(s) => serializer.serialize_str(s),
            Value::Number { value, .. } => serializer.serialize_f64(*value),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number {
            value,
            raw: value.to_string(),
        }
    }
}

/// One row of a dataset. Built once by the parser and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }

    /// Builds a record from `(field, value)` pairs. Later pairs win on duplicate names.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Textual cell contents. Text cells are returned as-is; numeric cells are
    /// not, use [`Record::display`] for those.
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.fields.get(field)? {
            Value::Text(s) => Some(s.as_str()),
            Value::Number { .. } => None,
        }
    }

    /// Cell as written in the source, whatever its type, empty for a missing
    /// field. Use this for grouping keys such as `class` that may look numeric.
    pub fn display(&self, field: &str) -> String {
        self.fields
            .get(field)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.fields.get(field)?.as_f64()
    }

    /// `100 * part / whole` for values derived from other columns.
    /// `None` if either side is missing or `whole` is zero.
    pub fn computed_ratio(&self, part: &str, whole: &str) -> Option<f64> {
        let part = self.number(part)?;
        let whole = self.number(whole)?;
        if whole == 0.0 {
            return None;
        }
        Some(part / whole * 100.0)
    }

    /// Reads `field` as provided, falling back to `total / max` only when the
    /// field itself is absent or non-numeric.
    pub fn percentage(&self, field: &str, total: &str, max: &str) -> Option<f64> {
        self.number(field)
            .or_else(|| self.computed_ratio(total, max))
    }

    pub fn is_blank(&self) -> bool {
        self.fields.values().all(Value::is_empty)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_parse_types_cells() {
        assert_eq!(Value::parse("85"), Value::from(85.0));
        assert_eq!(Value::parse(" 72.5 "), Value::from(72.5));
        assert_eq!(Value::parse("10A"), Value::Text("10A".into()));
        assert_eq!(Value::parse(""), Value::Text(String::new()));
        assert_eq!(Value::parse("NaN"), Value::Text("NaN".into()));
    }

    #[test]
    fn test_number_and_display() {
        let r = Record::from_pairs([
            ("class", Value::from(10.0)),
            ("name", Value::from("Asha")),
        ]);

        assert_eq!(r.number("class"), Some(10.0));
        assert_eq!(r.display("class"), "10");
        assert_eq!(r.text("name"), Some("Asha"));
        assert_eq!(r.text("class"), None);
        assert_eq!(r.number("name"), None);
        assert_eq!(r.number("missing"), None);
        assert_eq!(r.display("missing"), "");
    }

    #[test]
    fn test_percentage_prefers_provided_field() {
        let r = Record::from_pairs([
            ("percentage", 90.0),
            ("total_marks", 40.0),
            ("max_marks", 100.0),
        ]);
        assert_eq!(r.percentage("percentage", "total_marks", "max_marks"), Some(90.0));
    }

    #[test]
    fn test_percentage_falls_back_to_computed() {
        let r = Record::from_pairs([("total_marks", 45.0), ("max_marks", 50.0)]);
        assert_eq!(r.percentage("percentage", "total_marks", "max_marks"), Some(90.0));
    }

    #[test]
    fn test_computed_ratio_zero_whole() {
        let r = Record::from_pairs([("total_marks", 45.0), ("max_marks", 0.0)]);
        assert_eq!(r.computed_ratio("total_marks", "max_marks"), None);
    }

    #[test]
    fn test_is_blank() {
        let r = Record::from_pairs([("a", ""), ("b", "")]);
        assert!(r.is_blank());
        let r = Record::from_pairs([("a", ""), ("b", "x")]);
        assert!(!r.is_blank());
    }

    #[test]
    fn test_numeric_cells_keep_source_text() {
        let r = Record::from_pairs([
            ("class", Value::parse("09")),
            ("id", Value::parse(" 007 ")),
            ("fee", Value::parse("10.50")),
        ]);

        assert_eq!(r.display("class"), "09");
        assert_eq!(r.display("id"), "007");
        assert_eq!(r.display("fee"), "10.50");
        assert_eq!(r.number("class"), Some(9.0));
        assert_eq!(r.number("fee"), Some(10.5));
        assert_eq!(serde_json::to_string(&r).unwrap(), r#"{"class":9.0,"fee":10.5,"id":7.0}"#);
    }
}
