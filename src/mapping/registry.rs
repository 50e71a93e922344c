//! Datatype registry
//!
//! Associates scalar value types with an XSD datatype and a lexical codec.
//! Literal conversion requires the literal's datatype to match the registered
//! one exactly.

use super::value::ValueType;
use crate::object::Value;
use crate::rdf::vocab::xsd;
use crate::rdf::NamedNode;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Scalar ⇄ lexical form
pub trait LexicalCodec: Send + Sync {
    /// Lexical form of the value, `None` if the value has the wrong shape
    fn to_lexical(&self, value: &Value) -> Option<String>;

    /// Parse a lexical form
    fn from_lexical(&self, lexical: &str) -> Result<Value, String>;
}

struct StringCodec;

impl LexicalCodec for StringCodec {
    fn to_lexical(&self, value: &Value) -> Option<String> {
        value.as_str().map(str::to_string)
    }

    fn from_lexical(&self, lexical: &str) -> Result<Value, String> {
        Ok(Value::String(lexical.to_string()))
    }
}

struct IntegerCodec;

impl LexicalCodec for IntegerCodec {
    fn to_lexical(&self, value: &Value) -> Option<String> {
        value.as_i64().map(|i| i.to_string())
    }

    fn from_lexical(&self, lexical: &str) -> Result<Value, String> {
        lexical
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| e.to_string())
    }
}

struct DoubleCodec;

impl LexicalCodec for DoubleCodec {
    fn to_lexical(&self, value: &Value) -> Option<String> {
        value.as_f64().map(|d| d.to_string())
    }

    fn from_lexical(&self, lexical: &str) -> Result<Value, String> {
        match lexical.trim() {
            "INF" => Ok(Value::Double(f64::INFINITY)),
            "-INF" => Ok(Value::Double(f64::NEG_INFINITY)),
            other => other
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|e| e.to_string()),
        }
    }
}

struct FloatCodec;

impl LexicalCodec for FloatCodec {
    fn to_lexical(&self, value: &Value) -> Option<String> {
        value.as_f64().map(|d| (d as f32).to_string())
    }

    fn from_lexical(&self, lexical: &str) -> Result<Value, String> {
        lexical
            .trim()
            .parse::<f32>()
            .map(|f| Value::Double(f as f64))
            .map_err(|e| e.to_string())
    }
}

struct BooleanCodec;

impl LexicalCodec for BooleanCodec {
    fn to_lexical(&self, value: &Value) -> Option<String> {
        value.as_bool().map(|b| b.to_string())
    }

    fn from_lexical(&self, lexical: &str) -> Result<Value, String> {
        match lexical.trim() {
            "true" | "1" => Ok(Value::Boolean(true)),
            "false" | "0" => Ok(Value::Boolean(false)),
            other => Err(format!("not a boolean: {}", other)),
        }
    }
}

struct DateTimeCodec;

impl LexicalCodec for DateTimeCodec {
    fn to_lexical(&self, value: &Value) -> Option<String> {
        match value {
            Value::DateTime(dt) => Some(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            _ => None,
        }
    }

    fn from_lexical(&self, lexical: &str) -> Result<Value, String> {
        DateTime::parse_from_rfc3339(lexical.trim())
            .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
            .map_err(|e| e.to_string())
    }
}

struct DateCodec;

impl LexicalCodec for DateCodec {
    fn to_lexical(&self, value: &Value) -> Option<String> {
        match value {
            Value::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            _ => None,
        }
    }

    fn from_lexical(&self, lexical: &str) -> Result<Value, String> {
        NaiveDate::parse_from_str(lexical.trim(), "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|e| e.to_string())
    }
}

#[derive(Clone)]
struct Registration {
    datatype: NamedNode,
    codec: Arc<dyn LexicalCodec>,
}

/// Value type ⇄ datatype ⇄ codec table
#[derive(Clone)]
pub struct ConverterRegistry {
    by_type: HashMap<ValueType, Registration>,
    by_datatype: HashMap<NamedNode, ValueType>,
}

impl ConverterRegistry {
    /// Registry with no registrations
    pub fn empty() -> Self {
        Self {
            by_type: HashMap::new(),
            by_datatype: HashMap::new(),
        }
    }

    /// Registry with the XSD built-ins
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(ValueType::String, xsd::string(), StringCodec);
        registry.register(ValueType::Integer, xsd::integer(), IntegerCodec);
        registry.register(ValueType::Double, xsd::double(), DoubleCodec);
        registry.register(ValueType::Float, xsd::float(), FloatCodec);
        registry.register(ValueType::Boolean, xsd::boolean(), BooleanCodec);
        registry.register(ValueType::DateTime, xsd::date_time(), DateTimeCodec);
        registry.register(ValueType::Date, xsd::date(), DateCodec);
        registry
    }

    /// Register or replace the codec for a value type
    pub fn register(
        &mut self,
        value_type: ValueType,
        datatype: NamedNode,
        codec: impl LexicalCodec + 'static,
    ) {
        if let Some(previous) = self.by_type.get(&value_type) {
            self.by_datatype.remove(&previous.datatype);
        }
        self.by_datatype.insert(datatype.clone(), value_type.clone());
        self.by_type.insert(
            value_type,
            Registration {
                datatype,
                codec: Arc::new(codec),
            },
        );
    }

    pub fn supports(&self, value_type: &ValueType) -> bool {
        self.by_type.contains_key(value_type)
    }

    /// Datatype registered for a value type
    pub fn datatype(&self, value_type: &ValueType) -> Option<&NamedNode> {
        self.by_type.get(value_type).map(|r| &r.datatype)
    }

    /// Value type registered for a datatype
    pub fn value_type(&self, datatype: &NamedNode) -> Option<&ValueType> {
        self.by_datatype.get(datatype)
    }

    pub fn codec(&self, value_type: &ValueType) -> Option<&dyn LexicalCodec> {
        self.by_type.get(value_type).map(|r| r.codec.as_ref())
    }

    /// Value type of a native value, used when the declared type is `Any`
    pub fn infer_type(value: &Value) -> Option<ValueType> {
        match value {
            Value::String(_) => Some(ValueType::String),
            Value::Integer(_) => Some(ValueType::Integer),
            Value::Double(_) => Some(ValueType::Double),
            Value::Boolean(_) => Some(ValueType::Boolean),
            Value::DateTime(_) => Some(ValueType::DateTime),
            Value::Date(_) => Some(ValueType::Date),
            _ => None,
        }
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.by_type.iter().map(|(t, r)| (t, r.datatype.as_str())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_builtin_datatypes() {
        let registry = ConverterRegistry::new();
        assert_eq!(registry.datatype(&ValueType::Integer), Some(&xsd::integer()));
        assert_eq!(registry.value_type(&xsd::boolean()), Some(&ValueType::Boolean));
        assert!(!registry.supports(&ValueType::Node));
    }

    #[test]
    fn test_codecs() {
        let registry = ConverterRegistry::new();
        let integer = registry.codec(&ValueType::Integer).unwrap();
        assert_eq!(integer.from_lexical("42").unwrap(), Value::Integer(42));
        assert!(integer.from_lexical("forty-two").is_err());
        assert_eq!(integer.to_lexical(&Value::Integer(7)), Some("7".into()));
        assert_eq!(integer.to_lexical(&Value::from("7")), None);

        let boolean = registry.codec(&ValueType::Boolean).unwrap();
        assert_eq!(boolean.from_lexical("1").unwrap(), Value::Boolean(true));

        let date_time = registry.codec(&ValueType::DateTime).unwrap();
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let lexical = date_time.to_lexical(&Value::DateTime(dt)).unwrap();
        assert_eq!(lexical, "2024-03-01T12:30:00Z");
        assert_eq!(date_time.from_lexical(&lexical).unwrap(), Value::DateTime(dt));

        let date = registry.codec(&ValueType::Date).unwrap();
        assert_eq!(
            date.from_lexical("2024-03-01").unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
    }

    #[test]
    fn test_replace_registration() {
        let mut registry = ConverterRegistry::new();
        registry.register(ValueType::Integer, xsd::long(), IntegerCodec);
        assert_eq!(registry.datatype(&ValueType::Integer), Some(&xsd::long()));
        assert_eq!(registry.value_type(&xsd::integer()), None);
        assert_eq!(registry.value_type(&xsd::long()), Some(&ValueType::Integer));
    }
}
