use super::{Codec, CodecError, Raw};
use bson::oid::ObjectId;
use docfilter_ast::Value;
use uuid::Uuid;

/// Text, trimmed. Blank input (after trimming) is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCodec {
    pub trim_whitespace: bool,
}

impl Default for CharCodec {
    fn default() -> Self { Self { trim_whitespace: true } }
}

impl CharCodec {
    pub fn new() -> Self { Self::default() }

    /// Keep surrounding whitespace as given
    pub fn untrimmed() -> Self { Self { trim_whitespace: false } }
}

impl Codec for CharCodec {
    fn decode(&self, raw: &Raw) -> Result<Value, CodecError> {
        let text = raw.single()?;
        let text = if self.trim_whitespace { text.trim() } else { text };
        if text.is_empty() {
            return Err(CodecError::Blank);
        }
        Ok(Value::String(text.to_string()))
    }
}

/// Signed 64 bit integers. `10.0` and `10.` decode to 10; `10.5` is invalid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegerCodec;

impl Codec for IntegerCodec {
    fn decode(&self, raw: &Raw) -> Result<Value, CodecError> {
        let text = raw.single()?.trim();
        let digits = match text.split_once('.') {
            Some((whole, fraction)) if fraction.chars().all(|c| c == '0') => whole,
            _ => text,
        };
        digits.parse::<i64>().map(Value::I64).map_err(|_| CodecError::invalid(text, "integer"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloatCodec;

impl Codec for FloatCodec {
    fn decode(&self, raw: &Raw) -> Result<Value, CodecError> {
        let text = raw.single()?.trim();
        match text.parse::<f64>() {
            Ok(float) if float.is_finite() => Ok(Value::F64(float)),
            _ => Err(CodecError::invalid(text, "number")),
        }
    }
}

/// Three-state boolean. `null` decodes to [`Value::Null`], which filters treat as absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BooleanCodec;

impl BooleanCodec {
    const TRUE: &'static [&'static str] = &["t", "y", "yes", "true", "on", "1"];
    const FALSE: &'static [&'static str] = &["f", "n", "no", "false", "off", "0"];
    const NULL: &'static [&'static str] = &["null", "none"];
}

impl Codec for BooleanCodec {
    fn decode(&self, raw: &Raw) -> Result<Value, CodecError> {
        let text = raw.single()?.trim();
        let lowered = text.to_ascii_lowercase();
        if Self::TRUE.contains(&lowered.as_str()) {
            Ok(Value::Bool(true))
        } else if Self::FALSE.contains(&lowered.as_str()) {
            Ok(Value::Bool(false))
        } else if Self::NULL.contains(&lowered.as_str()) {
            Ok(Value::Null)
        } else {
            Err(CodecError::invalid(text, "boolean"))
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UuidCodec;

impl Codec for UuidCodec {
    fn decode(&self, raw: &Raw) -> Result<Value, CodecError> {
        let text = raw.single()?.trim();
        Uuid::parse_str(text).map(Value::Uuid).map_err(|_| CodecError::invalid(text, "uuid"))
    }
}

/// 24 hex digit document ids
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectIdCodec;

impl Codec for ObjectIdCodec {
    fn decode(&self, raw: &Raw) -> Result<Value, CodecError> {
        let text = raw.single()?.trim();
        ObjectId::parse_str(text).map(Value::ObjectId).map_err(|_| CodecError::invalid(text, "object id"))
    }
}
