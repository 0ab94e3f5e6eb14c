use super::{CharCodec, Codec, CodecError, FloatCodec, Raw, Shape};
use docfilter_ast::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Every value given for a key (`?foo=1&foo=2`), each decoded by the child codec.
#[derive(Debug, Clone)]
pub struct ListCodec {
    child: Arc<dyn Codec>,
}

impl ListCodec {
    pub fn new(child: impl Codec + 'static) -> Self { Self { child: Arc::new(child) } }

    pub fn of(child: Arc<dyn Codec>) -> Self { Self { child } }
}

impl Default for ListCodec {
    fn default() -> Self { Self::new(CharCodec::default()) }
}

impl Codec for ListCodec {
    fn shape(&self) -> Shape { Shape::Sequence }

    fn decode(&self, raw: &Raw) -> Result<Value, CodecError> {
        let items = match raw {
            Raw::One(item) => std::slice::from_ref(item),
            Raw::Many(items) => items.as_slice(),
            Raw::Group(_) => return Err(CodecError::ExpectedList),
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| self.child.decode(&Raw::One(item.clone())).map_err(|err| CodecError::item(index, err)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }
}

/// A group of `name.key` entries (`?foo.min=1&foo.max=2`), each value decoded by the child codec.
#[derive(Debug, Clone)]
pub struct DictCodec {
    child: Arc<dyn Codec>,
    valid_keys: Option<BTreeSet<String>>,
    required_keys: Option<BTreeSet<String>>,
}

impl DictCodec {
    pub fn new(child: impl Codec + 'static) -> Self { Self::of(Arc::new(child)) }

    pub fn of(child: Arc<dyn Codec>) -> Self { Self { child, valid_keys: None, required_keys: None } }

    /// The `min`/`max` group read by range filters
    pub fn range(child: Arc<dyn Codec>) -> Self { Self::of(child).valid_keys(["min", "max"]) }

    pub fn valid_keys<I: IntoIterator<Item = S>, S: Into<String>>(mut self, keys: I) -> Self {
        self.valid_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn required_keys<I: IntoIterator<Item = S>, S: Into<String>>(mut self, keys: I) -> Self {
        self.required_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    fn check_keys(&self, group: &BTreeMap<String, String>) -> Result<(), CodecError> {
        if let Some(valid) = &self.valid_keys {
            let invalid: Vec<String> = group.keys().filter(|key| !valid.contains(*key)).cloned().collect();
            if !invalid.is_empty() {
                return Err(CodecError::InvalidKeys(invalid));
            }
        }
        if let Some(required) = &self.required_keys {
            let missing: Vec<String> = required.iter().filter(|key| !group.contains_key(*key)).cloned().collect();
            if !missing.is_empty() {
                return Err(CodecError::MissingKeys(missing));
            }
        }
        Ok(())
    }
}

impl Codec for DictCodec {
    fn shape(&self) -> Shape { Shape::Group }

    fn decode(&self, raw: &Raw) -> Result<Value, CodecError> {
        let Raw::Group(group) = raw else {
            return Err(CodecError::ExpectedMap);
        };
        self.check_keys(group)?;
        group
            .iter()
            .map(|(key, item)| {
                let value = self.child.decode(&Raw::One(item.clone())).map_err(|err| CodecError::item(key, err))?;
                Ok((key.clone(), value))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Value::Map)
    }
}

/// `name.lng` and `name.lat`, both required, decoded into a GeoJSON point.
#[derive(Debug, Clone)]
pub struct GeoPointCodec {
    coordinates: DictCodec,
}

impl Default for GeoPointCodec {
    fn default() -> Self { Self { coordinates: DictCodec::new(FloatCodec).valid_keys(["lng", "lat"]).required_keys(["lng", "lat"]) } }
}

impl Codec for GeoPointCodec {
    fn shape(&self) -> Shape { Shape::Group }

    fn decode(&self, raw: &Raw) -> Result<Value, CodecError> {
        let decoded = self.coordinates.decode(raw)?;
        let coordinate = |key: &str| decoded.get_path(&[key]).and_then(Value::as_f64).ok_or_else(|| CodecError::MissingKeys(vec![key.to_string()]));
        Ok(Value::point(coordinate("lng")?, coordinate("lat")?))
    }
}
