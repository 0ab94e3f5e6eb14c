//! Filter descriptors.
//!
//! A [`Filter`] is an unbound template: the kind of comparison, the lookup operator,
//! an optional query-key override, an optional source path and the codec that decodes
//! its input. Templates are built once through [`FilterBuilder`], validated at build
//! time, and shared behind `Arc`. Binding a template to a name yields a [`BoundFilter`].

mod bound;

pub use bound::BoundFilter;

use crate::codec::{BooleanCodec, CharCodec, Codec, DateCodec, DateTimeCodec, DictCodec, FloatCodec, GeoPointCodec, IntegerCodec, ListCodec, ObjectIdCodec, UuidCodec};
use crate::error::ConfigurationError;
use docfilter_ast::Lookup;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static CREATION_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterKind {
    Boolean,
    Char,
    Uuid,
    Integer,
    Float,
    DateTime,
    /// Matches the whole calendar day
    Date,
    ObjectId,
    /// Matches a reference by the referenced document's id
    Reference,
    /// Membership against the list of every value given for the key
    List,
    /// `name.min` / `name.max` compared with the bound lookups
    Range { lower: Lookup, upper: Lookup, collapse: bool },
    GeoNear,
    GeoDistance,
    /// Stored `[low, high]` interval overlapping the queried `min`/`max` interval
    RangeIntersection { low: String, high: String },
}

impl FilterKind {
    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::Boolean => "boolean",
            FilterKind::Char => "char",
            FilterKind::Uuid => "uuid",
            FilterKind::Integer => "integer",
            FilterKind::Float => "float",
            FilterKind::DateTime => "datetime",
            FilterKind::Date => "date",
            FilterKind::ObjectId => "object id",
            FilterKind::Reference => "reference",
            FilterKind::List => "list",
            FilterKind::Range { .. } => "range",
            FilterKind::GeoNear => "geo near",
            FilterKind::GeoDistance => "geo distance",
            FilterKind::RangeIntersection { .. } => "range intersection",
        }
    }

    fn default_lookup(&self) -> Option<Lookup> {
        match self {
            FilterKind::GeoNear => Some(Lookup::Near),
            FilterKind::GeoDistance => Some(Lookup::MaxDistance),
            _ => None,
        }
    }

    /// Whether the kind can compile with `lookup`. `None` is plain equality.
    pub fn accepts(&self, lookup: Option<Lookup>) -> bool {
        match (self, lookup) {
            (FilterKind::Boolean, None | Some(Lookup::Ne | Lookup::Exists)) => true,
            (FilterKind::Char, None) => true,
            (FilterKind::Char, Some(lookup)) => lookup.is_comparison() || lookup.is_string(),
            (FilterKind::Uuid | FilterKind::Integer | FilterKind::Float | FilterKind::DateTime | FilterKind::ObjectId, None) => true,
            (FilterKind::Uuid | FilterKind::Integer | FilterKind::Float | FilterKind::DateTime | FilterKind::ObjectId, Some(lookup)) => {
                lookup.is_comparison()
            }
            (FilterKind::Date | FilterKind::Reference, lookup) => lookup.is_none(),
            (FilterKind::List, Some(lookup)) => lookup.is_membership(),
            (FilterKind::Range { .. } | FilterKind::RangeIntersection { .. }, lookup) => lookup.is_none(),
            (FilterKind::GeoNear | FilterKind::GeoDistance, Some(lookup)) => lookup.is_geo(),
            _ => false,
        }
    }

    fn is_collection(&self) -> bool {
        matches!(self, FilterKind::List | FilterKind::Range { .. } | FilterKind::RangeIntersection { .. })
    }

    fn codec(&self, child: Option<Arc<dyn Codec>>) -> Arc<dyn Codec> {
        let element = || child.clone().unwrap_or_else(|| Arc::new(CharCodec::default()));
        match self {
            FilterKind::Boolean => Arc::new(BooleanCodec),
            FilterKind::Char => Arc::new(CharCodec::default()),
            FilterKind::Uuid => Arc::new(UuidCodec),
            FilterKind::Integer => Arc::new(IntegerCodec),
            FilterKind::Float | FilterKind::GeoDistance => Arc::new(FloatCodec),
            FilterKind::DateTime => Arc::new(DateTimeCodec::millis()),
            FilterKind::Date => Arc::new(DateCodec),
            FilterKind::ObjectId | FilterKind::Reference => Arc::new(ObjectIdCodec),
            FilterKind::List => Arc::new(ListCodec::of(element())),
            FilterKind::Range { .. } | FilterKind::RangeIntersection { .. } => Arc::new(DictCodec::range(element())),
            FilterKind::GeoNear => Arc::new(GeoPointCodec::default()),
        }
    }
}

/// Per-filter construction options that can be supplied apart from the filter kind,
/// e.g. by schema introspection for the filters it synthesizes.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub lookup: Option<Lookup>,
    pub name: Option<String>,
    pub source: Option<String>,
    pub child: Option<Arc<dyn Codec>>,
}

impl FilterOptions {
    pub fn new() -> Self { Self::default() }

    pub fn lookup(mut self, lookup: Lookup) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn child(mut self, child: impl Codec + 'static) -> Self {
        self.child = Some(Arc::new(child));
        self
    }
}

/// An unbound filter template.
#[derive(Debug, Clone)]
pub struct Filter {
    kind: FilterKind,
    lookup: Option<Lookup>,
    name: Option<String>,
    source: Option<String>,
    codec: Arc<dyn Codec>,
    creation_order: u64,
}

impl Filter {
    pub fn boolean() -> FilterBuilder { FilterBuilder::new(FilterKind::Boolean) }

    /// Boolean filter testing attribute presence
    pub fn exists() -> FilterBuilder { Self::boolean().lookup(Lookup::Exists) }

    pub fn char() -> FilterBuilder { FilterBuilder::new(FilterKind::Char) }

    pub fn uuid() -> FilterBuilder { FilterBuilder::new(FilterKind::Uuid) }

    pub fn integer() -> FilterBuilder { FilterBuilder::new(FilterKind::Integer) }

    pub fn float() -> FilterBuilder { FilterBuilder::new(FilterKind::Float) }

    pub fn datetime() -> FilterBuilder { FilterBuilder::new(FilterKind::DateTime) }

    pub fn date() -> FilterBuilder { FilterBuilder::new(FilterKind::Date) }

    pub fn object_id() -> FilterBuilder { FilterBuilder::new(FilterKind::ObjectId) }

    pub fn reference() -> FilterBuilder { FilterBuilder::new(FilterKind::Reference) }

    /// List membership; a lookup must be chosen (`in`, `nin` or `all`)
    pub fn list() -> FilterBuilder { FilterBuilder::new(FilterKind::List) }

    /// Attribute value is one of the given values
    pub fn any() -> FilterBuilder { Self::list().lookup(Lookup::In) }

    /// Attribute value is none of the given values
    pub fn none() -> FilterBuilder { Self::list().lookup(Lookup::Nin) }

    /// Attribute contains all of the given values
    pub fn all() -> FilterBuilder { Self::list().lookup(Lookup::All) }

    pub fn range() -> FilterBuilder { FilterBuilder::new(FilterKind::Range { lower: Lookup::Gte, upper: Lookup::Lte, collapse: false }) }

    pub fn geo_near() -> FilterBuilder { FilterBuilder::new(FilterKind::GeoNear) }

    pub fn geo_distance() -> FilterBuilder { FilterBuilder::new(FilterKind::GeoDistance) }

    /// Matches documents whose stored `[low, high]` interval overlaps the queried one.
    /// Either stored bound may be missing, meaning unbounded on that side.
    pub fn range_intersection(low: impl Into<String>, high: impl Into<String>) -> FilterBuilder {
        FilterBuilder::new(FilterKind::RangeIntersection { low: low.into(), high: high.into() })
    }

    pub fn kind(&self) -> &FilterKind { &self.kind }

    pub fn lookup(&self) -> Option<Lookup> { self.lookup }

    /// Query key override
    pub fn name(&self) -> Option<&str> { self.name.as_deref() }

    /// Dotted attribute path override
    pub fn source(&self) -> Option<&str> { self.source.as_deref() }

    pub fn codec(&self) -> &Arc<dyn Codec> { &self.codec }

    /// Position in global construction sequence, used to order declarations
    pub fn creation_order(&self) -> u64 { self.creation_order }

    /// Attach this template to `name`. The template itself is never modified, so one
    /// template may be bound any number of times.
    pub fn bind(self: &Arc<Self>, name: &str) -> BoundFilter { BoundFilter::new(name, Arc::clone(self)) }
}

#[derive(Debug, Clone)]
pub struct FilterBuilder {
    kind: FilterKind,
    lookup: Option<Lookup>,
    name: Option<String>,
    source: Option<String>,
    child: Option<Arc<dyn Codec>>,
    codec: Option<Arc<dyn Codec>>,
    bounds: Option<(Lookup, Lookup)>,
    collapse: bool,
}

impl FilterBuilder {
    pub fn new(kind: FilterKind) -> Self {
        let lookup = kind.default_lookup();
        Self { kind, lookup, name: None, source: None, child: None, codec: None, bounds: None, collapse: false }
    }

    pub fn kind(&self) -> &FilterKind { &self.kind }

    pub fn lookup(mut self, lookup: Lookup) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Lookup given by its backend suffix, e.g. `"gte"`
    pub fn lookup_str(self, lookup: &str) -> Result<Self, ConfigurationError> { Ok(self.lookup(lookup.parse()?)) }

    /// Read the value from `name` in the query instead of the binding name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Compare against the attribute at this dotted path instead of the binding name.
    ///
    /// A last segment spelled like a lookup (`meta.exact`) compiles to a key the store
    /// reads as that lookup on the parent path; see [`docfilter_ast::split_key`].
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Element codec for list, range and range intersection filters
    pub fn child(mut self, child: impl Codec + 'static) -> Self {
        self.child = Some(Arc::new(child));
        self
    }

    /// Replace the kind's codec entirely
    pub fn codec(mut self, codec: impl Codec + 'static) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    /// Range comparison lookups, `gte`/`lte` unless given
    pub fn bounds(mut self, lower: Lookup, upper: Lookup) -> Self {
        self.bounds = Some((lower, upper));
        self
    }

    /// Compile equal range bounds as a single equality
    pub fn collapse(mut self) -> Self {
        self.collapse = true;
        self
    }

    pub fn options(mut self, options: &FilterOptions) -> Self {
        if let Some(lookup) = options.lookup {
            self.lookup = Some(lookup);
        }
        if let Some(name) = &options.name {
            self.name = Some(name.clone());
        }
        if let Some(source) = &options.source {
            self.source = Some(source.clone());
        }
        if let Some(child) = &options.child {
            self.child = Some(Arc::clone(child));
        }
        self
    }

    pub fn build(self) -> Result<Filter, ConfigurationError> {
        let FilterBuilder { mut kind, lookup, name, source, child, codec, bounds, collapse } = self;

        if !kind.accepts(lookup) {
            let lookup = lookup.map_or_else(|| "(equality)".to_string(), |lookup| lookup.to_string());
            return Err(ConfigurationError::InvalidLookup { kind: kind.name(), lookup });
        }
        if child.is_some() && !kind.is_collection() {
            return Err(ConfigurationError::UnsupportedOption { kind: kind.name(), option: "child" });
        }

        match &mut kind {
            FilterKind::Range { lower, upper, collapse: collapse_equal } => {
                if let Some((low, high)) = bounds {
                    if !matches!(low, Lookup::Gt | Lookup::Gte) || !matches!(high, Lookup::Lt | Lookup::Lte) {
                        return Err(ConfigurationError::InvalidRangeBounds { lower: low, upper: high });
                    }
                    *lower = low;
                    *upper = high;
                }
                *collapse_equal = collapse;
            }
            other => {
                if bounds.is_some() {
                    return Err(ConfigurationError::UnsupportedOption { kind: other.name(), option: "bounds" });
                }
                if collapse {
                    return Err(ConfigurationError::UnsupportedOption { kind: other.name(), option: "collapse" });
                }
            }
        }

        let codec = codec.unwrap_or_else(|| kind.codec(child));
        let creation_order = CREATION_COUNTER.fetch_add(1, Ordering::Relaxed);
        Ok(Filter { kind, lookup, name, source, codec, creation_order })
    }
}
