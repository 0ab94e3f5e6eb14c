use crate::error::LookupError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between a target path segment and the next segment or the lookup suffix.
pub const LOOKUP_SEP: &str = "__";

/// A comparison the backend applies between a stored attribute and a query value.
///
/// Plain equality has no suffix and is represented by the absence of a lookup
/// (`Option<Lookup>::None`) wherever an operator is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Lookup {
    // Ordering
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,

    Exists,

    // Membership
    In,
    Nin,
    All,

    // String matching
    Exact,
    IExact,
    Contains,
    IContains,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,

    // Geo
    Near,
    NearSphere,
    MaxDistance,
    MinDistance,
    WithinDistance,
    WithinSphericalDistance,
    WithinBox,
    WithinPolygon,
    GeoWithin,
    GeoWithinBox,
    GeoWithinPolygon,
    GeoWithinCenter,
    GeoWithinSphere,
    GeoIntersects,
}

impl Lookup {
    pub const COMPARISON: &'static [Lookup] = &[Lookup::Ne, Lookup::Gt, Lookup::Gte, Lookup::Lt, Lookup::Lte];

    pub const MEMBERSHIP: &'static [Lookup] = &[Lookup::In, Lookup::Nin, Lookup::All];

    pub const STRING: &'static [Lookup] = &[
        Lookup::Exact,
        Lookup::IExact,
        Lookup::Contains,
        Lookup::IContains,
        Lookup::StartsWith,
        Lookup::IStartsWith,
        Lookup::EndsWith,
        Lookup::IEndsWith,
    ];

    pub const GEO: &'static [Lookup] = &[
        Lookup::Near,
        Lookup::NearSphere,
        Lookup::MaxDistance,
        Lookup::MinDistance,
        Lookup::WithinDistance,
        Lookup::WithinSphericalDistance,
        Lookup::WithinBox,
        Lookup::WithinPolygon,
        Lookup::GeoWithin,
        Lookup::GeoWithinBox,
        Lookup::GeoWithinPolygon,
        Lookup::GeoWithinCenter,
        Lookup::GeoWithinSphere,
        Lookup::GeoIntersects,
    ];

    /// The suffix the backend understands, e.g. `gte` in `age__gte`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Lookup::Ne => "ne",
            Lookup::Gt => "gt",
            Lookup::Gte => "gte",
            Lookup::Lt => "lt",
            Lookup::Lte => "lte",
            Lookup::Exists => "exists",
            Lookup::In => "in",
            Lookup::Nin => "nin",
            Lookup::All => "all",
            Lookup::Exact => "exact",
            Lookup::IExact => "iexact",
            Lookup::Contains => "contains",
            Lookup::IContains => "icontains",
            Lookup::StartsWith => "startswith",
            Lookup::IStartsWith => "istartswith",
            Lookup::EndsWith => "endswith",
            Lookup::IEndsWith => "iendswith",
            Lookup::Near => "near",
            Lookup::NearSphere => "near_sphere",
            Lookup::MaxDistance => "max_distance",
            Lookup::MinDistance => "min_distance",
            Lookup::WithinDistance => "within_distance",
            Lookup::WithinSphericalDistance => "within_spherical_distance",
            Lookup::WithinBox => "within_box",
            Lookup::WithinPolygon => "within_polygon",
            Lookup::GeoWithin => "geo_within",
            Lookup::GeoWithinBox => "geo_within_box",
            Lookup::GeoWithinPolygon => "geo_within_polygon",
            Lookup::GeoWithinCenter => "geo_within_center",
            Lookup::GeoWithinSphere => "geo_within_sphere",
            Lookup::GeoIntersects => "geo_intersects",
        }
    }

    pub fn is_comparison(self) -> bool { Self::COMPARISON.contains(&self) }

    pub fn is_membership(self) -> bool { Self::MEMBERSHIP.contains(&self) }

    pub fn is_string(self) -> bool { Self::STRING.contains(&self) }

    pub fn is_geo(self) -> bool { Self::GEO.contains(&self) }

    fn all() -> impl Iterator<Item = Lookup> {
        Self::COMPARISON.iter().chain(Self::MEMBERSHIP).chain(Self::STRING).chain(Self::GEO).copied().chain(std::iter::once(Lookup::Exists))
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Lookup {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(LookupError::Empty);
        }
        Lookup::all().find(|lookup| lookup.as_str() == s).ok_or_else(|| LookupError::Unknown(s.to_string()))
    }
}

impl TryFrom<String> for Lookup {
    type Error = LookupError;

    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<Lookup> for String {
    fn from(lookup: Lookup) -> Self { lookup.as_str().to_string() }
}

/// Compile a backend key from a target path and an optional lookup suffix.
pub fn lookup_key(target: &str, lookup: Option<Lookup>) -> String {
    match lookup {
        Some(lookup) => format!("{target}{LOOKUP_SEP}{lookup}"),
        None => target.to_string(),
    }
}

/// Split a compiled key back into its path segments and trailing lookup, if the
/// last segment names one.
///
/// The split is ambiguous for paths whose last attribute is spelled like a lookup:
/// `meta__exact` reads as `exact` on `meta`, never as equality on `meta.exact`. The
/// document store resolves compiled keys the same way.
pub fn split_key(key: &str) -> (Vec<&str>, Option<Lookup>) {
    let mut segments: Vec<&str> = key.split(LOOKUP_SEP).collect();
    if segments.len() > 1 {
        if let Some(Ok(lookup)) = segments.last().map(|last| last.parse::<Lookup>()) {
            segments.pop();
            return (segments, Some(lookup));
        }
    }
    (segments, None)
}
