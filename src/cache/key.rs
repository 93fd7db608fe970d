//! Cache Key Module
//!
//! Turns a resource path and its query parameters into a canonical cache key.

use std::collections::HashMap;
use std::fmt;

use url::form_urlencoded;

// == Param Value ==
/// A scalar query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ParamValue {
    /// Returns true for values that read as an enabled flag.
    pub fn is_truthy(&self) -> bool {
        match self {
            ParamValue::Str(s) => !s.is_empty() && s != "false" && s != "0",
            ParamValue::Int(n) => *n != 0,
            ParamValue::Float(f) => *f != 0.0,
            ParamValue::Bool(b) => *b,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(n) => write!(f, "{}", n),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

// == Query Params ==
/// Query parameters for an upstream request.
///
/// A parameter may be present with no value; such entries are skipped both
/// when building the cache key and when sending the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    values: HashMap<String, Option<ParamValue>>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a defined parameter, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds a parameter that may be undefined, builder style.
    pub fn with_opt<V: Into<ParamValue>>(mut self, name: impl Into<String>, value: Option<V>) -> Self {
        self.values.insert(name.into(), value.map(Into::into));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(name.into(), Some(value.into()));
    }

    /// Returns the value of a defined parameter.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name).and_then(Option::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over every name, including those without a value.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Defined parameters as strings, sorted by name.
    pub fn sorted_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .values
            .iter()
            .filter_map(|(name, value)| value.as_ref().map(|v| (name.clone(), v.to_string())))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }
}

impl<K: Into<String>> FromIterator<(K, String)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, String)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

// == Derive Key ==
/// Builds the canonical key `path?a=1&b=2` with parameters sorted by name.
///
/// Undefined parameters are dropped, so `{a: None, b: 2}` and `{b: 2}` share a
/// key. An empty parameter set yields `path?`.
pub fn derive_key(path: &str, params: &QueryParams) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in params.sorted_pairs() {
        serializer.append_pair(&name, &value);
    }
    format!("{}?{}", path, serializer.finish())
}
