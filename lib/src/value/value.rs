use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Serialize, Deserialize};

/// An insertion-ordered dictionary.
pub type Dict<K = Arc<str>, V = Value> = IndexMap<K, V>;

/// Represents any valid value.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Num(Num),
    String(Arc<str>),
    Array(Arc<Vec<Value>>),
    Dict(Arc<Dict>),
}

impl Value {
    pub fn to_null(&self) -> Option<()> {
        match self {
            Value::Null => Some(()),
            _ => None
        }
    }

    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None
        }
    }

    pub fn to_num(&self) -> Option<Num> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None
        }
    }

    pub fn into_str(self) -> Result<Arc<str>, Value> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&**s),
            _ => None
        }
    }

    pub fn into_vec(self) -> Result<Arc<Vec<Value>>, Value> {
        match self {
            Value::Array(v) => Ok(v),
            _ => Err(self)
        }
    }

    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v.as_slice()),
            _ => None
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(v) => Some(&**v),
            _ => None
        }
    }

    pub fn into_dict(self) -> Result<Arc<Dict>, Value> {
        match self {
            Value::Dict(v) => Ok(v),
            _ => Err(self)
        }
    }

    /// The text form of a scalar: strings as-is, booleans and numbers as
    /// they'd be written in a CSV cell. `None` for null, arrays, and dicts.
    ///
    /// ```rust
    /// use cardpress::value::Value;
    ///
    /// assert_eq!(Value::from("Fireball").to_text().unwrap(), "Fireball");
    /// assert_eq!(Value::from(true).to_text().unwrap(), "true");
    /// assert_eq!(Value::from(3u8).to_text().unwrap(), "3");
    /// assert!(Value::Null.to_text().is_none());
    /// ```
    pub fn to_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::String(s) => Some(Cow::Borrowed(&**s)),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            Value::Num(n) => Some(Cow::Owned(n.to_string())),
            Value::Null | Value::Array(_) | Value::Dict(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
        }
    }
}

macro_rules! impl_from_primitive {
    ($($T:ty),+ => $E:ident::$kind:ident) => {
        $(
            impl From<$T> for $E {
                fn from(value: $T) -> Self {
                    $E::$kind(value.into())
                }
            }
        )+
    };
}

impl_from_primitive!(bool => Value::Bool);
impl_from_primitive!(&str => Value::String);
impl_from_primitive!(Cow<'_, str> => Value::String);
impl_from_primitive!(String => Value::String);
impl_from_primitive!(Arc<str> => Value::String);
impl_from_primitive!(Arc<Vec<Value>> => Value::Array);
impl_from_primitive!(Arc<Dict> => Value::Dict);
impl_from_primitive!(Dict => Value::Dict);
impl_from_primitive!(u8, u16, u32, u64 => Value::Num);
impl_from_primitive!(i8, i16, i32, i64, f64 => Value::Num);

impl From<()> for Value  {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<T> From<Option<T>> for Value where Value: From<T> {
    fn from(value: Option<T>) -> Self {
        value.map(Value::from).unwrap_or(Value::Null)
    }
}

impl<T> From<Vec<T>> for Value where Value: From<T> {
    fn from(value: Vec<T>) -> Self {
        value.into_iter()
            .map(Value::from)
            .collect()
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        let vec = iter.into_iter().collect::<Vec<Value>>();
        Value::Array(Arc::new(vec))
    }
}

/// A signed, unsigned, or floating point numeric value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Num {
    /// A signed integer.
    Int(i64),
    /// An unsigned integer too large for `Int`.
    UInt(u64),
    /// A floating point number.
    Float(f64),
}

impl Num {
    /// Converts `self` into an `i64` if it is integral and in range.
    ///
    /// ```rust
    /// use cardpress::value::Num;
    ///
    /// assert_eq!(Num::from(-3i8).to_i64(), Some(-3));
    /// assert_eq!(Num::from(2.0).to_i64(), Some(2));
    /// assert_eq!(Num::from(2.5).to_i64(), None);
    /// assert_eq!(Num::from(u64::MAX).to_i64(), None);
    /// ```
    pub fn to_i64(self) -> Option<i64> {
        match self {
            Num::Int(v) => Some(v),
            Num::UInt(v) => i64::try_from(v).ok(),
            Num::Float(v) if v.fract() == 0.0 && v.is_finite() => {
                (v >= i64::MIN as f64 && v <= i64::MAX as f64).then_some(v as i64)
            }
            Num::Float(_) => None,
        }
    }
}

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Num::Int(v) => v.fmt(f),
            Num::UInt(v) => v.fmt(f),
            Num::Float(v) => v.fmt(f),
        }
    }
}

macro_rules! impl_from_for_num_value {
    ($($T:ty: $V:ident),* $(,)?) => ($(
        impl From<$T> for Num {
            fn from(value: $T) -> Num {
                Num::$V(value.into())
            }
        }
    )*)
}

impl_from_for_num_value! {
    u8: Int, u16: Int, u32: Int, u64: UInt,
    i8: Int, i16: Int, i32: Int, i64: Int,
    f64: Float,
}

macro_rules! impl_try_from_value {
    ($($T:ty),+ => | $v:ident | $e:expr) => {
        $(
            impl TryFrom<$crate::value::Value> for $T {
                type Error = Value;

                fn try_from($v: $crate::value::Value) -> Result<Self, Self::Error> {
                    (|| $e)()
                }
            }
        )+
    };
}

impl_try_from_value!(() => |v| v.to_null().ok_or(v));
impl_try_from_value!(bool => |v| v.to_bool().ok_or(v));
impl_try_from_value!(Arc<str> => |v| v.into_str());
impl_try_from_value!(Arc<Dict> => |v| v.into_dict());
impl_try_from_value!(Arc<Vec<Value>> => |v| v.into_vec());
impl_try_from_value!(Num => |v| v.to_num().ok_or(v));
impl_try_from_value!(i64 => |v| v.to_num().and_then(Num::to_i64).ok_or(v));
