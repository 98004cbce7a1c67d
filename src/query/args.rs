//! Positional statement arguments.
//!
//! Callers either pass individual values as a tuple, `(a, b, c)`, or a
//! pre-built list, `vec![a, b, c]` / `[a, b, c]` / `&[a, b, c]`. Both forms
//! produce the same flat [`Args`], so `query(.., vec![1, 2, 3])` and
//! `query(.., (1, 2, 3))` bind identically, which is what `IN (?, ?, ?)`
//! style statements want.
//!
//! A list is always spread into individual parameters. To bind a byte
//! string as one BLOB parameter, wrap it in a tuple: `(bytes,)`.
//!
//! SQL integers are signed 64-bit, so `u64` and `usize` only convert through
//! `Param::try_from`, which rejects values above `i64::MAX`.

use crate::RowcastError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// A single positional parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

macro_rules! param_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Param {
                fn from(v: $t) -> Self {
                    Param::Int(v as i64)
                }
            }
        )*
    };
}

param_from_int!(i8, i16, i32, i64, isize, u8, u16, u32);

macro_rules! param_try_from_unsigned {
    ($($t:ty),*) => {
        $(
            impl TryFrom<$t> for Param {
                type Error = RowcastError;

                fn try_from(v: $t) -> Result<Self, Self::Error> {
                    i64::try_from(v).map(Param::Int).map_err(|_| {
                        RowcastError::TypeConversion(format!("{v} does not fit a signed 64-bit SQL integer"))
                    })
                }
            }
        )*
    };
}

param_try_from_unsigned!(u64, usize);

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}

impl From<f32> for Param {
    fn from(v: f32) -> Self {
        Param::Float(v as f64)
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Float(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}

impl From<&String> for Param {
    fn from(v: &String) -> Self {
        Param::Text(v.clone())
    }
}

impl From<Vec<u8>> for Param {
    fn from(v: Vec<u8>) -> Self {
        Param::Bytes(v)
    }
}

impl From<NaiveDate> for Param {
    fn from(v: NaiveDate) -> Self {
        Param::Text(v.format("%Y-%m-%d").to_string())
    }
}

impl From<NaiveTime> for Param {
    fn from(v: NaiveTime) -> Self {
        Param::Text(v.format("%H:%M:%S%.f").to_string())
    }
}

impl From<NaiveDateTime> for Param {
    fn from(v: NaiveDateTime) -> Self {
        Param::Text(v.and_utc().to_rfc3339())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Param
where
    Tz::Offset: std::fmt::Display,
{
    fn from(v: DateTime<Tz>) -> Self {
        Param::Text(v.to_rfc3339())
    }
}

impl From<serde_json::Value> for Param {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Param::Null,
            other => Param::Text(other.to_string()),
        }
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        v.map_or(Param::Null, Into::into)
    }
}

/// Flat, ordered positional arguments for one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Vec<Param>);

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, param: impl Into<Param>) {
        self.0.push(param.into());
    }

    pub fn as_slice(&self) -> &[Param] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<Param> {
        self.0
    }
}

impl<P: Into<Param>> FromIterator<P> for Args {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Args(iter.into_iter().map(Into::into).collect())
    }
}

/// Anything that can be bound as a statement's positional arguments.
pub trait IntoArgs {
    fn into_args(self) -> Args;
}

impl IntoArgs for Args {
    fn into_args(self) -> Args {
        self
    }
}

impl IntoArgs for () {
    fn into_args(self) -> Args {
        Args::new()
    }
}

impl<T: Into<Param>> IntoArgs for Vec<T> {
    fn into_args(self) -> Args {
        self.into_iter().collect()
    }
}

impl<T: Into<Param>, const N: usize> IntoArgs for [T; N] {
    fn into_args(self) -> Args {
        self.into_iter().collect()
    }
}

impl<T: Into<Param> + Clone> IntoArgs for &[T] {
    fn into_args(self) -> Args {
        self.iter().cloned().collect()
    }
}

macro_rules! tuple_into_args {
    ($($name:ident),+) => {
        impl<$($name: Into<Param>),+> IntoArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_args(self) -> Args {
                let ($($name,)+) = self;
                Args(vec![$($name.into()),+])
            }
        }
    };
}

tuple_into_args!(A);
tuple_into_args!(A, B);
tuple_into_args!(A, B, C);
tuple_into_args!(A, B, C, D);
tuple_into_args!(A, B, C, D, E);
tuple_into_args!(A, B, C, D, E, F);
tuple_into_args!(A, B, C, D, E, F, G);
tuple_into_args!(A, B, C, D, E, F, G, H);
tuple_into_args!(A, B, C, D, E, F, G, H, I);
tuple_into_args!(A, B, C, D, E, F, G, H, I, J);
tuple_into_args!(A, B, C, D, E, F, G, H, I, J, K);
tuple_into_args!(A, B, C, D, E, F, G, H, I, J, K, L);
