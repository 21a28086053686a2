//! Dummy parameter values
//!
//! The registry invokes query producers once with harmless stand-in
//! arguments; only the SQL and the declared shape matter, never the values.
//! [`Dummy`] supplies those stand-ins for every host scalar type, with empty
//! containers for `Vec` and none for `Option`. A parameter type without an
//! implementation fails at compile time.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A harmless instance of a parameter type.
pub trait Dummy {
    fn dummy() -> Self;
}

macro_rules! dummy {
    ($($ty:ty => $value:expr),* $(,)?) => {
        $(
            impl Dummy for $ty {
                fn dummy() -> Self {
                    $value
                }
            }
        )*
    };
}

dummy! {
    bool => false,
    i16 => 0,
    i32 => 0,
    i64 => 0,
    u8 => 0,
    u32 => 0,
    f32 => 0.0,
    f64 => 0.0,
    String => String::new(),
    &'static str => "",
    Decimal => Decimal::ZERO,
    Uuid => Uuid::nil(),
    serde_json::Value => serde_json::Value::Null,
    // chrono defaults are all the Unix epoch / midnight.
    NaiveDate => NaiveDate::default(),
    NaiveTime => NaiveTime::default(),
    NaiveDateTime => NaiveDateTime::default(),
    DateTime<Utc> => DateTime::<Utc>::default(),
}

impl<T: Dummy> Dummy for Vec<T> {
    fn dummy() -> Self {
        Vec::new()
    }
}

impl<T> Dummy for Option<T> {
    fn dummy() -> Self {
        None
    }
}
