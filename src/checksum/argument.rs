use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;

use crate::auth::TicketHeader;

/// One node of a call's argument tree. Built fresh per call by the caller,
/// read by the checksum engine and the AMF3 writer.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArgument {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(DateTime<Utc>),
    Sequence(Vec<CallArgument>),
    Mapping(BTreeMap<String, CallArgument>),
    Ticket(TicketHeader),
}

impl CallArgument {
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        CallArgument::Bytes(data.into())
    }

    pub fn sequence<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<CallArgument>,
    {
        CallArgument::Sequence(items.into_iter().map(Into::into).collect())
    }

    pub fn mapping<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<CallArgument>,
    {
        CallArgument::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Midnight UTC of the given calendar day.
    pub fn date(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(CallArgument::from)
    }
}

impl From<bool> for CallArgument {
    fn from(v: bool) -> Self {
        CallArgument::Bool(v)
    }
}

impl From<i32> for CallArgument {
    fn from(v: i32) -> Self {
        CallArgument::Integer(v as i64)
    }
}

impl From<i64> for CallArgument {
    fn from(v: i64) -> Self {
        CallArgument::Integer(v)
    }
}

impl From<u32> for CallArgument {
    fn from(v: u32) -> Self {
        CallArgument::Integer(v as i64)
    }
}

impl From<f64> for CallArgument {
    fn from(v: f64) -> Self {
        CallArgument::Double(v)
    }
}

impl From<&str> for CallArgument {
    fn from(v: &str) -> Self {
        CallArgument::Text(v.to_owned())
    }
}

impl From<String> for CallArgument {
    fn from(v: String) -> Self {
        CallArgument::Text(v)
    }
}

impl From<DateTime<Utc>> for CallArgument {
    fn from(v: DateTime<Utc>) -> Self {
        CallArgument::Date(v)
    }
}

impl From<NaiveDate> for CallArgument {
    fn from(v: NaiveDate) -> Self {
        CallArgument::Date(Utc.from_utc_datetime(&v.and_time(chrono::NaiveTime::MIN)))
    }
}

impl From<TicketHeader> for CallArgument {
    fn from(v: TicketHeader) -> Self {
        CallArgument::Ticket(v)
    }
}

impl<T: Into<CallArgument>> From<Option<T>> for CallArgument {
    fn from(v: Option<T>) -> Self {
        v.map_or(CallArgument::Null, Into::into)
    }
}
