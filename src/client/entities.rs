//! Typed records for gateway results.
//!
//! The gateway answers with loosely typed objects; every record here reads
//! the fields it knows and keeps its default for anything missing or of the
//! wrong kind.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::amf::AmfValue;

pub const LOGIN_OK_STATUSES: [&str; 2] = ["Success", "ThirdPartyCreated"];

/// Lenient conversion from a decoded value.
pub trait FromAmf: Sized + Default {
    /// Fill a record from an object value.
    fn from_fields(value: &AmfValue) -> Self;

    /// Default record for anything that is not an object.
    fn from_amf(value: &AmfValue) -> Self {
        if value.fields().is_some() {
            Self::from_fields(value)
        } else {
            Self::default()
        }
    }
}

fn int(value: &AmfValue, key: &str) -> Option<i64> {
    value.get(key).and_then(AmfValue::as_i64)
}

fn text(value: &AmfValue, key: &str) -> Option<String> {
    value.get(key).and_then(AmfValue::as_str).map(str::to_string)
}

fn flag(value: &AmfValue, key: &str) -> Option<bool> {
    match value.get(key)? {
        AmfValue::Bool(b) => Some(*b),
        other => other.as_i64().map(|n| n != 0),
    }
}

fn date(value: &AmfValue, key: &str) -> Option<DateTime<Utc>> {
    value.get(key).and_then(AmfValue::as_date)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NebulaLoginStatus {
    pub access_token: Option<String>,
    pub profile_id: Option<String>,
    pub refresh_token: Option<String>,
}

impl FromAmf for NebulaLoginStatus {
    fn from_fields(value: &AmfValue) -> Self {
        Self {
            access_token: text(value, "accessToken"),
            profile_id: text(value, "profileId"),
            refresh_token: text(value, "refresh_token"),
        }
    }
}

/// The logged-in actor, as far as the client cares.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Actor {
    pub actor_id: i64,
    pub name: Option<String>,
    pub level: i64,
    pub money: i64,
    pub fame: i64,
    pub fortune: i64,
    pub diamonds: i64,
    pub friend_count: i64,
    pub moderator: i64,
    pub recycle_points: i64,
    pub created: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub membership_timeout_date: Option<DateTime<Utc>>,
    pub locked_until: Option<DateTime<Utc>>,
    pub email: Option<String>,
}

impl FromAmf for Actor {
    fn from_fields(value: &AmfValue) -> Self {
        Self {
            actor_id: int(value, "ActorId").unwrap_or_default(),
            name: text(value, "Name"),
            level: int(value, "Level").unwrap_or_default(),
            money: int(value, "Money").unwrap_or_default(),
            fame: int(value, "Fame").unwrap_or_default(),
            fortune: int(value, "Fortune").unwrap_or_default(),
            diamonds: int(value, "Diamonds").unwrap_or_default(),
            friend_count: int(value, "FriendCount").unwrap_or_default(),
            moderator: int(value, "Moderator").unwrap_or_default(),
            recycle_points: int(value, "RecyclePoints").unwrap_or_default(),
            created: date(value, "Created"),
            last_login: date(value, "LastLogin"),
            membership_timeout_date: date(value, "MembershipTimeoutDate"),
            locked_until: date(value, "LockedUntil"),
            email: text(value, "Email"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginStatus {
    pub status: Option<String>,
    pub user_type: Option<String>,
    pub user_ip: i64,
    pub ticket: Option<String>,
    pub bought_respin_today: bool,
    pub diamond_respin_price: i64,
    pub fame_wheel_spin_price: i64,
    pub wheel_downloadable_fame_spins: i64,
    pub nebula_login_status: NebulaLoginStatus,
    pub actor: Actor,
}

impl Default for LoginStatus {
    fn default() -> Self {
        Self {
            status: None,
            user_type: None,
            user_ip: -1,
            ticket: None,
            bought_respin_today: false,
            diamond_respin_price: 0,
            fame_wheel_spin_price: 0,
            wheel_downloadable_fame_spins: 0,
            nebula_login_status: NebulaLoginStatus::default(),
            actor: Actor::default(),
        }
    }
}

impl LoginStatus {
    pub fn is_logged_in(&self) -> bool {
        self.status
            .as_deref()
            .map_or(false, |status| LOGIN_OK_STATUSES.contains(&status))
    }

    /// Field 1 of the ticket.
    pub fn actor_id(&self) -> Option<i64> {
        self.ticket.as_deref()?.split(',').nth(1)?.trim().parse().ok()
    }
}

impl FromAmf for LoginStatus {
    fn from_fields(value: &AmfValue) -> Self {
        let defaults = Self::default();
        Self {
            status: text(value, "status"),
            user_type: text(value, "userType"),
            user_ip: int(value, "userIp").unwrap_or(defaults.user_ip),
            ticket: text(value, "ticket"),
            bought_respin_today: flag(value, "boughtRespinToday").unwrap_or_default(),
            diamond_respin_price: int(value, "diamondRespinPrice").unwrap_or_default(),
            fame_wheel_spin_price: int(value, "fameWheelSpinPrice").unwrap_or_default(),
            wheel_downloadable_fame_spins: int(value, "wheelDownloadableFameSpins").unwrap_or_default(),
            nebula_login_status: value
                .get("nebulaLoginStatus")
                .map(NebulaLoginStatus::from_amf)
                .unwrap_or_default(),
            actor: value.get("actor").map(Actor::from_amf).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AwardData {
    pub starcoins: i64,
    pub diamonds: i64,
    pub fame: i64,
}

impl FromAmf for AwardData {
    fn from_fields(value: &AmfValue) -> Self {
        Self {
            starcoins: int(value, "Starcoins").unwrap_or_default(),
            diamonds: int(value, "Diamonds").unwrap_or_default(),
            fame: int(value, "Fame").unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PiggyBank {
    pub star_coins: i64,
    pub diamonds: i64,
    pub fame: i64,
    pub piggy_bank_state: i64,
}

impl FromAmf for PiggyBank {
    fn from_fields(value: &AmfValue) -> Self {
        Self {
            star_coins: int(value, "StarCoins").unwrap_or_default(),
            diamonds: int(value, "Diamonds").unwrap_or_default(),
            fame: int(value, "Fame").unwrap_or_default(),
            piggy_bank_state: int(value, "PiggyBankState").unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchActor {
    pub actor_id: i64,
    pub profile_id: Option<String>,
    pub membership_timeout_date: Option<DateTime<Utc>>,
    pub status: i64,
    pub name: Option<String>,
    pub level: i64,
    pub is_vip: bool,
}

impl FromAmf for SearchActor {
    fn from_fields(value: &AmfValue) -> Self {
        Self {
            actor_id: int(value, "ActorId").unwrap_or_default(),
            profile_id: text(value, "ProfileId"),
            membership_timeout_date: date(value, "MembershipTimeoutDate"),
            status: int(value, "Status").unwrap_or_default(),
            name: text(value, "Name"),
            level: int(value, "Level").unwrap_or_default(),
            is_vip: flag(value, "IsVIP").unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Autograph {
    pub fame: i64,
    pub timestamp: i64,
}

impl FromAmf for Autograph {
    fn from_fields(value: &AmfValue) -> Self {
        Self {
            fame: int(value, "Fame").unwrap_or_default(),
            timestamp: int(value, "Timestamp").unwrap_or_default(),
        }
    }
}
