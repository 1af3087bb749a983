//! Partitioning of orders into report groups.

use std::{collections::HashMap, fmt, str::FromStr};

use serde::Serialize;

use crate::{EngineError, OrderRecord, util::name_key};

/// Key of orders whose client has neither first nor last name.
pub const NO_NAME: &str = "no-name";
/// Key of orders without coupons.
pub const NO_COUPON: &str = "no-coupon";

const ALL: &str = "all";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GroupingStrategy {
    #[default]
    None,
    ByStatus,
    ByClient,
    ByCoupon,
}

/// Identity of one report group.
///
/// `key` decides membership; `label` is what gets rendered, taken from the
/// first order that produced the key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupKey {
    pub key: String,
    pub label: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sentinel: bool,
}

impl GroupKey {
    fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            sentinel: false,
        }
    }

    fn sentinel(key: &'static str) -> Self {
        Self {
            key: key.to_string(),
            label: key.to_string(),
            sentinel: true,
        }
    }
}

impl GroupingStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ByStatus => "status",
            Self::ByClient => "client",
            Self::ByCoupon => "coupon",
        }
    }

    /// Group key of a single order.
    #[must_use]
    pub fn key_of(self, order: &OrderRecord) -> GroupKey {
        match self {
            Self::None => GroupKey::new(ALL, ALL),
            Self::ByStatus => GroupKey::new(order.status.as_str(), order.status.label()),
            Self::ByClient => match order.client_name() {
                Some(name) => GroupKey::new(name_key(&name), name),
                None => GroupKey::sentinel(NO_NAME),
            },
            Self::ByCoupon => {
                let codes = order.coupon_codes().collect::<Vec<_>>();
                if codes.is_empty() {
                    GroupKey::sentinel(NO_COUPON)
                } else {
                    let joined = codes.join(", ");
                    GroupKey::new(joined.clone(), joined)
                }
            }
        }
    }

    /// The key used when an order lacks the grouping attribute.
    #[must_use]
    pub fn sentinel_key(self) -> Option<&'static str> {
        match self {
            Self::ByClient => Some(NO_NAME),
            Self::ByCoupon => Some(NO_COUPON),
            Self::None | Self::ByStatus => None,
        }
    }

    /// Splits `orders` into groups in first-seen key order, sentinels last.
    /// Every order lands in exactly one group.
    #[must_use]
    pub fn partition<'a>(
        self,
        orders: &[&'a OrderRecord],
    ) -> Vec<(GroupKey, Vec<&'a OrderRecord>)> {
        // Sentinels never share a slot with a regular key of the same text.
        let mut index: HashMap<(bool, String), usize> = HashMap::new();
        let mut groups: Vec<(GroupKey, Vec<&'a OrderRecord>)> = Vec::new();

        for order in orders {
            let key = self.key_of(order);
            let slot = (key.sentinel, key.key.clone());
            match index.get(&slot) {
                Some(&position) => groups[position].1.push(order),
                None => {
                    index.insert(slot, groups.len());
                    groups.push((key, vec![*order]));
                }
            }
        }

        if let Some(sentinel) = self.sentinel_key() {
            let trailing = groups
                .iter()
                .position(|(key, _)| key.sentinel && key.key == sentinel);
            if let Some(position) = trailing {
                let group = groups.remove(position);
                groups.push(group);
            }
        }
        groups
    }
}

impl fmt::Display for GroupingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupingStrategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "status" | "bystatus" => Ok(Self::ByStatus),
            "client" | "byclient" => Ok(Self::ByClient),
            "coupon" | "bycoupon" => Ok(Self::ByCoupon),
            other => Err(EngineError::InvalidOperation(format!(
                "unknown grouping: {other}"
            ))),
        }
    }
}
