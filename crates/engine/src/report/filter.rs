use crate::{OrderRecord, util::name_key};

/// Free-text search box value, resolved once instead of branching on
/// "string or number" at every use.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SearchFilter {
    #[default]
    Empty,
    /// Matches client names and coupon codes, ignoring case and accents.
    Text(String),
    /// Matches an order id exactly.
    Id(u64),
}

impl SearchFilter {
    /// `""` is empty, `"#42"` or `"42"` is an id, anything else is text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        match digits.parse::<u64>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Text(name_key(trimmed)),
        }
    }

    #[must_use]
    pub fn matches(&self, order: &OrderRecord) -> bool {
        match self {
            Self::Empty => true,
            Self::Id(id) => order.id == *id,
            Self::Text(needle) => {
                let needle = name_key(needle);
                order
                    .client_name()
                    .is_some_and(|name| name_key(&name).contains(&needle))
                    || order
                        .coupon_codes()
                        .any(|code| name_key(code).contains(&needle))
            }
        }
    }

    /// Orders accepted by the filter, in input order.
    pub fn apply<'a>(&self, orders: &'a [OrderRecord]) -> Vec<&'a OrderRecord> {
        orders.iter().filter(|order| self.matches(order)).collect()
    }
}
