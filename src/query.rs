//! List queries: pagination, sort directives, and caller scoping.
//!
//! Query parameters arrive as raw strings and are resolved leniently. Bad
//! sort tokens are dropped and a malformed range falls back to the
//! unranged scope; listing never fails validation.

use std::cmp::Ordering;

use crate::config::ConduitConfig;
use crate::model::{fields, Conduit, Status, UserId};

/// Largest integer exactly representable as an IEEE-754 double.
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Field a list may be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    /// `createdAt`
    CreatedAt,
    /// `updatedAt`
    UpdatedAt,
    /// `description`
    Description,
    /// `status`
    Status,
    /// `id`
    Id,
    /// `curi`
    Curi,
}

impl SortField {
    /// Every sortable field, in wire order.
    pub const ALL: [SortField; 6] = [
        SortField::CreatedAt,
        SortField::UpdatedAt,
        SortField::Description,
        SortField::Status,
        SortField::Id,
        SortField::Curi,
    ];

    /// Wire name of the field.
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::CreatedAt => fields::CREATED_AT,
            SortField::UpdatedAt => fields::UPDATED_AT,
            SortField::Description => fields::DESCRIPTION,
            SortField::Status => fields::STATUS,
            SortField::Id => fields::ID,
            SortField::Curi => fields::CURI,
        }
    }

    /// Looks up a field by exact wire name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    fn compare(self, a: &Conduit, b: &Conduit) -> Ordering {
        match self {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::Description => a.description.cmp(&b.description),
            SortField::Status => a.status.as_str().cmp(b.status.as_str()),
            SortField::Id => a.id.cmp(&b.id),
            SortField::Curi => a.curi.cmp(&b.curi),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

impl SortDirection {
    /// Parses `asc` or `desc`, ignoring ASCII case. Anything else,
    /// including surrounding whitespace, is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(SortDirection::Desc)
        } else {
            None
        }
    }
}

/// One `field:direction` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    /// Field compared
    pub field: SortField,
    /// Direction applied
    pub direction: SortDirection,
}

impl SortKey {
    /// `updatedAt:DESC`, used when no valid directive is given.
    pub const DEFAULT: SortKey = SortKey {
        field: SortField::UpdatedAt,
        direction: SortDirection::Desc,
    };

    /// Parses a single `field:direction` token.
    pub fn parse(token: &str) -> Option<Self> {
        let (field, direction) = token.split_once(':')?;
        Some(SortKey {
            field: SortField::parse(field)?,
            direction: SortDirection::parse(direction)?,
        })
    }
}

/// Parses a comma-separated sort parameter.
///
/// Tokens are trimmed before parsing and invalid ones are dropped. The
/// result is never empty: with no valid
/// token it is `[SortKey::DEFAULT]`.
pub fn parse_sort(raw: Option<&str>) -> Vec<SortKey> {
    let keys: Vec<SortKey> = raw
        .map(|s| s.split(',').map(str::trim).filter_map(SortKey::parse).collect())
        .unwrap_or_default();
    if keys.is_empty() {
        vec![SortKey::DEFAULT]
    } else {
        keys
    }
}

/// Parses a pagination bound. Only decimal integers within
/// ±[`MAX_SAFE_INTEGER`] are accepted.
pub fn parse_safe_integer(raw: Option<&str>) -> Option<i64> {
    raw?.parse::<i64>()
        .ok()
        .filter(|n| n.unsigned_abs() <= MAX_SAFE_INTEGER.unsigned_abs())
}

/// Compares two conduits under `order`; ties fall back to ascending id.
pub fn compare(order: &[SortKey], a: &Conduit, b: &Conduit) -> Ordering {
    order
        .iter()
        .map(|key| {
            let ord = key.field.compare(a, b);
            match key.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        })
        .find(|ord| ord.is_ne())
        .unwrap_or_else(|| a.id.cmp(&b.id))
}

/// Which conduits a list returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// The owner's conduits with `start <= id < start + count`.
    Range {
        /// Owning user
        owner: UserId,
        /// First id, inclusive
        start: i64,
        /// Width of the id window
        count: i64,
    },
    /// Every active conduit of every owner.
    ActiveEverywhere,
    /// Every conduit of one owner.
    Owner(UserId),
}

impl ListScope {
    /// Returns `true` if `conduit` falls inside this scope.
    pub fn matches(&self, conduit: &Conduit) -> bool {
        match *self {
            ListScope::Range { owner, start, count } => {
                conduit.user_id == owner && conduit.id >= start && conduit.id < start + count
            }
            ListScope::ActiveEverywhere => conduit.status == Status::Active,
            ListScope::Owner(owner) => conduit.user_id == owner,
        }
    }
}

/// Raw list query parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListParams<'a> {
    /// `start`
    pub start: Option<&'a str>,
    /// `count`
    pub count: Option<&'a str>,
    /// `sort`
    pub sort: Option<&'a str>,
}

/// A resolved list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Rows selected
    pub scope: ListScope,
    /// Ordering, never empty
    pub order: Vec<SortKey>,
}

/// Resolves raw parameters into a [`ListQuery`] for a given caller.
#[derive(Debug, Clone, Copy)]
pub struct ListQueryResolver<'c> {
    config: &'c ConduitConfig,
}

impl<'c> ListQueryResolver<'c> {
    /// Creates a resolver that consults `config` for the gateway caller.
    pub fn new(config: &'c ConduitConfig) -> Self {
        Self { config }
    }

    /// Resolves `params` for `caller`.
    ///
    /// A range applies only when both bounds are safe integers. Without
    /// one, the gateway caller sees all active conduits and anyone else
    /// sees their own.
    pub fn resolve(&self, caller: UserId, params: &ListParams<'_>) -> ListQuery {
        let range = parse_safe_integer(params.start).zip(parse_safe_integer(params.count));
        let scope = match range {
            Some((start, count)) => ListScope::Range {
                owner: caller,
                start,
                count,
            },
            None if self.config.is_gateway(caller) => ListScope::ActiveEverywhere,
            None => ListScope::Owner(caller),
        };
        ListQuery {
            scope,
            order: parse_sort(params.sort),
        }
    }
}
