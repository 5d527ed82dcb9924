//! Conduit entity, its enumerations, and the write payloads that feed it.

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Violations;
use crate::secret::{serialize_exposed, Secret};

/// Store-assigned conduit identifier.
pub type ConduitId = i64;

/// Identifier of the owning user (external collaborator).
pub type UserId = i64;

/// Maximum length of a generated conduit address.
pub const CURI_MAX_LEN: usize = 512;

/// Wire names of conduit fields.
pub mod fields {
    /// Store-assigned id
    pub const ID: &str = "id";
    /// Generated public address
    pub const CURI: &str = "curi";
    /// Target service credential
    pub const SURI_API_KEY: &str = "suriApiKey";
    /// Target service kind
    pub const SURI_TYPE: &str = "suriType";
    /// Target object key (URL or email)
    pub const SURI_OBJECT_KEY: &str = "suriObjectKey";
    /// IP allow-list
    pub const ALLOWLIST: &str = "allowlist";
    /// Request-access control methods
    pub const RACM: &str = "racm";
    /// Throttling flag
    pub const THROTTLE: &str = "throttle";
    /// Lifecycle status
    pub const STATUS: &str = "status";
    /// Free-form description
    pub const DESCRIPTION: &str = "description";
    /// Hidden form field rules
    pub const HIDDEN_FORM_FIELD: &str = "hiddenFormField";
    /// Owning user
    pub const USER_ID: &str = "userId";
    /// Creation timestamp
    pub const CREATED_AT: &str = "createdAt";
    /// Last update timestamp
    pub const UPDATED_AT: &str = "updatedAt";
}

/// Lifecycle status of a conduit or an allow-list entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Conduit is serving traffic
    Active,
    /// Conduit is parked; the only state in which it may be deleted
    #[default]
    Inactive,
}

impl Status {
    /// Every accepted wire value, in declaration order.
    pub const ALL: [&'static str; 2] = ["active", "inactive"];

    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Inactive => "inactive",
        }
    }

    /// Parses a wire value; matching is exact.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Status::Active),
            "inactive" => Some(Status::Inactive),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP method a conduit may accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// HTTP GET method
    Get,
    /// HTTP POST method
    Post,
    /// HTTP PUT method
    Put,
    /// HTTP PATCH method
    Patch,
    /// HTTP DELETE method
    Delete,
}

impl HttpMethod {
    /// Every accepted wire value.
    pub const ALL: [&'static str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Parses a wire value; matching is exact and case-sensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One IP-based entry of a conduit's allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowListEntry {
    /// IPv4 or IPv6 address
    pub ip: IpAddr,
    /// Whether the entry is in force
    pub status: Status,
    /// Operator note
    pub comment: String,
}

/// Policy applied to a hidden form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HffPolicy {
    /// Reject the request when the field is filled in
    DropIfFilled,
    /// Forward the request only when the field matches `value`
    PassIfMatch,
}

impl HffPolicy {
    /// Every accepted wire value.
    pub const ALL: [&'static str; 2] = ["drop-if-filled", "pass-if-match"];

    /// Parses a wire value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "drop-if-filled" => Some(HffPolicy::DropIfFilled),
            "pass-if-match" => Some(HffPolicy::PassIfMatch),
            _ => None,
        }
    }
}

/// A hidden form field filtering rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiddenFormField {
    /// Name of the form field; never blank
    pub field_name: String,
    /// Whether the field is forwarded to the target
    pub include: bool,
    /// Filtering policy
    pub policy: HffPolicy,
    /// Value compared against by `pass-if-match`
    pub value: String,
}

/// Validated conduit fields as supplied by a write request.
///
/// `None` means the caller did not supply the field. Create and replace
/// payloads come out of the validator with every optional field defaulted;
/// modify payloads keep `None` for untouched fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConduitDraft {
    /// Target service credential
    pub suri_api_key: Option<Secret<String>>,
    /// Target service kind
    pub suri_type: Option<String>,
    /// Target object key
    pub suri_object_key: Option<String>,
    /// IP allow-list
    pub allowlist: Option<Vec<AllowListEntry>>,
    /// Accepted HTTP methods
    pub racm: Option<Vec<HttpMethod>>,
    /// Throttling flag
    pub throttle: Option<bool>,
    /// Lifecycle status
    pub status: Option<Status>,
    /// Description
    pub description: Option<String>,
    /// Hidden form field rules
    pub hidden_form_field: Option<Vec<HiddenFormField>>,
}

impl ConduitDraft {
    /// Fills every absent optional field with its default.
    pub fn with_defaults(mut self) -> Self {
        self.allowlist.get_or_insert_with(Vec::new);
        self.racm.get_or_insert_with(default_racm);
        self.throttle.get_or_insert(true);
        self.status.get_or_insert(Status::Inactive);
        self.description.get_or_insert_with(String::new);
        self.hidden_form_field.get_or_insert_with(Vec::new);
        self
    }
}

/// Default accepted methods: `[GET]`.
pub fn default_racm() -> Vec<HttpMethod> {
    vec![HttpMethod::Get]
}

/// A conduit ready to be inserted; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewConduit {
    /// Generated public address
    pub curi: String,
    /// Target service credential
    pub suri_api_key: Secret<String>,
    /// Target service kind
    pub suri_type: String,
    /// Target object key
    pub suri_object_key: String,
    /// IP allow-list
    pub allowlist: Vec<AllowListEntry>,
    /// Accepted HTTP methods
    pub racm: Vec<HttpMethod>,
    /// Throttling flag
    pub throttle: bool,
    /// Lifecycle status
    pub status: Status,
    /// Description
    pub description: String,
    /// Hidden form field rules
    pub hidden_form_field: Vec<HiddenFormField>,
    /// Owning user
    pub user_id: UserId,
}

impl NewConduit {
    /// Builds an insertable conduit, injecting defaults for absent optional
    /// fields.
    ///
    /// # Errors
    ///
    /// Returns the not-null violations for any missing target field.
    pub fn from_draft(draft: ConduitDraft, user_id: UserId, curi: String) -> Result<Self, Violations> {
        let draft = draft.with_defaults();
        let mut missing = Violations::new();
        if draft.suri_api_key.is_none() {
            missing.push(fields::SURI_API_KEY, "api key is required");
        }
        if draft.suri_type.is_none() {
            missing.push(fields::SURI_TYPE, "resource type is required");
        }
        if draft.suri_object_key.is_none() {
            missing.push(fields::SURI_OBJECT_KEY, "object key is required");
        }

        match (draft.suri_api_key, draft.suri_type, draft.suri_object_key) {
            (Some(suri_api_key), Some(suri_type), Some(suri_object_key)) => Ok(Self {
                curi,
                suri_api_key,
                suri_type,
                suri_object_key,
                allowlist: draft.allowlist.unwrap_or_default(),
                racm: draft.racm.unwrap_or_else(default_racm),
                throttle: draft.throttle.unwrap_or(true),
                status: draft.status.unwrap_or_default(),
                description: draft.description.unwrap_or_default(),
                hidden_form_field: draft.hidden_form_field.unwrap_or_default(),
                user_id,
            }),
            _ => Err(missing),
        }
    }
}

/// A stored conduit.
///
/// Serializes to the owner-facing JSON representation (camelCase, RFC 3339
/// timestamps, api key in clear text).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conduit {
    /// Store-assigned id
    pub id: ConduitId,
    /// Target service credential
    #[serde(serialize_with = "serialize_exposed")]
    pub suri_api_key: Secret<String>,
    /// Target service kind
    pub suri_type: String,
    /// Target object key
    pub suri_object_key: String,
    /// Generated public address; set once at creation
    pub curi: String,
    /// IP allow-list
    pub allowlist: Vec<AllowListEntry>,
    /// Accepted HTTP methods
    pub racm: Vec<HttpMethod>,
    /// Throttling flag
    pub throttle: bool,
    /// Lifecycle status
    pub status: Status,
    /// Description
    pub description: String,
    /// Hidden form field rules
    pub hidden_form_field: Vec<HiddenFormField>,
    /// Owning user
    pub user_id: UserId,
    /// Set by the store on insert
    pub created_at: DateTime<Utc>,
    /// Set by the store on every write
    pub updated_at: DateTime<Utc>,
}

impl Conduit {
    /// Overwrites every writable field; absent optional fields revert to
    /// their defaults and absent target fields keep their stored value.
    pub fn replace_with(&mut self, draft: ConduitDraft) {
        let draft = draft.with_defaults();
        self.apply(draft);
    }

    /// Overwrites only the supplied fields.
    pub fn apply(&mut self, draft: ConduitDraft) {
        if let Some(v) = draft.suri_api_key {
            self.suri_api_key = v;
        }
        if let Some(v) = draft.suri_type {
            self.suri_type = v;
        }
        if let Some(v) = draft.suri_object_key {
            self.suri_object_key = v;
        }
        if let Some(v) = draft.allowlist {
            self.allowlist = v;
        }
        if let Some(v) = draft.racm {
            self.racm = v;
        }
        if let Some(v) = draft.throttle {
            self.throttle = v;
        }
        if let Some(v) = draft.status {
            self.status = v;
        }
        if let Some(v) = draft.description {
            self.description = v;
        }
        if let Some(v) = draft.hidden_form_field {
            self.hidden_form_field = v;
        }
    }
}
