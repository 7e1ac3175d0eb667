use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Registration lifecycle of a member.
///
/// Stored as text; anything the application does not recognise reads back as
/// `Unknown` so callers can refuse it explicitly instead of failing to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberStatus {
    Pending,
    Approved,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Pending => "PENDING",
            MemberStatus::Approved => "APPROVED",
            MemberStatus::Rejected => "REJECTED",
            MemberStatus::Unknown => "UNKNOWN",
        }
    }
}

impl From<&str> for MemberStatus {
    fn from(s: &str) -> Self {
        match s {
            "PENDING" => MemberStatus::Pending,
            "APPROVED" => MemberStatus::Approved,
            "REJECTED" => MemberStatus::Rejected,
            _ => MemberStatus::Unknown,
        }
    }
}

/// Admission decision recorded on a check-in log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckInStatus {
    Allowed,
    Denied,
}

impl CheckInStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInStatus::Allowed => "ALLOWED",
            CheckInStatus::Denied => "DENIED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageKind {
    Profile,
    Payment,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Profile => "PROFILE",
            ImageKind::Payment => "PAYMENT",
        }
    }
}

/// Member joined with the title and duration of its package.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRow {
    pub id: Uuid,
    pub member_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub status: String,
    pub membership_package_id: Uuid,
    pub package_title: Option<String>,
    pub package_duration_days: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MemberRow {
    pub fn member_status(&self) -> MemberStatus {
        MemberStatus::from(self.status.as_str())
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInLogRow {
    pub id: Uuid,
    pub member_id: Uuid,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub status: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CheckInLogRow {
    /// An admitted visit with no checkout yet. Denied attempts never count.
    pub fn is_open_visit(&self) -> bool {
        self.status == CheckInStatus::Allowed.as_str() && self.check_out_time.is_none()
    }
}

/// Check-in log with enough of its member to render a history table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInLogEntryRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub log: CheckInLogRow,
    pub member_name: String,
    pub member_code: String,
    pub package_title: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPackageRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Decimal rendered as text to keep precision on the wire.
    pub price: String,
    pub duration_days: i32,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub image: Option<String>,
    #[serde(skip)]
    pub password_hash: String,
    pub status: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminRow {
    pub fn is_active(&self) -> bool {
        self.status == "ACTIVE"
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberImageRow {
    pub id: Uuid,
    pub member_id: Uuid,
    pub kind: String,
    pub image_url: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
