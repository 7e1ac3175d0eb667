use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use infra::{
    db::Db,
    models::{CheckInLogRow, ImageKind, MemberRow, MemberStatus},
    repos::{
        member_images::create_image, members::create_member, CheckInLogRepo, CreateMemberData,
        CreateMemberImage, MemberFilter, MemberRepo, MembershipActivity, MembershipPackageRepo,
    },
};
use rand::distr::Alphanumeric;
use rand::RngExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{JwtService, PasswordService, Role};
use crate::clock::Clock;
use crate::error::AppError;
use crate::pagination::{PageRequest, Paginated};
use crate::services::notifier::{Notifier, MEMBER_APPROVED, MEMBER_REGISTERED, MEMBER_REJECTED};
use crate::state::AppState;

const MEMBER_CODE_ATTEMPTS: usize = 10;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentScreenshotInput {
    #[validate(length(min = 1, message = "Payment screenshot URL is required"))]
    pub image_url: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterMemberInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    pub phone: Option<String>,
    pub profile_photo: Option<String>,
    pub membership_package_id: Uuid,
    #[validate(nested)]
    #[serde(default)]
    pub payment_screenshots: Vec<PaymentScreenshotInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MemberLoginInput {
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberLoginResponse {
    pub access_token: String,
    pub member: MemberRow,
}

/// Where the member currently stands at the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInState {
    CheckedIn,
    CheckedOut,
    NeverCheckedIn,
}

/// Derive the door state from the log that best describes the member: the
/// open visit if there is one, else the most recent log.
pub fn check_in_state(latest: Option<&CheckInLogRow>) -> CheckInState {
    match latest {
        None => CheckInState::NeverCheckedIn,
        Some(log) if log.is_open_visit() => CheckInState::CheckedIn,
        Some(_) => CheckInState::CheckedOut,
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum MemberStatusReport {
    NotRegistered {
        registered: bool,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        deleted_at: Option<DateTime<Utc>>,
    },
    Registered {
        registered: bool,
        member: MemberRow,
        current_check_in_status: CheckInState,
        current_check_in: Option<CheckInLogRow>,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityParam {
    Active,
    Expired,
}

impl From<ActivityParam> for MembershipActivity {
    fn from(value: ActivityParam) -> Self {
        match value {
            ActivityParam::Active => MembershipActivity::Active,
            ActivityParam::Expired => MembershipActivity::Expired,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberListQuery {
    pub status: Option<MemberStatus>,
    pub active: Option<ActivityParam>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl MemberListQuery {
    fn filter(&self) -> MemberFilter {
        MemberFilter {
            status: self.status.map(|s| s.as_str().to_string()),
            activity: self.active.map(Into::into),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

/// `MEM-YYYYMMDD-XXXXX` with an uppercase alphanumeric suffix.
pub fn generate_member_code(date: NaiveDate) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(5)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("MEM-{}-{}", date.format("%Y%m%d"), suffix)
}

/// An approved member whose validity window has not closed yet.
pub fn has_active_subscription(member: &MemberRow, now: DateTime<Utc>) -> bool {
    member.member_status() == MemberStatus::Approved
        && member.end_date.is_some_and(|end| end > now)
}

fn event_payload(member: &MemberRow) -> serde_json::Value {
    serde_json::to_value(member).unwrap_or(serde_json::Value::Null)
}

/// Registration, member self-service and the admin approval workflow.
pub struct MemberService {
    db: Db,
    members: MemberRepo,
    packages: MembershipPackageRepo,
    logs: CheckInLogRepo,
    passwords: PasswordService,
    jwt: JwtService,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl MemberService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            members: MemberRepo::new(state.db.clone()),
            packages: MembershipPackageRepo::new(state.db.clone()),
            logs: CheckInLogRepo::new(state.db.clone()),
            passwords: state.password_service(),
            jwt: state.jwt_service().clone(),
            notifier: state.notifier(),
            clock: state.clock(),
        }
    }

    pub async fn register(&self, input: RegisterMemberInput) -> Result<MemberRow, AppError> {
        input.validate()?;
        if input.payment_screenshots.is_empty() {
            return Err(AppError::bad_request(
                "At least one payment screenshot is required",
            ));
        }

        self.packages
            .get_active(input.membership_package_id)
            .await?
            .ok_or_else(|| AppError::not_found("Membership package not found or inactive"))?;

        let email = input.email.trim().to_lowercase();
        if self.members.get_by_email(&email).await?.is_some() {
            return Err(AppError::bad_request("Member with this email already exists"));
        }

        let phone = input
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        if let Some(phone) = &phone {
            if self.members.phone_in_use(phone).await? {
                return Err(AppError::bad_request("Member with this phone already exists"));
            }
        }

        let member_code = self.unique_member_code().await?;
        let password_hash = self.passwords.hash(&input.password).await?;

        let mut tx = self.db.begin().await?;
        let member = create_member(
            &mut *tx,
            &CreateMemberData {
                member_id: member_code,
                name: input.name.trim().to_string(),
                email: Some(email),
                phone,
                password_hash,
                membership_package_id: input.membership_package_id,
            },
        )
        .await?;

        if let Some(url) = input.profile_photo.filter(|u| !u.trim().is_empty()) {
            create_image(
                &mut *tx,
                &CreateMemberImage {
                    member_id: member.id,
                    kind: ImageKind::Profile,
                    image_url: url,
                    description: None,
                },
            )
            .await?;
        }
        for shot in input.payment_screenshots {
            create_image(
                &mut *tx,
                &CreateMemberImage {
                    member_id: member.id,
                    kind: ImageKind::Payment,
                    image_url: shot.image_url,
                    description: shot.description,
                },
            )
            .await?;
        }
        tx.commit().await?;

        tracing::info!("Registered member {} ({})", member.member_id, member.id);
        self.notifier
            .publish(MEMBER_REGISTERED, member.id, event_payload(&member))
            .await;

        Ok(member)
    }

    async fn unique_member_code(&self) -> Result<String, AppError> {
        let today = self.clock.now().date_naive();
        for _ in 0..MEMBER_CODE_ATTEMPTS {
            let code = generate_member_code(today);
            if !self.members.business_id_exists(&code).await? {
                return Ok(code);
            }
        }
        Err(AppError::Internal(
            "Could not allocate a unique member id".to_string(),
        ))
    }

    pub async fn login(&self, input: MemberLoginInput) -> Result<MemberLoginResponse, AppError> {
        input.validate()?;
        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

        let member = self
            .members
            .get_by_email(input.email.trim())
            .await?
            .ok_or_else(invalid)?;
        let hash = member.password_hash.as_deref().ok_or_else(invalid)?;
        if !self.passwords.verify(&input.password, hash).await? {
            return Err(invalid());
        }

        let email = member.email.clone().unwrap_or_default();
        let access_token = self.jwt.create_token(member.id, email, Role::Member)?;
        Ok(MemberLoginResponse {
            access_token,
            member,
        })
    }

    pub async fn check_status(&self, email: &str) -> Result<MemberStatusReport, AppError> {
        let Some(member) = self.members.get_any_by_email(email.trim()).await? else {
            return Ok(MemberStatusReport::NotRegistered {
                registered: false,
                message: "Member not found with this email".to_string(),
                deleted_at: None,
            });
        };

        if member.is_deleted() {
            return Ok(MemberStatusReport::NotRegistered {
                registered: false,
                message: "Member account has been deleted".to_string(),
                deleted_at: member.deleted_at,
            });
        }

        // A denied attempt during a visit must not hide the visit.
        let latest = match self.logs.find_latest_open(member.id).await? {
            Some(open) => Some(open),
            None => self.logs.find_latest(member.id).await?,
        };
        Ok(MemberStatusReport::Registered {
            registered: true,
            current_check_in_status: check_in_state(latest.as_ref()),
            current_check_in: latest,
            member,
        })
    }

    pub async fn profile(&self, id: Uuid) -> Result<MemberRow, AppError> {
        self.members
            .get_by_id(id, false)
            .await?
            .ok_or_else(|| AppError::not_found("Member not found"))
    }

    /// End the member's validity window now.
    pub async fn cancel_subscription(&self, id: Uuid) -> Result<MemberRow, AppError> {
        let member = self.profile(id).await?;
        let now = self.clock.now();
        if !has_active_subscription(&member, now) {
            return Err(AppError::bad_request("No active subscription to cancel"));
        }

        let updated = self
            .members
            .set_end_date(id, now)
            .await?
            .ok_or_else(|| AppError::bad_request("Failed to cancel subscription"))?;
        tracing::info!("Member {} cancelled their subscription", updated.member_id);
        Ok(updated)
    }

    pub async fn list(&self, query: &MemberListQuery) -> Result<Paginated<MemberRow>, AppError> {
        let request = PageRequest {
            page: query.page,
            limit: query.limit,
        };
        let filter = query.filter();
        let now = self.clock.now();

        let rows = self.members.list(&filter, request.window(), now).await?;
        let total = self.members.count(&filter, now).await?;
        Ok(Paginated::new(rows, request, total))
    }

    /// Admin view of a member, soft-deleted ones included.
    pub async fn detail(&self, id: Uuid) -> Result<MemberRow, AppError> {
        self.members
            .get_by_id(id, true)
            .await?
            .ok_or_else(|| AppError::not_found("Member not found"))
    }

    /// Start the membership today and run it for the package's duration.
    pub async fn approve(&self, id: Uuid) -> Result<MemberRow, AppError> {
        let member = self.detail(id).await?;
        if member.member_status() == MemberStatus::Approved {
            return Err(AppError::bad_request("Member is already approved"));
        }

        let package = self
            .packages
            .get_by_id(member.membership_package_id)
            .await?
            .ok_or_else(|| AppError::not_found("Membership package not found"))?;

        let start = self.clock.now();
        let end = start + Duration::days(package.duration_days.into());
        let approved = self
            .members
            .approve(id, start, end)
            .await?
            .ok_or_else(|| AppError::bad_request("Failed to approve member"))?;

        tracing::info!(
            "Approved member {} until {}",
            approved.member_id,
            end.date_naive()
        );
        self.notifier
            .publish(MEMBER_APPROVED, approved.id, event_payload(&approved))
            .await;
        Ok(approved)
    }

    pub async fn reject(&self, id: Uuid) -> Result<MemberRow, AppError> {
        let member = self.detail(id).await?;
        if member.member_status() == MemberStatus::Rejected {
            return Err(AppError::bad_request("Member is already rejected"));
        }

        let rejected = self
            .members
            .set_status(id, MemberStatus::Rejected.as_str())
            .await?
            .ok_or_else(|| AppError::bad_request("Failed to reject member"))?;

        tracing::info!("Rejected member {}", rejected.member_id);
        self.notifier
            .publish(MEMBER_REJECTED, rejected.id, event_payload(&rejected))
            .await;
        Ok(rejected)
    }

    pub async fn delete(&self, id: Uuid) -> Result<MemberRow, AppError> {
        let member = self.detail(id).await?;
        if member.is_deleted() {
            return Err(AppError::bad_request("Member is already deleted"));
        }

        let deleted = self
            .members
            .soft_delete(id, self.clock.now())
            .await?
            .ok_or_else(|| AppError::bad_request("Failed to delete member"))?;
        tracing::info!("Soft-deleted member {}", deleted.member_id);
        Ok(deleted)
    }

    pub async fn restore(&self, id: Uuid) -> Result<MemberRow, AppError> {
        let member = self.detail(id).await?;
        if !member.is_deleted() {
            return Err(AppError::bad_request("Member is not deleted"));
        }

        let restored = self
            .members
            .restore(id)
            .await?
            .ok_or_else(|| AppError::bad_request("Failed to restore member"))?;
        tracing::info!("Restored member {}", restored.member_id);
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use infra::models::CheckInStatus;

    fn log(status: CheckInStatus, open: bool) -> CheckInLogRow {
        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        CheckInLogRow {
            id: Uuid::new_v4(),
            member_id: Uuid::new_v4(),
            check_in_time: t0,
            check_out_time: if open { None } else { Some(t0 + Duration::hours(1)) },
            status: status.as_str().to_string(),
            reason: None,
            created_at: t0,
        }
    }

    fn approved_until(end_date: Option<DateTime<Utc>>) -> MemberRow {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        MemberRow {
            id: Uuid::new_v4(),
            member_id: "MEM-20240101-QW3RT".to_string(),
            name: "Sam Okafor".to_string(),
            email: Some("sam@example.com".to_string()),
            phone: Some("+66812345678".to_string()),
            password_hash: None,
            status: "APPROVED".to_string(),
            membership_package_id: Uuid::new_v4(),
            package_title: Some("Quarterly".to_string()),
            package_duration_days: Some(90),
            start_date: Some(t0),
            end_date,
            deleted_at: None,
            created_at: t0,
            updated_at: t0,
        }
    }

    #[test]
    fn member_code_has_date_and_uppercase_suffix() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        for _ in 0..50 {
            let code = generate_member_code(date);
            assert_eq!(code.len(), "MEM-20240601-XXXXX".len());
            assert!(code.starts_with("MEM-20240601-"));

            let suffix = &code["MEM-20240601-".len()..];
            assert!(suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn door_state_follows_latest_log() {
        assert_eq!(check_in_state(None), CheckInState::NeverCheckedIn);
        assert_eq!(
            check_in_state(Some(&log(CheckInStatus::Allowed, true))),
            CheckInState::CheckedIn
        );
        assert_eq!(
            check_in_state(Some(&log(CheckInStatus::Allowed, false))),
            CheckInState::CheckedOut
        );
        // A denied attempt never puts the member inside.
        assert_eq!(
            check_in_state(Some(&log(CheckInStatus::Denied, true))),
            CheckInState::CheckedOut
        );
    }

    #[test]
    fn only_running_memberships_can_be_cancelled() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        assert!(has_active_subscription(
            &approved_until(Some(now + Duration::days(3))),
            now
        ));
        assert!(!has_active_subscription(&approved_until(Some(now)), now));
        assert!(!has_active_subscription(&approved_until(None), now));

        let mut pending = approved_until(Some(now + Duration::days(3)));
        pending.status = "PENDING".to_string();
        assert!(!has_active_subscription(&pending, now));
    }

    #[test]
    fn list_query_drops_blank_search() {
        let query = MemberListQuery {
            status: Some(MemberStatus::Pending),
            active: Some(ActivityParam::Expired),
            search: Some("   ".to_string()),
            ..Default::default()
        };
        let filter = query.filter();
        assert_eq!(filter.status.as_deref(), Some("PENDING"));
        assert_eq!(filter.activity, Some(MembershipActivity::Expired));
        assert!(filter.search.is_none());
    }

    #[test]
    fn status_report_serializes_camel_case() {
        let report = MemberStatusReport::Registered {
            registered: true,
            member: approved_until(None),
            current_check_in_status: CheckInState::NeverCheckedIn,
            current_check_in: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["registered"], true);
        assert_eq!(json["currentCheckInStatus"], "never_checked_in");
        assert!(json["currentCheckIn"].is_null());
        assert_eq!(json["member"]["memberId"], "MEM-20240101-QW3RT");
        assert!(json["member"].get("passwordHash").is_none());
    }

    #[test]
    fn registration_requires_valid_email_and_password() {
        let input = RegisterMemberInput {
            name: "Lee".to_string(),
            email: "not-an-email".to_string(),
            password: "123".to_string(),
            phone: None,
            profile_photo: None,
            membership_package_id: Uuid::new_v4(),
            payment_screenshots: vec![PaymentScreenshotInput {
                image_url: "https://cdn.example.com/slip.jpg".to_string(),
                description: None,
            }],
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("name"));
    }
}
