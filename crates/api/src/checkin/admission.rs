//! Door admission decision.
//!
//! `evaluate` is a pure function of the member record and the instant of the
//! attempt. Soft-deleted members never get here: the recorder rejects them
//! before evaluation and writes no log.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use infra::models::{CheckInStatus, MemberRow, MemberStatus};

/// Outcome of an admission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied(DenialReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    PendingApproval,
    Rejected,
    EndDateMissing,
    Expired { on: NaiveDate },
    NotActive,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::PendingApproval => {
                write!(f, "Membership registration is pending approval")
            }
            DenialReason::Rejected => write!(f, "Membership registration was rejected"),
            DenialReason::EndDateMissing => write!(f, "Membership end date is not set"),
            DenialReason::Expired { on } => {
                write!(f, "Membership expired on {}", on.format("%Y-%m-%d"))
            }
            DenialReason::NotActive => write!(f, "Membership is not active"),
        }
    }
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }

    pub fn status(&self) -> CheckInStatus {
        match self {
            Admission::Allowed => CheckInStatus::Allowed,
            Admission::Denied(_) => CheckInStatus::Denied,
        }
    }

    /// Text stored alongside a denied log. `None` for admitted members.
    pub fn reason(&self) -> Option<String> {
        match self {
            Admission::Allowed => None,
            Admission::Denied(reason) => Some(reason.to_string()),
        }
    }
}

/// Decide whether `member` may enter at `now`.
pub fn evaluate(member: &MemberRow, now: DateTime<Utc>) -> Admission {
    match member.member_status() {
        MemberStatus::Pending => Admission::Denied(DenialReason::PendingApproval),
        MemberStatus::Rejected => Admission::Denied(DenialReason::Rejected),
        MemberStatus::Approved => match member.end_date {
            None => Admission::Denied(DenialReason::EndDateMissing),
            Some(end_date) if now > end_date => Admission::Denied(DenialReason::Expired {
                on: end_date.date_naive(),
            }),
            Some(_) => Admission::Allowed,
        },
        MemberStatus::Unknown => Admission::Denied(DenialReason::NotActive),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn member(status: &str, end_date: Option<DateTime<Utc>>) -> MemberRow {
        let created = Utc.with_ymd_and_hms(2023, 12, 1, 8, 0, 0).unwrap();
        MemberRow {
            id: Uuid::new_v4(),
            member_id: "MEM-20231201-AB12C".to_string(),
            name: "Dana Reyes".to_string(),
            email: Some("dana@example.com".to_string()),
            phone: None,
            password_hash: None,
            status: status.to_string(),
            membership_package_id: Uuid::new_v4(),
            package_title: Some("Monthly".to_string()),
            package_duration_days: Some(30),
            start_date: end_date.map(|_| created),
            end_date,
            deleted_at: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn approved_with_future_end_date_is_allowed() {
        let now = at(2024, 6, 1);
        for days in [1, 10, 365] {
            let m = member("APPROVED", Some(now + Duration::days(days)));
            let decision = evaluate(&m, now);
            assert_eq!(decision, Admission::Allowed);
            assert_eq!(decision.reason(), None);
            assert_eq!(decision.status(), CheckInStatus::Allowed);
        }
    }

    #[test]
    fn end_date_equal_to_now_is_still_allowed() {
        let now = at(2024, 6, 1);
        let m = member("APPROVED", Some(now));
        assert!(evaluate(&m, now).is_allowed());
    }

    #[test]
    fn expired_membership_reports_calendar_date() {
        let m = member("APPROVED", Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let decision = evaluate(&m, at(2024, 6, 1));

        assert_eq!(decision.status(), CheckInStatus::Denied);
        assert_eq!(
            decision.reason().as_deref(),
            Some("Membership expired on 2024-01-01")
        );
    }

    #[test]
    fn one_second_past_end_date_is_expired() {
        let end = at(2024, 3, 15);
        let m = member("APPROVED", Some(end));
        let decision = evaluate(&m, end + Duration::seconds(1));
        assert_eq!(
            decision,
            Admission::Denied(DenialReason::Expired {
                on: end.date_naive()
            })
        );
    }

    #[test]
    fn pending_and_rejected_are_denied_regardless_of_dates() {
        let now = at(2024, 6, 1);
        for end in [None, Some(now + Duration::days(30)), Some(now - Duration::days(30))] {
            assert_eq!(
                evaluate(&member("PENDING", end), now).reason().as_deref(),
                Some("Membership registration is pending approval")
            );
            assert_eq!(
                evaluate(&member("REJECTED", end), now).reason().as_deref(),
                Some("Membership registration was rejected")
            );
        }
    }

    #[test]
    fn approved_without_end_date_is_denied() {
        let decision = evaluate(&member("APPROVED", None), at(2024, 6, 1));
        assert_eq!(
            decision.reason().as_deref(),
            Some("Membership end date is not set")
        );
    }

    #[test]
    fn unrecognised_status_is_not_active() {
        let now = at(2024, 6, 1);
        let decision = evaluate(&member("SUSPENDED", Some(now + Duration::days(5))), now);
        assert_eq!(decision, Admission::Denied(DenialReason::NotActive));
        assert_eq!(decision.reason().as_deref(), Some("Membership is not active"));
    }
}
