use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use infra::{
    models::{CheckInLogEntryRow, CheckInLogRow, CheckInStatus, MemberRow},
    repos::{CheckInLogFilter, NewCheckInLog},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkin::admission;
use crate::checkin::store::{CheckInLogStore, MemberStore};
use crate::clock::Clock;
use crate::error::AppError;
use crate::pagination::{PageRequest, Paginated};

/// Front-desk view of the member who just presented their card.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontDeskMember {
    pub id: Uuid,
    pub name: String,
    pub member_id: String,
    pub membership_package: Option<PackageSummary>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSummary {
    pub id: Uuid,
    pub title: String,
    pub duration_days: Option<i32>,
}

impl From<&MemberRow> for FrontDeskMember {
    fn from(member: &MemberRow) -> Self {
        Self {
            id: member.id,
            name: member.name.clone(),
            member_id: member.member_id.clone(),
            membership_package: member.package_title.as_ref().map(|title| PackageSummary {
                id: member.membership_package_id,
                title: title.clone(),
                duration_days: member.package_duration_days,
            }),
            start_date: member.start_date,
            end_date: member.end_date,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberBrief {
    pub id: Uuid,
    pub name: String,
    pub member_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInOutcome {
    pub success: bool,
    pub status: CheckInStatus,
    pub reason: Option<String>,
    pub check_in: CheckInLogRow,
    pub member: FrontDeskMember,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitDuration {
    pub minutes: i64,
    pub hours: i64,
    pub minutes_remainder: i64,
}

impl VisitDuration {
    pub fn between(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> Self {
        let minutes = (check_out - check_in).num_minutes().max(0);
        Self {
            minutes,
            hours: minutes / 60,
            minutes_remainder: minutes % 60,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutOutcome {
    pub success: bool,
    pub message: String,
    pub check_in: CheckInLogRow,
    pub duration: VisitDuration,
    pub member: MemberBrief,
}

/// History filter as it arrives in the query string.
///
/// Dates accept RFC 3339 timestamps or plain `YYYY-MM-DD`. A plain date is
/// midnight UTC on both ends, so `endDate=2024-06-01` stops at the start of
/// that day.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInQuery {
    pub member_id: Option<Uuid>,
    pub status: Option<CheckInStatus>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl CheckInQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            limit: self.limit,
        }
    }

    fn to_filter(&self) -> Result<CheckInLogFilter, AppError> {
        Ok(CheckInLogFilter {
            member_id: self.member_id,
            status: self.status,
            from: self
                .start_date
                .as_deref()
                .map(parse_bound)
                .transpose()?,
            to: self
                .end_date
                .as_deref()
                .map(parse_bound)
                .transpose()?,
        })
    }
}

fn parse_bound(value: &str) -> Result<DateTime<Utc>, AppError> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| AppError::bad_request(format!("Invalid date: {value}")))
}

/// Door-side check-in and checkout, plus the history queries behind the
/// admin log screens.
#[derive(Clone)]
pub struct CheckInRecorder {
    members: Arc<dyn MemberStore>,
    logs: Arc<dyn CheckInLogStore>,
    clock: Arc<dyn Clock>,
}

impl CheckInRecorder {
    pub fn new(
        members: Arc<dyn MemberStore>,
        logs: Arc<dyn CheckInLogStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            members,
            logs,
            clock,
        }
    }

    /// Resolve a member presenting at the door. Soft-deleted rows are looked up
    /// so they get their own error instead of "not found".
    async fn live_member(&self, business_id: &str) -> Result<MemberRow, AppError> {
        let member = self
            .members
            .find_by_business_id(business_id.trim(), true)
            .await?
            .ok_or_else(|| AppError::not_found("Member not found"))?;

        if member.is_deleted() {
            return Err(AppError::bad_request("Member account is deleted"));
        }
        Ok(member)
    }

    pub async fn check_in(&self, business_id: &str) -> Result<CheckInOutcome, AppError> {
        let member = self.live_member(business_id).await?;
        let now = self.clock.now();
        let decision = admission::evaluate(&member, now);

        // A member is inside at most once: a new admission ends any visit
        // that was never checked out.
        if decision.is_allowed() {
            match self.logs.close_open_visits(member.id, now).await {
                Ok(0) => {}
                Ok(closed) => tracing::info!(
                    member_id = %member.member_id,
                    closed,
                    "Closed visit(s) left open before re-entry"
                ),
                Err(e) => {
                    tracing::error!("Failed to close open visits for {}: {}", member.member_id, e);
                    return Err(AppError::bad_request("Failed to create check-in log"));
                }
            }
        }

        let new_log = NewCheckInLog {
            member_id: member.id,
            check_in_time: now,
            status: decision.status(),
            reason: decision.reason(),
        };
        let log = match self.logs.create_log(&new_log).await {
            Ok(Some(log)) => log,
            Ok(None) => return Err(AppError::bad_request("Failed to create check-in log")),
            Err(e) => {
                tracing::error!("Failed to insert check-in log for {}: {}", member.member_id, e);
                return Err(AppError::bad_request("Failed to create check-in log"));
            }
        };

        if decision.is_allowed() {
            tracing::info!(member_id = %member.member_id, "Check-in allowed");
        } else {
            tracing::info!(
                member_id = %member.member_id,
                reason = ?new_log.reason,
                "Check-in denied"
            );
        }

        Ok(CheckInOutcome {
            success: decision.is_allowed(),
            status: new_log.status,
            reason: new_log.reason,
            check_in: log,
            member: FrontDeskMember::from(&member),
        })
    }

    pub async fn check_out(&self, business_id: &str) -> Result<CheckOutOutcome, AppError> {
        let member = self.live_member(business_id).await?;

        let open = self
            .logs
            .find_latest_open_log(member.id)
            .await?
            .ok_or_else(|| AppError::bad_request("No active check-in found. Please check in first."))?;

        if !open.is_open_visit() {
            return Err(AppError::bad_request("Already checked out"));
        }

        let now = self.clock.now();
        let closed = match self.logs.close_log(open.id, now).await {
            Ok(Some(closed)) => closed,
            // Lost the race against a concurrent checkout of the same log.
            Ok(None) => return Err(AppError::bad_request("Already checked out")),
            Err(e) => {
                tracing::error!("Failed to close check-in log {}: {}", open.id, e);
                return Err(AppError::bad_request("Failed to process checkout"));
            }
        };

        let check_out_time = closed.check_out_time.unwrap_or(now);
        let duration = VisitDuration::between(closed.check_in_time, check_out_time);
        tracing::info!(
            member_id = %member.member_id,
            minutes = duration.minutes,
            "Checked out"
        );

        Ok(CheckOutOutcome {
            success: true,
            message: "Checkout successful".to_string(),
            check_in: closed,
            duration,
            member: MemberBrief {
                id: member.id,
                name: member.name,
                member_id: member.member_id,
            },
        })
    }

    pub async fn find_all(
        &self,
        query: &CheckInQuery,
    ) -> Result<Paginated<CheckInLogEntryRow>, AppError> {
        let filter = query.to_filter()?;
        self.page_of_logs(&filter, query.page_request()).await
    }

    /// History of one member. Soft-deleted members keep their history visible.
    pub async fn find_by_member_id(
        &self,
        member_id: Uuid,
        query: &CheckInQuery,
    ) -> Result<Paginated<CheckInLogEntryRow>, AppError> {
        self.members
            .find_by_id(member_id, true)
            .await?
            .ok_or_else(|| AppError::not_found("Member not found"))?;

        let filter = CheckInLogFilter {
            member_id: Some(member_id),
            ..query.to_filter()?
        };
        self.page_of_logs(&filter, query.page_request()).await
    }

    async fn page_of_logs(
        &self,
        filter: &CheckInLogFilter,
        request: PageRequest,
    ) -> Result<Paginated<CheckInLogEntryRow>, AppError> {
        let rows = self.logs.list_logs(filter, request.window()).await?;
        let total = self.logs.count_logs(filter).await?;
        Ok(Paginated::new(rows, request, total))
    }
}
