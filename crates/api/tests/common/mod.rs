#![allow(dead_code)]

use std::sync::Arc;

use api::checkin::{CheckInLogStore, CheckInRecorder, MemberStore, StoreResult};
use api::clock::Clock;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use infra::{
    models::{CheckInLogEntryRow, CheckInLogRow, MemberRow},
    pagination::LimitOffset,
    repos::{CheckInLogFilter, NewCheckInLog},
};
use parking_lot::Mutex;
use uuid::Uuid;

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

/// Clock pinned to an instant the test moves by hand.
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(now)))
    }

    pub fn advance(&self, by: Duration) {
        *self.0.lock() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }
}

pub fn member(business_id: &str, status: &str, end_date: Option<DateTime<Utc>>) -> MemberRow {
    let created = utc(2023, 12, 1, 8, 0);
    MemberRow {
        id: Uuid::new_v4(),
        member_id: business_id.to_string(),
        name: format!("Member {business_id}"),
        email: Some(format!("{}@example.com", business_id.to_lowercase())),
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

#[derive(Default)]
pub struct InMemoryMembers {
    rows: Mutex<Vec<MemberRow>>,
    failing: Mutex<bool>,
}

impl InMemoryMembers {
    pub fn with(rows: Vec<MemberRow>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows),
            failing: Mutex::new(false),
        })
    }

    pub fn fail_queries(&self) {
        *self.failing.lock() = true;
    }

    pub fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) {
        if let Some(m) = self.rows.lock().iter_mut().find(|m| m.id == id) {
            m.deleted_at = Some(at);
        }
    }

    fn check(&self) -> StoreResult<()> {
        if *self.failing.lock() {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(())
    }

    fn snapshot(&self) -> Vec<MemberRow> {
        self.rows.lock().clone()
    }
}

#[async_trait]
impl MemberStore for InMemoryMembers {
    async fn find_by_business_id(
        &self,
        member_id: &str,
        include_deleted: bool,
    ) -> StoreResult<Option<MemberRow>> {
        self.check()?;
        Ok(self
            .snapshot()
            .into_iter()
            .find(|m| m.member_id == member_id && (include_deleted || !m.is_deleted())))
    }

    async fn find_by_id(&self, id: Uuid, include_deleted: bool) -> StoreResult<Option<MemberRow>> {
        self.check()?;
        Ok(self
            .snapshot()
            .into_iter()
            .find(|m| m.id == id && (include_deleted || !m.is_deleted())))
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> StoreResult<Vec<MemberRow>> {
        self.check()?;
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|m| m.status == "APPROVED" && !m.is_deleted())
            .filter(|m| m.end_date.is_some_and(|end| end < now))
            .collect())
    }

    async fn list_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<MemberRow>> {
        self.check()?;
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|m| m.status == "APPROVED" && !m.is_deleted())
            .filter(|m| m.end_date.is_some_and(|end| end >= from && end <= to))
            .collect())
    }
}

/// How the log store should misbehave on its next writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFault {
    #[default]
    None,
    InsertReturnsNothing,
    InsertErrors,
    CloseLosesRace,
    CloseErrors,
}

pub struct InMemoryLogs {
    members: Arc<InMemoryMembers>,
    rows: Mutex<Vec<CheckInLogRow>>,
    fault: Mutex<LogFault>,
}

impl InMemoryLogs {
    pub fn new(members: Arc<InMemoryMembers>) -> Arc<Self> {
        Arc::new(Self {
            members,
            rows: Mutex::new(Vec::new()),
            fault: Mutex::new(LogFault::None),
        })
    }

    pub fn inject(&self, fault: LogFault) {
        *self.fault.lock() = fault;
    }

    pub fn all(&self) -> Vec<CheckInLogRow> {
        self.rows.lock().clone()
    }

    fn entry(&self, log: CheckInLogRow) -> CheckInLogEntryRow {
        let member = self
            .members
            .snapshot()
            .into_iter()
            .find(|m| m.id == log.member_id);
        CheckInLogEntryRow {
            member_name: member.as_ref().map(|m| m.name.clone()).unwrap_or_default(),
            member_code: member
                .as_ref()
                .map(|m| m.member_id.clone())
                .unwrap_or_default(),
            package_title: member.and_then(|m| m.package_title),
            log,
        }
    }

    fn matching(&self, filter: &CheckInLogFilter) -> Vec<CheckInLogRow> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .iter()
            .filter(|log| matches_filter(filter, log))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.check_in_time.cmp(&a.check_in_time));
        rows
    }
}

/// Same predicate the SQL history filter applies.
pub fn matches_filter(filter: &CheckInLogFilter, log: &CheckInLogRow) -> bool {
    filter.member_id.is_none_or(|id| log.member_id == id)
        && filter.status.is_none_or(|s| log.status == s.as_str())
        && filter.from.is_none_or(|from| log.check_in_time >= from)
        && filter.to.is_none_or(|to| log.check_in_time <= to)
}

#[async_trait]
impl CheckInLogStore for InMemoryLogs {
    async fn create_log(&self, data: &NewCheckInLog) -> StoreResult<Option<CheckInLogRow>> {
        match *self.fault.lock() {
            LogFault::InsertReturnsNothing => return Ok(None),
            LogFault::InsertErrors => return Err(sqlx::Error::PoolClosed),
            _ => {}
        }

        let row = CheckInLogRow {
            id: Uuid::new_v4(),
            member_id: data.member_id,
            check_in_time: data.check_in_time,
            check_out_time: None,
            status: data.status.as_str().to_string(),
            reason: data.reason.clone(),
            created_at: data.check_in_time,
        };
        self.rows.lock().push(row.clone());
        Ok(Some(row))
    }

    async fn find_latest_open_log(&self, member_id: Uuid) -> StoreResult<Option<CheckInLogRow>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|log| log.member_id == member_id && log.is_open_visit())
            .max_by_key(|log| log.check_in_time)
            .cloned())
    }

    async fn close_log(
        &self,
        id: Uuid,
        check_out_time: DateTime<Utc>,
    ) -> StoreResult<Option<CheckInLogRow>> {
        match *self.fault.lock() {
            LogFault::CloseLosesRace => return Ok(None),
            LogFault::CloseErrors => return Err(sqlx::Error::PoolClosed),
            _ => {}
        }

        let mut rows = self.rows.lock();
        Ok(rows
            .iter_mut()
            .find(|log| log.id == id && log.is_open_visit())
            .map(|log| {
                log.check_out_time = Some(check_out_time);
                log.clone()
            }))
    }

    async fn close_open_visits(&self, member_id: Uuid, at: DateTime<Utc>) -> StoreResult<u64> {
        let mut closed = 0;
        for log in self
            .rows
            .lock()
            .iter_mut()
            .filter(|log| log.member_id == member_id && log.is_open_visit())
        {
            log.check_out_time = Some(at);
            closed += 1;
        }
        Ok(closed)
    }

    async fn list_logs(
        &self,
        filter: &CheckInLogFilter,
        page: LimitOffset,
    ) -> StoreResult<Vec<CheckInLogEntryRow>> {
        Ok(self
            .matching(filter)
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .map(|log| self.entry(log))
            .collect())
    }

    async fn count_logs(&self, filter: &CheckInLogFilter) -> StoreResult<i64> {
        Ok(self.matching(filter).len() as i64)
    }
}

pub struct Desk {
    pub members: Arc<InMemoryMembers>,
    pub logs: Arc<InMemoryLogs>,
    pub clock: Arc<FixedClock>,
    pub recorder: CheckInRecorder,
}

/// Recorder wired to in-memory stores with the clock pinned at `now`.
pub fn desk(members: Vec<MemberRow>, now: DateTime<Utc>) -> Desk {
    let members = InMemoryMembers::with(members);
    let logs = InMemoryLogs::new(members.clone());
    let clock = FixedClock::at(now);
    let recorder = CheckInRecorder::new(members.clone(), logs.clone(), clock.clone());
    Desk {
        members,
        logs,
        clock,
        recorder,
    }
}
