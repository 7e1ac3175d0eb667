use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::checkin::{MemberStore, StoreResult};
use crate::clock::Clock;

const EXPIRING_SOON_WINDOW_DAYS: i64 = 7;
const EXPIRED_SCAN_HOUR: u32 = 0;
const EXPIRING_SOON_SCAN_HOUR: u32 = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredMember {
    pub member_id: String,
    pub name: String,
    pub expired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiringMember {
    pub member_id: String,
    pub name: String,
    pub days_until_expiration: i64,
    pub expires_on: NaiveDate,
}

/// Whole days left before `end`, rounded up. A membership ending in ten
/// minutes has one day left.
pub fn days_until(end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    let remaining = (end - now).num_milliseconds().max(0);
    (remaining + DAY_MS - 1) / DAY_MS
}

/// Daily membership reports. Both scans only read and log; member status is
/// left untouched and admission keeps rejecting expired members on its own.
pub struct ExpirationSweeper {
    members: Arc<dyn MemberStore>,
    clock: Arc<dyn Clock>,
}

impl ExpirationSweeper {
    pub fn new(members: Arc<dyn MemberStore>, clock: Arc<dyn Clock>) -> Self {
        Self { members, clock }
    }

    pub async fn scan_expired(&self) -> StoreResult<Vec<ExpiredMember>> {
        let now = self.clock.now();
        let members = self.members.list_expired(now).await?;

        Ok(members
            .into_iter()
            .filter_map(|m| {
                m.end_date.map(|expired_at| ExpiredMember {
                    member_id: m.member_id,
                    name: m.name,
                    expired_at,
                })
            })
            .collect())
    }

    pub async fn scan_expiring_soon(&self) -> StoreResult<Vec<ExpiringMember>> {
        let now = self.clock.now();
        let until = now + Duration::days(EXPIRING_SOON_WINDOW_DAYS);
        let members = self.members.list_expiring_between(now, until).await?;

        Ok(members
            .into_iter()
            .filter_map(|m| {
                m.end_date.map(|end| ExpiringMember {
                    member_id: m.member_id,
                    name: m.name,
                    days_until_expiration: days_until(end, now),
                    expires_on: end.date_naive(),
                })
            })
            .collect())
    }

    /// Expired scan with its errors logged instead of returned.
    pub async fn run_expired_scan(&self) {
        info!("Starting membership expiration check");

        match self.scan_expired().await {
            Ok(expired) if expired.is_empty() => info!("No expired memberships found"),
            Ok(expired) => {
                for m in &expired {
                    warn!(
                        member_id = %m.member_id,
                        name = %m.name,
                        expired_at = %m.expired_at.to_rfc3339(),
                        "Membership expired"
                    );
                }
                info!(
                    "Membership expiration check completed, {} expired membership(s)",
                    expired.len()
                );
            }
            Err(e) => error!("Error while checking expired memberships: {}", e),
        }
    }

    pub async fn run_expiring_soon_scan(&self) {
        info!("Checking for memberships expiring soon");

        match self.scan_expiring_soon().await {
            Ok(expiring) if expiring.is_empty() => info!("No memberships expiring soon"),
            Ok(expiring) => {
                for m in &expiring {
                    warn!(
                        member_id = %m.member_id,
                        name = %m.name,
                        days = m.days_until_expiration,
                        expires_on = %m.expires_on,
                        "Membership expiring soon"
                    );
                }
                info!(
                    "Expiring soon check completed, {} membership(s) within {} days",
                    expiring.len(),
                    EXPIRING_SOON_WINDOW_DAYS
                );
            }
            Err(e) => error!("Error while checking memberships expiring soon: {}", e),
        }
    }
}

/// A wall-clock hour in a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct DailySchedule {
    pub hour: u32,
    pub offset: FixedOffset,
}

impl DailySchedule {
    /// First occurrence strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_now = now.with_timezone(&self.offset).naive_local();
        let mut next =
            local_now.date().and_time(NaiveTime::MIN) + Duration::hours(self.hour.into());
        if next <= local_now {
            next += Duration::days(1);
        }
        (next - Duration::seconds(self.offset.local_minus_utc().into())).and_utc()
    }
}

#[derive(Debug, Clone, Copy)]
enum Scan {
    Expired,
    ExpiringSoon,
}

/// Running sweep loops. `shutdown` stops them and waits; dropping the handle
/// stops them without waiting.
pub struct SweeperHandle {
    stop: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SweeperHandle {
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                error!("Sweeper task ended abnormally: {}", e);
            }
        }
        info!("Expiration sweeper stopped");
    }
}

/// Spawn the midnight expired scan and the morning expiring-soon scan.
pub fn spawn_expiration_sweeper(
    sweeper: ExpirationSweeper,
    offset: FixedOffset,
) -> SweeperHandle {
    let sweeper = Arc::new(sweeper);
    let (stop, stopped) = watch::channel(false);

    let tasks = [
        (Scan::Expired, EXPIRED_SCAN_HOUR),
        (Scan::ExpiringSoon, EXPIRING_SOON_SCAN_HOUR),
    ]
    .into_iter()
    .map(|(scan, hour)| {
        let schedule = DailySchedule { hour, offset };
        tokio::spawn(run_daily(sweeper.clone(), scan, schedule, stopped.clone()))
    })
    .collect();

    SweeperHandle { stop, tasks }
}

async fn run_daily(
    sweeper: Arc<ExpirationSweeper>,
    scan: Scan,
    schedule: DailySchedule,
    mut stopped: watch::Receiver<bool>,
) {
    info!(
        "Scheduled {:?} scan daily at {:02}:00 ({})",
        scan, schedule.hour, schedule.offset
    );

    loop {
        let now = sweeper.clock.now();
        let wait = (schedule.next_after(now) - now)
            .to_std()
            .unwrap_or_default();

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = stopped.changed() => break,
        }

        match scan {
            Scan::Expired => sweeper.run_expired_scan().await,
            Scan::ExpiringSoon => sweeper.run_expiring_soon_scan().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn days_until_rounds_up() {
        let now = utc(2024, 6, 1, 12, 0);
        assert_eq!(days_until(now, now), 0);
        assert_eq!(days_until(now + Duration::minutes(10), now), 1);
        assert_eq!(days_until(now + Duration::days(1), now), 1);
        assert_eq!(days_until(now + Duration::days(1) + Duration::seconds(1), now), 2);
        assert_eq!(days_until(now + Duration::days(7), now), 7);
    }

    #[test]
    fn midnight_in_bangkok_is_five_pm_utc() {
        let schedule = DailySchedule {
            hour: 0,
            offset: FixedOffset::east_opt(7 * 3600).unwrap(),
        };
        assert_eq!(
            schedule.next_after(utc(2024, 6, 1, 10, 0)),
            utc(2024, 6, 1, 17, 0)
        );
        // Already past today's run: move to tomorrow.
        assert_eq!(
            schedule.next_after(utc(2024, 6, 1, 17, 0)),
            utc(2024, 6, 2, 17, 0)
        );
    }

    #[test]
    fn morning_run_in_utc() {
        let schedule = DailySchedule {
            hour: 9,
            offset: FixedOffset::east_opt(0).unwrap(),
        };
        assert_eq!(
            schedule.next_after(utc(2024, 6, 1, 8, 59)),
            utc(2024, 6, 1, 9, 0)
        );
        assert_eq!(
            schedule.next_after(utc(2024, 12, 31, 9, 30)),
            utc(2025, 1, 1, 9, 0)
        );
    }
}
