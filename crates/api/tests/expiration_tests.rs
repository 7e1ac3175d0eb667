mod common;

use std::time::Duration as StdDuration;

use api::services::{spawn_expiration_sweeper, ExpirationSweeper};
use chrono::{Duration, FixedOffset, NaiveDate};
use common::*;

#[tokio::test]
async fn expired_scan_reports_only_live_approved_members_past_their_end_date() {
    let now = utc(2024, 6, 1, 0, 0);
    let mut deleted = member("MEM-D", "APPROVED", Some(now - Duration::days(3)));
    deleted.deleted_at = Some(now - Duration::days(1));

    let members = InMemoryMembers::with(vec![
        member("MEM-A", "APPROVED", Some(now - Duration::days(2))),
        member("MEM-B", "APPROVED", Some(now + Duration::days(2))),
        member("MEM-C", "REJECTED", Some(now - Duration::days(2))),
        deleted,
    ]);
    let sweeper = ExpirationSweeper::new(members, FixedClock::at(now));

    let expired = sweeper.scan_expired().await.unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].member_id, "MEM-A");
    assert_eq!(expired[0].expired_at, now - Duration::days(2));
}

#[tokio::test]
async fn expiring_soon_scan_counts_days_rounded_up() {
    let now = utc(2024, 6, 1, 9, 0);
    let members = InMemoryMembers::with(vec![
        member("MEM-1", "APPROVED", Some(now + Duration::hours(3))),
        member("MEM-2", "APPROVED", Some(now + Duration::days(2) + Duration::hours(1))),
        member("MEM-3", "APPROVED", Some(now + Duration::days(7))),
        member("MEM-4", "APPROVED", Some(now + Duration::days(8))),
        member("MEM-5", "PENDING", Some(now + Duration::days(1))),
    ]);
    let sweeper = ExpirationSweeper::new(members, FixedClock::at(now));

    let mut soon = sweeper.scan_expiring_soon().await.unwrap();
    soon.sort_by(|a, b| a.member_id.cmp(&b.member_id));

    let days: Vec<_> = soon
        .iter()
        .map(|m| (m.member_id.as_str(), m.days_until_expiration))
        .collect();
    assert_eq!(days, vec![("MEM-1", 1), ("MEM-2", 3), ("MEM-3", 7)]);
    assert_eq!(
        soon[2].expires_on,
        NaiveDate::from_ymd_opt(2024, 6, 8).unwrap()
    );
}

#[tokio::test]
async fn scans_swallow_store_failures() {
    let members = InMemoryMembers::with(vec![member("MEM-1", "APPROVED", None)]);
    members.fail_queries();
    let sweeper = ExpirationSweeper::new(members, FixedClock::at(utc(2024, 6, 1, 0, 0)));

    assert!(sweeper.scan_expired().await.is_err());
    // The scheduled wrappers only log.
    sweeper.run_expired_scan().await;
    sweeper.run_expiring_soon_scan().await;
}

#[tokio::test]
async fn sweeper_stops_on_shutdown() {
    let members = InMemoryMembers::with(vec![]);
    let sweeper = ExpirationSweeper::new(members, FixedClock::at(utc(2024, 6, 1, 10, 0)));
    let handle = spawn_expiration_sweeper(sweeper, FixedOffset::east_opt(7 * 3600).unwrap());

    tokio::time::timeout(StdDuration::from_secs(5), handle.shutdown())
        .await
        .expect("sweeper did not stop");
}
