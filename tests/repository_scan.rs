use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use link_audit::domain::entities::{
    AuditTrigger, LinkStatus, LinkType, MaintenanceReport, ScannedLink, ValidationResult,
};
use link_audit::domain::repositories::{AuditRepository, ScanRepository};
use link_audit::infrastructure::persistence::{PgAuditRepository, PgScanRepository};

async fn create_test_audit(pool: &PgPool) -> i64 {
    PgAuditRepository::new(Arc::new(pool.clone()))
        .save_report(&MaintenanceReport::new(AuditTrigger::Manual, false))
        .await
        .unwrap()
}

fn checked(url: &str, status: LinkStatus, minutes_ago: i64) -> ValidationResult {
    let mut result = ValidationResult::local(url.to_string(), status, None);
    result.last_checked = Utc::now() - Duration::minutes(minutes_ago);
    result
}

#[sqlx::test]
async fn test_save_links(pool: PgPool) {
    let audit_id = create_test_audit(&pool).await;
    let repo = PgScanRepository::new(Arc::new(pool.clone()));
    let links = vec![
        ScannedLink::new(
            "/about".to_string(),
            "app/page.tsx".to_string(),
            3,
            LinkType::Internal,
            "<Link href=\"/about\">".to_string(),
        ),
        ScannedLink::new(
            "https://other.org".to_string(),
            "app/page.tsx".to_string(),
            9,
            LinkType::External,
            String::new(),
        ),
    ];

    repo.save_links(audit_id, &links).await.unwrap();
    repo.save_links(audit_id, &[]).await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scanned_links WHERE audit_id = $1")
        .bind(audit_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[sqlx::test]
async fn test_url_history_newest_first(pool: PgPool) {
    let audit_id = create_test_audit(&pool).await;
    let repo = PgScanRepository::new(Arc::new(pool));

    let mut redirected = checked("/pricing", LinkStatus::Redirect, 0);
    redirected.status_code = Some(301);
    redirected.redirect_url = Some("/plans".to_string());
    repo.append_results(Some(audit_id), &[checked("/pricing", LinkStatus::Valid, 60)])
        .await
        .unwrap();
    repo.append_results(None, &[redirected, checked("/other", LinkStatus::Valid, 0)])
        .await
        .unwrap();

    let history = repo.url_history("/pricing", 10).await.unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].status, LinkStatus::Redirect);
    assert_eq!(history[0].status_code, Some(301));
    assert_eq!(history[0].redirect_url.as_deref(), Some("/plans"));
    assert_eq!(history[1].status, LinkStatus::Valid);

    let limited = repo.url_history("/pricing", 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[sqlx::test]
async fn test_known_good_urls_use_latest_check(pool: PgPool) {
    let repo = PgScanRepository::new(Arc::new(pool));
    repo.append_results(
        None,
        &[
            checked("/stable", LinkStatus::Valid, 30),
            checked("/recovered", LinkStatus::Broken, 30),
            checked("/recovered", LinkStatus::Valid, 5),
            checked("/regressed", LinkStatus::Valid, 30),
            checked("/regressed", LinkStatus::Broken, 5),
        ],
    )
    .await
    .unwrap();

    let known = repo.known_good_urls().await.unwrap();

    assert_eq!(known, vec!["/recovered".to_string(), "/stable".to_string()]);
}
