//! Offline tests for brandpulse-db pool configuration and row conversions.
//! These tests do not require a live database connection.

use brandpulse_core::{
    Alert, AppConfig, Environment, Mention, MetricSnapshot, RiskLevel, Sentiment, Severity,
};
use brandpulse_db::{AlertRow, DbError, MentionRow, PoolConfig, SnapshotRow};
use chrono::Utc;
use rust_decimal::Decimal;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use uuid::Uuid;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        pipeline_config_path: None,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        openai_api_key: None,
        openai_model: "gpt-4o-mini".to_string(),
        openai_base_url: None,
        classifier_timeout_secs: 20,
        twitter_bearer_token: None,
        alert_webhook_url: None,
        alert_timeout_secs: 10,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

fn mention_row(sentiment: Option<&str>) -> MentionRow {
    MentionRow {
        id: Uuid::new_v4(),
        brand_id: Uuid::new_v4(),
        external_id: "1790000000000000001".to_string(),
        content: "I love this brand".to_string(),
        author: "someone".to_string(),
        sentiment: sentiment.map(str::to_string),
        confidence_score: sentiment.map(|_| Decimal::new(700, 3)),
        created_at: Utc::now(),
        analyzed_at: sentiment.map(|_| Utc::now()),
    }
}

#[test]
fn unclassified_mention_row_converts_with_no_label() {
    let mention = Mention::try_from(mention_row(None)).expect("conversion");

    assert!(!mention.is_classified());
    assert!(mention.confidence.is_none());
    assert!(mention.analyzed_at.is_none());
}

#[test]
fn classified_mention_row_converts_label_and_confidence() {
    let mention = Mention::try_from(mention_row(Some("positive"))).expect("conversion");

    assert_eq!(mention.sentiment, Some(Sentiment::Positive));
    let confidence = mention.confidence.expect("confidence");
    assert!((confidence - 0.7).abs() < 1e-9);
}

#[test]
fn mention_row_with_unknown_label_is_rejected() {
    let err = Mention::try_from(mention_row(Some("ecstatic"))).unwrap_err();

    assert!(matches!(
        err,
        DbError::InvalidColumn {
            column: "mentions.sentiment",
            ..
        }
    ));
}

#[test]
fn snapshot_row_converts_score_and_risk_level() {
    let row = SnapshotRow {
        id: Uuid::new_v4(),
        brand_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        positive_count: 10,
        negative_count: 60,
        neutral_count: 30,
        total_count: 100,
        overall_score: Decimal::new(-5000, 2),
        risk_level: "critical".to_string(),
    };

    let snapshot = MetricSnapshot::try_from(row).expect("conversion");
    assert_eq!(snapshot.risk_level, RiskLevel::Critical);
    assert!((snapshot.overall_score + 50.0).abs() < 1e-9);
    assert_eq!(snapshot.total_count, 100);
}

#[test]
fn alert_row_reads_type_column_as_kind() {
    let row = AlertRow {
        id: Uuid::new_v4(),
        brand_id: Uuid::new_v4(),
        kind: "critical_sentiment".to_string(),
        message: "Critical negative sentiment detected: 60.0% negative mentions".to_string(),
        severity: "critical".to_string(),
        acknowledged: false,
        created_at: Utc::now(),
    };

    let alert = Alert::try_from(row).expect("conversion");
    assert_eq!(alert.severity, Severity::Critical);
    assert_eq!(alert.kind.as_str(), "critical_sentiment");
    assert!(!alert.acknowledged);
}

#[test]
fn alert_row_with_unknown_severity_is_rejected() {
    let row = AlertRow {
        id: Uuid::new_v4(),
        brand_id: Uuid::new_v4(),
        kind: "critical_sentiment".to_string(),
        message: "m".to_string(),
        severity: "apocalyptic".to_string(),
        acknowledged: false,
        created_at: Utc::now(),
    };

    assert!(matches!(
        Alert::try_from(row),
        Err(DbError::InvalidColumn {
            column: "alerts.severity",
            ..
        })
    ));
}
