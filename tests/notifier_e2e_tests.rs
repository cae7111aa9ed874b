//! 端到端测试：SQLite 文件数据库 + 本地 axum 模拟的广告平台与Webhook

use ad_notifier::{Application, ShutdownManager};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use notifier_core::config::{
    AppConfig, DatabaseConfig, PollerConfig, ResolverConfig, WebhookConfig,
};
use notifier_core::models::DeliveryOutcome;
use notifier_infrastructure::database::SqliteLaunchRepository;
use notifier_testing_utils::{staged_sequence, StagedRecordBuilder, TestEnv};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

type Received = Arc<Mutex<Vec<Value>>>;

async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn graph_server() -> String {
    let app = Router::new().route(
        "/{id}",
        get(|Path(id): Path<String>| async move {
            if id == "missing" {
                (StatusCode::NOT_FOUND, Json(json!({"error": "not found"})))
            } else {
                (StatusCode::OK, Json(json!({"name": format!("Ad {id} // tracking")})))
            }
        }),
    );
    spawn_server(app).await
}

async fn webhook_server(status: StatusCode) -> (String, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/hook",
            post(
                move |State(received): State<Received>, Json(body): Json<Value>| async move {
                    received.lock().unwrap().push(body);
                    status
                },
            ),
        )
        .with_state(received.clone());
    (format!("{}/hook", spawn_server(app).await), received)
}

struct Harness {
    _dir: TempDir,
    config: AppConfig,
    staging: SqliteLaunchRepository,
}

async fn harness(graph_url: String, webhook_url: String) -> Harness {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite:{}", dir.path().join("launches.db").display());

    let config = AppConfig {
        database: DatabaseConfig {
            url: url.clone(),
            ..DatabaseConfig::default()
        },
        resolver: ResolverConfig {
            base_url: graph_url,
            access_token: "test-token".to_string(),
            timeout_seconds: 5,
        },
        webhook: WebhookConfig {
            url: webhook_url,
            timeout_seconds: 5,
        },
        poller: PollerConfig {
            poll_interval_seconds: 1,
            ..PollerConfig::default()
        },
        ..AppConfig::default()
    };
    config.validate().unwrap();

    let options = url
        .parse::<sqlx::sqlite::SqliteConnectOptions>()
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    let staging = SqliteLaunchRepository::new(pool);
    staging.ensure_schema().await.unwrap();

    Harness {
        _dir: dir,
        config,
        staging,
    }
}

#[tokio::test]
async fn test_single_cycle_delivers_and_archives() {
    let graph_url = graph_server().await;
    let (webhook_url, received) = webhook_server(StatusCode::OK).await;
    let h = harness(graph_url, webhook_url).await;

    for record in staged_sequence(&["A", "B"]) {
        h.staging.stage(&record).await.unwrap();
    }

    let app = Application::new(h.config.clone()).await.unwrap();
    let report = app.run_once().await;
    app.shutdown().await;

    assert_eq!(report.found, 2);
    assert_eq!(report.archived, 2);
    assert_eq!(h.staging.staged_count().await.unwrap(), 0);

    let archived = h.staging.list_archived().await.unwrap();
    assert_eq!(archived.len(), 2);
    assert!(archived.iter().all(|r| r.outcome == DeliveryOutcome::Success));
    assert_eq!(archived[0].display_name.as_deref(), Some("Ad id-A // tracking"));

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["count"], 2);
    assert_eq!(received[0]["items"][0]["display_name"], "Ad id-A");
    assert_eq!(received[0]["items"][1]["display_name"], "Ad id-B");
}

#[tokio::test]
async fn test_unresolved_record_stays_in_staging() {
    let graph_url = graph_server().await;
    let (webhook_url, received) = webhook_server(StatusCode::OK).await;
    let h = harness(graph_url, webhook_url).await;

    h.staging
        .stage(
            &StagedRecordBuilder::new("lost")
                .with_external_id("missing")
                .build(),
        )
        .await
        .unwrap();

    let app = Application::new(h.config.clone()).await.unwrap();
    let report = app.run_once().await;
    app.shutdown().await;

    assert_eq!(report.unresolved, 1);
    assert!(received.lock().unwrap().is_empty());
    assert_eq!(h.staging.staged_keys().await.unwrap(), vec!["lost".to_string()]);
    assert!(h.staging.list_archived().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_webhook_error_archives_as_failed() {
    let graph_url = graph_server().await;
    let (webhook_url, _received) = webhook_server(StatusCode::INTERNAL_SERVER_ERROR).await;
    let h = harness(graph_url, webhook_url).await;

    for record in staged_sequence(&["A", "B", "C"]) {
        h.staging.stage(&record).await.unwrap();
    }

    let app = Application::new(h.config.clone()).await.unwrap();
    app.run_once().await;
    app.shutdown().await;

    let archived = h.staging.list_archived().await.unwrap();
    assert_eq!(archived.len(), 3);
    assert!(archived.iter().all(|r| r.outcome == DeliveryOutcome::Failed));
    assert_eq!(h.staging.staged_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_poll_loop_picks_up_new_records_until_shutdown() {
    let graph_url = graph_server().await;
    let (webhook_url, received) = webhook_server(StatusCode::OK).await;
    let h = harness(graph_url, webhook_url).await;

    let app = Arc::new(Application::new(h.config.clone()).await.unwrap());
    let shutdown_manager = ShutdownManager::new();
    let shutdown_rx = shutdown_manager.subscribe().await;
    let handle = {
        let app = Arc::clone(&app);
        tokio::spawn(async move { app.run(shutdown_rx).await })
    };

    for record in staged_sequence(&["A"]) {
        h.staging.stage(&record).await.unwrap();
    }

    let delivered = TestEnv::wait_for(
        || {
            let received = received.clone();
            async move { !received.lock().unwrap().is_empty() }
        },
        Duration::from_secs(10),
    )
    .await;
    assert!(delivered);

    shutdown_manager.shutdown().await;
    let cycles = tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(cycles >= 1);
    app.shutdown().await;

    assert_eq!(h.staging.list_archived().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_token_is_fatal_configuration() {
    let result = AppConfig::from_toml(
        r#"
        [database]
        url = "sqlite::memory:"

        [webhook]
        url = "http://localhost:9/hook"
        "#,
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn test_malformed_resolver_url_fails_startup() {
    let (webhook_url, _received) = webhook_server(StatusCode::OK).await;
    let mut h = harness("http://localhost:9".to_string(), webhook_url).await;
    h.config.resolver.base_url = "http://bad host".to_string();

    let result = Application::new(h.config.clone()).await;
    let err = result.err().expect("startup should fail");
    assert!(format!("{err:#}").contains("创建名称解析器失败"));
}
