use anyhow::Result;
use health_etl::config::PipelineConfig;
use health_etl::error::EtlError;
use health_etl::fetch::Fetcher;
use health_etl::pipeline;
use health_etl::storage::{SqliteStorage, Storage};
use std::sync::Arc;
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Minimal HTTP stub that answers every connection with the same status
/// and JSON body. Returns the base URL to point a pipeline at.
async fn spawn_stub_server(status: u16, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let body = body.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let reason = match status {
                    200 => "OK",
                    500 => "Internal Server Error",
                    _ => "Error",
                };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn case_pipeline_end_to_end_is_idempotent() -> Result<()> {
    let body = serde_json::json!([
        {"submission_date": "2021-01-01T00:00:00.000", "state": "ca", "new_case": "10", "new_death": null},
        {"submission_date": "2021-01-02T00:00:00.000", "state": "ca", "new_case": "20", "new_death": "1"},
        {"submission_date": "2021-01-01T00:00:00.000", "state": "wa", "new_case": 5, "new_death": 0}
    ])
    .to_string();
    let endpoint = spawn_stub_server(200, body).await;

    let dir = tempdir()?;
    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::new(dir.path().join("etl.db")));
    let fetcher = Fetcher::new()?;
    let config = PipelineConfig {
        endpoint,
        table: "covid_cases".to_string(),
    };

    let summary = pipeline::run_cases(&fetcher, &storage, &config).await?;
    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.loaded, 3);

    // Second run against the byte-identical response must not accumulate
    pipeline::run_cases(&fetcher, &storage, &config).await?;

    let totals = storage.top_states_by_cases("covid_cases", 5).await?;
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0].state, "CA");
    assert_eq!(totals[0].total_cases, 30.0);
    assert_eq!(totals[1].state, "WA");
    assert_eq!(totals[1].total_cases, 5.0);
    Ok(())
}

#[tokio::test]
async fn http_error_aborts_before_the_store_is_touched() -> Result<()> {
    let endpoint = spawn_stub_server(500, "oops".to_string()).await;

    let dir = tempdir()?;
    let db_path = dir.path().join("etl.db");
    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::new(&db_path));
    let fetcher = Fetcher::new()?;
    let config = PipelineConfig {
        endpoint,
        table: "covid_cases".to_string(),
    };

    let err = pipeline::run_cases(&fetcher, &storage, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, EtlError::Fetch { status: 500 }));

    // The loader never ran, so the database file was never created
    assert!(!db_path.exists());
    Ok(())
}

#[tokio::test]
async fn malformed_case_date_aborts_the_run() -> Result<()> {
    let body = serde_json::json!([
        {"submission_date": "garbage", "state": "ca", "new_case": "1", "new_death": "0"}
    ])
    .to_string();
    let endpoint = spawn_stub_server(200, body).await;

    let dir = tempdir()?;
    let db_path = dir.path().join("etl.db");
    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::new(&db_path));
    let fetcher = Fetcher::new()?;
    let config = PipelineConfig {
        endpoint,
        table: "covid_cases".to_string(),
    };

    let err = pipeline::run_cases(&fetcher, &storage, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, EtlError::Parse(_)));
    assert!(!db_path.exists());
    Ok(())
}

#[tokio::test]
async fn vaccination_pipeline_drops_countyless_rows_and_keeps_bad_dates() -> Result<()> {
    let body = serde_json::json!([
        {
            "date": "2021-06-01T00:00:00.000",
            "recip_county": "King County",
            "recip_state": "WA",
            "series_complete_pop_pct": "45.3",
            "administered_dose1_recip": "1200000",
            "administered_dose1_pop_pct": "55.1"
        },
        {
            "date": "06/01/2021",
            "recip_county": "Pierce County",
            "recip_state": "WA",
            "series_complete_pop_pct": null,
            "administered_dose1_recip": "900",
            "administered_dose1_pop_pct": "12.5"
        },
        {
            "date": "2021-06-01T00:00:00.000",
            "recip_county": "",
            "recip_state": "WA",
            "series_complete_pop_pct": "45.3",
            "administered_dose1_recip": "0",
            "administered_dose1_pop_pct": "0"
        }
    ])
    .to_string();
    let endpoint = spawn_stub_server(200, body).await;

    let dir = tempdir()?;
    let db_path = dir.path().join("etl.db");
    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::new(&db_path));
    let fetcher = Fetcher::new()?;
    let config = PipelineConfig {
        endpoint,
        table: "vaccinations".to_string(),
    };

    let summary = pipeline::run_vaccinations(&fetcher, &storage, &config).await?;
    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.loaded, 2);

    let conn = rusqlite::Connection::open(&db_path)?;
    let mut stmt = conn.prepare("SELECT county, date FROM vaccinations ORDER BY county")?;
    let rows: Vec<(String, Option<String>)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<_, _>>()?;

    assert_eq!(
        rows,
        vec![
            ("King County".to_string(), Some("2021-06-01".to_string())),
            ("Pierce County".to_string(), None),
        ]
    );
    Ok(())
}
