use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use vsi_core::{messages, HistoryQuery, JobId, JobStatus};
use vsi_engine::{
    ClientSettings, ErrorKind, ProgressSink, ReqwestTransport, RetryPolicy, Transport,
    UploadRequest,
};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingSink {
    percents: Arc<Mutex<Vec<f64>>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<f64> {
        self.percents.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, percent: f64) {
        self.percents.lock().unwrap().push(percent);
    }
}

fn settings_for(server: &MockServer) -> ClientSettings {
    ClientSettings {
        base_url: format!("{}/api", server.uri()),
        retry: RetryPolicy {
            attempts: 2,
            delay: Duration::from_millis(10),
        },
        ..ClientSettings::default()
    }
}

fn zip_on_disk(size: usize) -> (tempfile::TempDir, UploadRequest) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.zip");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(&vec![b'z'; size]).unwrap();
    let request = UploadRequest {
        path,
        filename: "data.zip".to_string(),
        media_type: "application/zip".to_string(),
    };
    (dir, request)
}

#[tokio::test]
async fn upload_posts_multipart_and_reports_capped_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"data.zip\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "job_id": "job_42",
            "message": "File uploaded successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, request) = zip_on_disk(64 * 1024);
    let transport = ReqwestTransport::new(settings_for(&server)).unwrap();
    let sink = RecordingSink::default();

    let receipt = transport.submit_upload(&request, &sink).await.expect("upload ok");
    assert_eq!(receipt.job_id, JobId::from("job_42"));
    assert_eq!(receipt.message.as_deref(), Some("File uploaded successfully"));

    let percents = sink.take();
    assert!(!percents.is_empty());
    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(percents.iter().all(|p| (0.0..=95.0).contains(p)));
    assert_eq!(percents.last().copied(), Some(95.0));
}

#[tokio::test]
async fn payload_too_large_reads_as_file_too_large() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(413))
        .mount(&server)
        .await;

    let (_dir, request) = zip_on_disk(16);
    let transport = ReqwestTransport::new(settings_for(&server)).unwrap();
    let err = transport
        .submit_upload(&request, &RecordingSink::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PayloadTooLarge);
    assert_eq!(err.user_message(), messages::FILE_TOO_LARGE);
}

#[tokio::test]
async fn bad_request_surfaces_server_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "detail": "Only ZIP files are allowed" })),
        )
        .mount(&server)
        .await;

    let (_dir, request) = zip_on_disk(16);
    let transport = ReqwestTransport::new(settings_for(&server)).unwrap();
    let err = transport
        .submit_upload(&request, &RecordingSink::default())
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Only ZIP files are allowed");
}

#[tokio::test]
async fn uploads_are_not_retried_on_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, request) = zip_on_disk(16);
    let transport = ReqwestTransport::new(settings_for(&server)).unwrap();
    let err = transport
        .submit_upload(&request, &RecordingSink::default())
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), messages::SERVER_ERROR);
}

#[tokio::test]
async fn slow_upload_reads_as_upload_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "job_id": "late" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let (_dir, request) = zip_on_disk(16);
    let settings = ClientSettings {
        request_timeout: Duration::from_millis(200),
        ..settings_for(&server)
    };
    let transport = ReqwestTransport::new(settings).unwrap();
    let err = transport
        .submit_upload(&request, &RecordingSink::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UploadTimeout);
    assert_eq!(err.user_message(), messages::UPLOAD_TIMEOUT);
}

#[tokio::test]
async fn missing_local_file_is_a_file_error() {
    let server = MockServer::start().await;
    let transport = ReqwestTransport::new(settings_for(&server)).unwrap();
    let request = UploadRequest {
        path: "/definitely/not/here.zip".into(),
        filename: "here.zip".to_string(),
        media_type: "application/zip".to_string(),
    };
    let err = transport
        .submit_upload(&request, &RecordingSink::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::File);
}

#[tokio::test]
async fn status_decodes_offsetless_timestamps_and_missing_filename() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/upload/job_7/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "job_id": "job_7",
            "status": "Failed",
            "created_at": "2024-05-01T12:30:00.123456",
            "updated_at": "2024-05-01T12:31:00",
            "error_message": "Corrupt archive"
        })))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(settings_for(&server)).unwrap();
    let job = transport
        .fetch_status(&JobId::from("job_7"))
        .await
        .expect("status ok");
    assert_eq!(job.job_id, JobId::from("job_7"));
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.filename, None);
    assert_eq!(job.error_message.as_deref(), Some("Corrupt archive"));
    assert!(job.updated_at > job.created_at);
}

#[tokio::test]
async fn unknown_job_is_not_found_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/upload/nope/status"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "detail": "Job ID not found" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(settings_for(&server)).unwrap();
    let err = transport.fetch_status(&JobId::from("nope")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.user_message(), messages::NOT_FOUND);
}

#[tokio::test]
async fn history_sends_filter_and_paging_and_sorts_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/uploads"))
        .and(query_param("status", "Completed"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "total": 7,
            "page": 2,
            "limit": 5,
            "uploads": [
                {
                    "job_id": "old",
                    "filename": "a.zip",
                    "status": "Completed",
                    "created_at": "2024-05-01T08:00:00",
                    "updated_at": "2024-05-01T08:05:00"
                },
                {
                    "job_id": "new",
                    "filename": "b.zip",
                    "status": "Completed",
                    "created_at": "2024-05-02T08:00:00Z",
                    "updated_at": "2024-05-02T08:05:00Z"
                }
            ]
        })))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(settings_for(&server)).unwrap();
    let query = HistoryQuery {
        status: Some(JobStatus::Completed),
        page: 2,
        limit: 5,
    };
    let page = transport.fetch_history(&query).await.expect("history ok");
    assert_eq!((page.total, page.page, page.limit), (7, 2, 5));
    let ids: Vec<_> = page.jobs.iter().map(|job| job.job_id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old"]);
}

#[tokio::test]
async fn unreachable_server_is_a_network_error_after_retries() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let settings = ClientSettings {
        base_url: format!("http://127.0.0.1:{port}/api"),
        retry: RetryPolicy {
            attempts: 1,
            delay: Duration::from_millis(10),
        },
        ..ClientSettings::default()
    };
    let transport = ReqwestTransport::new(settings).unwrap();
    let err = transport
        .fetch_history(&HistoryQuery {
            status: None,
            page: 1,
            limit: 10,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Network);
    assert_eq!(err.user_message(), messages::NETWORK_ERROR);
}

#[test]
fn rejects_an_unparseable_base_url() {
    let settings = ClientSettings {
        base_url: "not a url".to_string(),
        ..ClientSettings::default()
    };
    let err = ReqwestTransport::new(settings).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidUrl);
}
