//! Integration tests for the download command
//!
//! These tests use wiremock to serve the URL list and run the full
//! resume, scan, dispatch and drain cycle end-to-end.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use url_harvest::config::{DownloadConfig, PersistMode};
use url_harvest::crawler::run_download;
use url_harvest::output::{MemoryReporter, ProgressCode};
use url_harvest::storage::LedgerError;
use url_harvest::url::url_to_filename;
use url_harvest::HarvestError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARTICLE: &str = "This paragraph is comfortably longer than one hundred characters so the extractor keeps it in the output text.";

/// Creates a test configuration rooted in `dir`
fn create_test_config(dir: &Path) -> DownloadConfig {
    DownloadConfig {
        max_concurrent_downloads: 4,
        outdir: dir.join("scraped"),
        infile: dir.join("urls.txt"),
        checkfile: dir.join("scraped.txt"),
        parsedfile: dir.join("parsed.txt"),
        timeout: Duration::from_secs(5),
        ..DownloadConfig::default()
    }
}

fn write_urls(config: &DownloadConfig, urls: &[String]) {
    let mut content = urls.join("\n");
    content.push('\n');
    std::fs::write(&config.infile, content).expect("Failed to write url list");
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("Failed to read file")
        .lines()
        .map(str::to_string)
        .collect()
}

fn artifact(config: &DownloadConfig, url: &str) -> std::path::PathBuf {
    config.outdir.join(url_to_filename(url))
}

async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or_default()
}

/// Serves responses whose body stops well short of the announced length
async fn serve_truncated(body: String) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            // Read the whole request so closing the socket sends a clean FIN
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }

            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n",
                body.len() + 4096
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(body.as_bytes()).await;
            let _ = socket.flush().await;
        }
    });

    format!("http://{}/cut", addr)
}

#[tokio::test]
async fn test_raw_download_saves_body_verbatim() {
    let mock_server = MockServer::start().await;
    let body = "<html><body><p>raw bytes stay raw</p></body></html>";

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let url = format!("{}/page", mock_server.uri());
    write_urls(&config, &[url.clone()]);

    let reporter = Arc::new(MemoryReporter::new());
    let summary = run_download(config.clone(), reporter.clone())
        .await
        .expect("Download failed");

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.dispatched, 1);
    assert_eq!(summary.outcomes.saved, 1);
    assert_eq!(reporter.codes(), vec![ProgressCode::Saved]);
    assert_eq!(std::fs::read_to_string(artifact(&config, &url)).unwrap(), body);
}

#[tokio::test]
async fn test_status_handling() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let missing = format!("{}/missing", mock_server.uri());
    let broken = format!("{}/broken", mock_server.uri());
    write_urls(&config, &[missing.clone(), broken.clone()]);

    let reporter = Arc::new(MemoryReporter::new());
    let summary = run_download(config.clone(), reporter.clone())
        .await
        .expect("Download failed");

    // 404 bodies are stored, other failures are not
    assert_eq!(
        std::fs::read_to_string(artifact(&config, &missing)).unwrap(),
        "not here"
    );
    assert!(!artifact(&config, &broken).exists());

    assert_eq!(reporter.count(ProgressCode::NotFoundSaved), 1);
    assert_eq!(reporter.count(ProgressCode::Status), 1);
    assert_eq!(summary.outcomes.not_found_saved, 1);
    assert_eq!(summary.outcomes.status, 1);
}

#[tokio::test]
async fn test_unreachable_host_is_transport_failure() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    // Bind and release a port so nothing is listening on it
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let url = format!("http://127.0.0.1:{}/gone", port);
    write_urls(&config, &[url.clone(), "not a url".to_string()]);

    let reporter = Arc::new(MemoryReporter::new());
    let summary = run_download(config.clone(), reporter.clone())
        .await
        .expect("Download failed");

    assert_eq!(reporter.count(ProgressCode::Transport), 1);
    assert_eq!(reporter.count(ProgressCode::Request), 1);
    assert_eq!(summary.outcomes.persisted(), 0);
    assert!(!artifact(&config, &url).exists());
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = DownloadConfig {
        timeout: Duration::from_secs(1),
        ..create_test_config(dir.path())
    };
    let url = format!("{}/slow", mock_server.uri());
    write_urls(&config, &[url.clone()]);

    let reporter = Arc::new(MemoryReporter::new());
    run_download(config.clone(), reporter.clone())
        .await
        .expect("Download failed");

    assert_eq!(reporter.codes(), vec![ProgressCode::Timeout]);
    assert!(!artifact(&config, &url).exists());
}

#[tokio::test]
async fn test_second_run_fetches_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("content"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let urls: Vec<String> = (0..5)
        .map(|i| format!("{}/page{}", mock_server.uri(), i))
        .collect();
    write_urls(&config, &urls);

    let first = run_download(config.clone(), Arc::new(MemoryReporter::new()))
        .await
        .expect("First run failed");
    assert_eq!(first.outcomes.saved, 5);
    assert_eq!(request_count(&mock_server).await, 5);

    let reporter = Arc::new(MemoryReporter::new());
    let second = run_download(config.clone(), reporter.clone())
        .await
        .expect("Second run failed");

    assert_eq!(second.resumed, 5);
    assert_eq!(second.scanned, 0);
    assert_eq!(second.dispatched, 0);
    assert_eq!(reporter.resumed(), Some(5));
    assert_eq!(request_count(&mock_server).await, 5);
    assert_eq!(read_lines(&config.checkfile), urls);
}

#[tokio::test]
async fn test_resume_continues_after_checked_prefix() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("content"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let urls: Vec<String> = (0..4)
        .map(|i| format!("{}/page{}", mock_server.uri(), i))
        .collect();
    write_urls(&config, &urls);

    // A previous run got through the first two lines
    std::fs::write(&config.checkfile, format!("{}\n{}\n", urls[0], urls[1])).unwrap();

    let summary = run_download(config.clone(), Arc::new(MemoryReporter::new()))
        .await
        .expect("Download failed");

    assert_eq!(summary.resumed, 2);
    assert_eq!(summary.scanned, 2);
    assert_eq!(request_count(&mock_server).await, 2);
    assert!(!artifact(&config, &urls[0]).exists());
    assert!(artifact(&config, &urls[3]).exists());
    assert_eq!(read_lines(&config.checkfile), urls);
}

#[tokio::test]
async fn test_corrupted_checkpoint_aborts_before_fetching() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("content"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let urls: Vec<String> = (0..3)
        .map(|i| format!("{}/page{}", mock_server.uri(), i))
        .collect();
    write_urls(&config, &urls);
    std::fs::write(&config.checkfile, format!("{}\nhttp://other/\n", urls[0])).unwrap();

    let result = run_download(config.clone(), Arc::new(MemoryReporter::new())).await;

    match result {
        Err(HarvestError::Ledger(LedgerError::Misaligned { line, .. })) => assert_eq!(line, 2),
        other => panic!("Expected misaligned checkpoint, got {:?}", other),
    }
    assert_eq!(request_count(&mock_server).await, 0);
    // The ledger is left as it was
    assert_eq!(read_lines(&config.checkfile), vec![urls[0].clone(), "http://other/".to_string()]);
}

#[tokio::test]
async fn test_checkpoint_longer_than_input_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    write_urls(&config, &["http://a.test/".to_string()]);
    std::fs::write(&config.checkfile, "http://a.test/\nhttp://b.test/\n").unwrap();

    let result = run_download(config, Arc::new(MemoryReporter::new())).await;
    assert!(matches!(
        result,
        Err(HarvestError::Ledger(LedgerError::InputExhausted { .. }))
    ));
}

#[tokio::test]
async fn test_missing_input_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let result = run_download(config, Arc::new(MemoryReporter::new())).await;
    assert!(matches!(result, Err(HarvestError::InputFile { .. })));
}

#[tokio::test]
async fn test_blank_lines_are_recorded_not_fetched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("content"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let a = format!("{}/a", mock_server.uri());
    let b = format!("{}/b", mock_server.uri());
    std::fs::write(&config.infile, format!("{}\n\n  {}  \n", a, b)).unwrap();

    let summary = run_download(config.clone(), Arc::new(MemoryReporter::new()))
        .await
        .expect("Download failed");

    assert_eq!(summary.scanned, 3);
    assert_eq!(summary.blank, 1);
    assert_eq!(summary.dispatched, 2);
    assert_eq!(read_lines(&config.checkfile), vec![a, String::new(), b]);
}

#[tokio::test]
async fn test_existing_artifact_is_not_fetched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fresh"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let kept = format!("{}/kept", mock_server.uri());
    let fresh = format!("{}/fresh", mock_server.uri());
    write_urls(&config, &[kept.clone(), fresh.clone()]);

    std::fs::create_dir_all(&config.outdir).unwrap();
    std::fs::write(artifact(&config, &kept), "old").unwrap();

    let summary = run_download(config.clone(), Arc::new(MemoryReporter::new()))
        .await
        .expect("Download failed");

    assert_eq!(summary.skipped_existing, 1);
    assert_eq!(std::fs::read_to_string(artifact(&config, &kept)).unwrap(), "old");
    assert_eq!(std::fs::read_to_string(artifact(&config, &fresh)).unwrap(), "fresh");
    // Skipped lines still land in the ledger
    assert_eq!(read_lines(&config.checkfile), vec![kept, fresh]);
}

#[tokio::test]
async fn test_retry_missing_refetches_checked_urls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("content"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = DownloadConfig {
        retry_missing: true,
        ..create_test_config(dir.path())
    };
    let urls: Vec<String> = (0..3)
        .map(|i| format!("{}/page{}", mock_server.uri(), i))
        .collect();
    write_urls(&config, &urls);
    std::fs::write(&config.checkfile, format!("{}\n{}\n", urls[0], urls[1])).unwrap();
    std::fs::create_dir_all(&config.outdir).unwrap();
    std::fs::write(artifact(&config, &urls[0]), "old").unwrap();

    let summary = run_download(config.clone(), Arc::new(MemoryReporter::new()))
        .await
        .expect("Download failed");

    // page1 was checked but has no artifact, page2 is new
    assert_eq!(summary.dispatched, 2);
    assert_eq!(request_count(&mock_server).await, 2);
    assert!(artifact(&config, &urls[1]).exists());
    assert_eq!(std::fs::read_to_string(artifact(&config, &urls[0])).unwrap(), "old");
    assert_eq!(read_lines(&config.checkfile), urls);
}

#[tokio::test]
async fn test_text_mode_stores_extracted_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<html><head><title>Title</title></head><body><script>var x = 1;</script><p>{}</p><p>short</p></body></html>",
            ARTICLE
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/blank"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body><p>tiny</p></body></html>"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = DownloadConfig {
        persist: PersistMode::Text,
        ..create_test_config(dir.path())
    };
    let article = format!("{}/article", mock_server.uri());
    let blank = format!("{}/blank", mock_server.uri());
    write_urls(&config, &[article.clone(), blank.clone()]);

    let reporter = Arc::new(MemoryReporter::new());
    let summary = run_download(config.clone(), reporter.clone())
        .await
        .expect("Download failed");

    assert_eq!(
        std::fs::read_to_string(artifact(&config, &article)).unwrap(),
        format!("{}\n", ARTICLE)
    );
    assert!(!artifact(&config, &blank).exists());
    assert_eq!(reporter.count(ProgressCode::Saved), 1);
    assert_eq!(reporter.count(ProgressCode::Empty), 1);
    assert_eq!(summary.outcomes.empty, 1);
    assert_eq!(read_lines(&config.parsedfile), vec![article]);
}

#[tokio::test]
async fn test_concurrency_never_exceeds_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("content")
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = DownloadConfig {
        max_concurrent_downloads: 3,
        ..create_test_config(dir.path())
    };
    let urls: Vec<String> = (0..12)
        .map(|i| format!("{}/page{}", mock_server.uri(), i))
        .collect();
    write_urls(&config, &urls);

    let summary = run_download(config.clone(), Arc::new(MemoryReporter::new()))
        .await
        .expect("Download failed");

    assert!(summary.peak_in_flight <= 3);
    assert!(summary.peak_in_flight >= 1);
    // Every fetch completed before the run returned
    assert_eq!(summary.outcomes.saved, 12);
    for url in &urls {
        assert!(artifact(&config, url).exists());
    }
}

#[tokio::test]
async fn test_first_milestone_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("content"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    write_urls(&config, &[format!("{}/only", mock_server.uri())]);

    let reporter = Arc::new(MemoryReporter::new());
    run_download(config, reporter.clone())
        .await
        .expect("Download failed");

    let milestones = reporter.milestones();
    assert_eq!(milestones.len(), 1);
    assert_eq!(milestones[0].scanned, 0);
}

#[tokio::test]
async fn test_invalid_settings_are_rejected() {
    let dir = TempDir::new().unwrap();
    let config = DownloadConfig {
        max_concurrent_downloads: 0,
        ..create_test_config(dir.path())
    };
    write_urls(&config, &["http://a.test/".to_string()]);

    let result = run_download(config.clone(), Arc::new(MemoryReporter::new())).await;
    assert!(matches!(result, Err(HarvestError::Config(_))));
    assert!(!config.checkfile.exists());
}

#[tokio::test]
async fn test_invalid_utf8_line_does_not_stop_the_run() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("content"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let uri = mock_server.uri();

    let mut input = format!("{}/a\n{}/caf", uri, uri).into_bytes();
    input.push(0xe9);
    input.extend_from_slice(format!("\n{}/c\n", uri).as_bytes());
    std::fs::write(&config.infile, input).unwrap();

    let summary = run_download(config.clone(), Arc::new(MemoryReporter::new()))
        .await
        .expect("Download failed");

    assert_eq!(summary.scanned, 3);
    assert_eq!(summary.dispatched, 3);
    assert_eq!(request_count(&mock_server).await, 3);
    assert_eq!(
        read_lines(&config.checkfile),
        vec![
            format!("{}/a", uri),
            format!("{}/caf\u{FFFD}", uri),
            format!("{}/c", uri)
        ]
    );

    // The recorded line still matches the raw input on resume
    let second = run_download(config.clone(), Arc::new(MemoryReporter::new()))
        .await
        .expect("Resume failed");
    assert_eq!(second.resumed, 3);
    assert_eq!(second.dispatched, 0);
    assert_eq!(request_count(&mock_server).await, 3);
}

#[tokio::test]
async fn test_raw_mode_discards_cut_off_body() {
    let url = serve_truncated("<html><body><p>partial".to_string()).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    write_urls(&config, &[url.clone()]);

    let reporter = Arc::new(MemoryReporter::new());
    let summary = run_download(config.clone(), reporter.clone())
        .await
        .expect("Download failed");

    assert_eq!(reporter.codes(), vec![ProgressCode::Body]);
    assert_eq!(summary.outcomes.body, 1);
    assert!(!artifact(&config, &url).exists());
}

#[tokio::test]
async fn test_text_mode_keeps_text_from_cut_off_body() {
    let url = serve_truncated(format!(
        "<html><body><p>{}</p><p>the rest never arrives",
        ARTICLE
    ))
    .await;

    let dir = TempDir::new().unwrap();
    let config = DownloadConfig {
        persist: PersistMode::Text,
        ..create_test_config(dir.path())
    };
    write_urls(&config, &[url.clone()]);

    let reporter = Arc::new(MemoryReporter::new());
    run_download(config.clone(), reporter.clone())
        .await
        .expect("Download failed");

    assert_eq!(reporter.codes(), vec![ProgressCode::Body]);
    assert_eq!(
        std::fs::read_to_string(artifact(&config, &url)).unwrap(),
        format!("{}\n", ARTICLE)
    );
    // A cut-off body is not a successful extraction
    assert!(read_lines(&config.parsedfile).is_empty());
}
