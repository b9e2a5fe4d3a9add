//! Integration tests for the scan pipeline
//!
//! These tests use wiremock as the search backend and the scripted browser
//! in place of Chromium, and run the full discovery, fetch, extract and
//! persist cycle end-to-end.

use lead_harvester::browser::{ScriptedBrowser, ScriptedPage};
use lead_harvester::config::Config;
use lead_harvester::crawler::{run_scan_with, ScanRequest, SeedDiscovery, StopReason};
use lead_harvester::output::load_leads;
use lead_harvester::{HarvestError, LeadStatus};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock search backend
fn create_test_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.search.endpoint = format!("{}/html/", server.uri());
    config.search.timeout_secs = 5;
    config.crawler.fetch_timeout_secs = 1;
    config.crawler.settle_delay_ms = 0;
    config.capture.frames_dir = path_string(dir, "frames");
    config.capture.video_path = path_string(dir, "recording.mp4");
    config.output.leads_path = path_string(dir, "leads.csv");
    config.output.summary_path = path_string(dir, "summary.md");
    config
}

fn path_string(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).display().to_string()
}

/// Renders a result page whose links are wrapped in `uddg` redirects
fn results_page(results: &[(&str, &str)]) -> String {
    let mut html = String::from("<html><body><div class=\"results\">");
    for (title, destination) in results {
        let encoded: String = url::form_urlencoded::byte_serialize(destination.as_bytes()).collect();
        html.push_str(&format!(
            r#"<div class="result"><h2><a class="result__a" href="//duckduckgo.com/l/?uddg={}&amp;rut=abc">{}</a></h2></div>"#,
            encoded, title
        ));
    }
    html.push_str("</div></body></html>");
    html
}

async fn mount_results(server: &MockServer, keyword: &str, results: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path("/html/"))
        .and(query_param("q", keyword))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(results_page(results))
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

fn contact_page(email: &str) -> ScriptedPage {
    ScriptedPage::new(
        format!("Welcome! Write to {} for quotes.", email),
        "<html><body>Welcome</body></html>",
    )
}

#[tokio::test]
async fn test_full_scan_writes_verified_leads() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    mount_results(
        &server,
        "test",
        &[
            ("Alpha Traders", "https://alpha.test/"),
            ("Beta Exports", "https://beta.test/contact"),
            ("Gamma Knits", "https://gamma.test/"),
        ],
    )
    .await;

    let browser = ScriptedBrowser::new()
        .with_page("https://alpha.test/", contact_page("sales@alpha.test"))
        .with_page(
            "https://beta.test/contact",
            contact_page("info@beta.test").with_delay(Duration::from_secs(3)),
        )
        .with_page("https://gamma.test/", contact_page("hello@gamma.test"));

    let report = run_scan_with(&config, ScanRequest::new("test"), "hash", &browser)
        .await
        .expect("scan should succeed");

    assert_eq!(report.seeds, 3);
    assert_eq!(report.processed, 3);
    assert_eq!(report.fetch_timeouts, 1);
    assert_eq!(report.stop_reason, StopReason::QueueExhausted);

    let leads = load_leads(Path::new(&config.output.leads_path)).unwrap();
    assert_eq!(leads.len(), 2);
    assert!(leads.iter().all(|lead| lead.status == LeadStatus::Verified));
    assert_eq!(leads[0].company, "Alpha Traders");
    assert_eq!(leads[0].website, "https://alpha.test/");
    assert!(leads[0].emails.contains("sales@alpha.test"));
    assert_eq!(leads[1].website, "https://gamma.test/");

    let summary = fs::read_to_string(&config.output.summary_path).unwrap();
    assert!(summary.contains("- **Keyword**: test"));
    assert!(summary.contains("- **Config Hash**: hash"));
}

#[tokio::test]
async fn test_discovery_decodes_redirect_links() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    mount_results(
        &server,
        "garments",
        &[
            ("Knit House", "https://knit.test/about?lang=en"),
            ("Not a page", "ftp://files.test/catalog"),
        ],
    )
    .await;

    let discovery = SeedDiscovery::new(&config.search, &config.browser.user_agent).unwrap();
    let seeds = discovery.discover("garments").await;

    assert_eq!(seeds.len(), 1);
    assert_eq!(seeds[0].url.as_str(), "https://knit.test/about?lang=en");
    assert_eq!(seeds[0].source_title, "Knit House");
    assert_eq!(seeds[0].depth, 1);
}

#[tokio::test]
async fn test_quota_stops_with_queue_remaining() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    let urls: Vec<String> = (0..5).map(|i| format!("https://lead{}.test/", i)).collect();
    let results: Vec<(&str, &str)> = urls.iter().map(|u| ("Lead", u.as_str())).collect();
    mount_results(&server, "test", &results).await;

    let mut browser = ScriptedBrowser::new();
    for (i, url) in urls.iter().enumerate() {
        browser = browser.with_page(url, contact_page(&format!("team@lead{}.test", i)));
    }

    let request = ScanRequest {
        max_leads: Some(1),
        ..ScanRequest::new("test")
    };
    let report = run_scan_with(&config, request, "hash", &browser)
        .await
        .unwrap();

    assert_eq!(report.leads.len(), 1);
    assert_eq!(report.remaining, 4);
    assert_eq!(report.stop_reason, StopReason::QuotaReached);
    assert_eq!(browser.navigations(), vec!["https://lead0.test/".to_string()]);

    let leads = load_leads(Path::new(&config.output.leads_path)).unwrap();
    assert_eq!(leads.len(), 1);
}

#[tokio::test]
async fn test_duplicate_results_produce_one_row() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    mount_results(
        &server,
        "test",
        &[
            ("Acme", "https://www.acme.test/?utm_source=ddg"),
            ("Acme again", "https://acme.test/"),
        ],
    )
    .await;

    let browser = ScriptedBrowser::new().with_page("https://acme.test/", contact_page("a@acme.test"));

    let report = run_scan_with(&config, ScanRequest::new("test"), "hash", &browser)
        .await
        .unwrap();

    assert_eq!(report.processed, 1);
    let leads = load_leads(Path::new(&config.output.leads_path)).unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].company, "Acme");
}

#[tokio::test]
async fn test_parallel_workers_respect_quota() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    let urls: Vec<String> = (0..10).map(|i| format!("https://shop{}.test/", i)).collect();
    let results: Vec<(&str, &str)> = urls.iter().map(|u| ("Shop", u.as_str())).collect();
    mount_results(&server, "test", &results).await;

    let mut browser = ScriptedBrowser::new();
    for (i, url) in urls.iter().enumerate() {
        let page = contact_page(&format!("buy@shop{}.test", i))
            .with_delay(Duration::from_millis(10 * (i as u64 % 4)));
        browser = browser.with_page(url, page);
    }

    let request = ScanRequest {
        max_leads: Some(2),
        workers: Some(3),
        ..ScanRequest::new("test")
    };
    let report = run_scan_with(&config, request, "hash", &browser)
        .await
        .unwrap();

    assert_eq!(browser.sessions_opened(), 3);
    assert_eq!(report.leads.len(), 2);
    assert!(report.processed <= 10);
    assert_eq!(
        load_leads(Path::new(&config.output.leads_path)).unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_search_failure_keeps_existing_table() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let previous = "Company,Website,Emails,Phones,WhatsApp,Status\n\
                    Old,https://old.test/,old@old.test,,,Verified\n";
    fs::write(&config.output.leads_path, previous).unwrap();

    let report = run_scan_with(&config, ScanRequest::new("test"), "hash", &ScriptedBrowser::new())
        .await
        .unwrap();

    assert_eq!(report.seeds, 0);
    assert!(report.leads.is_empty());
    assert_eq!(report.stop_reason, StopReason::QueueExhausted);
    assert_eq!(fs::read_to_string(&config.output.leads_path).unwrap(), previous);
}

#[tokio::test]
async fn test_browser_launch_failure_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let browser = ScriptedBrowser::new().failing_launch();
    let result = run_scan_with(&config, ScanRequest::new("test"), "hash", &browser).await;

    assert!(matches!(result, Err(HarvestError::Browser(_))));
    assert!(!Path::new(&config.output.leads_path).exists());
}

#[tokio::test]
async fn test_launch_failure_keeps_previous_frames() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    let frames = Path::new(&config.capture.frames_dir);
    fs::create_dir_all(frames).unwrap();
    fs::write(frames.join("frame_0.png"), b"previous run").unwrap();

    let request = ScanRequest {
        record: Some(true),
        ..ScanRequest::new("test")
    };
    let browser = ScriptedBrowser::new().failing_launch();
    let result = run_scan_with(&config, request, "hash", &browser).await;

    assert!(matches!(result, Err(HarvestError::Browser(_))));
    assert_eq!(fs::read(frames.join("frame_0.png")).unwrap(), b"previous run");
}

#[tokio::test]
async fn test_invalid_requests_rejected() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let browser = ScriptedBrowser::new();

    let blank = run_scan_with(&config, ScanRequest::new("   "), "hash", &browser).await;
    assert!(matches!(blank, Err(HarvestError::InvalidRequest(_))));

    let over_quota = ScanRequest {
        max_leads: Some(500),
        ..ScanRequest::new("test")
    };
    let result = run_scan_with(&config, over_quota, "hash", &browser).await;
    assert!(matches!(result, Err(HarvestError::Config(_))));
    assert_eq!(browser.sessions_opened(), 0);
}

#[tokio::test]
async fn test_recording_writes_frames() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    mount_results(
        &server,
        "test",
        &[("One", "https://one.test/"), ("Two", "https://two.test/")],
    )
    .await;

    // Leftovers from an earlier recording must not survive the reset
    fs::create_dir_all(&config.capture.frames_dir).unwrap();
    fs::write(Path::new(&config.capture.frames_dir).join("frame_7.png"), b"stale").unwrap();

    let browser = ScriptedBrowser::new()
        .with_page("https://one.test/", contact_page("a@one.test"))
        .with_page("https://two.test/", ScriptedPage::new("no contacts here", ""));

    let request = ScanRequest {
        record: Some(true),
        ..ScanRequest::new("test")
    };
    let report = run_scan_with(&config, request, "hash", &browser)
        .await
        .unwrap();

    let frames = Path::new(&config.capture.frames_dir);
    assert_eq!(report.frames_captured, 2);
    assert!(frames.join("frame_0.png").exists());
    assert!(frames.join("frame_1.png").exists());
    assert!(!frames.join("frame_7.png").exists());
    assert_eq!(report.leads.len(), 1);
}
