use anyhow::Result;
use asb_audit::config::GerritConfig;
use asb_audit::gerrit::{Change, GerritClient};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

// reqwest's blocking client must not run on the async test runtime itself
async fn fetch(uri: String, query: &'static str) -> Result<Vec<Change>> {
    tokio::task::spawn_blocking(move || {
        let client = GerritClient::new(&GerritConfig {
            url: uri,
            ..GerritConfig::default()
        })?;
        client.fetch_changes(query)
    })
    .await?
}

fn page(numbers: &[u64], more: bool) -> String {
    let records: Vec<String> = numbers
        .iter()
        .enumerate()
        .map(|(i, n)| {
            let marker = if more && i + 1 == numbers.len() {
                ",\"_more_changes\":true"
            } else {
                ""
            };
            format!(
                "{{\"project\":\"LineageOS/android_system_core\",\"change_id\":\"I{}\",\"status\":\"MERGED\",\"topic\":\"asb-2019.02\",\"_number\":{}{}}}",
                n, n, marker
            )
        })
        .collect();
    format!(")]}}'\n[{}]\n", records.join(","))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_pages_are_requested_with_cumulative_start() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/changes/"))
        .and(query_param("q", "branch:cm-11.0"))
        .and(query_param_is_missing("start"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(&[1, 2], true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/changes/"))
        .and(query_param("q", "branch:cm-11.0"))
        .and(query_param("start", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(&[3], false)))
        .expect(1)
        .mount(&server)
        .await;

    let changes = fetch(server.uri(), "branch:cm-11.0").await?;

    let numbers: Vec<u64> = changes.iter().map(|c| c.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    let requests = server.received_requests().await.unwrap_or_default();
    let starts: Vec<Option<String>> = requests
        .iter()
        .map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "start")
                .map(|(_, v)| v.into_owned())
        })
        .collect();
    assert_eq!(starts, vec![None, Some("2".to_string())]);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_is_fatal_and_names_request() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/changes/"))
        .and(query_param_is_missing("start"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(&[1, 2], true)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/changes/"))
        .and(query_param("start", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal server error"))
        .mount(&server)
        .await;

    let err = fetch(server.uri(), "branch:cm-11.0").await.unwrap_err();
    let message = format!("{:#}", err);

    assert!(message.contains(&format!("{}/changes/", server.uri())), "{}", message);
    assert!(message.contains("start=2"), "{}", message);
    assert!(message.contains("500"), "{}", message);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_body_without_xssi_guard_is_accepted() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/changes/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    let changes = fetch(server.uri(), "topic:asb-2019.02-cm11").await?;
    assert!(changes.is_empty());

    Ok(())
}
