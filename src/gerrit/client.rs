use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{Client as HttpClient, Response};
use std::time::Duration;
use tracing::{debug, info};

use crate::cache::SnapshotFile;
use crate::config::GerritConfig;
use crate::gerrit::models::Change;

/// Prefix Gerrit puts in front of every JSON body to defeat XSSI
const XSSI_GUARD: &str = ")]}'";

/// Where the change list comes from
pub enum ChangeSource {
    /// Query the review server, following pagination
    Live(GerritClient),
    /// Replay a previously saved snapshot
    Snapshot(SnapshotFile),
    #[cfg(test)]
    Mock(MockGerrit),
}

impl ChangeSource {
    /// Fetch the complete ordered list of changes for `query`
    pub fn fetch(&self, query: &str) -> Result<Vec<Change>> {
        match self {
            ChangeSource::Live(client) => client.fetch_changes(query),
            ChangeSource::Snapshot(snapshot) => {
                info!("Using cached snapshot {:?}", snapshot.path());
                snapshot.load()
            }
            #[cfg(test)]
            ChangeSource::Mock(client) => fetch_all_pages(query, |start| client.page(start)),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, ChangeSource::Live(_))
    }
}

/// Drain every page of a paginated query.
///
/// `fetch_page` receives the number of records already retrieved as the
/// `start` offset. Paging stops once the last record of a page no longer
/// carries the `_more_changes` marker, or a page comes back empty.
pub fn fetch_all_pages<F>(query: &str, mut fetch_page: F) -> Result<Vec<Change>>
where
    F: FnMut(usize) -> Result<Vec<Change>>,
{
    let mut changes = fetch_page(0)?;

    while changes.last().map_or(false, |c| c.more_changes) {
        let start = changes.len();
        debug!("Fetching {:?} starting at {}", query, start);
        let page = fetch_page(start)?;
        if page.is_empty() {
            break;
        }
        changes.extend(page);
    }

    Ok(changes)
}

/// Anonymous client for the Gerrit REST API
pub struct GerritClient {
    client: HttpClient,
    base_url: String,
}

impl GerritClient {
    pub fn new(config: &GerritConfig) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(GerritClient {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch all changes matching `query`
    pub fn fetch_changes(&self, query: &str) -> Result<Vec<Change>> {
        fetch_all_pages(query, |start| self.fetch_page(query, start))
    }

    /// Fetch a single page of changes
    fn fetch_page(&self, query: &str, start: usize) -> Result<Vec<Change>> {
        let url = format!("{}/changes/", self.base_url);
        let mut request = self.client.get(&url).query(&[("q", query)]);
        if start > 0 {
            request = request.query(&[("start", start)]);
        }

        let response = request
            .send()
            .with_context(|| format!("Gerrit request failed: {}?q={}&start={}", url, query, start))?;

        self.handle_response(response)
            .with_context(|| format!("Gerrit request failed: {}?q={}&start={}", url, query, start))
    }

    fn handle_response(&self, response: Response) -> Result<Vec<Change>> {
        let status = response.status();
        let body = response.text().context("Failed to read Gerrit response body")?;

        if !status.is_success() {
            return Err(anyhow!("Gerrit response ({}): {}", status, body.trim()));
        }

        parse_changes(&body)
    }
}

/// Parse a Gerrit JSON body, tolerating the XSSI guard line
pub fn parse_changes(body: &str) -> Result<Vec<Change>> {
    let json = body.trim_start().strip_prefix(XSSI_GUARD).unwrap_or(body);
    serde_json::from_str(json).context("Failed to parse Gerrit response")
}

/// Mock Gerrit server serving canned pages
#[cfg(test)]
pub struct MockGerrit {
    pub pages: Vec<Vec<Change>>,
    pub requested_starts: std::cell::RefCell<Vec<usize>>,
}

#[cfg(test)]
impl MockGerrit {
    pub fn new(pages: Vec<Vec<Change>>) -> Self {
        MockGerrit {
            pages,
            requested_starts: std::cell::RefCell::new(vec![]),
        }
    }

    pub fn page(&self, start: usize) -> Result<Vec<Change>> {
        let mut starts = self.requested_starts.borrow_mut();
        let index = starts.len();
        starts.push(start);

        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| anyhow!("No mock page configured for request {}", index))
    }
}
