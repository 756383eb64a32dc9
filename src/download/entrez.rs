/// NCBI E-utilities client: esearch pagination and efetch batches
use crate::core::config::{DiagnosticsConfig, EntrezConfig, SearchConfig};
use crate::{HarvestError, Result};
use serde::Deserialize;
use std::time::{Duration, Instant};

const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// The two E-utilities endpoints the harvester talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `esearch.fcgi`, sent as GET
    Search,
    /// `efetch.fcgi`, sent as POST so long ID lists stay out of the URL
    Fetch,
}

impl Endpoint {
    pub fn url(&self) -> String {
        match self {
            Endpoint::Search => format!("{}/esearch.fcgi", EUTILS_BASE),
            Endpoint::Fetch => format!("{}/efetch.fcgi", EUTILS_BASE),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Search => "esearch",
            Endpoint::Fetch => "efetch",
        }
    }
}

/// Executes one request against an endpoint and returns the raw body.
#[cfg_attr(test, mockall::automock)]
pub trait EutilsTransport {
    fn execute(&mut self, endpoint: Endpoint, params: &[(String, String)]) -> Result<Vec<u8>>;
}

/// Keeps consecutive requests at least `min_interval` apart.
#[derive(Debug, Clone)]
pub struct RequestPacer {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl RequestPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// Sleep off whatever remains of the interval, then stamp the request.
    pub fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                std::thread::sleep(self.min_interval - elapsed);
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// Call `send` until it succeeds or `attempts` calls have failed, sleeping
/// `backoff` between failures. `send` receives the 1-based attempt number.
pub fn with_retries<F, E>(
    endpoint: Endpoint,
    attempts: u32,
    backoff: Duration,
    mut send: F,
) -> Result<Vec<u8>>
where
    F: FnMut(u32) -> std::result::Result<Vec<u8>, E>,
    E: std::fmt::Display,
{
    let attempts = attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match send(attempt) {
            Ok(body) => return Ok(body),
            Err(e) => {
                tracing::warn!(
                    "{} attempt {}/{} failed: {}",
                    endpoint.name(),
                    attempt,
                    attempts,
                    e
                );
                last_error = e.to_string();
                if attempt < attempts {
                    std::thread::sleep(backoff);
                }
            }
        }
    }

    Err(HarvestError::Transport {
        endpoint: endpoint.name().to_string(),
        attempts,
        message: last_error,
    })
}

fn send_once(
    client: &reqwest::blocking::Client,
    endpoint: Endpoint,
    params: &[(String, String)],
) -> reqwest::Result<Vec<u8>> {
    let request = match endpoint {
        Endpoint::Search => client.get(endpoint.url()).query(params),
        Endpoint::Fetch => client.post(endpoint.url()).form(params),
    };
    let response = request
        .header(reqwest::header::ACCEPT, "*/*")
        .send()?
        .error_for_status()?;
    Ok(response.bytes()?.to_vec())
}

/// Blocking reqwest transport with identification params, fixed-backoff
/// retries and a minimum delay between requests.
pub struct EntrezClient {
    client: reqwest::blocking::Client,
    email: String,
    tool: String,
    retries: u32,
    backoff: Duration,
    pacer: RequestPacer,
}

impl EntrezClient {
    pub fn new(config: &EntrezConfig) -> Result<Self> {
        let user_agent = format!(
            "{}/1.0 (+https://www.ncbi.nlm.nih.gov/; email:{})",
            config.tool, config.email
        );
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            email: config.email.clone(),
            tool: config.tool.clone(),
            retries: config.retries.max(1),
            backoff: Duration::from_millis(config.retry_backoff_ms),
            pacer: RequestPacer::new(Duration::from_millis(config.request_delay_ms)),
        })
    }
}

impl EutilsTransport for EntrezClient {
    fn execute(&mut self, endpoint: Endpoint, params: &[(String, String)]) -> Result<Vec<u8>> {
        let mut query = params.to_vec();
        query.push(("email".to_string(), self.email.clone()));
        query.push(("tool".to_string(), self.tool.clone()));

        let client = &self.client;
        let pacer = &mut self.pacer;
        with_retries(endpoint, self.retries, self.backoff, |_| {
            pacer.wait();
            send_once(client, endpoint, &query)
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct EsearchEnvelope {
    #[serde(default)]
    esearchresult: EsearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct EsearchResult {
    #[serde(default)]
    count: Option<String>,
    #[serde(default)]
    idlist: Vec<String>,
}

/// Page through esearch for one term, stopping at `search.max_records`.
pub fn search_ids<T: EutilsTransport + ?Sized>(
    transport: &mut T,
    database: &str,
    term: &str,
    search: &SearchConfig,
    diagnostics: &DiagnosticsConfig,
) -> Result<Vec<String>> {
    let cap = search.max_records;
    let page = search.page_size.max(1);
    let mut ids: Vec<String> = Vec::new();
    let mut retstart = 0usize;

    while retstart < cap {
        let params = vec![
            ("db".to_string(), database.to_string()),
            ("term".to_string(), term.to_string()),
            ("retmode".to_string(), "json".to_string()),
            ("retmax".to_string(), page.to_string()),
            ("retstart".to_string(), retstart.to_string()),
        ];
        let raw = transport.execute(Endpoint::Search, &params)?;
        let envelope: EsearchEnvelope = serde_json::from_slice(&raw)?;
        let page_ids = envelope.esearchresult.idlist;

        if retstart == 0 {
            let total: usize = envelope
                .esearchresult
                .count
                .as_deref()
                .and_then(|c| c.parse().ok())
                .unwrap_or(0);
            let preview = diagnostics.preview_ids.min(page_ids.len());
            tracing::info!("esearch total available: {}", total);
            tracing::info!("esearch sample IDs: {:?}", &page_ids[..preview]);
        }

        if page_ids.is_empty() {
            break;
        }
        let short_page = page_ids.len() < page;
        ids.extend(page_ids);
        retstart += page;

        if short_page {
            break;
        }
        if ids.len() >= cap {
            break;
        }
    }

    ids.truncate(cap);
    Ok(ids)
}

/// efetch parameters for one ID batch
pub fn fetch_params(database: &str, ids: &[String]) -> Vec<(String, String)> {
    vec![
        ("db".to_string(), database.to_string()),
        ("id".to_string(), ids.join(",")),
        ("rettype".to_string(), "gb".to_string()),
        ("retmode".to_string(), "xml".to_string()),
    ]
}
