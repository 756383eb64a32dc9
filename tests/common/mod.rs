/// Shared fixtures and a scripted transport for integration tests
use marker_harvest::download::{Endpoint, EutilsTransport};
use marker_harvest::{Config, HarvestError};
use std::collections::VecDeque;
use std::path::PathBuf;

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture_path(name)).expect("fixture exists")
}

#[allow(dead_code)]
pub fn esearch_body(ids: &[&str]) -> Vec<u8> {
    serde_json::json!({
        "esearchresult": { "count": ids.len().to_string(), "idlist": ids }
    })
    .to_string()
    .into_bytes()
}

/// Region-aware preset with a contact address and a single term
pub fn test_config() -> Config {
    let mut config = Config::region_aware();
    config.entrez.email = "curator@example.org".to_string();
    config.search.terms = vec!["Tardigrada[Organism]".to_string()];
    config
}

/// Replays canned bodies per endpoint, in order.
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedTransport {
    pub searches: VecDeque<Vec<u8>>,
    pub fetches: VecDeque<Vec<u8>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new(searches: Vec<Vec<u8>>, fetches: Vec<Vec<u8>>) -> Self {
        Self {
            searches: searches.into(),
            fetches: fetches.into(),
        }
    }
}

impl EutilsTransport for ScriptedTransport {
    fn execute(&mut self, endpoint: Endpoint, _params: &[(String, String)]) -> marker_harvest::Result<Vec<u8>> {
        let queue = match endpoint {
            Endpoint::Search => &mut self.searches,
            Endpoint::Fetch => &mut self.fetches,
        };
        queue.pop_front().ok_or_else(|| HarvestError::Transport {
            endpoint: endpoint.name().to_string(),
            attempts: 1,
            message: "no scripted response left".to_string(),
        })
    }
}
