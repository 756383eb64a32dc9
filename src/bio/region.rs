/// Region inclusion decisions from locality text and coordinates
use crate::bio::coords::parse_lat_lon_f64;
use crate::core::config::{BoundingBox, RegionConfig};
use serde::{Deserialize, Serialize};

/// Why a record was (or was not) placed inside the target region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchReason {
    Text,
    LatLon,
    Pacific,
    Disabled,
    None,
}

impl MatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchReason::Text => "text",
            MatchReason::LatLon => "latlon",
            MatchReason::Pacific => "pacific",
            MatchReason::Disabled => "disabled",
            MatchReason::None => "none",
        }
    }
}

impl std::fmt::Display for MatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionDecision {
    pub matched: bool,
    pub reason: MatchReason,
}

impl RegionDecision {
    fn hit(reason: MatchReason) -> Self {
        Self {
            matched: true,
            reason,
        }
    }

    fn miss() -> Self {
        Self {
            matched: false,
            reason: MatchReason::None,
        }
    }
}

/// Region matcher built once from [`RegionConfig`].
#[derive(Debug, Clone)]
pub struct RegionMatcher {
    enabled: bool,
    bounds: Option<BoundingBox>,
    pacific_tokens: Vec<String>,
    text_tokens: Vec<String>,
}

impl RegionMatcher {
    pub fn new(config: &RegionConfig) -> Self {
        let lower = |tokens: &[String]| -> Vec<String> {
            tokens
                .iter()
                .map(|t| t.to_lowercase())
                .filter(|t| !t.is_empty())
                .collect()
        };

        Self {
            enabled: config.enabled,
            bounds: config.use_latlon_box.then_some(config.bounds),
            pacific_tokens: if config.allow_pacific_general {
                lower(&config.pacific_tokens)
            } else {
                Vec::new()
            },
            text_tokens: lower(&config.text_tokens),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Decide region membership; the first rule that hits wins.
    ///
    /// Tokens are plain substrings of the combined lower-cased text, so short
    /// tokens such as `"bcs"` can match inside unrelated words.
    pub fn decide(
        &self,
        locality: &str,
        definition: &str,
        feature_text: &str,
        lat_lon_raw: &str,
    ) -> RegionDecision {
        if !self.enabled {
            return RegionDecision::hit(MatchReason::Disabled);
        }

        let blob = format!(" {} {} {} ", locality, definition, feature_text).to_lowercase();

        if self.pacific_tokens.iter().any(|t| blob.contains(t.as_str())) {
            return RegionDecision::hit(MatchReason::Pacific);
        }

        if self.text_tokens.iter().any(|t| blob.contains(t.as_str())) {
            return RegionDecision::hit(MatchReason::Text);
        }

        if let Some(bounds) = &self.bounds {
            if let Some((lat, lon)) = parse_lat_lon_f64(lat_lon_raw) {
                if bounds.contains(lat, lon) {
                    return RegionDecision::hit(MatchReason::LatLon);
                }
            }
        }

        RegionDecision::miss()
    }
}
