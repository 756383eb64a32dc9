use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub entrez: EntrezConfig,
    pub search: SearchConfig,
    pub region: RegionConfig,
    pub edna: EdnaConfig,
    pub population: PopulationConfig,
    pub output: OutputConfig,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntrezConfig {
    /// Contact address sent with every request (required by NCBI)
    pub email: String,
    pub tool: String,
    /// Target database (`nucleotide` or `nuccore`)
    pub database: String,
    pub retries: u32,
    pub retry_backoff_ms: u64,
    pub timeout_secs: u64,
    /// Minimum spacing between consecutive requests
    pub request_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub terms: Vec<String>,
    /// Hard cap on record IDs collected across all terms
    pub max_records: usize,
    pub page_size: usize,
    pub fetch_batch_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Inclusive on every edge
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.lat_min <= lat && lat <= self.lat_max && self.lon_min <= lon && lon <= self.lon_max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    pub enabled: bool,
    pub use_latlon_box: bool,
    pub bounds: BoundingBox,
    /// Accept general Pacific wording before the locality tokens are tried
    pub allow_pacific_general: bool,
    pub pacific_tokens: Vec<String>,
    pub text_tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdnaConfig {
    pub enabled: bool,
    pub keywords: Vec<String>,
    /// Source qualifiers whose presence marks an environmental sample
    pub marker_qualifiers: Vec<String>,
    /// Keep eDNA records even when the region check fails
    pub relaxed_region: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub enabled: bool,
    /// Decimal places for lat/lon when grouping
    pub round_decimals: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
    /// Prepended to the Individuals/eDNA sheet names (`<prefix>_Individuals`)
    pub sheet_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Dropped records logged per batch
    pub show_drops: usize,
    /// IDs previewed from the first search page
    pub preview_ids: usize,
    pub write_debug_xml: bool,
    /// Number of leading batches dumped when `write_debug_xml` is set
    pub debug_xml_limit: usize,
    pub debug_dir: PathBuf,
}

/// Named starting points for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// No region filter and no eDNA split; everything lands in Individuals
    Baseline,
    /// Alaska to Baja California filter with eDNA routing and population counts
    #[default]
    RegionAware,
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "baseline" => Ok(Preset::Baseline),
            "region-aware" | "region" | "pacific" => Ok(Preset::RegionAware),
            _ => Err(format!("Unknown preset: {}", s)),
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Preset::Baseline => write!(f, "baseline"),
            Preset::RegionAware => write!(f, "region-aware"),
        }
    }
}

const DEFAULT_SEARCH_TERM: &str =
    "Tardigrada[Organism] AND (COI OR COX1 OR 18S OR 28S OR ITS1 OR ITS2)";

const PACIFIC_TOKENS: &[&str] = &[
    "pacific ocean",
    "north pacific",
    "eastern pacific",
    "northeast pacific",
    "california current",
    "west coast",
];

const BASELINE_TOKENS: &[&str] = &[
    "Alaska",
    "British Columbia",
    "Washington",
    "Oregon",
    "California",
    "Baja California",
];

const COASTAL_TOKENS: &[&str] = &[
    // Jurisdictions
    "alaska", "british columbia", "washington", "oregon", "california",
    "baja california", "baja california sur", "baja california norte",
    "usa: alaska", "usa: washington", "usa: oregon", "usa: california",
    "canada: british columbia", "mexico: baja california", "mexico: baja california sur",
    "mexico: baja california norte",
    "us: ak", "us: wa", "us: or", "us: ca", "usa: ak", "usa: wa", "usa: or", "usa: ca",
    "canada: bc", "ca: bc", "mexico: bc", "mexico: bcs", "mexico: bcn", "bcs", "bcn",
    // General Pacific wording
    "pacific ocean", "north pacific", "eastern pacific", "northeast pacific",
    "california current", "west coast",
    // Alaska
    "gulf of alaska", "aleutian", "prince william sound", "kodiak", "kenai", "kachemak",
    "southeast alaska", "sitka", "ketchikan", "juneau",
    // British Columbia
    "vancouver island", "haida gwaii", "queen charlotte", "inside passage",
    "strait of georgia", "salish sea", "juan de fuca", "barkley sound", "tofino", "ucluelet",
    // Washington
    "puget sound", "san juan islands", "olympic coast", "grays harbor", "willapa bay",
    // Oregon
    "columbia river", "tillamook", "coos bay", "yaquina", "newport", "brookings",
    "oregon coast",
    // California, north to south
    "humboldt", "trinidad head", "mendocino", "bodega bay", "point reyes",
    "san francisco bay", "half moon bay", "monterey bay", "moss landing", "carmel",
    "point lobos", "big sur", "morro bay", "avila", "pismo", "santa barbara", "goleta",
    "santa barbara channel", "channel islands", "anacapa", "santa cruz island",
    "point conception", "santa catalina", "catalina island", "san pedro", "long beach",
    "palos verdes", "redondo", "santa monica bay", "malibu", "ventura", "la jolla",
    "scripps pier", "mission bay", "san diego", "san diego bay", "imperial beach",
    // Baja California and the Gulf of California
    "ensenada", "rosarito", "san quintín", "bahía san quintín", "bahia san quintin",
    "bahía de los ángeles", "bahia de los angeles", "isla de cedros", "bahía tortugas",
    "bahia tortugas", "guerrero negro", "laguna ojo de liebre", "vizcaíno",
    "laguna san ignacio", "bahía magdalena", "bahia magdalena", "loreto",
    "bahía concepción", "bahia concepcion", "mulegé", "mulege", "la paz",
    "cabo san lucas", "san josé del cabo", "san jose del cabo", "todos santos",
    "gulf of california", "sea of cortez", "mar de cortés", "mar de cortes",
];

const EDNA_KEYWORDS: &[&str] = &[
    "edna",
    "environmental dna",
    "environmental sample",
    "metabarcoding",
    "metagenom",
    "amplicon",
    "bulk sample",
    "seawater",
    "sea water",
    "water filter",
    "plankton",
    "sediment",
    "marine sediment",
    "biofilm",
];

const EDNA_QUALIFIERS: &[&str] = &["environmental_sample", "metagenomic"];

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl Default for EntrezConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            tool: "marker_harvest".to_string(),
            database: "nucleotide".to_string(),
            retries: 3,
            retry_backoff_ms: 1000,
            timeout_secs: 60,
            request_delay_ms: 350, // about 3 requests per second
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            terms: vec![DEFAULT_SEARCH_TERM.to_string()],
            max_records: 5000,
            page_size: 500,
            fetch_batch_size: 100,
        }
    }
}

impl Default for BoundingBox {
    /// Alaska to Baja California
    fn default() -> Self {
        Self {
            lat_min: 22.0,
            lat_max: 72.0,
            lon_min: -180.0,
            lon_max: -100.0,
        }
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            use_latlon_box: true,
            bounds: BoundingBox::default(),
            allow_pacific_general: true,
            pacific_tokens: owned(PACIFIC_TOKENS),
            text_tokens: owned(COASTAL_TOKENS),
        }
    }
}

impl Default for EdnaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keywords: owned(EDNA_KEYWORDS),
            marker_qualifiers: owned(EDNA_QUALIFIERS),
            relaxed_region: true,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            round_decimals: 2,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("Pacific_Marine_Tardigrades_FILLED.xlsx"),
            sheet_prefix: "Marine_Tardigrades".to_string(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            show_drops: 12,
            preview_ids: 10,
            write_debug_xml: false,
            debug_xml_limit: 1,
            debug_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Baseline => Self::baseline(),
            Preset::RegionAware => Self::region_aware(),
        }
    }

    /// Full coastal filter, eDNA routing and population counts
    pub fn region_aware() -> Self {
        Self::default()
    }

    /// Broad pull: every record is an individual and nothing is filtered
    pub fn baseline() -> Self {
        let mut config = Self::default();
        config.entrez.database = "nuccore".to_string();
        config.region = RegionConfig {
            enabled: false,
            allow_pacific_general: false,
            pacific_tokens: Vec::new(),
            text_tokens: owned(BASELINE_TOKENS),
            ..RegionConfig::default()
        };
        config.edna.enabled = false;
        config.edna.relaxed_region = false;
        config.population.enabled = false;
        config.diagnostics.show_drops = 5;
        config
    }

    /// Reject settings that would make a run pointless or unsafe for the API.
    pub fn validate(&self) -> Result<(), crate::HarvestError> {
        let invalid = |msg: &str| -> Result<(), crate::HarvestError> {
            Err(crate::HarvestError::Config(msg.to_string()))
        };

        if self.search.terms.iter().all(|t| t.trim().is_empty()) {
            return invalid("search.terms is empty");
        }
        let email = self.entrez.email.trim();
        if email.is_empty() || !email.contains('@') {
            return invalid("entrez.email must be set to a contact address (NCBI policy)");
        }
        if self.entrez.tool.trim().is_empty() {
            return invalid("entrez.tool must not be empty");
        }
        if self.entrez.retries == 0 {
            return invalid("entrez.retries must be at least 1");
        }
        if self.search.page_size == 0 || self.search.fetch_batch_size == 0 {
            return invalid("search.page_size and search.fetch_batch_size must be positive");
        }
        self.validate_classification()
    }

    /// Checks that apply even when no request is made (offline `classify`).
    pub fn validate_classification(&self) -> Result<(), crate::HarvestError> {
        let max_decimals = crate::core::population::MAX_ROUND_DECIMALS;
        if self.population.round_decimals > max_decimals {
            return Err(crate::HarvestError::Config(format!(
                "population.round_decimals must be at most {}",
                max_decimals
            )));
        }
        let b = &self.region.bounds;
        if b.lat_min > b.lat_max || b.lon_min > b.lon_max {
            return Err(crate::HarvestError::Config(
                "region.bounds minimum exceeds maximum".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, crate::HarvestError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| crate::HarvestError::Config(format!("Failed to parse config: {}", e)))?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), crate::HarvestError> {
    let contents = to_toml(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn to_toml(config: &Config) -> Result<String, crate::HarvestError> {
    toml::to_string_pretty(config)
        .map_err(|e| crate::HarvestError::Config(format!("Failed to serialize config: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_email(mut config: Config) -> Config {
        config.entrez.email = "someone@example.org".to_string();
        config
    }

    #[test]
    fn test_presets_differ_where_expected() {
        let baseline = Config::baseline();
        let region = Config::region_aware();

        assert!(!baseline.region.enabled);
        assert!(!baseline.edna.enabled);
        assert!(!baseline.population.enabled);
        assert_eq!(baseline.entrez.database, "nuccore");

        assert!(region.region.enabled);
        assert!(region.edna.enabled && region.edna.relaxed_region);
        assert!(region.population.enabled);
        assert!(region.region.text_tokens.iter().any(|t| t == "monterey bay"));
        assert_eq!(Config::from_preset(Preset::RegionAware), region);
    }

    #[test]
    fn test_preset_from_str() {
        assert_eq!("baseline".parse::<Preset>(), Ok(Preset::Baseline));
        assert_eq!("Region_Aware".parse::<Preset>(), Ok(Preset::RegionAware));
        assert!("coastal".parse::<Preset>().is_err());
    }

    #[test]
    fn test_validate_requires_email_and_terms() {
        assert!(Config::default().validate().is_err());
        assert!(with_email(Config::default()).validate().is_ok());

        let mut config = with_email(Config::default());
        config.search.terms = vec!["  ".to_string()];
        assert!(matches!(
            config.validate(),
            Err(crate::HarvestError::Config(_))
        ));

        let mut config = with_email(Config::default());
        config.entrez.email = "not-an-address".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_box() {
        let mut config = with_email(Config::default());
        config.region.bounds.lat_min = 80.0;
        assert!(config.validate().is_err());
        assert!(config.validate_classification().is_err());
    }

    #[test]
    fn test_offline_validation_ignores_contact() {
        assert!(Config::default().validate_classification().is_ok());
    }

    #[test]
    fn test_validate_rejects_oversized_round_decimals() {
        let mut config = with_email(Config::default());
        config.population.round_decimals = 16;
        assert!(matches!(
            config.validate_classification(),
            Err(crate::HarvestError::Config(_))
        ));
        config.population.round_decimals = 15;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [entrez]
            email = "lab@example.edu"

            [region]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.entrez.email, "lab@example.edu");
        assert_eq!(config.entrez.retries, 3);
        assert!(!config.region.enabled);
        assert!(config.region.use_latlon_box);
        assert_eq!(config.population.round_decimals, 2);
    }

    #[test]
    fn test_save_and_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvest.toml");
        let config = with_email(Config::baseline());

        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }
}
