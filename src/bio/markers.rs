/// Keyword-based molecular marker detection
use serde::{Deserialize, Serialize};

/// Loci reported as separate workbook columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marker {
    Coi,
    Ssu18S,
    Lsu28S,
    Its1,
    Its2,
}

impl Marker {
    pub const ALL: [Marker; 5] = [
        Marker::Coi,
        Marker::Ssu18S,
        Marker::Lsu28S,
        Marker::Its1,
        Marker::Its2,
    ];

    /// Column header used in the workbook
    pub fn column(&self) -> &'static str {
        match self {
            Marker::Coi => "COI",
            Marker::Ssu18S => "18S",
            Marker::Lsu28S => "28S",
            Marker::Its1 => "ITS1",
            Marker::Its2 => "ITS2",
        }
    }

    /// Lower-case substrings that flag this marker
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Marker::Coi => &["coi", "cox1", "cytochrome oxidase subunit i"],
            Marker::Ssu18S => &["18s", "small subunit", "ssu"],
            Marker::Lsu28S => &["28s", "large subunit", "lsu"],
            Marker::Its1 => &["its1"],
            Marker::Its2 => &["its2"],
        }
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// Presence flags for every [`Marker`]; several may be set at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerFlags {
    pub coi: bool,
    pub ssu_18s: bool,
    pub lsu_28s: bool,
    pub its1: bool,
    pub its2: bool,
}

impl MarkerFlags {
    /// Flag markers mentioned in the definition line or feature notes.
    ///
    /// Plain substring search: `"ssu"` inside an unrelated word still counts.
    pub fn detect(definition: &str, feature_text: &str) -> Self {
        let text = format!("{} {}", definition, feature_text).to_lowercase();
        let mentions = |marker: Marker| marker.keywords().iter().any(|k| text.contains(k));

        Self {
            coi: mentions(Marker::Coi),
            ssu_18s: mentions(Marker::Ssu18S),
            lsu_28s: mentions(Marker::Lsu28S),
            its1: mentions(Marker::Its1),
            its2: mentions(Marker::Its2),
        }
    }

    pub fn is_set(&self, marker: Marker) -> bool {
        match marker {
            Marker::Coi => self.coi,
            Marker::Ssu18S => self.ssu_18s,
            Marker::Lsu28S => self.lsu_28s,
            Marker::Its1 => self.its1,
            Marker::Its2 => self.its2,
        }
    }

    pub fn is_empty(&self) -> bool {
        Marker::ALL.iter().all(|m| !self.is_set(*m))
    }

    /// Markers that are set, in column order
    pub fn detected(&self) -> Vec<Marker> {
        Marker::ALL.into_iter().filter(|m| self.is_set(*m)).collect()
    }
}
