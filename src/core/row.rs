use crate::bio::markers::{Marker, MarkerFlags};
use serde::{Deserialize, Serialize};

/// Column headers shared by the Individuals and eDNA sheets
pub const FIELDS: [&str; 14] = [
    "Species_ID",
    "COI",
    "18S",
    "28S",
    "ITS1",
    "ITS2",
    "Latitude",
    "Longitude",
    "Locality",
    "Depth",
    "Collection_Date",
    "Population_Representation",
    "Data_Type",
    "Citation_DOI",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Individual,
    #[serde(rename = "eDNA")]
    Edna,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Individual => "Individual",
            DataType::Edna => "eDNA",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One output row. Marker columns hold the accession when the marker was
/// detected and stay empty otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub species_id: String,
    pub coi: String,
    pub ssu_18s: String,
    pub lsu_28s: String,
    pub its1: String,
    pub its2: String,
    pub latitude: String,
    pub longitude: String,
    pub locality: String,
    pub depth: String,
    pub collection_date: String,
    /// Group size when more than one row shares species, place, date and coordinates
    pub population_representation: String,
    pub data_type: DataType,
    pub citation_doi: String,
}

impl NormalizedRow {
    /// Marker columns for `accession` according to `flags`
    pub fn with_markers(accession: &str, flags: MarkerFlags, data_type: DataType) -> Self {
        let column = |marker: Marker| {
            if flags.is_set(marker) {
                accession.to_string()
            } else {
                String::new()
            }
        };

        Self {
            species_id: String::new(),
            coi: column(Marker::Coi),
            ssu_18s: column(Marker::Ssu18S),
            lsu_28s: column(Marker::Lsu28S),
            its1: column(Marker::Its1),
            its2: column(Marker::Its2),
            latitude: String::new(),
            longitude: String::new(),
            locality: String::new(),
            depth: String::new(),
            collection_date: String::new(),
            population_representation: String::new(),
            data_type,
            citation_doi: String::new(),
        }
    }

    pub fn marker(&self, marker: Marker) -> &str {
        match marker {
            Marker::Coi => &self.coi,
            Marker::Ssu18S => &self.ssu_18s,
            Marker::Lsu28S => &self.lsu_28s,
            Marker::Its1 => &self.its1,
            Marker::Its2 => &self.its2,
        }
    }

    /// Cells in [`FIELDS`] order
    pub fn to_cells(&self) -> Vec<String> {
        let mut cells = Vec::with_capacity(FIELDS.len());
        cells.push(self.species_id.clone());
        cells.extend(Marker::ALL.iter().map(|m| self.marker(*m).to_string()));
        cells.extend([
            self.latitude.clone(),
            self.longitude.clone(),
            self.locality.clone(),
            self.depth.clone(),
            self.collection_date.clone(),
            self.population_representation.clone(),
            self.data_type.to_string(),
            self.citation_doi.clone(),
        ]);
        cells
    }
}
