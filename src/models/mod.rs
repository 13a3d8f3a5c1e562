use chrono::Local;
use serde::{Deserialize, Serialize};

/// Business operation advertised by a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusinessType {
    Venta,
    Arriendo,
    Unknown,
}

impl BusinessType {
    pub fn as_str(self) -> &'static str {
        match self {
            BusinessType::Venta => "Venta",
            BusinessType::Arriendo => "Arriendo",
            BusinessType::Unknown => "N/A",
        }
    }
}

/// One scraped listing, project or project unit.
///
/// Every value field is a string with `"N/A"` standing in for anything the
/// page did not yield; numeric fields carry raw digit runs so unparseable
/// markup degrades to a sentinel instead of a failure. Field names follow
/// the output column names. Project-linkage fields are omitted entirely
/// when they do not apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyRecord {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Neighborhood")]
    pub neighborhood: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Built Area")]
    pub built_area: String,
    #[serde(rename = "Land Area")]
    pub land_area: String,
    #[serde(rename = "Bedrooms")]
    pub bedrooms: String,
    #[serde(rename = "Bathrooms")]
    pub bathrooms: String,
    #[serde(rename = "Half Bathrooms")]
    pub half_bathrooms: String,
    #[serde(rename = "Garage")]
    pub garage: String,
    #[serde(rename = "Stratum")]
    pub stratum: String,
    #[serde(rename = "Year Built")]
    pub year_built: String,
    #[serde(rename = "Floor Level")]
    pub floor_level: String,
    #[serde(rename = "Administration Fee")]
    pub administration_fee: String,
    #[serde(rename = "Property Type")]
    pub property_type: String,
    #[serde(rename = "Business Type")]
    pub business_type: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Extraction Date")]
    pub extraction_date: String,
    /// `None` for a clean extraction, a short diagnostic otherwise.
    /// Records with an error set are persisted like any other.
    #[serde(rename = "Error")]
    pub error: Option<String>,
    #[serde(rename = "Property_Category")]
    pub property_category: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Features")]
    pub features: String,
    #[serde(rename = "Features_Count")]
    pub features_count: String,

    // Project linkage, present only on project and unit records.
    #[serde(rename = "Is_Project", skip_serializing_if = "Option::is_none")]
    pub is_project: Option<String>,
    #[serde(rename = "Is_Project_Unit", skip_serializing_if = "Option::is_none")]
    pub is_project_unit: Option<String>,
    #[serde(rename = "Project_Parent", skip_serializing_if = "Option::is_none")]
    pub project_parent: Option<String>,
    #[serde(rename = "Project_Name", skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(rename = "Project_Units", skip_serializing_if = "Option::is_none")]
    pub project_units: Option<String>,
    #[serde(rename = "Has_Individual_Units", skip_serializing_if = "Option::is_none")]
    pub has_individual_units: Option<String>,
    #[serde(rename = "Price_Label", skip_serializing_if = "Option::is_none")]
    pub price_label: Option<String>,
}

/// Timestamp format used on every record.
pub fn extraction_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M").to_string()
}

impl PropertyRecord {
    /// A record with every field at its `"N/A"` sentinel and the
    /// extraction timestamp set. Base for both parsers and error records.
    pub fn stub(url: &str) -> Self {
        let na = || "N/A".to_string();
        Self {
            url: url.to_string(),
            title: na(),
            neighborhood: na(),
            price: na(),
            built_area: na(),
            land_area: na(),
            bedrooms: na(),
            bathrooms: na(),
            half_bathrooms: na(),
            garage: na(),
            stratum: na(),
            year_built: na(),
            floor_level: na(),
            administration_fee: na(),
            property_type: na(),
            business_type: na(),
            status: na(),
            extraction_date: extraction_timestamp(),
            error: None,
            property_category: na(),
            description: na(),
            features: na(),
            features_count: "0".to_string(),
            is_project: None,
            is_project_unit: None,
            project_parent: None,
            project_name: None,
            project_units: None,
            has_individual_units: None,
            price_label: None,
        }
    }

    /// Minimal record for a URL that produced no data. Kept in the
    /// output: a failed extraction is data, not something to discard.
    pub fn error(url: &str, message: impl Into<String>) -> Self {
        let mut record = Self::stub(url);
        record.error = Some(message.into());
        record
    }

    /// Clean extraction with a usable title.
    pub fn is_valid(&self) -> bool {
        self.error.is_none() && self.title != "N/A"
    }
}

/// Run-level counts derived from the accumulated record list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeStats {
    pub total_records: usize,
    pub valid_records: usize,
    pub projects: usize,
    pub project_units: usize,
    /// Valid records that are neither projects nor project units.
    pub individual_properties: i64,
    pub lots_land: usize,
}

impl ScrapeStats {
    pub fn from_records(records: &[PropertyRecord]) -> Self {
        let valid = records.iter().filter(|r| r.is_valid()).count();
        let projects = records
            .iter()
            .filter(|r| r.is_project.as_deref() == Some("Sí"))
            .count();
        let units = records
            .iter()
            .filter(|r| r.is_project_unit.as_deref() == Some("Sí"))
            .count();
        let lots = records
            .iter()
            .filter(|r| r.property_category == "Lote/Terreno")
            .count();
        Self {
            total_records: records.len(),
            valid_records: valid,
            projects,
            project_units: units,
            individual_properties: valid as i64 - projects as i64 - units as i64,
            lots_land: lots,
        }
    }
}
