use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel-1 repeat-cycle length: one satellite revisit every 6 days
pub const PASS_CYCLE_SECONDS: i64 = 6 * 86_400;

/// Dual-polarization modes delivered by Sentinel-1 RTC bursts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolarizationMode {
    /// VV co-pol with VH cross-pol
    VvVh,
    /// HH co-pol with HV cross-pol
    HhHv,
}

impl PolarizationMode {
    /// Parse the `+`-joined form used by search providers ("VV+VH", "HH+HV")
    pub fn parse(s: &str) -> CatalogResult<Self> {
        match s {
            "VV+VH" => Ok(PolarizationMode::VvVh),
            "HH+HV" => Ok(PolarizationMode::HhHv),
            other => Err(CatalogError::InvalidFormat(format!(
                "invalid polarization mode: {}. Must be one of: VV+VH, HH+HV",
                other
            ))),
        }
    }
}

impl std::fmt::Display for PolarizationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolarizationMode::VvVh => write!(f, "VV+VH"),
            PolarizationMode::HhHv => write!(f, "HH+HV"),
        }
    }
}

/// Orbit direction of an acquisition group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrbitPass {
    Ascending,
    Descending,
}

/// Geospatial bounding box in lon/lat degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, max_lon: f64, min_lat: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        }
    }

    /// Degenerate box around a single point, for point-in-tile queries
    pub fn from_point(lon: f64, lat: f64) -> Self {
        Self::new(lon, lon, lat, lat)
    }

    /// Axis-aligned overlap test (boundary contact counts as overlap)
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lon <= other.max_lon
            && self.max_lon >= other.min_lon
            && self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
    }
}

/// One RTC burst acquisition from the normalized metadata table.
///
/// Identity after deduplication is (burst_id, acq_dt). Rows are read-only
/// inputs to the enumeration core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurstAcquisition {
    /// Full scene identifier from the search provider
    pub scene_id: String,
    /// Normalized burst id, e.g. "T137_292318_IW2"
    pub burst_id: String,
    /// Acquisition start time (UTC)
    pub acq_dt: DateTime<Utc>,
    pub polarization_mode: PolarizationMode,
    pub url_copol: String,
    pub url_crosspol: String,
    /// Relative orbit number, 1..=175
    pub track_number: u16,
    pub footprint: BoundingBox,
}

/// Burst-to-tile-to-track lookup table row.
///
/// Bursts sharing one `acq_group_id_within_mgrs_tile` are observed in one
/// physical satellite overpass of the tile. Near the equator a single pass
/// can span two adjacent track numbers, so the group id, not the track
/// number, is the unit of enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurstLutEntry {
    pub burst_id: String,
    pub mgrs_tile_id: String,
    pub track_number: u16,
    pub acq_group_id_within_mgrs_tile: u32,
    pub orbit_pass: OrbitPass,
    pub area_per_acq_group_km2: u64,
    pub n_bursts_per_acq_group: u32,
}

/// MGRS tile table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MgrsTileRecord {
    pub mgrs_tile_id: String,
    pub utm_epsg: u32,
    pub utm_wkt: String,
    pub geometry: BoundingBox,
}

/// Burst footprint table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurstGeometryRecord {
    pub burst_id: String,
    pub geometry: BoundingBox,
}

/// Role of an acquisition within a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputCategory {
    Pre,
    Post,
}

impl std::fmt::Display for InputCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputCategory::Pre => write!(f, "pre"),
            InputCategory::Post => write!(f, "post"),
        }
    }
}

/// Acquisition row augmented with product provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
    pub acquisition: BurstAcquisition,
    pub product_id: u64,
    pub mgrs_tile_id: String,
    pub acq_group_id_within_mgrs_tile: u32,
    pub pass_id: i64,
    pub input_category: InputCategory,
}

/// One enumerated change-detection product: a post-event pass paired with
/// the bounded pre-event history for every surviving burst.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: u64,
    pub mgrs_tile_id: String,
    pub acq_group_id_within_mgrs_tile: u32,
    pub pass_id: i64,
    /// Pre rows (ascending by acquisition time), then post rows
    pub rows: Vec<ProductRow>,
}

impl Product {
    /// Rows with the given role, in stored order
    pub fn rows_for(&self, category: InputCategory) -> impl Iterator<Item = &ProductRow> {
        self.rows.iter().filter(move |r| r.input_category == category)
    }

    /// Distinct burst ids carrying the given role
    pub fn burst_ids_for(&self, category: InputCategory) -> std::collections::BTreeSet<&str> {
        self.rows_for(category)
            .map(|r| r.acquisition.burst_id.as_str())
            .collect()
    }

    /// Number of pre rows for one burst
    pub fn pre_count(&self, burst_id: &str) -> usize {
        self.rows_for(InputCategory::Pre)
            .filter(|r| r.acquisition.burst_id == burst_id)
            .count()
    }
}

/// Workflow input extracted from one product: the identifiers a downstream
/// processing job needs to reproduce the post-image pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub mgrs_tile_id: String,
    /// Calendar date (UTC) of the earliest post acquisition
    pub acq_date: NaiveDate,
    pub track_number: u16,
    pub product_id: u64,
}

/// Per-burst time-series summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurstSummary {
    pub burst_id: String,
    pub count: usize,
    pub earliest_acq_dt: DateTime<Utc>,
    pub latest_acq_dt: DateTime<Utc>,
}

/// Error types for catalog operations
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("MGRS tile not found: {0}")]
    TileNotFound(String),

    #[error("burst not found: {0}")]
    BurstNotFound(String),

    #[error("no MGRS tiles overlap the query geometry")]
    NoCoverage,

    #[error(
        "track numbers {track_numbers:?} map to {n_groups} acquisition groups \
         in MGRS tile {mgrs_tile_id}"
    )]
    AmbiguousGroup {
        mgrs_tile_id: String,
        track_numbers: Vec<u16>,
        n_groups: usize,
    },

    #[error("invalid track set: {0}")]
    InvalidTrackSet(String),

    #[error("post_date_buffer_days must be less than 6 (S1 pass length), got {0}")]
    InvalidPostWindow(i64),

    #[error("insufficient pre-imagery for track {track_number} in MGRS tile {mgrs_tile_id}")]
    InsufficientPreImagery {
        mgrs_tile_id: String,
        track_number: u16,
    },

    #[error("timestamp {timestamp} precedes the pass epoch {epoch}")]
    InvalidTimestamp {
        timestamp: DateTime<Utc>,
        epoch: DateTime<Utc>,
    },
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
