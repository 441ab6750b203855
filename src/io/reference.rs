use crate::types::{
    BoundingBox, BurstGeometryRecord, BurstLutEntry, CatalogError, CatalogResult, MgrsTileRecord,
};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Immutable spatial reference tables: MGRS tile outlines, burst
/// footprints and the burst-to-tile-to-track lookup table.
///
/// Constructed once and shared by reference; no method mutates the store,
/// so it is safe to use from concurrent enumeration calls.
pub struct ReferenceStore {
    tiles: Vec<MgrsTileRecord>,
    burst_geometries: Vec<BurstGeometryRecord>,
    lut: Vec<BurstLutEntry>,
}

/// Burst footprint joined with its LUT attributes
#[derive(Debug, Clone, PartialEq)]
pub struct BurstAttributes {
    pub burst_id: String,
    pub geometry: BoundingBox,
    pub mgrs_tile_id: String,
    pub track_number: u16,
    pub acq_group_id_within_mgrs_tile: u32,
}

impl ReferenceStore {
    pub fn new(
        tiles: Vec<MgrsTileRecord>,
        burst_geometries: Vec<BurstGeometryRecord>,
        lut: Vec<BurstLutEntry>,
    ) -> Self {
        Self {
            tiles,
            burst_geometries,
            lut,
        }
    }

    /// Load the three reference tables from JSON array files
    pub fn from_json_files<P: AsRef<Path>>(
        tile_path: P,
        burst_geometry_path: P,
        lut_path: P,
    ) -> CatalogResult<Self> {
        log::info!(
            "Loading reference tables: tiles={}, bursts={}, lut={}",
            tile_path.as_ref().display(),
            burst_geometry_path.as_ref().display(),
            lut_path.as_ref().display()
        );
        let tiles: Vec<MgrsTileRecord> =
            serde_json::from_reader(BufReader::new(File::open(tile_path)?))?;
        let burst_geometries: Vec<BurstGeometryRecord> =
            serde_json::from_reader(BufReader::new(File::open(burst_geometry_path)?))?;
        let lut: Vec<BurstLutEntry> =
            serde_json::from_reader(BufReader::new(File::open(lut_path)?))?;
        log::debug!(
            "Reference store loaded: {} tiles, {} burst footprints, {} LUT rows",
            tiles.len(),
            burst_geometries.len(),
            lut.len()
        );
        Ok(Self::new(tiles, burst_geometries, lut))
    }

    /// Look up one tile record by id
    pub fn tile(&self, mgrs_tile_id: &str) -> CatalogResult<&MgrsTileRecord> {
        self.tiles
            .iter()
            .find(|t| t.mgrs_tile_id == mgrs_tile_id)
            .ok_or_else(|| CatalogError::TileNotFound(mgrs_tile_id.to_string()))
    }

    /// Look up one burst footprint by id
    pub fn burst_geometry(&self, burst_id: &str) -> CatalogResult<&BoundingBox> {
        self.burst_geometries
            .iter()
            .find(|b| b.burst_id == burst_id)
            .map(|b| &b.geometry)
            .ok_or_else(|| CatalogError::BurstNotFound(burst_id.to_string()))
    }

    /// LUT rows restricted to the given tiles, in tile-argument order.
    ///
    /// Every requested tile must have at least one LUT row.
    pub fn lut_for_tiles(&self, mgrs_tile_ids: &[&str]) -> CatalogResult<Vec<&BurstLutEntry>> {
        let mut rows = Vec::new();
        for tile_id in mgrs_tile_ids {
            let tile_rows: Vec<&BurstLutEntry> = self
                .lut
                .iter()
                .filter(|e| e.mgrs_tile_id == *tile_id)
                .collect();
            if tile_rows.is_empty() {
                return Err(CatalogError::TileNotFound(tile_id.to_string()));
            }
            rows.extend(tile_rows);
        }
        Ok(rows)
    }

    /// Burst ids covered by the given tiles, optionally restricted to the
    /// single acquisition group implied by a track-number set.
    ///
    /// With track numbers the filter must resolve to exactly one
    /// `acq_group_id_within_mgrs_tile` per tile; near the equator one pass
    /// can span two adjacent tracks, so up to two numerically adjacent
    /// track numbers are accepted.
    pub fn burst_ids_for_tiles(
        &self,
        mgrs_tile_ids: &[&str],
        track_numbers: Option<&[u16]>,
    ) -> CatalogResult<Vec<String>> {
        let rows = match track_numbers {
            None => self.lut_for_tiles(mgrs_tile_ids)?,
            Some(tracks) => {
                validate_track_set(tracks)?;
                let mut rows = Vec::new();
                for tile_id in mgrs_tile_ids {
                    let (_, group_rows) = self.group_for_tracks(tile_id, tracks)?;
                    rows.extend(group_rows);
                }
                rows
            }
        };
        // Unique burst ids, first-appearance order
        let mut seen = HashSet::new();
        let mut burst_ids = Vec::new();
        for row in rows {
            if seen.insert(row.burst_id.as_str()) {
                burst_ids.push(row.burst_id.clone());
            }
        }
        Ok(burst_ids)
    }

    /// Resolve a tile's acquisition group from a validated track set,
    /// returning the group id and its LUT rows.
    pub fn group_for_tracks(
        &self,
        mgrs_tile_id: &str,
        track_numbers: &[u16],
    ) -> CatalogResult<(u32, Vec<&BurstLutEntry>)> {
        let tile_rows: Vec<&BurstLutEntry> = self
            .lut
            .iter()
            .filter(|e| e.mgrs_tile_id == mgrs_tile_id && track_numbers.contains(&e.track_number))
            .collect();

        let mut group_ids: Vec<u32> = tile_rows
            .iter()
            .map(|e| e.acq_group_id_within_mgrs_tile)
            .collect();
        group_ids.sort_unstable();
        group_ids.dedup();

        match group_ids.len() {
            0 => Err(CatalogError::TileNotFound(format!(
                "{} (tracks {:?})",
                mgrs_tile_id, track_numbers
            ))),
            1 => {
                let group_id = group_ids[0];
                let group_rows = self
                    .lut
                    .iter()
                    .filter(|e| {
                        e.mgrs_tile_id == mgrs_tile_id
                            && e.acq_group_id_within_mgrs_tile == group_id
                    })
                    .collect();
                Ok((group_id, group_rows))
            }
            n => Err(CatalogError::AmbiguousGroup {
                mgrs_tile_id: mgrs_tile_id.to_string(),
                track_numbers: track_numbers.to_vec(),
                n_groups: n,
            }),
        }
    }

    /// Tiles whose outline intersects the query geometry
    pub fn tiles_overlapping(&self, geometry: &BoundingBox) -> CatalogResult<Vec<&MgrsTileRecord>> {
        let overlapping: Vec<&MgrsTileRecord> = self
            .tiles
            .iter()
            .filter(|t| t.geometry.intersects(geometry))
            .collect();
        if overlapping.is_empty() {
            return Err(CatalogError::NoCoverage);
        }
        Ok(overlapping)
    }

    /// Burst footprints for the given tiles, joined with LUT attributes
    pub fn burst_table_for_tiles(
        &self,
        mgrs_tile_ids: &[&str],
    ) -> CatalogResult<Vec<BurstAttributes>> {
        let rows = self.lut_for_tiles(mgrs_tile_ids)?;
        let mut table = Vec::with_capacity(rows.len());
        for row in rows {
            let geometry = *self.burst_geometry(&row.burst_id)?;
            table.push(BurstAttributes {
                burst_id: row.burst_id.clone(),
                geometry,
                mgrs_tile_id: row.mgrs_tile_id.clone(),
                track_number: row.track_number,
                acq_group_id_within_mgrs_tile: row.acq_group_id_within_mgrs_tile,
            });
        }
        Ok(table)
    }
}

/// Reject track sets a single satellite pass cannot produce: more than two
/// tracks, or two tracks that are not numerically adjacent.
fn validate_track_set(track_numbers: &[u16]) -> CatalogResult<()> {
    if track_numbers.is_empty() {
        return Err(CatalogError::InvalidTrackSet(
            "no track numbers provided".to_string(),
        ));
    }
    if track_numbers.len() > 2 {
        return Err(CatalogError::InvalidTrackSet(format!(
            "cannot handle more than 2 track numbers, got {:?}",
            track_numbers
        )));
    }
    if track_numbers.len() == 2 {
        let delta = (i32::from(track_numbers[0]) - i32::from(track_numbers[1])).abs();
        if delta > 1 {
            return Err(CatalogError::InvalidTrackSet(format!(
                "track numbers {:?} are not consecutive",
                track_numbers
            )));
        }
    }
    Ok(())
}
