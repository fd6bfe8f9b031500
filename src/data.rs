//! Layer Repository
//!
//! Resolves the 14 expected layer names to shapefiles anywhere below the
//! proposal root and loads them fully into memory. A layer that is absent or
//! unreadable is recorded as "not present"; loading never fails because of a
//! single layer.
//!
//! **Per layer we keep**:
//!   - geometries (one slot per feature; `None` for null shapes)
//!   - the dBASE attribute table as a polars `DataFrame` (one row per feature)
//!   - the CRS parsed from the `.prj` companion file, if any

use crate::error::EngineError;
use crate::utils::crs::{Crs, Reprojector};
use anyhow::{Context, Result};
use geo::Geometry;
use polars::prelude::*;
use shapefile::dbase::FieldValue;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// The fixed set of input layers a proposal may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerKind {
    Buildings,
    ContextBuildings,
    GreenRoofs,
    SolarPanels,
    TrafficAreas,
    TrafficCenterlines,
    PublicGreen,
    PublicPlazas,
    PrivateGreen,
    Water,
    ProposedTrees,
    ExistingTrees,
    ExistingGreen,
    SiteBoundary,
}

impl LayerKind {
    pub const ALL: [LayerKind; 14] = [
        LayerKind::Buildings,
        LayerKind::ContextBuildings,
        LayerKind::GreenRoofs,
        LayerKind::SolarPanels,
        LayerKind::TrafficAreas,
        LayerKind::TrafficCenterlines,
        LayerKind::PublicGreen,
        LayerKind::PublicPlazas,
        LayerKind::PrivateGreen,
        LayerKind::Water,
        LayerKind::ProposedTrees,
        LayerKind::ExistingTrees,
        LayerKind::ExistingGreen,
        LayerKind::SiteBoundary,
    ];

    /// Base name of the shapefile (matched case-sensitively)
    pub fn file_stem(self) -> &'static str {
        match self {
            LayerKind::Buildings => "Gebaeude",
            LayerKind::ContextBuildings => "Gebaeude_Umgebung",
            LayerKind::GreenRoofs => "Dachgruen",
            LayerKind::SolarPanels => "PV_Anlage",
            LayerKind::TrafficAreas => "Verkehrsflaechen",
            LayerKind::TrafficCenterlines => "Verkehrsmittellinie",
            LayerKind::PublicGreen => "oeffentliche_Gruenflaechen",
            LayerKind::PublicPlazas => "oeffentliche_Plaetze",
            LayerKind::PrivateGreen => "private_Gruenflaechen",
            LayerKind::Water => "Wasser",
            LayerKind::ProposedTrees => "Baeume_Entwurf",
            LayerKind::ExistingTrees => "Bestandsbaeume",
            LayerKind::ExistingGreen => "Bestandsgruen",
            LayerKind::SiteBoundary => "Gebietsabgrenzung",
        }
    }

    pub fn from_file_stem(stem: &str) -> Option<LayerKind> {
        LayerKind::ALL.into_iter().find(|kind| kind.file_stem() == stem)
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// One loaded geometry layer
#[derive(Debug, Clone)]
pub struct Layer {
    kind: LayerKind,
    geometries: Vec<Option<Geometry<f64>>>,
    attributes: DataFrame,
    crs: Option<Crs>,
}

impl Layer {
    pub fn new(kind: LayerKind, geometries: Vec<Option<Geometry<f64>>>) -> Self {
        Self {
            kind,
            geometries,
            attributes: DataFrame::empty(),
            crs: None,
        }
    }

    /// Layer from plain geometries, every feature present
    pub fn from_geometries(kind: LayerKind, geometries: impl IntoIterator<Item = Geometry<f64>>) -> Self {
        Self::new(kind, geometries.into_iter().map(Some).collect())
    }

    pub fn with_crs(mut self, crs: Option<Crs>) -> Self {
        self.crs = crs;
        self
    }

    /// Attach an attribute table; it must have one row per feature
    pub fn with_attributes(mut self, attributes: DataFrame) -> Result<Self> {
        if attributes.width() > 0 && attributes.height() != self.geometries.len() {
            anyhow::bail!(
                "{}: attribute table has {} rows for {} features",
                self.kind,
                attributes.height(),
                self.geometries.len()
            );
        }
        self.attributes = attributes;
        Ok(self)
    }

    /// Add a text attribute column
    pub fn with_text_attribute(mut self, name: &str, values: &[&str]) -> Result<Self> {
        let series = Series::new(name.into(), values);
        self.push_column(series)?;
        Ok(self)
    }

    /// Add a numeric attribute column (`None` = null cell)
    pub fn with_numeric_attribute(mut self, name: &str, values: &[Option<f64>]) -> Result<Self> {
        let series = Series::new(name.into(), values);
        self.push_column(series)?;
        Ok(self)
    }

    fn push_column(&mut self, series: Series) -> Result<()> {
        if series.len() != self.geometries.len() {
            anyhow::bail!(
                "{}: column '{}' has {} values for {} features",
                self.kind,
                series.name(),
                series.len(),
                self.geometries.len()
            );
        }
        self.attributes
            .with_column(series)
            .with_context(|| format!("{}: failed to add attribute column", self.kind))?;
        Ok(())
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    pub fn attributes(&self) -> &DataFrame {
        &self.attributes
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.get_column_index(name).is_some()
    }

    /// Number of features, including those without geometry
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// All features with their index; geometry is `None` for null shapes
    pub fn features(&self) -> impl Iterator<Item = (usize, Option<&Geometry<f64>>)> + '_ {
        self.geometries.iter().enumerate().map(|(idx, g)| (idx, g.as_ref()))
    }

    /// Geometries of features that have one
    pub fn geometries(&self) -> impl Iterator<Item = &Geometry<f64>> + '_ {
        self.geometries.iter().flatten()
    }

    /// Reproject all geometries into `target`
    ///
    /// Layers without CRS are assumed to be in `target` already. Pairs that
    /// cannot be reprojected are left untouched with a warning.
    pub fn align_to(&mut self, target: &Crs) {
        let Some(source) = self.crs.clone() else {
            self.crs = Some(target.clone());
            return;
        };
        if &source == target {
            return;
        }
        if !source.can_reproject_to(target) {
            warn!(
                layer = %self.kind,
                from = %source,
                to = %target,
                "CRS cannot be reprojected, assuming coordinates are already aligned"
            );
            self.crs = Some(target.clone());
            return;
        }

        let reprojector = match Reprojector::new(&source, target) {
            Ok(r) => r,
            Err(e) => {
                warn!(layer = %self.kind, "reprojection unavailable: {:#}", e);
                return;
            }
        };

        let mut dropped = 0usize;
        for slot in self.geometries.iter_mut() {
            if let Some(geometry) = slot.as_ref() {
                match reprojector.transform(geometry) {
                    Ok(projected) => *slot = Some(projected),
                    Err(e) => {
                        debug!(layer = %self.kind, "dropping feature: {:#}", e);
                        *slot = None;
                        dropped += 1;
                    }
                }
            }
        }
        if dropped > 0 {
            warn!(layer = %self.kind, dropped, "features could not be reprojected");
        }
        info!(layer = %self.kind, from = %source, to = %target, "reprojected layer");
        self.crs = Some(target.clone());
    }
}

/// All layers of one proposal, read once and shared read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct LayerRepository {
    layers: BTreeMap<LayerKind, Layer>,
}

impl LayerRepository {
    /// Empty repository; every layer is absent
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `root` recursively and load every expected layer found
    ///
    /// Only an unusable root is an error; unreadable entries below it are
    /// skipped. For each name the first match in file-name order wins.
    pub fn open(root: &Path) -> Result<Self, EngineError> {
        if !root.is_dir() {
            return Err(EngineError::InputRoot(root.to_path_buf()));
        }

        let paths = Self::discover(root)?;
        let mut repository = Self::new();

        for kind in LayerKind::ALL {
            let Some(path) = paths.get(&kind) else {
                continue;
            };
            match read_layer(kind, path) {
                Ok(layer) => {
                    debug!(layer = %kind, features = layer.len(), path = ?path, "loaded layer");
                    repository.insert(layer);
                }
                Err(e) => {
                    warn!(layer = %kind, path = ?path, "layer could not be read: {:#}", e);
                }
            }
        }

        info!(
            root = ?root,
            present = repository.layers.len(),
            expected = LayerKind::ALL.len(),
            "layer repository loaded"
        );
        Ok(repository)
    }

    fn discover(root: &Path) -> Result<BTreeMap<LayerKind, PathBuf>, EngineError> {
        let mut found = BTreeMap::new();

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) if source.depth() == 0 => {
                    return Err(EngineError::Scan {
                        path: root.to_path_buf(),
                        source,
                    });
                }
                Err(e) => {
                    warn!(path = ?e.path(), "skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("shp") {
                continue;
            }
            let Some(kind) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(LayerKind::from_file_stem)
            else {
                continue;
            };
            if let Some(previous) = found.get(&kind) {
                debug!(layer = %kind, kept = ?previous, ignored = ?path, "duplicate layer file");
                continue;
            }
            found.insert(kind, path.to_path_buf());
        }

        Ok(found)
    }

    pub fn insert(&mut self, layer: Layer) {
        self.layers.insert(layer.kind(), layer);
    }

    pub fn get(&self, kind: LayerKind) -> Option<&Layer> {
        self.layers.get(&kind)
    }

    /// Present and holding at least one feature
    pub fn get_non_empty(&self, kind: LayerKind) -> Option<&Layer> {
        self.get(kind).filter(|layer| !layer.is_empty())
    }

    pub fn absent(&self) -> Vec<LayerKind> {
        LayerKind::ALL
            .into_iter()
            .filter(|kind| !self.layers.contains_key(kind))
            .collect()
    }

    /// Reproject every layer into `reference`, once per run
    pub fn align_to(&mut self, reference: &Crs) {
        for layer in self.layers.values_mut() {
            layer.align_to(reference);
        }
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.layers.values()
    }
}

/// Read one shapefile with its attribute table and projection
fn read_layer(kind: LayerKind, path: &Path) -> Result<Layer> {
    let dbf_path = path.with_extension("dbf");

    let layer = if dbf_path.exists() {
        let mut reader = shapefile::Reader::from_path(path)
            .with_context(|| format!("Failed to open shapefile: {:?}", path))?;

        let mut geometries = Vec::new();
        let mut records = Vec::new();
        for item in reader.iter_shapes_and_records() {
            let (shape, record) = item.with_context(|| format!("Failed to read feature from {:?}", path))?;
            geometries.push(Geometry::<f64>::try_from(shape).ok());
            records.push(record);
        }

        let field_names = read_field_names(&dbf_path)?;
        let attributes = attribute_table(&field_names, &records)
            .with_context(|| format!("Failed to build attribute table for {:?}", path))?;
        Layer::new(kind, geometries).with_attributes(attributes)?
    } else {
        debug!(layer = %kind, "no .dbf companion, loading geometry only");
        let shapes = shapefile::read_shapes(path)
            .with_context(|| format!("Failed to read shapes: {:?}", path))?;
        Layer::new(
            kind,
            shapes.into_iter().map(|s| Geometry::<f64>::try_from(s).ok()).collect(),
        )
    };

    Ok(layer.with_crs(read_prj(path)))
}

fn read_field_names(dbf_path: &Path) -> Result<Vec<String>> {
    let reader = shapefile::dbase::Reader::from_path(dbf_path)
        .with_context(|| format!("Failed to open attribute table: {:?}", dbf_path))?;
    Ok(reader
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .filter(|name| name != "DeletionFlag")
        .collect())
}

fn read_prj(shp_path: &Path) -> Option<Crs> {
    let prj_path = shp_path.with_extension("prj");
    let wkt = fs::read_to_string(&prj_path).ok()?;
    if wkt.trim().is_empty() {
        return None;
    }
    Some(Crs::from_wkt(&wkt))
}

/// Cell value of one dBASE field
enum Cell {
    Text(Option<String>),
    Number(Option<f64>),
    Flag(Option<bool>),
}

fn cell(value: &FieldValue) -> Cell {
    match value {
        FieldValue::Character(s) => Cell::Text(s.clone()),
        FieldValue::Memo(s) => Cell::Text(Some(s.clone())),
        FieldValue::Numeric(n) => Cell::Number(*n),
        FieldValue::Float(f) => Cell::Number(f.map(f64::from)),
        FieldValue::Integer(i) => Cell::Number(Some(f64::from(*i))),
        FieldValue::Double(d) => Cell::Number(Some(*d)),
        FieldValue::Logical(b) => Cell::Flag(*b),
        _ => Cell::Text(None),
    }
}

/// Build the per-feature attribute table, columns sorted by field name
fn attribute_table(field_names: &[String], records: &[shapefile::dbase::Record]) -> Result<DataFrame> {
    let mut names: Vec<&String> = field_names.iter().collect();
    names.sort();
    names.dedup();

    let mut columns = Vec::with_capacity(names.len());
    for name in names {
        let cells: Vec<Cell> = records
            .iter()
            .map(|record| record.get(name).map(cell).unwrap_or(Cell::Text(None)))
            .collect();

        let all_numeric = cells.iter().all(|c| matches!(c, Cell::Number(_) | Cell::Text(None)));
        let all_flags = cells.iter().all(|c| matches!(c, Cell::Flag(_) | Cell::Text(None)));

        let series = if all_numeric && cells.iter().any(|c| matches!(c, Cell::Number(_))) {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|c| match c {
                    Cell::Number(n) => *n,
                    _ => None,
                })
                .collect();
            Series::new(name.as_str().into(), values)
        } else if all_flags && cells.iter().any(|c| matches!(c, Cell::Flag(_))) {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|c| match c {
                    Cell::Flag(b) => *b,
                    _ => None,
                })
                .collect();
            Series::new(name.as_str().into(), values)
        } else {
            let values: Vec<Option<String>> = cells
                .into_iter()
                .map(|c| match c {
                    Cell::Text(s) => s.map(|s| s.trim_end().to_string()),
                    Cell::Number(n) => n.map(|n| n.to_string()),
                    Cell::Flag(b) => b.map(|b| b.to_string()),
                })
                .collect();
            Series::new(name.as_str().into(), values)
        };
        columns.push(Column::from(series));
    }

    if columns.is_empty() {
        return Ok(DataFrame::empty());
    }
    Ok(DataFrame::new(columns)?)
}
