//! Coordinate reference systems
//!
//! Layers carry their CRS as ESRI WKT in the `.prj` companion file. Only a
//! small set of systems used for German planning data can be reprojected;
//! anything else is kept as opaque WKT and compared textually.
//!
//! Reprojection goes through `proj4rs`. Geographic systems take radians there,
//! so degrees are converted on the way in and out.

use anyhow::{anyhow, Result};
use geo::{Geometry, MapCoords};
use proj4rs::proj::Proj;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Crs {
    Epsg(u32),
    /// WKT that could not be mapped to a known EPSG code
    Unknown(String),
}

/// Known systems: EPSG code, proj string, whether coordinates are lon/lat
const KNOWN_SYSTEMS: &[(u32, &str, bool)] = &[
    (4326, "+proj=longlat +datum=WGS84 +no_defs", true),
    (4258, "+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs", true),
    (25832, "+proj=utm +zone=32 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs", false),
    (25833, "+proj=utm +zone=33 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs", false),
    (3857, "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs", false),
    (31466, "+proj=tmerc +lat_0=0 +lon_0=6 +k=1 +x_0=2500000 +y_0=0 +ellps=bessel +towgs84=598.1,73.7,418.2,0.202,0.045,-2.455,6.7 +units=m +no_defs", false),
    (31467, "+proj=tmerc +lat_0=0 +lon_0=9 +k=1 +x_0=3500000 +y_0=0 +ellps=bessel +towgs84=598.1,73.7,418.2,0.202,0.045,-2.455,6.7 +units=m +no_defs", false),
    (31468, "+proj=tmerc +lat_0=0 +lon_0=12 +k=1 +x_0=4500000 +y_0=0 +ellps=bessel +towgs84=598.1,73.7,418.2,0.202,0.045,-2.455,6.7 +units=m +no_defs", false),
    (31469, "+proj=tmerc +lat_0=0 +lon_0=15 +k=1 +x_0=5500000 +y_0=0 +ellps=bessel +towgs84=598.1,73.7,418.2,0.202,0.045,-2.455,6.7 +units=m +no_defs", false),
];

/// ESRI WKT names (PROJCS/GEOGCS) without an AUTHORITY clause
const ESRI_NAMES: &[(&str, u32)] = &[
    ("ETRS_1989_UTM_Zone_32N", 25832),
    ("ETRS89_UTM_zone_32N", 25832),
    ("ETRS89 / UTM zone 32N", 25832),
    ("ETRS_1989_UTM_Zone_33N", 25833),
    ("ETRS89_UTM_zone_33N", 25833),
    ("ETRS89 / UTM zone 33N", 25833),
    ("DHDN_3_Degree_Gauss_Zone_2", 31466),
    ("DHDN_3_Degree_Gauss_Zone_3", 31467),
    ("DHDN_3_Degree_Gauss_Zone_4", 31468),
    ("DHDN_3_Degree_Gauss_Zone_5", 31469),
    ("WGS_1984_Web_Mercator_Auxiliary_Sphere", 3857),
    ("WGS 84 / Pseudo-Mercator", 3857),
    ("GCS_ETRS_1989", 4258),
    ("GCS_WGS_1984", 4326),
    ("WGS 84", 4326),
];

impl Crs {
    /// Parse a user-facing CRS identifier such as `EPSG:25832`
    pub fn parse(identifier: &str) -> Option<Crs> {
        let code = identifier
            .trim()
            .strip_prefix("EPSG:")
            .or_else(|| identifier.trim().strip_prefix("epsg:"))?;
        let code: u32 = code.parse().ok()?;
        KNOWN_SYSTEMS
            .iter()
            .any(|(known, _, _)| *known == code)
            .then_some(Crs::Epsg(code))
    }

    /// Identify the CRS described by a `.prj` WKT string
    ///
    /// The outermost `AUTHORITY["EPSG","…"]` wins (it is the last one in the
    /// string); otherwise the PROJCS/GEOGCS name is looked up.
    pub fn from_wkt(wkt: &str) -> Crs {
        let wkt = wkt.trim();

        if let Some(code) = last_epsg_authority(wkt) {
            return Crs::Epsg(code);
        }

        let head = wkt.split(',').next().unwrap_or_default();
        for (name, code) in ESRI_NAMES {
            if head.contains(name) {
                return Crs::Epsg(*code);
            }
        }

        Crs::Unknown(wkt.to_string())
    }

    fn known_system(&self) -> Option<(&'static str, bool)> {
        match self {
            Crs::Epsg(code) => KNOWN_SYSTEMS
                .iter()
                .find(|(known, _, _)| known == code)
                .map(|(_, proj, latlong)| (*proj, *latlong)),
            Crs::Unknown(_) => None,
        }
    }

    /// Whether geometries in `self` can be reprojected to `target`
    pub fn can_reproject_to(&self, target: &Crs) -> bool {
        self.known_system().is_some() && target.known_system().is_some()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{}", code),
            Crs::Unknown(wkt) => {
                let short: String = wkt.chars().take(40).collect();
                write!(f, "unknown ({}…)", short)
            }
        }
    }
}

fn last_epsg_authority(wkt: &str) -> Option<u32> {
    let marker = "AUTHORITY[\"EPSG\",";
    let start = wkt.rfind(marker)? + marker.len();
    let rest = &wkt[start..];
    let digits: String = rest
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Reprojects geometries between two known systems
pub struct Reprojector {
    source: Proj,
    target: Proj,
    source_latlong: bool,
    target_latlong: bool,
}

impl Reprojector {
    pub fn new(from: &Crs, to: &Crs) -> Result<Self> {
        let (source_def, source_latlong) = from
            .known_system()
            .ok_or_else(|| anyhow!("no projection definition for {}", from))?;
        let (target_def, target_latlong) = to
            .known_system()
            .ok_or_else(|| anyhow!("no projection definition for {}", to))?;

        let source = Proj::from_proj_string(source_def)
            .map_err(|e| anyhow!("invalid projection {}: {:?}", from, e))?;
        let target = Proj::from_proj_string(target_def)
            .map_err(|e| anyhow!("invalid projection {}: {:?}", to, e))?;

        Ok(Self {
            source,
            target,
            source_latlong,
            target_latlong,
        })
    }

    pub fn transform(&self, geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
        geometry.try_map_coords(|coord| {
            let (mut x, mut y) = (coord.x, coord.y);
            if self.source_latlong {
                x = x.to_radians();
                y = y.to_radians();
            }

            let mut point = (x, y, 0.0);
            proj4rs::transform::transform(&self.source, &self.target, &mut point)
                .map_err(|e| anyhow!("reprojection failed at ({}, {}): {:?}", coord.x, coord.y, e))?;

            let (mut x, mut y) = (point.0, point.1);
            if self.target_latlong {
                x = x.to_degrees();
                y = y.to_degrees();
            }
            Ok(geo::coord! { x: x, y: y })
        })
    }
}
