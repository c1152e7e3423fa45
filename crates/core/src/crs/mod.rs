//! Coordinate Reference System handling

mod utm;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use utm::{parse_utm_epsg, utm_to_wgs84, wgs84_to_utm};

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation (primary)
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
    /// PROJ string if available
    proj: Option<String>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
            proj: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
            proj: None,
        }
    }

    /// Create a CRS from a PROJ string
    pub fn from_proj(proj: impl Into<String>) -> Self {
        Self {
            wkt: None,
            epsg: None,
            proj: Some(proj.into()),
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Whether coordinates are longitude/latitude in degrees
    pub fn is_geographic(&self) -> bool {
        if let Some(code) = self.epsg {
            return code == 4326 || code == 4269 || code == 4258;
        }
        if let Some(wkt) = &self.wkt {
            let head = wkt.trim_start().to_ascii_uppercase();
            return head.starts_with("GEOGCS") || head.starts_with("GEOGCRS");
        }
        if let Some(proj) = &self.proj {
            return proj.contains("+proj=longlat") || proj.contains("+proj=latlong");
        }
        false
    }

    /// UTM zone and hemisphere (`true` = north) for WGS84 UTM codes
    pub fn utm_zone(&self) -> Option<(u32, bool)> {
        self.epsg.and_then(parse_utm_epsg)
    }

    /// Convert a coordinate in this CRS to WGS84 (longitude, latitude).
    ///
    /// Supported for geographic CRSs and WGS84 UTM zones; any other CRS
    /// returns `None`.
    pub fn to_lonlat(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if self.is_geographic() {
            return Some((x, y));
        }
        let (zone, north) = self.utm_zone()?;
        Some(utm_to_wgs84(x, y, zone, north))
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }

        // WKT string comparison is imperfect but sufficient for grids
        // produced by the same upstream collaborator
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }

        if let (Some(a), Some(b)) = (&self.proj, &other.proj) {
            return a == b;
        }

        false
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(proj) = &self.proj {
            return proj.clone();
        }
        if let Some(wkt) = &self.wkt {
            let end = wkt.char_indices().nth(50).map_or(wkt.len(), |(i, _)| i);
            return format!("WKT:{}", &wkt[..end]);
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::wgs84()
    }
}
