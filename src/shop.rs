//! Shop records consumed by the planner.

use crate::error::ScheduleError;
use crate::geo;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Region a shop belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "HK")]
    HongKong,
    #[serde(rename = "KN")]
    Kowloon,
    #[serde(rename = "NT")]
    NewTerritories,
    #[serde(rename = "IS")]
    Islands,
    #[serde(rename = "MO")]
    Macau,
}

impl Region {
    /// Every region, in reporting order.
    pub const ALL: [Region; 5] = [
        Region::HongKong,
        Region::Kowloon,
        Region::NewTerritories,
        Region::Islands,
        Region::Macau,
    ];

    /// Short region code as used in shop exports.
    pub fn code(&self) -> &'static str {
        match self {
            Region::HongKong => "HK",
            Region::Kowloon => "KN",
            Region::NewTerritories => "NT",
            Region::Islands => "IS",
            Region::Macau => "MO",
        }
    }

    /// Parse a region code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Region> {
        Region::ALL
            .into_iter()
            .find(|region| region.code().eq_ignore_ascii_case(code.trim()))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A retail shop that needs a stock-take visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    pub shop_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub region: Region,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    /// Shop sits next to a rail station.
    #[serde(default)]
    pub near_rail: bool,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Shop {
    /// Create an active shop with the given identity and location.
    pub fn new(shop_id: impl Into<String>, region: Region, lat: Option<f64>, lng: Option<f64>) -> Self {
        Shop {
            shop_id: shop_id.into(),
            name: String::new(),
            address: String::new(),
            region,
            district: String::new(),
            brand: String::new(),
            lat,
            lng,
            near_rail: false,
            active: true,
        }
    }

    /// Set the district.
    pub fn with_district(mut self, district: impl Into<String>) -> Self {
        self.district = district.into();
        self
    }

    /// Set the brand.
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    /// Mark the shop as rail-adjacent.
    pub fn with_near_rail(mut self, near_rail: bool) -> Self {
        self.near_rail = near_rail;
        self
    }

    /// Set the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Valid `(lat, lng)` pair, or `None` when absent or out of range.
    pub fn location(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if geo::is_valid_coordinate(lat, lng) => Some((lat, lng)),
            _ => None,
        }
    }

    /// Whether the shop carries usable coordinates.
    pub fn is_located(&self) -> bool {
        self.location().is_some()
    }
}

/// Index shops by id.
pub fn shop_index(shops: &[Shop]) -> HashMap<&str, &Shop> {
    shops.iter().map(|shop| (shop.shop_id.as_str(), shop)).collect()
}

/// Load shops from a JSON array file.
pub fn load_shops<P: AsRef<Path>>(path: P) -> Result<Vec<Shop>, ScheduleError> {
    let file = File::open(path)?;
    let shops = serde_json::from_reader(BufReader::new(file))?;
    Ok(shops)
}
