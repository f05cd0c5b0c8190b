//! Grid-compatibility rules for PV installations
//!
//! A plan is grid compatible when capacity and area stay within the
//! operator limits, the system is not free-field mounted, and shading is
//! at most minimal.

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

/// Maximum capacity accepted for feed-in, in kW.
pub const MAX_CAPACITY_KW: f64 = 100.0;
/// Maximum installation area, in m².
pub const MAX_AREA_M2: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MountingSystem {
    #[serde(rename = "Aufdachmontage")]
    RoofMounting,
    #[serde(rename = "Indachmontage")]
    InRoofMounting,
    #[serde(rename = "Flachdachmontage")]
    FlatRoofMounting,
    #[serde(rename = "Freiflächenmontage")]
    FreeFieldMounting,
}

impl MountingSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoofMounting => "Aufdachmontage",
            Self::InRoofMounting => "Indachmontage",
            Self::FlatRoofMounting => "Flachdachmontage",
            Self::FreeFieldMounting => "Freiflächenmontage",
        }
    }
}

impl std::fmt::Display for MountingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MountingSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Aufdachmontage" | "RoofMounting" => Ok(Self::RoofMounting),
            "Indachmontage" | "InRoofMounting" => Ok(Self::InRoofMounting),
            "Flachdachmontage" | "FlatRoofMounting" => Ok(Self::FlatRoofMounting),
            "Freiflächenmontage" | "FreeFieldMounting" => Ok(Self::FreeFieldMounting),
            other => Err(format!("unknown mounting system '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadingClass {
    NoShade,
    MinimalShade,
    ModerateShade,
    HeavyShade,
}

impl ShadingClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoShade => "NoShade",
            Self::MinimalShade => "MinimalShade",
            Self::ModerateShade => "ModerateShade",
            Self::HeavyShade => "HeavyShade",
        }
    }
}

impl std::fmt::Display for ShadingClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ShadingClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NoShade" => Ok(Self::NoShade),
            "MinimalShade" => Ok(Self::MinimalShade),
            "ModerateShade" => Ok(Self::ModerateShade),
            "HeavyShade" => Ok(Self::HeavyShade),
            other => Err(format!("unknown shading class '{}'", other)),
        }
    }
}

/// Compass orientation of the module field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::N => "N",
            Self::NE => "NE",
            Self::E => "E",
            Self::SE => "SE",
            Self::S => "S",
            Self::SW => "SW",
            Self::W => "W",
            Self::NW => "NW",
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "N" => Ok(Self::N),
            "NE" => Ok(Self::NE),
            "E" => Ok(Self::E),
            "SE" => Ok(Self::SE),
            "S" => Ok(Self::S),
            "SW" => Ok(Self::SW),
            "W" => Ok(Self::W),
            "NW" => Ok(Self::NW),
            other => Err(format!("unknown orientation '{}'", other)),
        }
    }
}

/// The four plan fields the compatibility check reads.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GridInputs {
    pub capacity_kw: Option<f64>,
    pub area_m2: Option<f64>,
    pub mounting_system: Option<MountingSystem>,
    pub shading: Option<ShadingClass>,
}

/// Evaluates the plan against the grid limits.
///
/// A missing field is a precondition failure (`NotImplemented`), not a
/// failed threshold: the plan has not been entered yet.
pub fn check_grid_compatibility(inputs: &GridInputs) -> DomainResult<bool> {
    let (Some(capacity), Some(area), Some(mounting), Some(shading)) = (
        inputs.capacity_kw,
        inputs.area_m2,
        inputs.mounting_system,
        inputs.shading,
    ) else {
        return Err(DomainError::NotImplemented(
            "offer must be created first".to_string(),
        ));
    };

    Ok(capacity <= MAX_CAPACITY_KW
        && area <= MAX_AREA_M2
        && mounting != MountingSystem::FreeFieldMounting
        && matches!(shading, ShadingClass::NoShade | ShadingClass::MinimalShade))
}
