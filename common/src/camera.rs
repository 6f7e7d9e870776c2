use std::fmt;
use std::str::FromStr;

/// Mounting position of one of the vehicle's cameras.
///
/// The wire values match the `CameraName.Name` enum of the dataset schema
/// (0 is UNKNOWN and has no variant here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CameraName {
    Front,
    FrontLeft,
    FrontRight,
    SideLeft,
    SideRight,
}

impl CameraName {
    /// Every camera, in the order ALL-mode runs visit them.
    pub const ALL: [CameraName; 5] = [
        CameraName::Front,
        CameraName::FrontLeft,
        CameraName::FrontRight,
        CameraName::SideLeft,
        CameraName::SideRight,
    ];

    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            1 => Some(CameraName::Front),
            2 => Some(CameraName::FrontLeft),
            3 => Some(CameraName::FrontRight),
            4 => Some(CameraName::SideLeft),
            5 => Some(CameraName::SideRight),
            _ => None,
        }
    }

    pub fn wire_value(self) -> i32 {
        match self {
            CameraName::Front => 1,
            CameraName::FrontLeft => 2,
            CameraName::FrontRight => 3,
            CameraName::SideLeft => 4,
            CameraName::SideRight => 5,
        }
    }

    /// Upper-case identifier, as used in configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            CameraName::Front => "FRONT",
            CameraName::FrontLeft => "FRONT_LEFT",
            CameraName::FrontRight => "FRONT_RIGHT",
            CameraName::SideLeft => "SIDE_LEFT",
            CameraName::SideRight => "SIDE_RIGHT",
        }
    }

    /// Lower-case identifier, used for output directories and file names.
    pub fn lowercase_name(self) -> &'static str {
        match self {
            CameraName::Front => "front",
            CameraName::FrontLeft => "front_left",
            CameraName::FrontRight => "front_right",
            CameraName::SideLeft => "side_left",
            CameraName::SideRight => "side_right",
        }
    }
}

impl fmt::Display for CameraName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CameraName {
    type Err = UnknownCamera;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CameraName::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCamera(s.to_string()))
    }
}

/// Which cameras a job extracts. Fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(try_from = "String")]
pub enum CameraSelector {
    Single(CameraName),
    All,
}

impl Default for CameraSelector {
    fn default() -> Self {
        CameraSelector::Single(CameraName::Front)
    }
}

impl fmt::Display for CameraSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraSelector::Single(camera) => camera.fmt(f),
            CameraSelector::All => f.write_str("ALL"),
        }
    }
}

impl FromStr for CameraSelector {
    type Err = UnknownCamera;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(CameraSelector::All);
        }
        s.parse().map(CameraSelector::Single)
    }
}

impl TryFrom<String> for CameraSelector {
    type Error = UnknownCamera;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown camera {0:?}, expected one of FRONT, FRONT_LEFT, FRONT_RIGHT, SIDE_LEFT, SIDE_RIGHT or ALL")]
pub struct UnknownCamera(pub String);
