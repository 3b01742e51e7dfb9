use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Server-assigned identifier grouping every result of one batch submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Magnification factor applied by the remote model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Scale {
    X2,
    X3,
    #[default]
    X4,
}

impl Scale {
    pub const ALL: [Scale; 3] = [Scale::X2, Scale::X3, Scale::X4];

    pub fn factor(self) -> u32 {
        match self {
            Scale::X2 => 2,
            Scale::X3 => 3,
            Scale::X4 => 4,
        }
    }
}

impl TryFrom<u32> for Scale {
    type Error = ProtocolError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Scale::X2),
            3 => Ok(Scale::X3),
            4 => Ok(Scale::X4),
            other => Err(ProtocolError::UnsupportedScale(other)),
        }
    }
}

impl From<Scale> for u32 {
    fn from(value: Scale) -> Self {
        value.factor()
    }
}

impl FromStr for Scale {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches(['x', 'X']);
        let value = trimmed
            .parse::<u32>()
            .map_err(|_| ProtocolError::InvalidScale(s.to_string()))?;
        Scale::try_from(value)
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.factor())
    }
}

/// Upscaling model variant the remote service should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelId {
    #[default]
    #[serde(rename = "RealESRGAN_x4plus")]
    RealEsrganX4Plus,
    #[serde(rename = "RealESRGAN_x4plus_anime_6B")]
    RealEsrganX4PlusAnime6B,
}

impl ModelId {
    pub const ALL: [ModelId; 2] = [ModelId::RealEsrganX4Plus, ModelId::RealEsrganX4PlusAnime6B];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelId::RealEsrganX4Plus => "RealESRGAN_x4plus",
            ModelId::RealEsrganX4PlusAnime6B => "RealESRGAN_x4plus_anime_6B",
        }
    }
}

impl FromStr for ModelId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelId::ALL
            .into_iter()
            .find(|model| model.as_str() == s.trim())
            .ok_or_else(|| ProtocolError::UnknownModel(s.to_string()))
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
