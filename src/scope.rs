//! Scoped addressing of world-graph partitions.
//!
//! The world's knowledge is split into scoped address spaces. A
//! [`ScopeAddress`] names one partition and resolves to the canonical storage
//! key under which its nodes and edges are persisted. Addresses are
//! call-scoped values — they are never persisted themselves.

use serde::{Deserialize, Serialize};

use crate::error::RecallError;

/// The six scope partitions of a world graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeType {
    /// World-level lore visible from everywhere.
    World,
    /// A narrative chapter.
    Chapter,
    /// An area within a chapter.
    Area,
    /// A location within an area.
    Location,
    /// A single character's private graph.
    Character,
    /// The party's shared camp graph.
    Camp,
}

impl ScopeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::World => "world",
            Self::Chapter => "chapter",
            Self::Area => "area",
            Self::Location => "location",
            Self::Character => "character",
            Self::Camp => "camp",
        }
    }
}

impl std::fmt::Display for ScopeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScopeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "world" => Ok(Self::World),
            "chapter" => Ok(Self::Chapter),
            "area" => Ok(Self::Area),
            "location" => Ok(Self::Location),
            "character" => Ok(Self::Character),
            "camp" => Ok(Self::Camp),
            _ => Err(format!("unknown scope type: {s}")),
        }
    }
}

/// Address of one scoped partition of a world graph.
///
/// Which sub-identifiers are required depends on `scope_type`:
///
/// | scope | required |
/// |-------|----------|
/// | `world`, `camp` | none |
/// | `chapter` | `chapter_id` |
/// | `area` | `chapter_id`, `area_id` |
/// | `location` | `chapter_id`, `area_id`, `location_id` |
/// | `character` | `character_id` |
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeAddress {
    pub scope_type: ScopeType,
    pub chapter_id: Option<String>,
    pub area_id: Option<String>,
    pub location_id: Option<String>,
    pub character_id: Option<String>,
}

impl ScopeAddress {
    fn bare(scope_type: ScopeType) -> Self {
        Self {
            scope_type,
            chapter_id: None,
            area_id: None,
            location_id: None,
            character_id: None,
        }
    }

    pub fn world() -> Self {
        Self::bare(ScopeType::World)
    }

    pub fn camp() -> Self {
        Self::bare(ScopeType::Camp)
    }

    pub fn chapter(chapter_id: impl Into<String>) -> Self {
        Self {
            chapter_id: Some(chapter_id.into()),
            ..Self::bare(ScopeType::Chapter)
        }
    }

    pub fn area(chapter_id: impl Into<String>, area_id: impl Into<String>) -> Self {
        Self {
            chapter_id: Some(chapter_id.into()),
            area_id: Some(area_id.into()),
            ..Self::bare(ScopeType::Area)
        }
    }

    pub fn location(
        chapter_id: impl Into<String>,
        area_id: impl Into<String>,
        location_id: impl Into<String>,
    ) -> Self {
        Self {
            chapter_id: Some(chapter_id.into()),
            area_id: Some(area_id.into()),
            location_id: Some(location_id.into()),
            ..Self::bare(ScopeType::Location)
        }
    }

    pub fn character(character_id: impl Into<String>) -> Self {
        Self {
            character_id: Some(character_id.into()),
            ..Self::bare(ScopeType::Character)
        }
    }

    /// Resolve this address to its canonical storage key.
    ///
    /// Pure; fails with [`RecallError::InvalidScope`] when a required
    /// sub-identifier is missing for the declared scope type.
    pub fn storage_key(&self) -> Result<String, RecallError> {
        match self.scope_type {
            ScopeType::World => Ok("world".to_string()),
            ScopeType::Camp => Ok("camp".to_string()),
            ScopeType::Chapter => {
                let c = self.require("chapter_id", &self.chapter_id)?;
                Ok(format!("chapter/{c}"))
            }
            ScopeType::Area => {
                let c = self.require("chapter_id", &self.chapter_id)?;
                let a = self.require("area_id", &self.area_id)?;
                Ok(format!("chapter/{c}/area/{a}"))
            }
            ScopeType::Location => {
                let c = self.require("chapter_id", &self.chapter_id)?;
                let a = self.require("area_id", &self.area_id)?;
                let l = self.require("location_id", &self.location_id)?;
                Ok(format!("chapter/{c}/area/{a}/location/{l}"))
            }
            ScopeType::Character => {
                let id = self.require("character_id", &self.character_id)?;
                Ok(format!("character/{id}"))
            }
        }
    }

    fn require<'a>(
        &self,
        field: &str,
        value: &'a Option<String>,
    ) -> Result<&'a str, RecallError> {
        value.as_deref().ok_or_else(|| {
            RecallError::InvalidScope(format!(
                "{} scope requires {field}",
                self.scope_type
            ))
        })
    }
}

impl std::fmt::Display for ScopeAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.storage_key() {
            Ok(key) => f.write_str(&key),
            Err(_) => write!(f, "{}(incomplete)", self.scope_type),
        }
    }
}
