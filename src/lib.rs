//! Reading resources library exports

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::resources::ResourceId;

pub mod core;
pub mod resources;

#[cfg(test)]
pub mod test_support;

/// A Quran text edition the user can pick. Each one needs its own
/// downloadable resource package.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reading {
    #[default]
    #[value(name = "hafs_1405")]
    #[serde(rename = "hafs_1405")]
    Hafs1405,
    #[value(name = "hafs_1421")]
    #[serde(rename = "hafs_1421")]
    Hafs1421,
    #[value(name = "hafs_1440")]
    #[serde(rename = "hafs_1440")]
    Hafs1440,
    Tajweed,
}

impl Reading {
    /// Tag of the resource package backing this reading.
    pub fn resource_id(self) -> ResourceId {
        ResourceId::new(self.tag())
    }

    pub fn tag(self) -> &'static str {
        match self {
            Reading::Hafs1405 => "hafs_1405",
            Reading::Hafs1421 => "hafs_1421",
            Reading::Hafs1440 => "hafs_1440",
            Reading::Tajweed => "tajweed",
        }
    }
}
