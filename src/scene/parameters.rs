//! The live parameters shared between the scene and the debug panel.

use crate::{
    config::{SceneConfig, WaterConfig},
    sun::SunParameters,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaterParameters {
    pub distortion_scale: f32,
    pub size: f32,
}

impl Default for WaterParameters {
    fn default() -> Self {
        Self::from_config(&WaterConfig::default())
    }
}

impl WaterParameters {
    pub fn from_config(config: &WaterConfig) -> Self {
        Self {
            distortion_scale: config.distortion_scale,
            size: config.size,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SceneParameters {
    pub sun: SunParameters,
    pub water: WaterParameters,
}

/// A single adjustable value of [`SceneParameters`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Parameter {
    Elevation,
    Azimuth,
    DistortionScale,
    Size,
}

/// Which groups differ between two parameter sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Changes {
    pub sun: bool,
    pub water: bool,
}

impl SceneParameters {
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            sun: config.sun,
            water: WaterParameters::from_config(&config.water),
        }
    }

    pub fn get(&self, parameter: Parameter) -> f32 {
        match parameter {
            Parameter::Elevation => self.sun.elevation,
            Parameter::Azimuth => self.sun.azimuth,
            Parameter::DistortionScale => self.water.distortion_scale,
            Parameter::Size => self.water.size,
        }
    }

    pub fn set(&mut self, parameter: Parameter, value: f32) {
        match parameter {
            Parameter::Elevation => self.sun.elevation = value,
            Parameter::Azimuth => self.sun.azimuth = value,
            Parameter::DistortionScale => self.water.distortion_scale = value,
            Parameter::Size => self.water.size = value,
        }
    }

    /// Compares against the last applied set; everything counts as changed
    /// when nothing was applied yet.
    pub fn changes_since(&self, applied: Option<&SceneParameters>) -> Changes {
        match applied {
            None => Changes {
                sun: true,
                water: true,
            },
            Some(applied) => Changes {
                sun: self.sun != applied.sun,
                water: self.water != applied.water,
            },
        }
    }
}
