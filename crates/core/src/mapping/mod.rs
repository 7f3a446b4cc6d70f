use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{config::canonical_name, Parameters, Result, RibbonError};

/// A value routed to a named parameter by the configuration panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterUpdate {
    pub target: String,
    pub value: f64,
}

impl ParameterUpdate {
    pub fn new(target: impl Into<String>, value: f64) -> Self {
        Self {
            target: target.into(),
            value,
        }
    }

    /// Writes the value into `parameters`. Values are taken as-is; clamping
    /// is left to the caller (see [`ParameterRange::clamp`]).
    pub fn apply_to(&self, parameters: &mut Parameters) -> Result<()> {
        *parameters.field_mut(&self.target)? = self.value;
        Ok(())
    }
}

/// Parses `name=value`, as accepted on the command line.
impl FromStr for ParameterUpdate {
    type Err = RibbonError;

    fn from_str(s: &str) -> Result<Self> {
        let (target, value) = s
            .split_once('=')
            .ok_or_else(|| RibbonError::msg(format!("expected name=value, got `{s}`")))?;
        let target = canonical_name(target.trim())?;
        let value = value
            .trim()
            .parse::<f64>()
            .map_err(|err| RibbonError::msg(format!("invalid value for `{target}`: {err}")))?;
        Ok(Self::new(target, value))
    }
}

/// Editing range offered by the configuration panel for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParameterRange {
    const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Range for a parameter given by canonical name or panel alias.
    pub fn for_parameter(name: &str) -> Result<Self> {
        let range = match canonical_name(name)? {
            "index_step" => Self::new(0.01, 0.5, 0.0001),
            "radius" => Self::new(0.0, 5.0, 0.01),
            "angular_rate" => Self::new(0.0, 5.0, 0.0001),
            "stretch" => Self::new(0.0, 1.5, 0.00001),
            "cross_section_size" => Self::new(0.01, 1.5, 0.01),
            _ => Self::new(0.1, 10.0, 0.1),
        };
        Ok(range)
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Clamps every field of `parameters` into its panel range.
pub fn clamp_to_ranges(parameters: &Parameters) -> Result<Parameters> {
    let mut clamped = *parameters;
    for name in Parameters::NAMES {
        let range = ParameterRange::for_parameter(name)?;
        let field = clamped.field_mut(name)?;
        *field = range.clamp(*field);
    }
    Ok(clamped)
}
