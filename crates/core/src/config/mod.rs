use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    frame::DegeneracyPolicy,
    gradient::{Color, Gradient, GradientStop},
    ribbon::EmissionMode,
    scene::CameraPose,
    snapshot::merge_override,
    Result, RibbonError,
};

/// Scalar knobs of the ribbon curve, edited live by the configuration panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Curve parameter advance between consecutive samples.
    pub index_step: f64,
    pub radius: f64,
    pub angular_rate: f64,
    /// Scale applied to the curve parameter along the X axis.
    pub stretch: f64,
    /// Distance from the curve to each cross-section vertex.
    pub cross_section_size: f64,
    pub line_width: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            index_step: 0.09,
            radius: 2.0,
            angular_rate: 0.5,
            stretch: 1.0,
            cross_section_size: 0.2,
            line_width: 1.0,
        }
    }
}

impl Parameters {
    /// Canonical parameter names, in declaration order.
    pub const NAMES: [&'static str; 6] = [
        "index_step",
        "radius",
        "angular_rate",
        "stretch",
        "cross_section_size",
        "line_width",
    ];

    /// Checks that every value is finite and the cross-section is not empty.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.fields() {
            if !value.is_finite() {
                return Err(RibbonError::InvalidParameter { name, value });
            }
        }

        if self.cross_section_size <= 0.0 {
            return Err(RibbonError::InvalidParameter {
                name: "cross_section_size",
                value: self.cross_section_size,
            });
        }

        Ok(())
    }

    /// Returns `(name, value)` pairs for every parameter.
    pub fn fields(&self) -> [(&'static str, f64); 6] {
        [
            ("index_step", self.index_step),
            ("radius", self.radius),
            ("angular_rate", self.angular_rate),
            ("stretch", self.stretch),
            ("cross_section_size", self.cross_section_size),
            ("line_width", self.line_width),
        ]
    }

    /// Looks a parameter up by canonical name or by its short panel alias.
    pub fn get(&self, name: &str) -> Result<f64> {
        let name = canonical_name(name)?;
        self.fields()
            .into_iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
            .ok_or_else(|| RibbonError::UnknownParameter(name.to_string()))
    }

    /// Mutable access to a parameter by canonical name or short alias.
    pub fn field_mut(&mut self, name: &str) -> Result<&mut f64> {
        match canonical_name(name)? {
            "index_step" => Ok(&mut self.index_step),
            "radius" => Ok(&mut self.radius),
            "angular_rate" => Ok(&mut self.angular_rate),
            "stretch" => Ok(&mut self.stretch),
            "cross_section_size" => Ok(&mut self.cross_section_size),
            "line_width" => Ok(&mut self.line_width),
            other => Err(RibbonError::UnknownParameter(other.to_string())),
        }
    }
}

/// Resolves the short names used by the debug panel (`i`, `r`, `w`, `l`,
/// `size`) to canonical field names.
pub fn canonical_name(name: &str) -> Result<&'static str> {
    let canonical = match name {
        "i" | "index_step" => "index_step",
        "r" | "radius" => "radius",
        "w" | "angular_rate" => "angular_rate",
        "l" | "stretch" => "stretch",
        "size" | "cross_section_size" => "cross_section_size",
        "line_width" => "line_width",
        other => return Err(RibbonError::UnknownParameter(other.to_string())),
    };
    Ok(canonical)
}

/// Top-level configuration structure for the application.
///
/// Parameters are flattened so that an exported snapshot (parameters plus a
/// `camera` object) can be replayed directly as an override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub sample_count: usize,
    pub emission: EmissionMode,
    pub degeneracy: DegeneracyPolicy,
    pub gradient: Vec<GradientStop>,
    #[serde(flatten)]
    pub parameters: Parameters,
    pub camera: CameraPose,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sample_count: 5000,
            emission: EmissionMode::default(),
            degeneracy: DegeneracyPolicy::default(),
            gradient: default_gradient_stops(),
            parameters: Parameters::default(),
            camera: CameraPose::default(),
        }
    }
}

impl AppConfig {
    /// Applies a JSON override document on top of the built-in defaults.
    pub fn from_override_str(json: &str) -> Result<Self> {
        let overrides: serde_json::Value = serde_json::from_str(json)?;
        Self::default().with_override(overrides)
    }

    /// Reads an override document from disk and merges it over the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loaded configuration override");
        Self::from_override_str(&text)
    }

    /// Merges `overrides` over this configuration and validates the result.
    pub fn with_override(&self, overrides: serde_json::Value) -> Result<Self> {
        let mut base = serde_json::to_value(self)?;
        merge_override(&mut base, overrides);
        let config: AppConfig = serde_json::from_value(base)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_count < 2 {
            return Err(RibbonError::TooFewSamples {
                min: 2,
                actual: self.sample_count,
            });
        }
        self.parameters.validate()?;
        self.build_gradient().map(|_| ())
    }

    pub fn build_gradient(&self) -> Result<Gradient> {
        Gradient::new(self.gradient.clone())
    }
}

fn default_gradient_stops() -> Vec<GradientStop> {
    [
        (0.0, Color::from_rgb8(0x77, 0x00, 0xff)),
        (0.2, Color::from_rgb8(0x00, 0x95, 0xff)),
        (0.4, Color::from_rgb8(0x00, 0xff, 0xbf)),
        (1.0, Color::from_rgb8(0x33, 0x00, 0xff)),
    ]
    .into_iter()
    .map(|(position, color)| GradientStop::new(position, color))
    .collect()
}
