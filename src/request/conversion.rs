use super::definition::{AdapterSpec, DEFAULT_CHECKPOINT, GenerationRequest, Source, Variant};
use super::seed::{Seed, WireSeed};
use crate::error::RequestError;
use serde::{Deserialize, Serialize};

/// A trait for caller-side request formats that can be turned into a `GenerationRequest`.
///
/// This is the seam where caller errors are caught: anything that does not validate here
/// never reaches the compiler.
pub trait IntoRequest {
    fn into_request(self) -> Result<GenerationRequest, RequestError>;
}

/// An adapter entry as callers send it. A missing strength means full strength.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RawAdapter {
    pub name: String,
    #[serde(default = "default_strength")]
    pub strength: f64,
}

/// The flat request shape accepted over the wire.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RawGenerateRequest {
    #[serde(default = "default_mode")]
    pub mode: String,
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
    #[serde(default = "default_dimension")]
    pub width: u32,
    #[serde(default = "default_dimension")]
    pub height: u32,
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_cfg_scale")]
    pub cfg_scale: f64,
    #[serde(default = "default_sampler")]
    pub sampler_name: String,
    #[serde(default = "default_scheduler")]
    pub scheduler: String,
    #[serde(default)]
    pub seed: WireSeed,
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub vae: Option<String>,
    #[serde(default)]
    pub loras: Option<Vec<RawAdapter>>,
    #[serde(default)]
    pub init_image: Option<String>,
    #[serde(default = "default_denoise")]
    pub denoising_strength: f64,
    #[serde(default)]
    pub mask_image: Option<String>,
}

fn default_mode() -> String {
    Variant::Direct.tag().to_string()
}
fn default_dimension() -> u32 {
    512
}
fn default_steps() -> u32 {
    20
}
fn default_cfg_scale() -> f64 {
    7.0
}
fn default_sampler() -> String {
    "euler".to_string()
}
fn default_scheduler() -> String {
    "normal".to_string()
}
fn default_batch_size() -> u32 {
    1
}
fn default_model() -> String {
    DEFAULT_CHECKPOINT.to_string()
}
fn default_denoise() -> f64 {
    0.75
}
fn default_strength() -> f64 {
    1.0
}

impl RawGenerateRequest {
    /// Parses a request from JSON.
    pub fn from_json(json: &str) -> Result<Self, RequestError> {
        serde_json::from_str(json).map_err(|e| RequestError::JsonParseError(e.to_string()))
    }
}

fn require_positive(field: &'static str, value: u32) -> Result<u32, RequestError> {
    if value == 0 {
        Err(RequestError::InvalidParameter {
            field,
            message: "must be greater than zero".to_string(),
        })
    } else {
        Ok(value)
    }
}

fn require_finite(field: &'static str, value: f64) -> Result<f64, RequestError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RequestError::InvalidParameter {
            field,
            message: format!("{} is not a finite number", value),
        })
    }
}

fn require_unit_interval(field: &'static str, value: f64) -> Result<f64, RequestError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(RequestError::InvalidParameter {
            field,
            message: format!("{} is outside [0, 1]", value),
        })
    }
}

fn require_name(field: &'static str, value: String) -> Result<String, RequestError> {
    if value.trim().is_empty() {
        Err(RequestError::InvalidParameter {
            field,
            message: "must not be empty".to_string(),
        })
    } else {
        Ok(value)
    }
}

fn require_present(
    field: &'static str,
    value: Option<String>,
    variant: Variant,
) -> Result<String, RequestError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| RequestError::MissingField {
            field,
            mode: variant.tag().to_string(),
        })
}

impl IntoRequest for RawGenerateRequest {
    fn into_request(self) -> Result<GenerationRequest, RequestError> {
        let variant: Variant = self.mode.parse()?;

        let source = match variant {
            Variant::Direct => Source::Direct {
                width: require_positive("width", self.width)?,
                height: require_positive("height", self.height)?,
            },
            Variant::ImageGuided => Source::ImageGuided {
                image: require_present("init_image", self.init_image, variant)?,
                denoise: require_unit_interval("denoising_strength", self.denoising_strength)?,
            },
            Variant::Inpaint => Source::Inpaint {
                image: require_present("init_image", self.init_image, variant)?,
                mask: require_present("mask_image", self.mask_image, variant)?,
                denoise: require_unit_interval("denoising_strength", self.denoising_strength)?,
            },
        };

        let adapters = self
            .loras
            .unwrap_or_default()
            .into_iter()
            .map(|raw| {
                Ok(AdapterSpec {
                    name: require_name("loras.name", raw.name)?,
                    strength: require_finite("loras.strength", raw.strength)?,
                })
            })
            .collect::<Result<Vec<_>, RequestError>>()?;

        Ok(GenerationRequest {
            source,
            prompt: self.prompt,
            negative_prompt: self.negative_prompt,
            steps: require_positive("steps", self.steps)?,
            cfg_scale: require_finite("cfg_scale", self.cfg_scale)?,
            sampler_name: require_name("sampler_name", self.sampler_name)?,
            scheduler: require_name("scheduler", self.scheduler)?,
            seed: Seed::from_wire(self.seed)?,
            batch_size: require_positive("batch_size", self.batch_size)?,
            checkpoint: require_name("model", self.model)?,
            vae: self.vae.filter(|name| !name.trim().is_empty()),
            adapters,
        })
    }
}

impl TryFrom<RawGenerateRequest> for GenerationRequest {
    type Error = RequestError;

    fn try_from(raw: RawGenerateRequest) -> Result<Self, Self::Error> {
        raw.into_request()
    }
}
