use super::seed::Seed;
use crate::error::RequestError;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CHECKPOINT: &str = "v1-5-pruned-emaonly.safetensors";

/// The three kinds of pipeline the compiler can assemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Text to image from an empty latent.
    Direct,
    /// Image to image from an encoded source picture.
    ImageGuided,
    /// Masked inpainting of a source picture.
    Inpaint,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Direct, Variant::ImageGuided, Variant::Inpaint];

    /// The `mode` tag used by callers.
    pub fn tag(self) -> &'static str {
        match self {
            Variant::Direct => "txt2img",
            Variant::ImageGuided => "img2img",
            Variant::Inpaint => "inpaint",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Variant {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.tag() == s)
            .ok_or_else(|| RequestError::UnknownVariant(s.to_string()))
    }
}

/// Where the sampler's starting latent comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Direct {
        width: u32,
        height: u32,
    },
    ImageGuided {
        image: String,
        denoise: f64,
    },
    Inpaint {
        image: String,
        mask: String,
        denoise: f64,
    },
}

impl Source {
    pub fn variant(&self) -> Variant {
        match self {
            Source::Direct { .. } => Variant::Direct,
            Source::ImageGuided { .. } => Variant::ImageGuided,
            Source::Inpaint { .. } => Variant::Inpaint,
        }
    }

    /// Denoise strength handed to the sampler. Direct generation always starts from pure noise.
    pub fn denoise(&self) -> f64 {
        match self {
            Source::Direct { .. } => 1.0,
            Source::ImageGuided { denoise, .. } | Source::Inpaint { denoise, .. } => *denoise,
        }
    }
}

/// A weight adapter applied on top of the checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterSpec {
    pub name: String,
    pub strength: f64,
}

impl AdapterSpec {
    pub fn new(name: impl Into<String>, strength: f64) -> Self {
        Self {
            name: name.into(),
            strength,
        }
    }
}

/// A validated generation request, the compiler's input.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub source: Source,
    pub prompt: String,
    pub negative_prompt: String,
    pub steps: u32,
    pub cfg_scale: f64,
    pub sampler_name: String,
    pub scheduler: String,
    pub seed: Seed,
    pub batch_size: u32,
    pub checkpoint: String,
    pub vae: Option<String>,
    /// Applied in order; each adapter sees the effect of the ones before it.
    pub adapters: Vec<AdapterSpec>,
}

impl GenerationRequest {
    /// A request with the usual defaults: 20 steps, cfg 7, euler/normal, random seed,
    /// one image, the stock checkpoint, no VAE override and no adapters.
    pub fn new(source: Source, prompt: impl Into<String>) -> Self {
        Self {
            source,
            prompt: prompt.into(),
            negative_prompt: String::new(),
            steps: 20,
            cfg_scale: 7.0,
            sampler_name: "euler".to_string(),
            scheduler: "normal".to_string(),
            seed: Seed::Random,
            batch_size: 1,
            checkpoint: DEFAULT_CHECKPOINT.to_string(),
            vae: None,
            adapters: Vec::new(),
        }
    }

    pub fn variant(&self) -> Variant {
        self.source.variant()
    }
}
