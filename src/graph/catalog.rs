//! The closed vocabulary of operations the compiler may emit.
//!
//! Every operation carries a fixed input schema and a fixed list of output kinds. This is the
//! contract the rendering engine expects: an operation or input name outside this table, or
//! a handle of the wrong kind wired into a slot, is an assembler defect.

use super::handle::DataKind;
use super::node::{Input, Literal};
use crate::error::UnknownOperation;
use std::fmt;
use std::str::FromStr;

/// The literal types an input may accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Integer,
    Float,
    Text,
}

/// What a named input accepts: a literal of some type or a handle of some data kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Literal(LiteralKind),
    Link(DataKind),
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Literal(LiteralKind::Integer) => f.write_str("integer"),
            InputKind::Literal(LiteralKind::Float) => f.write_str("float"),
            InputKind::Literal(LiteralKind::Text) => f.write_str("text"),
            InputKind::Link(kind) => write!(f, "{} handle", kind),
        }
    }
}

/// One entry of an operation's input schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSpec {
    pub name: &'static str,
    pub kind: InputKind,
}

macro_rules! input_kind {
    (integer) => {
        InputKind::Literal(LiteralKind::Integer)
    };
    (float) => {
        InputKind::Literal(LiteralKind::Float)
    };
    (text) => {
        InputKind::Literal(LiteralKind::Text)
    };
    ($kind:ident) => {
        InputKind::Link(DataKind::$kind)
    };
}

/// Master macro defining the operation enum, its wire names, schemas and parsing.
macro_rules! define_operations {
    ( $( $variant:ident = $wire:literal ( $( $input:literal : $ikind:ident ),* $(,)? ) -> [ $( $out:ident ),* $(,)? ] ),* $(,)? ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Operation {
            $( $variant, )*
        }

        impl Operation {
            /// Every operation in the catalog, in declaration order.
            pub const ALL: &'static [Operation] = &[ $( Operation::$variant, )* ];

            /// The `class_type` the rendering engine knows this operation by.
            pub fn wire_name(self) -> &'static str {
                match self {
                    $( Operation::$variant => $wire, )*
                }
            }

            pub fn inputs(self) -> &'static [InputSpec] {
                match self {
                    $(
                        Operation::$variant => {
                            const SPECS: &[InputSpec] = &[
                                $( InputSpec { name: $input, kind: input_kind!($ikind) }, )*
                            ];
                            SPECS
                        }
                    )*
                }
            }

            pub fn outputs(self) -> &'static [DataKind] {
                match self {
                    $(
                        Operation::$variant => {
                            const KINDS: &[DataKind] = &[ $( DataKind::$out, )* ];
                            KINDS
                        }
                    )*
                }
            }
        }

        impl FromStr for Operation {
            type Err = UnknownOperation;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $wire => Ok(Operation::$variant), )*
                    _ => Err(UnknownOperation(s.to_string())),
                }
            }
        }
    };
}

define_operations! {
    CheckpointLoader = "CheckpointLoaderSimple" ("ckpt_name": text) -> [Model, Clip, Vae],
    VaeLoader = "VAELoader" ("vae_name": text) -> [Vae],
    LoraLoader = "LoraLoader" (
        "lora_name": text,
        "strength_model": float,
        "strength_clip": float,
        "model": Model,
        "clip": Clip,
    ) -> [Model, Clip],
    TextEncode = "CLIPTextEncode" ("text": text, "clip": Clip) -> [Conditioning],
    EmptyLatent = "EmptyLatentImage" ("width": integer, "height": integer, "batch_size": integer) -> [Latent],
    LoadImage = "LoadImage" ("image": text, "upload": text) -> [Image, Mask],
    LoadMask = "LoadImageMask" ("image": text, "channel": text, "upload": text) -> [Mask],
    VaeEncode = "VAEEncode" ("pixels": Image, "vae": Vae) -> [Latent],
    VaeEncodeInpaint = "VAEEncodeForInpaint" (
        "pixels": Image,
        "vae": Vae,
        "mask": Mask,
        "grow_mask_by": integer,
    ) -> [Latent],
    Sampler = "KSampler" (
        "seed": integer,
        "steps": integer,
        "cfg": float,
        "sampler_name": text,
        "scheduler": text,
        "denoise": float,
        "model": Model,
        "positive": Conditioning,
        "negative": Conditioning,
        "latent_image": Latent,
    ) -> [Latent],
    VaeDecode = "VAEDecode" ("samples": Latent, "vae": Vae) -> [Image],
    SaveImage = "SaveImage" ("images": Image, "filename_prefix": text) -> [],
}

impl Operation {
    /// The first output slot producing `kind`, if any.
    pub fn output_slot(self, kind: DataKind) -> Option<u32> {
        self.outputs()
            .iter()
            .position(|k| *k == kind)
            .map(|slot| slot as u32)
    }

    /// Checks a set of inputs against this operation's schema.
    ///
    /// Returns a description of the first mismatch. Input order is not significant, but
    /// every schema input must be present exactly once and nothing else may be supplied.
    pub fn check_inputs(self, inputs: &[(&'static str, Input)]) -> Result<(), String> {
        let schema = self.inputs();

        for (name, _) in inputs {
            if !schema.iter().any(|spec| spec.name == *name) {
                return Err(format!("unknown input '{}'", name));
            }
            if inputs.iter().filter(|(other, _)| other == name).count() > 1 {
                return Err(format!("input '{}' supplied more than once", name));
            }
        }

        for spec in schema {
            let (_, input) = inputs
                .iter()
                .find(|(name, _)| *name == spec.name)
                .ok_or_else(|| format!("missing input '{}'", spec.name))?;

            let matches = match (spec.kind, input) {
                (InputKind::Literal(LiteralKind::Integer), Input::Literal(Literal::Integer(_)))
                | (InputKind::Literal(LiteralKind::Float), Input::Literal(Literal::Float(_)))
                | (InputKind::Literal(LiteralKind::Text), Input::Literal(Literal::Text(_))) => true,
                (InputKind::Link(expected), Input::Link(handle)) => handle.kind == expected,
                _ => false,
            };
            if !matches {
                return Err(format!(
                    "input '{}' expects {}, got {}",
                    spec.name,
                    spec.kind,
                    input.describe()
                ));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
