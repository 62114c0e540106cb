use super::spine::Assembler;
use crate::error::CompileError;
use crate::graph::{DataKind, Handle, Input, Operation};

/// Where in the spine a source stage is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Placement {
    /// Right after the VAE stage, ahead of the adapter chain.
    BeforeAdapters,
    /// After both prompt encoders, just ahead of the sampler.
    AfterConditioning,
}

/// Produces the latent the sampler starts from.
pub(super) trait SourceStage {
    fn placement(&self) -> Placement;

    /// Emits the stage's nodes and returns the latent handle. `vae` is the current VAE.
    fn emit(&self, asm: &mut Assembler, vae: Handle) -> Result<Handle, CompileError>;
}

pub(super) struct EmptyLatent {
    pub width: u32,
    pub height: u32,
    pub batch_size: u32,
}

impl SourceStage for EmptyLatent {
    fn placement(&self) -> Placement {
        Placement::AfterConditioning
    }

    fn emit(&self, asm: &mut Assembler, _vae: Handle) -> Result<Handle, CompileError> {
        asm.emit(
            Operation::EmptyLatent,
            vec![
                ("width", Input::integer(self.width)),
                ("height", Input::integer(self.height)),
                ("batch_size", Input::integer(self.batch_size)),
            ],
        )?
        .output(DataKind::Latent)
    }
}

fn load_image(asm: &mut Assembler, image: &str) -> Result<Handle, CompileError> {
    asm.emit(
        Operation::LoadImage,
        vec![("image", Input::text(image)), ("upload", Input::text("image"))],
    )?
    .output(DataKind::Image)
}

pub(super) struct EncodeImage<'a> {
    pub image: &'a str,
}

impl SourceStage for EncodeImage<'_> {
    fn placement(&self) -> Placement {
        Placement::BeforeAdapters
    }

    fn emit(&self, asm: &mut Assembler, vae: Handle) -> Result<Handle, CompileError> {
        let pixels = load_image(asm, self.image)?;
        asm.emit(
            Operation::VaeEncode,
            vec![("pixels", pixels.into()), ("vae", vae.into())],
        )?
        .output(DataKind::Latent)
    }
}

pub(super) struct EncodeMasked<'a> {
    pub image: &'a str,
    pub mask: &'a str,
    pub mask_channel: &'a str,
    pub grow_mask_by: u32,
}

impl SourceStage for EncodeMasked<'_> {
    fn placement(&self) -> Placement {
        Placement::BeforeAdapters
    }

    fn emit(&self, asm: &mut Assembler, vae: Handle) -> Result<Handle, CompileError> {
        let pixels = load_image(asm, self.image)?;
        let mask = asm
            .emit(
                Operation::LoadMask,
                vec![
                    ("image", Input::text(self.mask)),
                    ("channel", Input::text(self.mask_channel)),
                    ("upload", Input::text("image")),
                ],
            )?
            .output(DataKind::Mask)?;
        asm.emit(
            Operation::VaeEncodeInpaint,
            vec![
                ("pixels", pixels.into()),
                ("vae", vae.into()),
                ("mask", mask.into()),
                ("grow_mask_by", Input::integer(self.grow_mask_by)),
            ],
        )?
        .output(DataKind::Latent)
    }
}
