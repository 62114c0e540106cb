use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The model families the tool knows how to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModelKind {
    Checkpoints,
    Vae,
    Loras,
    Embeddings,
    Hypernetworks,
    Controlnet,
    Upscale,
}

/// Source directory, destination directory and accepted extensions of one model family.
struct Mapping {
    src: &'static str,
    dst: &'static str,
    extensions: &'static [&'static str],
}

impl ModelKind {
    const ALL: [ModelKind; 7] = [
        ModelKind::Checkpoints,
        ModelKind::Vae,
        ModelKind::Loras,
        ModelKind::Embeddings,
        ModelKind::Hypernetworks,
        ModelKind::Controlnet,
        ModelKind::Upscale,
    ];

    fn mapping(self) -> Mapping {
        match self {
            ModelKind::Checkpoints => Mapping {
                src: "models/Stable-diffusion",
                dst: "models/checkpoints",
                extensions: &["ckpt", "safetensors", "pt", "pth"],
            },
            ModelKind::Vae => Mapping {
                src: "models/VAE",
                dst: "models/vae",
                extensions: &["ckpt", "safetensors", "pt", "pth"],
            },
            ModelKind::Loras => Mapping {
                src: "models/Lora",
                dst: "models/loras",
                extensions: &["safetensors", "pt", "pth"],
            },
            ModelKind::Embeddings => Mapping {
                src: "embeddings",
                dst: "models/embeddings",
                extensions: &["pt", "pth", "safetensors", "bin"],
            },
            ModelKind::Hypernetworks => Mapping {
                src: "models/hypernetworks",
                dst: "models/hypernetworks",
                extensions: &["pt", "pth", "safetensors"],
            },
            ModelKind::Controlnet => Mapping {
                src: "models/ControlNet",
                dst: "models/controlnet",
                extensions: &["safetensors", "pth"],
            },
            ModelKind::Upscale => Mapping {
                src: "models/ESRGAN",
                dst: "models/upscale_models",
                extensions: &["pth", "pt"],
            },
        }
    }
}

/// Copies model files from one installation layout into the rendering engine's layout
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Root of the installation to copy from
    #[arg(short, long)]
    source: PathBuf,

    /// Root of the rendering engine installation to copy into
    #[arg(short, long)]
    dest: PathBuf,

    /// Model families to copy (all of them when omitted)
    #[arg(short, long, value_enum)]
    kind: Vec<ModelKind>,

    /// Only report what would be copied
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Default)]
struct Tally {
    copied: usize,
    skipped: usize,
    bytes: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let kinds = if cli.kind.is_empty() {
        ModelKind::ALL.to_vec()
    } else {
        cli.kind.clone()
    };

    if cli.dry_run {
        println!("Dry run: nothing will be written.");
    }

    let mut total = Tally::default();
    for kind in kinds {
        let tally = copy_kind(kind, &cli.source, &cli.dest, cli.dry_run)?;
        total.copied += tally.copied;
        total.skipped += tally.skipped;
        total.bytes += tally.bytes;
    }

    println!("\n--- Migration Summary ---");
    println!("Copied:   {}", total.copied);
    println!("Skipped:  {}", total.skipped);
    println!("Size:     {:.1} MiB", total.bytes as f64 / (1024.0 * 1024.0));
    Ok(())
}

/// Copies the files of one model family, subdirectories included. Each file keeps its path
/// relative to the family's source directory. Existing destination files are left alone.
fn copy_kind(
    kind: ModelKind,
    source_root: &Path,
    dest_root: &Path,
    dry_run: bool,
) -> Result<Tally, Box<dyn std::error::Error>> {
    let mapping = kind.mapping();
    let src_dir = source_root.join(mapping.src);
    let dst_dir = dest_root.join(mapping.dst);
    let mut tally = Tally::default();

    if !src_dir.is_dir() {
        println!("-> {:?}: source directory not found: {}", kind, src_dir.display());
        return Ok(tally);
    }
    println!("\n-> {:?}: {} -> {}", kind, src_dir.display(), dst_dir.display());

    let entries = WalkDir::new(&src_dir)
        .sort_by_file_name()
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    for entry in entries {
        let path = entry.path();
        if !entry.file_type().is_file() || !has_allowed_extension(path, mapping.extensions) {
            continue;
        }
        let relative = path.strip_prefix(&src_dir)?;
        let target = dst_dir.join(relative);
        if target.exists() {
            println!("   skip  {} (already present)", relative.display());
            tally.skipped += 1;
            continue;
        }

        let size = entry.metadata()?.len();
        if dry_run {
            println!("   would copy  {}", relative.display());
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &target)?;
            println!("   copied  {}", relative.display());
        }
        tally.copied += 1;
        tally.bytes += size;
    }

    Ok(tally)
}

fn has_allowed_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
}
