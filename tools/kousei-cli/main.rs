use clap::{Parser, ValueEnum};
use kousei::graph::analysis;
use kousei::prelude::*;
use std::fs;
use std::io::{self, Write};
use std::time::Instant;

/// Output format of the compiled graph.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Compact JSON, ready to submit.
    Json,
    /// Indented JSON.
    Pretty,
    /// Human-readable node listing.
    Listing,
}

/// Compiles generation requests into rendering-engine node graphs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the request JSON file
    request_path: Option<String>,

    /// Optional compiler options JSON file
    #[arg(short, long)]
    config: Option<String>,

    /// Write the graph to this file instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// How to print the compiled graph
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,

    /// Run in interactive mode to be prompted for inputs
    #[arg(short = 'i', long, help = "Run in interactive 'human' mode")]
    human: bool,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let options = cli
        .config
        .as_deref()
        .map(load_options)
        .unwrap_or_default();

    let raw = if cli.human {
        run_interactive()
    } else {
        let path = cli.request_path.clone().unwrap_or_else(|| {
            exit_with_error("Request path is required in non-interactive mode.")
        });
        let json = fs::read_to_string(&path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to read request file '{}': {}", path, e))
        });
        RawGenerateRequest::from_json(&json)
            .unwrap_or_else(|e| exit_with_error(&format!("Invalid request: {}", e)))
    };

    run_compilation(raw, options, cli.format, cli.output.as_deref());
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "kousei=info".into());
    // Logs go to stderr so stdout stays a clean graph document.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_options(path: &str) -> CompilerOptions {
    let json = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read config file '{}': {}", path, e))
    });
    serde_json::from_str(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse config JSON: {}", e)))
}

fn run_compilation(
    raw: RawGenerateRequest,
    options: CompilerOptions,
    format: OutputFormat,
    output_path: Option<&str>,
) {
    let compile_start = Instant::now();
    let compiler = Compiler::builder().with_options(options).build();
    let workflow = compiler
        .compile_request(raw)
        .unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)));
    let compile_duration = compile_start.elapsed();

    if let Err(e) = analysis::verify(&workflow.graph) {
        exit_with_error(&format!("Compiled graph failed verification: {}", e));
    }

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(&workflow.graph)
            .unwrap_or_else(|e| exit_with_error(&format!("Serialization failed: {}", e))),
        OutputFormat::Pretty => serde_json::to_string_pretty(&workflow.graph)
            .unwrap_or_else(|e| exit_with_error(&format!("Serialization failed: {}", e))),
        OutputFormat::Listing => visualize_graph(&workflow.graph, workflow.variant.tag()),
    };

    match output_path {
        Some(path) => {
            fs::write(path, &rendered).unwrap_or_else(|e| {
                exit_with_error(&format!("Could not write to file '{}': {}", path, e))
            });
            eprintln!("  -> Wrote graph to '{}'", path);
        }
        None => println!("{}", rendered),
    }

    eprintln!("\n--- Compilation Summary ---");
    eprintln!("Mode:          {}", workflow.variant);
    eprintln!("Nodes:         {}", workflow.graph.len());
    eprintln!("Seed:          {}", workflow.seed);
    eprintln!("Compile time:  {:?}", compile_duration);
}

/// Prompts for the handful of fields that matter most and defaults the rest.
fn run_interactive() -> RawGenerateRequest {
    eprintln!("--- Kousei Interactive Mode ---");

    let mode = loop {
        let mode = prompt_for_input("Mode (txt2img, img2img, inpaint)", Some("txt2img"));
        match mode.parse::<Variant>() {
            Ok(_) => break mode,
            Err(e) => eprintln!("{}", e),
        }
    };

    let prompt = prompt_for_input("Prompt", None);
    let negative_prompt = prompt_for_input("Negative prompt", Some(""));
    let model = prompt_for_input("Checkpoint", Some(kousei::request::DEFAULT_CHECKPOINT));

    let seed = loop {
        let seed = prompt_for_input("Seed (-1 for random)", Some("-1"));
        match seed.parse::<WireSeed>() {
            Ok(value) => break value,
            Err(e) => eprintln!("{}", e),
        }
    };

    let (init_image, mask_image) = match mode.as_str() {
        "img2img" => (Some(prompt_for_input("Source image", None)), None),
        "inpaint" => (
            Some(prompt_for_input("Source image", None)),
            Some(prompt_for_input("Mask image", None)),
        ),
        _ => (None, None),
    };

    let mut raw: RawGenerateRequest = serde_json::from_value(serde_json::json!({
        "mode": mode,
        "prompt": prompt,
    }))
    .unwrap_or_else(|e| exit_with_error(&format!("Failed to build request: {}", e)));
    raw.negative_prompt = negative_prompt;
    raw.model = model;
    raw.seed = seed;
    raw.init_image = init_image;
    raw.mask_image = mask_image;
    raw
}

/// A helper function to prompt the user and read a line of input.
fn prompt_for_input(prompt_text: &str, default: Option<&str>) -> String {
    let mut line = String::new();
    let default_prompt = default.map_or("".to_string(), |d| format!(" [default: {}]", d));

    eprint!("> {}{}: ", prompt_text, default_prompt);
    let _ = io::stderr().flush();

    if let Err(e) = io::stdin().read_line(&mut line) {
        exit_with_error(&format!("Failed to read line: {}", e));
    }
    let trimmed = line.trim().to_string();

    if trimmed.is_empty() {
        default.unwrap_or("").to_string()
    } else {
        trimmed
    }
}

fn exit_with_error(message: &str) -> ! {
    tracing::error!("{}", message);
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
