//! Unit tests for the catalog, value types, error messages and the graph listing.
mod common;
use common::*;
use kousei::error::{TopologyError, UnknownOperation};
use kousei::graph::{InputKind, LiteralKind};
use kousei::prelude::*;
use std::str::FromStr;

#[test]
fn test_operation_wire_names_round_trip() {
    for op in Operation::ALL {
        let parsed = Operation::from_str(op.wire_name()).expect("catalog name must parse");
        assert_eq!(parsed, *op);
        assert_eq!(op.to_string(), op.wire_name());
    }
    assert_eq!(Operation::ALL.len(), 12);
}

#[test]
fn test_unknown_operation_is_rejected() {
    let err = Operation::from_str("ControlNetApply").unwrap_err();
    assert_eq!(err, UnknownOperation("ControlNetApply".to_string()));
    assert_eq!(
        err.to_string(),
        "Unknown operation type 'ControlNetApply'"
    );
}

#[test]
fn test_catalog_output_slots() {
    assert_eq!(
        Operation::CheckpointLoader.outputs(),
        &[DataKind::Model, DataKind::Clip, DataKind::Vae]
    );
    assert_eq!(Operation::CheckpointLoader.output_slot(DataKind::Vae), Some(2));
    assert_eq!(Operation::LoraLoader.output_slot(DataKind::Clip), Some(1));
    assert_eq!(Operation::LoadImage.output_slot(DataKind::Image), Some(0));
    assert!(Operation::SaveImage.outputs().is_empty());
    assert_eq!(Operation::TextEncode.output_slot(DataKind::Latent), None);
}

#[test]
fn test_catalog_input_schemas() {
    let sampler = Operation::Sampler.inputs();
    assert_eq!(sampler.len(), 10);
    let seed = sampler.iter().find(|spec| spec.name == "seed").unwrap();
    assert_eq!(seed.kind, InputKind::Literal(LiteralKind::Integer));
    let model = sampler.iter().find(|spec| spec.name == "model").unwrap();
    assert_eq!(model.kind, InputKind::Link(DataKind::Model));
    assert_eq!(model.kind.to_string(), "MODEL handle");
}

#[test]
fn test_check_inputs_reports_first_mismatch() {
    let ok = vec![("vae_name", Input::text("v.safetensors"))];
    assert_eq!(Operation::VaeLoader.check_inputs(&ok), Ok(()));

    let wrong_type = vec![("vae_name", Input::float(1.0))];
    assert_eq!(
        Operation::VaeLoader.check_inputs(&wrong_type),
        Err("input 'vae_name' expects text, got float".to_string())
    );

    let missing: Vec<(&'static str, Input)> = Vec::new();
    assert_eq!(
        Operation::VaeLoader.check_inputs(&missing),
        Err("missing input 'vae_name'".to_string())
    );

    let twice = vec![
        ("vae_name", Input::text("a")),
        ("vae_name", Input::text("b")),
    ];
    assert_eq!(
        Operation::VaeLoader.check_inputs(&twice),
        Err("input 'vae_name' supplied more than once".to_string())
    );
}

#[test]
fn test_literal_display() {
    assert_eq!(Literal::Integer(42).to_string(), "42");
    assert_eq!(Literal::Float(7.0).to_string(), "7.0");
    assert_eq!(Literal::Float(0.75).to_string(), "0.75");
    assert_eq!(Literal::Text("a cat".to_string()).to_string(), "\"a cat\"");
}

#[test]
fn test_variant_tags() {
    for variant in Variant::ALL {
        assert_eq!(variant.tag().parse::<Variant>(), Ok(variant));
        assert_eq!(variant.to_string(), variant.tag());
    }
    assert_eq!(Variant::Direct.tag(), "txt2img");
    assert_eq!(Variant::ImageGuided.tag(), "img2img");
    assert_eq!(Variant::Inpaint.tag(), "inpaint");
    assert_eq!(
        "upscale".parse::<Variant>(),
        Err(RequestError::UnknownVariant("upscale".to_string()))
    );
}

#[test]
fn test_source_denoise() {
    assert_eq!(create_direct_request().source.denoise(), 1.0);
    assert_eq!(create_image_guided_request().source.denoise(), 0.6);
    assert_eq!(create_inpaint_request().source.denoise(), 0.9);
}

#[test]
fn test_request_defaults() {
    let request = GenerationRequest::new(
        Source::Direct {
            width: 64,
            height: 64,
        },
        "x",
    );
    assert_eq!(request.seed, Seed::Random);
    assert_eq!(request.checkpoint, kousei::request::DEFAULT_CHECKPOINT);
    assert_eq!(request.vae, None);
    assert!(request.adapters.is_empty());
    assert_eq!(request.variant(), Variant::Direct);
}

#[test]
fn test_error_messages() {
    let missing = RequestError::MissingField {
        field: "mask_image",
        mode: "inpaint".to_string(),
    };
    assert_eq!(
        missing.to_string(),
        "Field 'mask_image' is required for mode 'inpaint'"
    );

    let wrapped = CompileError::from(RequestError::UnknownVariant("x".to_string()));
    assert_eq!(
        wrapped.to_string(),
        "Unknown generation mode 'x' (expected txt2img, img2img or inpaint)"
    );

    let status = EngineError::Status {
        code: 500,
        body: "boom".to_string(),
    };
    assert_eq!(
        SessionError::from(status).to_string(),
        "Rendering engine returned status 500: boom"
    );

    assert_eq!(
        TopologyError::TerminalCount(2).to_string(),
        "Expected exactly one terminal node, found 2"
    );
}

#[test]
fn test_visualizer_lists_every_node() {
    let mut request = create_direct_request();
    request.adapters = vec![AdapterSpec::new("lora_a", 0.8)];
    let graph = Compiler::default().compile(&request).unwrap().graph;
    let listing = visualize_graph(&graph, "txt2img");

    assert!(listing.starts_with("======== GRAPH: txt2img (8 nodes) ========"));
    assert!(listing.trim_end().ends_with("END OF GRAPH ================"));
    for op in operations(&graph) {
        assert!(listing.contains(op.wire_name()), "missing {}", op);
    }
    assert!(listing.contains("-> #1.0 MODEL"));
    assert!(listing.contains("-> #2.1 CLIP"));
    assert!(listing.contains("\"lora_a\""));
    assert!(listing.contains("(terminal)"));
    assert_eq!(listing.matches("(terminal)").count(), 1);
}

#[test]
fn test_handle_display() {
    let graph = Compiler::default()
        .compile(&create_direct_request())
        .unwrap()
        .graph;
    let handle = link(&graph, only(&graph, Operation::VaeDecode), "vae");
    assert_eq!(handle.to_string(), "#1.2 (VAE)");
    assert_eq!(
        serde_json::to_string(&handle).unwrap(),
        r#"["1",2]"#
    );
}
