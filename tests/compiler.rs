//! Tests for graph assembly: node sequences, wiring through optional stages, seeds.
mod common;
use common::*;
use itertools::Itertools;
use kousei::graph::analysis;
use kousei::prelude::*;

#[test]
fn test_direct_request_compiles_to_seven_nodes() {
    let workflow = Compiler::default()
        .compile(&create_direct_request())
        .expect("Failed to compile");
    let graph = &workflow.graph;

    assert_eq!(
        operations(graph),
        vec![
            Operation::CheckpointLoader,
            Operation::TextEncode,
            Operation::TextEncode,
            Operation::EmptyLatent,
            Operation::Sampler,
            Operation::VaeDecode,
            Operation::SaveImage,
        ]
    );
    let ids: Vec<u32> = graph.iter().map(|(id, _)| id.get()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);

    let sampler = only(graph, Operation::Sampler);
    assert_eq!(literal(graph, sampler, "seed"), Literal::Integer(42));
    assert_eq!(literal(graph, sampler, "steps"), Literal::Integer(20));
    assert_eq!(literal(graph, sampler, "cfg"), Literal::Float(7.0));
    assert_eq!(literal(graph, sampler, "denoise"), Literal::Float(1.0));
    assert_eq!(workflow.seed, 42);
}

#[test]
fn test_direct_request_with_two_adapters_compiles_to_nine_nodes() {
    let mut request = create_direct_request();
    request.adapters = create_adapters();
    let graph = Compiler::default().compile(&request).unwrap().graph;

    assert_eq!(graph.len(), 9);
    let loras: Vec<NodeId> = graph
        .nodes_of(Operation::LoraLoader)
        .map(|(id, _)| id)
        .collect();
    assert_eq!(loras.len(), 2);
    assert_eq!(
        literal(&graph, loras[0], "lora_name"),
        Literal::Text("lora_a".to_string())
    );
    assert_eq!(
        literal(&graph, loras[0], "strength_model"),
        Literal::Float(0.8)
    );
    assert_eq!(
        literal(&graph, loras[0], "strength_clip"),
        Literal::Float(0.8)
    );
    assert_eq!(
        literal(&graph, loras[1], "lora_name"),
        Literal::Text("lora_b".to_string())
    );

    // The save node's upstream chain passes through both adapters, in request order.
    let save = only(&graph, Operation::SaveImage);
    let upstream = analysis::ancestors(&graph, save);
    let chain: Vec<NodeId> = upstream
        .into_iter()
        .filter(|id| loras.contains(id))
        .collect();
    assert_eq!(chain, loras);
}

#[test]
fn test_without_adapters_encoders_read_the_checkpoint_clip() {
    for request in [
        create_direct_request(),
        create_image_guided_request(),
        create_inpaint_request(),
    ] {
        let graph = Compiler::default().compile(&request).unwrap().graph;
        let loader = only(&graph, Operation::CheckpointLoader);
        for (encoder, _) in graph.nodes_of(Operation::TextEncode) {
            let clip = link(&graph, encoder, "clip");
            assert_eq!(clip.node, loader);
            assert_eq!(clip.slot, 1);
            assert_eq!(clip.kind, DataKind::Clip);
        }
        assert_eq!(graph.count_of(Operation::LoraLoader), 0);
    }
}

#[test]
fn test_adapters_chain_left_to_right() {
    let mut request = create_direct_request();
    request.adapters = (0..4)
        .map(|i| AdapterSpec::new(format!("lora_{}", i), 0.25 * i as f64))
        .collect();
    let graph = Compiler::default().compile(&request).unwrap().graph;

    let loader = only(&graph, Operation::CheckpointLoader);
    let loras: Vec<NodeId> = graph
        .nodes_of(Operation::LoraLoader)
        .map(|(id, _)| id)
        .collect();
    assert_eq!(loras.len(), 4);

    assert_eq!(link(&graph, loras[0], "model").node, loader);
    assert_eq!(link(&graph, loras[0], "clip").node, loader);
    for (previous, current) in loras.iter().tuple_windows() {
        assert_eq!(link(&graph, *current, "model").node, *previous);
        assert_eq!(link(&graph, *current, "clip").node, *previous);
    }

    let last = *loras.last().unwrap();
    for (encoder, _) in graph.nodes_of(Operation::TextEncode) {
        assert_eq!(link(&graph, encoder, "clip").node, last);
    }
    let sampler = only(&graph, Operation::Sampler);
    let model = link(&graph, sampler, "model");
    assert_eq!((model.node, model.slot), (last, 0));

    for (i, id) in loras.iter().enumerate() {
        assert_eq!(
            literal(&graph, *id, "lora_name"),
            Literal::Text(format!("lora_{}", i))
        );
    }
}

#[test]
fn test_vae_override_feeds_encode_and_decode() {
    for base in [create_image_guided_request(), create_inpaint_request()] {
        let mut request = base;
        request.vae = Some("better.vae.safetensors".to_string());
        let graph = Compiler::default().compile(&request).unwrap().graph;

        let vae_loader = only(&graph, Operation::VaeLoader);
        let encoder = graph
            .nodes_of(Operation::VaeEncode)
            .chain(graph.nodes_of(Operation::VaeEncodeInpaint))
            .map(|(id, _)| id)
            .next()
            .expect("an encode node");
        let decoder = only(&graph, Operation::VaeDecode);

        assert_eq!(link(&graph, encoder, "vae").node, vae_loader);
        assert_eq!(link(&graph, decoder, "vae").node, vae_loader);
    }
}

#[test]
fn test_without_vae_override_decode_uses_checkpoint_vae() {
    let graph = Compiler::default()
        .compile(&create_direct_request())
        .unwrap()
        .graph;
    let loader = only(&graph, Operation::CheckpointLoader);
    let vae = link(&graph, only(&graph, Operation::VaeDecode), "vae");
    assert_eq!((vae.node, vae.slot, vae.kind), (loader, 2, DataKind::Vae));
    assert_eq!(graph.count_of(Operation::VaeLoader), 0);
}

#[test]
fn test_variant_source_stages() {
    let compiler = Compiler::default();

    let direct = compiler.compile(&create_direct_request()).unwrap().graph;
    assert_eq!(direct.count_of(Operation::EmptyLatent), 1);
    assert_eq!(direct.count_of(Operation::LoadImage), 0);
    assert_eq!(direct.count_of(Operation::LoadMask), 0);
    assert_eq!(direct.count_of(Operation::VaeEncode), 0);
    assert_eq!(direct.count_of(Operation::VaeEncodeInpaint), 0);

    let guided = compiler
        .compile(&create_image_guided_request())
        .unwrap()
        .graph;
    assert_eq!(guided.count_of(Operation::LoadImage), 1);
    assert_eq!(guided.count_of(Operation::VaeEncode), 1);
    assert_eq!(guided.count_of(Operation::LoadMask), 0);
    assert_eq!(guided.count_of(Operation::VaeEncodeInpaint), 0);
    assert_eq!(guided.count_of(Operation::EmptyLatent), 0);

    let inpaint = compiler.compile(&create_inpaint_request()).unwrap().graph;
    assert_eq!(inpaint.count_of(Operation::LoadImage), 1);
    assert_eq!(inpaint.count_of(Operation::LoadMask), 1);
    assert_eq!(inpaint.count_of(Operation::VaeEncodeInpaint), 1);
    assert_eq!(inpaint.count_of(Operation::VaeEncode), 0);
    assert_eq!(inpaint.count_of(Operation::EmptyLatent), 0);
}

#[test]
fn test_inpaint_wiring_and_denoise() {
    let graph = Compiler::default()
        .compile(&create_inpaint_request())
        .unwrap()
        .graph;

    let image = only(&graph, Operation::LoadImage);
    let mask = only(&graph, Operation::LoadMask);
    let encode = only(&graph, Operation::VaeEncodeInpaint);
    let sampler = only(&graph, Operation::Sampler);

    assert_eq!(link(&graph, encode, "pixels").node, image);
    assert_eq!(link(&graph, encode, "mask").node, mask);
    assert_eq!(literal(&graph, encode, "grow_mask_by"), Literal::Integer(6));
    assert_eq!(
        literal(&graph, mask, "channel"),
        Literal::Text("red".to_string())
    );
    assert_eq!(link(&graph, sampler, "latent_image").node, encode);
    assert_eq!(literal(&graph, sampler, "denoise"), Literal::Float(0.9));
}

#[test]
fn test_image_guided_uses_request_denoise() {
    let graph = Compiler::default()
        .compile(&create_image_guided_request())
        .unwrap()
        .graph;
    let sampler = only(&graph, Operation::Sampler);
    let encode = only(&graph, Operation::VaeEncode);
    assert_eq!(literal(&graph, sampler, "denoise"), Literal::Float(0.6));
    assert_eq!(link(&graph, sampler, "latent_image").node, encode);
    assert_eq!(
        link(&graph, encode, "pixels").node,
        only(&graph, Operation::LoadImage)
    );
}

#[test]
fn test_empty_latent_carries_dimensions_and_batch() {
    let mut request = create_direct_request();
    request.source = Source::Direct {
        width: 768,
        height: 640,
    };
    request.batch_size = 4;
    let graph = Compiler::default().compile(&request).unwrap().graph;
    let latent = only(&graph, Operation::EmptyLatent);
    assert_eq!(literal(&graph, latent, "width"), Literal::Integer(768));
    assert_eq!(literal(&graph, latent, "height"), Literal::Integer(640));
    assert_eq!(literal(&graph, latent, "batch_size"), Literal::Integer(4));
}

#[test]
fn test_random_seed_is_resolved_per_compilation() {
    let mut request = create_direct_request();
    request.seed = Seed::Random;
    let compiler = Compiler::default();

    let first = compiler.compile(&request).unwrap();
    let second = compiler.compile(&request).unwrap();
    assert_ne!(first.seed, second.seed);

    for workflow in [&first, &second] {
        let sampler = only(&workflow.graph, Operation::Sampler);
        assert_eq!(
            literal(&workflow.graph, sampler, "seed"),
            Literal::Integer(workflow.seed)
        );
    }
}

#[test]
fn test_random_seed_follows_the_supplied_rng() {
    let mut request = create_direct_request();
    request.seed = Seed::Random;
    let compiler = Compiler::default();

    let a = compiler
        .compile_with_rng(&request, &mut seeded_rng())
        .unwrap();
    let b = compiler
        .compile_with_rng(&request, &mut seeded_rng())
        .unwrap();
    assert_eq!(a.seed, b.seed);
}

#[test]
fn test_fixed_seed_ignores_the_rng() {
    let request = create_direct_request();
    let workflow = Compiler::default()
        .compile_with_rng(&request, &mut seeded_rng())
        .unwrap();
    assert_eq!(workflow.seed, 42);
}

#[test]
fn test_ids_restart_for_every_compilation() {
    let compiler = Compiler::default();
    let mut long = create_inpaint_request();
    long.adapters = create_adapters();
    let _ = compiler.compile(&long).unwrap();

    let graph = compiler.compile(&create_direct_request()).unwrap().graph;
    let first = graph.iter().next().map(|(id, _)| id.get());
    assert_eq!(first, Some(1));
}

#[test]
fn test_filename_prefixes_tag_each_variant() {
    let compiler = Compiler::builder()
        .with_filename_prefix(Variant::ImageGuided, "guided")
        .build();

    let cases = [
        (create_direct_request(), "kousei_txt2img"),
        (create_image_guided_request(), "guided"),
        (create_inpaint_request(), "kousei_inpaint"),
    ];
    for (request, prefix) in cases {
        let workflow = compiler.compile(&request).unwrap();
        let save = workflow.terminal().expect("a save node");
        assert_eq!(
            literal(&workflow.graph, save, "filename_prefix"),
            Literal::Text(prefix.to_string())
        );
    }
}

#[test]
fn test_mask_growth_is_configurable() {
    let compiler = Compiler::builder().with_mask_growth(12).build();
    let graph = compiler.compile(&create_inpaint_request()).unwrap().graph;
    let encode = only(&graph, Operation::VaeEncodeInpaint);
    assert_eq!(literal(&graph, encode, "grow_mask_by"), Literal::Integer(12));
}

#[test]
fn test_pixel_sources_are_emitted_before_adapters() {
    let mut request = create_image_guided_request();
    request.adapters = create_adapters();
    request.vae = Some("v.safetensors".to_string());
    let graph = Compiler::default().compile(&request).unwrap().graph;

    assert_eq!(
        operations(&graph),
        vec![
            Operation::CheckpointLoader,
            Operation::VaeLoader,
            Operation::LoadImage,
            Operation::VaeEncode,
            Operation::LoraLoader,
            Operation::LoraLoader,
            Operation::TextEncode,
            Operation::TextEncode,
            Operation::Sampler,
            Operation::VaeDecode,
            Operation::SaveImage,
        ]
    );
}
