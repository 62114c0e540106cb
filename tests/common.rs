//! Common test utilities for building requests and inspecting compiled graphs.
use kousei::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;

/// The direct-generation request used throughout the tests.
///
/// `a cat`, 20 steps, cfg 7, euler/normal, seed 42, 512x512, batch 1, `m.safetensors`.
#[allow(dead_code)]
pub fn create_direct_request() -> GenerationRequest {
    let mut request = GenerationRequest::new(
        Source::Direct {
            width: 512,
            height: 512,
        },
        "a cat",
    );
    request.steps = 20;
    request.cfg_scale = 7.0;
    request.sampler_name = "euler".to_string();
    request.scheduler = "normal".to_string();
    request.seed = Seed::Fixed(42);
    request.batch_size = 1;
    request.checkpoint = "m.safetensors".to_string();
    request
}

/// Two adapters, `lora_a` at 0.8 then `lora_b` at 1.0.
#[allow(dead_code)]
pub fn create_adapters() -> Vec<AdapterSpec> {
    vec![
        AdapterSpec::new("lora_a", 0.8),
        AdapterSpec::new("lora_b", 1.0),
    ]
}

#[allow(dead_code)]
pub fn create_image_guided_request() -> GenerationRequest {
    let mut request = create_direct_request();
    request.source = Source::ImageGuided {
        image: "source.png".to_string(),
        denoise: 0.6,
    };
    request
}

#[allow(dead_code)]
pub fn create_inpaint_request() -> GenerationRequest {
    let mut request = create_direct_request();
    request.source = Source::Inpaint {
        image: "source.png".to_string(),
        mask: "mask.png".to_string(),
        denoise: 0.9,
    };
    request
}

/// Every variant, each with and without adapters and VAE override.
#[allow(dead_code)]
pub fn create_request_matrix() -> Vec<GenerationRequest> {
    let bases = [
        create_direct_request(),
        create_image_guided_request(),
        create_inpaint_request(),
    ];
    let mut requests = Vec::new();
    for base in bases {
        for adapters in [Vec::new(), vec![AdapterSpec::new("only", 0.5)], create_adapters()] {
            for vae in [None, Some("override.vae.safetensors".to_string())] {
                let mut request = base.clone();
                request.adapters = adapters.clone();
                request.vae = vae;
                requests.push(request);
            }
        }
    }
    requests
}

#[allow(dead_code)]
pub fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(0x5eed)
}

/// The handle wired into input `name` of node `id`.
#[allow(dead_code)]
pub fn link(graph: &Graph, id: NodeId, name: &str) -> Handle {
    *graph
        .get(id)
        .and_then(|node| node.input(name))
        .and_then(Input::as_handle)
        .unwrap_or_else(|| panic!("node {} has no link named {}", id, name))
}

/// The literal given to input `name` of node `id`.
#[allow(dead_code)]
pub fn literal(graph: &Graph, id: NodeId, name: &str) -> Literal {
    graph
        .get(id)
        .and_then(|node| node.input(name))
        .and_then(Input::as_literal)
        .cloned()
        .unwrap_or_else(|| panic!("node {} has no literal named {}", id, name))
}

/// The single node of `operation`, panicking if there is not exactly one.
#[allow(dead_code)]
pub fn only(graph: &Graph, operation: Operation) -> NodeId {
    let ids: Vec<NodeId> = graph.nodes_of(operation).map(|(id, _)| id).collect();
    assert_eq!(ids.len(), 1, "expected exactly one {} node", operation);
    ids[0]
}

/// Operations in creation order.
#[allow(dead_code)]
pub fn operations(graph: &Graph) -> Vec<Operation> {
    graph.iter().map(|(_, node)| node.operation).collect()
}

/// Scratch directory for tests that write files.
#[allow(dead_code)]
pub fn setup_test_dir() -> PathBuf {
    std::env::temp_dir().join("kousei_tests")
}
