#![allow(dead_code)]

pub mod embedding_mock;

use vibe_matcher::{CatalogItem, SimpleEmbedder};

pub use embedding_mock::{MockEmbeddingConfig, MockEmbeddingServer, MockHandle, MOCK_API_KEY};

/// Catalog item with just a name; description and vibes left empty.
pub fn named_item(id: &str, name: &str) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        vibes: Vec::new(),
        price: 49.99,
        image_url: String::new(),
    }
}

pub fn unit(dims: usize, axis: usize) -> Vec<f32> {
    let mut v = vec![0.0; dims];
    v[axis] = 1.0;
    v
}

/// Real HTTP embedder pointed at a running mock.
pub fn embedder_for(handle: &MockHandle) -> SimpleEmbedder {
    SimpleEmbedder::new(MOCK_API_KEY.to_string())
        .expect("client")
        .with_base_url(handle.url.clone())
}
