//! Product catalog: immutable reference data the ranker scores against.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Separator between vibe tags in the embedded text.
pub const VIBE_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub vibes: Vec<String>,
    pub price: f64,
    #[serde(default)]
    pub image_url: String,
}

impl CatalogItem {
    /// The only text the embedding provider sees for this item. Price and
    /// image never contribute.
    pub fn embedding_text(&self) -> String {
        format!(
            "{}. {}. Vibes: {}",
            self.name,
            self.description,
            self.vibes.join(VIBE_SEPARATOR)
        )
    }
}

/// Check the invariants every candidate list must hold: non-empty, unique
/// ids, finite non-negative prices.
pub fn validate_items(items: &[CatalogItem]) -> std::result::Result<(), String> {
    if items.is_empty() {
        return Err("candidate list is empty".to_string());
    }

    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if item.id.is_empty() {
            return Err(format!("item '{}' has an empty id", item.name));
        }
        if !seen.insert(item.id.as_str()) {
            return Err(format!("duplicate item id '{}'", item.id));
        }
        if !item.price.is_finite() || item.price < 0.0 {
            return Err(format!(
                "item '{}' has an invalid price {}",
                item.id, item.price
            ));
        }
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    pub fn new(items: Vec<CatalogItem>) -> Result<Self> {
        validate_items(&items).map_err(|e| anyhow::anyhow!("Invalid catalog: {e}"))?;
        Ok(Self { items })
    }

    /// Load a JSON array of items.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let items: Vec<CatalogItem> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse catalog {}", path.display()))?;
        let catalog = Self::new(items)?;
        info!("Loaded {} catalog items from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Load from `path` when given, otherwise the built-in demo catalog.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn builtin() -> Self {
        Self {
            items: builtin_items(),
        }
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn item(
    id: &str,
    name: &str,
    description: &str,
    vibes: &[&str],
    price: f64,
    image_url: &str,
) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        vibes: vibes.iter().map(|v| v.to_string()).collect(),
        price,
        image_url: image_url.to_string(),
    }
}

fn builtin_items() -> Vec<CatalogItem> {
    vec![
        item(
            "1",
            "Bohemian Sunset Dress",
            "Flowy maxi dress in warm earthy tones with intricate patterns. Perfect for festival vibes and carefree summer days. Features bell sleeves and a cinched waist for a flattering silhouette.",
            &["boho", "festival", "relaxed", "artistic"],
            89.99,
            "/assets/product-1.jpg",
        ),
        item(
            "2",
            "Urban Edge Leather Jacket",
            "Sleek black leather jacket with asymmetric zipper and silver hardware. Epitomizes energetic urban chic with a rebellious edge. Pairs perfectly with everything from dresses to jeans.",
            &["edgy", "urban", "bold", "modern"],
            249.99,
            "/assets/product-2.jpg",
        ),
        item(
            "3",
            "Cozy Cashmere Sweater",
            "Luxuriously soft oversized cashmere in warm cream. Ultimate comfort meets sophisticated simplicity. Perfect for cozy winter days and elegant lounging.",
            &["cozy", "elegant", "minimalist", "comfort"],
            179.99,
            "/assets/product-3.jpg",
        ),
        item(
            "4",
            "Athletic Flow Joggers",
            "Technical fabric joggers in sleek navy with reflective details. Combines athletic performance with street style sensibility. Moisture-wicking and incredibly versatile.",
            &["sporty", "energetic", "modern", "casual"],
            68.99,
            "/assets/product-4.jpg",
        ),
        item(
            "5",
            "Vintage Romance Blouse",
            "Delicate lace blouse in soft blush with pearl buttons. Channels vintage femininity with a contemporary twist. Features romantic puff sleeves and intricate detailing.",
            &["romantic", "vintage", "feminine", "elegant"],
            94.99,
            "/assets/product-5.jpg",
        ),
        item(
            "6",
            "Minimalist Linen Pants",
            "High-waisted linen trousers in natural beige. Clean lines and breathable fabric embody effortless sophistication. Perfect for warm weather and refined casual looks.",
            &["minimalist", "elegant", "natural", "sophisticated"],
            112.99,
            "/assets/product-6.jpg",
        ),
        item(
            "7",
            "Neon Statement Windbreaker",
            "Bold neon yellow windbreaker with geometric panels. Makes an energetic statement perfect for urban adventures. Water-resistant and impossible to miss.",
            &["bold", "energetic", "sporty", "urban"],
            79.99,
            "/assets/product-7.jpg",
        ),
        item(
            "8",
            "Artisan Knit Cardigan",
            "Hand-knit cardigan in rich terracotta with wooden buttons. Artisanal craftsmanship meets bohemian warmth. Each piece is unique with slight variations in pattern.",
            &["boho", "artisan", "cozy", "unique"],
            134.99,
            "/assets/product-8.jpg",
        ),
    ]
}
