//! Menu catalog held in memory, seeded from the built-in list or a YAML file

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

use crate::application::errors::StorageError;
use crate::domain::entities::MenuItem;
use crate::domain::traits::MenuRepository;

const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/150";

/// One catalog entry as written in the YAML file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CatalogEntry {
    id: String,
    name: String,
    description: String,
    price_cents: i64,
    category: String,
    #[serde(default = "default_available")]
    available: bool,
    #[serde(default)]
    image_url: Option<String>,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    items: Vec<CatalogEntry>,
}

/// The restaurant's standard menu
pub fn default_catalog() -> Vec<MenuItem> {
    let entries: [(&str, &str, &str, i64, &str); 10] = [
        ("1", "Pizza Margherita", "Pizza tradicional com molho de tomate, mussarela e manjericão", 3590, "Pizzas"),
        ("2", "Pizza Pepperoni", "Pizza com molho de tomate, mussarela e pepperoni", 4290, "Pizzas"),
        ("3", "Pizza Portuguesa", "Pizza com presunto, ovos, cebola, azeitona e ervilha", 3990, "Pizzas"),
        ("4", "Hambúrguer Clássico", "Hambúrguer com carne bovina, alface, tomate e maionese", 1890, "Hambúrgueres"),
        ("5", "Hambúrguer Bacon", "Hambúrguer com carne, bacon, queijo e molho especial", 2290, "Hambúrgueres"),
        ("6", "Refrigerante Lata", "Coca-Cola, Pepsi, Guaraná ou Fanta - 350ml", 450, "Bebidas"),
        ("7", "Suco Natural", "Suco de laranja, limão ou maracujá - 500ml", 890, "Bebidas"),
        ("8", "Água Mineral", "Água mineral sem gás - 500ml", 300, "Bebidas"),
        ("9", "Batata Frita", "Porção de batata frita crocante", 1290, "Acompanhamentos"),
        ("10", "Onion Rings", "Anéis de cebola empanados e fritos", 1490, "Acompanhamentos"),
    ];

    entries
        .into_iter()
        .filter_map(|(id, name, description, price_cents, category)| {
            MenuItem::create(
                id,
                name,
                description,
                price_cents,
                category,
                true,
                Some(PLACEHOLDER_IMAGE.to_string()),
            )
            .ok()
        })
        .collect()
}

/// Load a catalog from a YAML file of the form `items: [{id, name, ...}]`.
/// Entries failing validation are rejected with the offending id.
pub fn load_catalog(path: &Path) -> Result<Vec<MenuItem>, StorageError> {
    let content = std::fs::read_to_string(path)?;
    parse_catalog(&content)
}

fn parse_catalog(content: &str) -> Result<Vec<MenuItem>, StorageError> {
    let file: CatalogFile =
        serde_yaml::from_str(content).map_err(|e| StorageError::Serialization(e.to_string()))?;

    file.items
        .into_iter()
        .map(|entry| {
            let id = entry.id.clone();
            MenuItem::create(
                entry.id,
                entry.name,
                entry.description,
                entry.price_cents,
                entry.category,
                entry.available,
                entry.image_url,
            )
            .map_err(|e| StorageError::Serialization(format!("menu item {}: {}", id, e)))
        })
        .collect()
}

/// Read-only menu repository over a fixed list of items
#[derive(Debug, Clone)]
pub struct InMemoryMenuRepository {
    items: Vec<MenuItem>,
}

impl InMemoryMenuRepository {
    pub fn new(items: Vec<MenuItem>) -> Self {
        Self { items }
    }
}

impl Default for InMemoryMenuRepository {
    fn default() -> Self {
        Self::new(default_catalog())
    }
}

#[async_trait]
impl MenuRepository for InMemoryMenuRepository {
    async fn find_all_items(&self) -> Result<Vec<MenuItem>, StorageError> {
        Ok(self.items.clone())
    }

    async fn find_items_by_category(&self, category: &str) -> Result<Vec<MenuItem>, StorageError> {
        let wanted = category.to_lowercase();
        Ok(self
            .items
            .iter()
            .filter(|i| i.is_available() && i.category().to_lowercase() == wanted)
            .cloned()
            .collect())
    }

    async fn find_item_by_id(&self, id: &str) -> Result<Option<MenuItem>, StorageError> {
        Ok(self.items.iter().find(|i| i.id() == id).cloned())
    }

    async fn find_available_items(&self) -> Result<Vec<MenuItem>, StorageError> {
        Ok(self.items.iter().filter(|i| i.is_available()).cloned().collect())
    }

    async fn get_categories(&self) -> Result<Vec<String>, StorageError> {
        let mut categories: Vec<String> = self
            .items
            .iter()
            .filter(|i| i.is_available())
            .map(|i| i.category().to_string())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }
}
