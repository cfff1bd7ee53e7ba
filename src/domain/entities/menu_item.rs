use serde::{Deserialize, Serialize};
use std::fmt;

use crate::application::errors::DomainError;

/// Render an amount in cents as Brazilian reais, e.g. `R$ 35,90`
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}R$ {},{:02}", sign, abs / 100, abs % 100)
}

/// A product on the restaurant menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    id: String,
    name: String,
    description: String,
    price_cents: i64,
    category: String,
    available: bool,
    image_url: Option<String>,
}

impl MenuItem {
    /// Build a validated menu item. Text fields are trimmed.
    pub fn create(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        price_cents: i64,
        category: impl Into<String>,
        available: bool,
        image_url: Option<String>,
    ) -> Result<Self, DomainError> {
        let id = required(id.into(), "ID do item é obrigatório")?;
        let name = required(name.into(), "Nome do item é obrigatório")?;
        let description = required(description.into(), "Descrição do item é obrigatória")?;

        if price_cents <= 0 {
            return Err(DomainError::validation("Preço deve ser maior que zero"));
        }

        let category = required(category.into(), "Categoria é obrigatória")?;

        Ok(Self {
            id,
            name,
            description,
            price_cents,
            category,
            available,
            image_url: image_url.map(|u| u.trim().to_string()),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price_cents(&self) -> i64 {
        self.price_cents
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn format_price(&self) -> String {
        format_cents(self.price_cents)
    }

    /// Two-line text used in menu listings
    pub fn display_text(&self) -> String {
        format!("*{}* - {}\n{}", self.name, self.format_price(), self.description)
    }
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.format_price())
    }
}

fn required(value: String, msg: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(msg));
    }
    Ok(trimmed.to_string())
}
