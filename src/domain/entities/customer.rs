use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::application::errors::DomainError;

/// Country code 55 followed by area code and number
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^55\d{10,11}$").expect("static regex"));

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex"));

/// Delivery address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl Address {
    pub fn single_line(&self) -> String {
        format!("{}, {} - {}, {}", self.street, self.number, self.neighborhood, self.city)
    }
}

/// Customer placing an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    name: String,
    phone: String,
    email: Option<String>,
    address: Option<Address>,
}

impl Customer {
    pub fn create(
        name: &str,
        phone: &str,
        email: Option<&str>,
        address: Option<Address>,
    ) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("Nome do cliente é obrigatório"));
        }

        let phone = phone.trim();
        if phone.is_empty() {
            return Err(DomainError::validation("Telefone do cliente é obrigatório"));
        }

        if !is_valid_phone(phone) {
            return Err(DomainError::validation(
                "Telefone do cliente deve estar no formato válido",
            ));
        }

        let email = email.map(str::trim);
        if let Some(email) = email {
            if !is_valid_email(email) {
                return Err(DomainError::validation("Email do cliente deve ter formato válido"));
            }
        }

        Ok(Self {
            name: name.to_string(),
            phone: phone.to_string(),
            email: email.map(str::to_string),
            address,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    /// Name, phone, email and address are all present; required to place an order
    pub fn has_complete_data(&self) -> bool {
        !self.name.is_empty() && !self.phone.is_empty() && self.email.is_some() && self.address.is_some()
    }

    pub fn update_address(&self, address: Address) -> Customer {
        Customer {
            address: Some(address),
            ..self.clone()
        }
    }

    pub fn update_email(&self, email: &str) -> Result<Customer, DomainError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(DomainError::validation("Email deve ter formato válido"));
        }
        Ok(Customer {
            email: Some(email.to_string()),
            ..self.clone()
        })
    }
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}
