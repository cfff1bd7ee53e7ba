use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::customer::Customer;
use super::menu_item::{format_cents, MenuItem};
use crate::application::errors::DomainError;

/// A menu item with its quantity inside an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub menu_item: MenuItem,
    pub quantity: u32,
    pub notes: Option<String>,
}

impl OrderItem {
    pub fn new(menu_item: MenuItem, quantity: u32) -> Self {
        Self {
            menu_item,
            quantity,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn subtotal_cents(&self) -> i64 {
        self.menu_item.price_cents() * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Customer-facing label
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pendente",
            OrderStatus::Confirmed => "Confirmado",
            OrderStatus::Preparing => "Em preparo",
            OrderStatus::Ready => "Pronto",
            OrderStatus::Delivered => "Entregue",
            OrderStatus::Cancelled => "Cancelado",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Pix,
}

impl PaymentMethod {
    /// Maps the payment menu option ("1", "2", "3")
    pub fn from_option(option: &str) -> Option<Self> {
        match option {
            "1" => Some(PaymentMethod::Cash),
            "2" => Some(PaymentMethod::Card),
            "3" => Some(PaymentMethod::Pix),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Dinheiro",
            PaymentMethod::Card => "Cartão",
            PaymentMethod::Pix => "PIX",
        }
    }
}

/// A customer order. Every change produces a new value with the total recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: String,
    customer: Customer,
    items: Vec<OrderItem>,
    status: OrderStatus,
    payment_method: PaymentMethod,
    created_at: DateTime<Utc>,
    total_cents: i64,
    observations: Option<String>,
    delivery_fee_cents: i64,
}

impl Order {
    pub fn create(
        customer: Customer,
        items: Vec<OrderItem>,
        payment_method: PaymentMethod,
        observations: Option<String>,
        delivery_fee_cents: i64,
    ) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::validation("Pedido deve ter pelo menos um item"));
        }

        if items.iter().any(|i| i.quantity == 0) {
            return Err(DomainError::validation("Quantidade deve ser maior que zero"));
        }

        if !customer.has_complete_data() {
            return Err(DomainError::validation("Dados do cliente incompletos"));
        }

        if delivery_fee_cents < 0 {
            return Err(DomainError::validation("Taxa de entrega não pode ser negativa"));
        }

        let total_cents = items_total(&items) + delivery_fee_cents;

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            customer,
            items,
            status: OrderStatus::Pending,
            payment_method,
            created_at: Utc::now(),
            total_cents,
            observations,
            delivery_fee_cents,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// First eight characters of the id, used in customer-facing references
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn total_cents(&self) -> i64 {
        self.total_cents
    }

    pub fn delivery_fee_cents(&self) -> i64 {
        self.delivery_fee_cents
    }

    pub fn observations(&self) -> Option<&str> {
        self.observations.as_deref()
    }

    pub fn add_item(
        &self,
        menu_item: MenuItem,
        quantity: u32,
        notes: Option<String>,
    ) -> Result<Order, DomainError> {
        if !menu_item.is_available() {
            return Err(DomainError::validation("Item não está disponível"));
        }

        if quantity == 0 {
            return Err(DomainError::validation("Quantidade deve ser maior que zero"));
        }

        let mut items = self.items.clone();
        items.push(OrderItem {
            menu_item,
            quantity,
            notes,
        });
        Ok(self.with_items(items))
    }

    /// Removes every line for the given menu item id
    pub fn remove_item(&self, menu_item_id: &str) -> Result<Order, DomainError> {
        let items: Vec<OrderItem> = self
            .items
            .iter()
            .filter(|i| i.menu_item.id() != menu_item_id)
            .cloned()
            .collect();

        if items.is_empty() {
            return Err(DomainError::validation("Pedido deve ter pelo menos um item"));
        }

        Ok(self.with_items(items))
    }

    pub fn update_status(&self, status: OrderStatus) -> Order {
        Order {
            status,
            ..self.clone()
        }
    }

    pub fn confirm(&self) -> Result<Order, DomainError> {
        if self.status != OrderStatus::Pending {
            return Err(DomainError::invalid_operation(
                "Apenas pedidos pendentes podem ser confirmados",
            ));
        }
        Ok(self.update_status(OrderStatus::Confirmed))
    }

    pub fn cancel(&self) -> Result<Order, DomainError> {
        if self.status == OrderStatus::Delivered {
            return Err(DomainError::invalid_operation(
                "Pedidos entregues não podem ser cancelados",
            ));
        }
        Ok(self.update_status(OrderStatus::Cancelled))
    }

    pub fn format_total(&self) -> String {
        format_cents(self.total_cents)
    }

    pub fn items_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn summary_text(&self) -> String {
        let items_text = self
            .items
            .iter()
            .map(|i| format!("{}x {} - {}", i.quantity, i.menu_item.name(), i.menu_item.format_price()))
            .collect::<Vec<_>>()
            .join("\n");

        let delivery_text = if self.delivery_fee_cents > 0 {
            format!("\nTaxa de entrega: {}", format_cents(self.delivery_fee_cents))
        } else {
            String::new()
        };

        format!(
            "*RESUMO DO PEDIDO*\n\n{}{}\n\n*Total: {}*",
            items_text,
            delivery_text,
            self.format_total()
        )
    }

    fn with_items(&self, items: Vec<OrderItem>) -> Order {
        Order {
            total_cents: items_total(&items) + self.delivery_fee_cents,
            items,
            ..self.clone()
        }
    }
}

fn items_total(items: &[OrderItem]) -> i64 {
    items.iter().map(OrderItem::subtotal_cents).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::customer::Address;
    use proptest::prelude::*;

    fn customer() -> Customer {
        let address = Address {
            street: "Rua A".to_string(),
            number: "10".to_string(),
            complement: None,
            neighborhood: "Centro".to_string(),
            city: "Recife".to_string(),
            state: "PE".to_string(),
            zip_code: "50000-000".to_string(),
        };
        Customer::create("Maria", "5581999999999", Some("maria@email.com"), Some(address)).unwrap()
    }

    fn item(id: &str, price_cents: i64) -> MenuItem {
        MenuItem::create(id, format!("Item {}", id), "desc", price_cents, "Pizzas", true, None).unwrap()
    }

    #[test]
    fn test_create_computes_total_with_delivery_fee() {
        let order = Order::create(
            customer(),
            vec![OrderItem::new(item("1", 3590), 2)],
            PaymentMethod::Pix,
            None,
            500,
        )
        .unwrap();
        assert_eq!(order.total_cents(), 3590 * 2 + 500);
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.items_count(), 2);
        assert_eq!(order.format_total(), "R$ 76,80");
    }

    #[test]
    fn test_create_requires_items_and_complete_customer() {
        assert!(Order::create(customer(), vec![], PaymentMethod::Cash, None, 0).is_err());

        let partial = Customer::create("Maria", "5581999999999", None, None).unwrap();
        let err = Order::create(partial, vec![OrderItem::new(item("1", 100), 1)], PaymentMethod::Cash, None, 0)
            .unwrap_err();
        assert_eq!(err, DomainError::validation("Dados do cliente incompletos"));
    }

    #[test]
    fn test_total_after_add_and_remove() {
        let order = Order::create(customer(), vec![OrderItem::new(item("1", 1000), 1)], PaymentMethod::Card, None, 500)
            .unwrap();
        let order = order.add_item(item("2", 250), 2, None).unwrap();
        let order = order.add_item(item("3", 1890), 1, Some("sem cebola".to_string())).unwrap();
        assert_eq!(order.total_cents(), 1000 + 500 + 1890 + 500);

        let order = order.remove_item("2").unwrap();
        assert_eq!(order.total_cents(), 1000 + 1890 + 500);
        assert_eq!(order.items().len(), 2);
    }

    #[test]
    fn test_cannot_remove_last_item() {
        let order = Order::create(customer(), vec![OrderItem::new(item("1", 1000), 1)], PaymentMethod::Card, None, 0)
            .unwrap();
        assert!(order.remove_item("1").is_err());
    }

    #[test]
    fn test_add_item_rejects_unavailable_and_zero_quantity() {
        let order = Order::create(customer(), vec![OrderItem::new(item("1", 1000), 1)], PaymentMethod::Card, None, 0)
            .unwrap();
        let unavailable = MenuItem::create("9", "Sorvete", "desc", 900, "Sobremesas", false, None).unwrap();
        assert!(order.add_item(unavailable, 1, None).is_err());
        assert!(order.add_item(item("2", 100), 0, None).is_err());
    }

    #[test]
    fn test_status_lifecycle() {
        let order = Order::create(customer(), vec![OrderItem::new(item("1", 1000), 1)], PaymentMethod::Cash, None, 0)
            .unwrap();
        let confirmed = order.confirm().unwrap();
        assert_eq!(confirmed.status(), OrderStatus::Confirmed);
        assert!(confirmed.confirm().is_err());

        let delivered = confirmed.update_status(OrderStatus::Delivered);
        assert!(delivered.cancel().is_err());
        assert_eq!(order.cancel().unwrap().status(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_summary_text() {
        let order = Order::create(customer(), vec![OrderItem::new(item("1", 3590), 1)], PaymentMethod::Cash, None, 500)
            .unwrap();
        assert_eq!(
            order.summary_text(),
            "*RESUMO DO PEDIDO*\n\n1x Item 1 - R$ 35,90\nTaxa de entrega: R$ 5,00\n\n*Total: R$ 40,90*"
        );
    }

    proptest! {
        #[test]
        fn prop_total_is_sum_of_lines_plus_fee(
            lines in prop::collection::vec((1i64..100_000, 1u32..10), 1..8),
            fee in 0i64..2_000,
        ) {
            let items: Vec<OrderItem> = lines
                .iter()
                .enumerate()
                .map(|(n, (price, qty))| OrderItem::new(item(&n.to_string(), *price), *qty))
                .collect();
            let expected: i64 = lines.iter().map(|(p, q)| p * i64::from(*q)).sum::<i64>() + fee;
            let order = Order::create(customer(), items, PaymentMethod::Pix, None, fee).unwrap();
            prop_assert_eq!(order.total_cents(), expected);
        }
    }
}
