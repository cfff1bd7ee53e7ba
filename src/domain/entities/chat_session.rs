use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::customer::Customer;
use super::order::Order;
use crate::application::errors::DomainError;

/// Conversation state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatState {
    Welcome,
    MainMenu,
    BrowsingMenu,
    AddingItems,
    AskToAddMoreItems,
    CollectingCustomerData,
    CollectingAddress,
    SelectingPayment,
    OrderConfirmation,
    OrderCompleted,
    Cancelled,
    /// A stored state name this build does not know; handled like `Welcome`
    #[serde(other)]
    Unrecognized,
}

impl ChatState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatState::Welcome => "WELCOME",
            ChatState::MainMenu => "MAIN_MENU",
            ChatState::BrowsingMenu => "BROWSING_MENU",
            ChatState::AddingItems => "ADDING_ITEMS",
            ChatState::AskToAddMoreItems => "ASK_TO_ADD_MORE_ITEMS",
            ChatState::CollectingCustomerData => "COLLECTING_CUSTOMER_DATA",
            ChatState::CollectingAddress => "COLLECTING_ADDRESS",
            ChatState::SelectingPayment => "SELECTING_PAYMENT",
            ChatState::OrderConfirmation => "ORDER_CONFIRMATION",
            ChatState::OrderCompleted => "ORDER_COMPLETED",
            ChatState::Cancelled => "CANCELLED",
            ChatState::Unrecognized => "UNRECOGNIZED",
        }
    }

    /// States where the user types free text (name, email, address)
    pub fn collects_free_text(&self) -> bool {
        matches!(self, ChatState::CollectingCustomerData | ChatState::CollectingAddress)
    }
}

impl fmt::Display for ChatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of the customer-data questionnaire
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "awaiting", rename_all = "snake_case")]
pub enum CustomerDraft {
    #[default]
    NotStarted,
    AwaitingName,
    AwaitingEmail { name: String },
    AwaitingAddress { name: String, email: String },
}

/// Scratch data carried between turns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatContext {
    pub current_category: Option<String>,
    pub selected_items: Vec<String>,
    pub customer_draft: CustomerDraft,
    pub last_message_time: DateTime<Utc>,
}

impl ChatContext {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            current_category: None,
            selected_items: Vec::new(),
            customer_draft: CustomerDraft::NotStarted,
            last_message_time: now,
        }
    }
}

/// Partial context update; only the fields that are set replace existing ones
#[derive(Debug, Clone, Default)]
pub struct ContextPatch {
    current_category: Option<String>,
    selected_items: Option<Vec<String>>,
    customer_draft: Option<CustomerDraft>,
}

impl ContextPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_category(mut self, category: impl Into<String>) -> Self {
        self.current_category = Some(category.into());
        self
    }

    pub fn selected_items(mut self, items: Vec<String>) -> Self {
        self.selected_items = Some(items);
        self
    }

    pub fn customer_draft(mut self, draft: CustomerDraft) -> Self {
        self.customer_draft = Some(draft);
        self
    }
}

/// Per-phone-number conversation. Transition methods never mutate `self`;
/// each returns a new session with `updated_at` and `last_message_time` refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    id: String,
    phone_number: String,
    state: ChatState,
    context: ChatContext,
    customer: Option<Customer>,
    current_order: Option<Order>,
    completed_orders: Vec<Order>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn create(phone_number: &str) -> Result<Self, DomainError> {
        let phone_number = phone_number.trim();
        if phone_number.is_empty() {
            return Err(DomainError::validation("Número de telefone é obrigatório"));
        }

        let now = Utc::now();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            phone_number: phone_number.to_string(),
            state: ChatState::Welcome,
            context: ChatContext::fresh(now),
            customer: None,
            current_order: None,
            completed_orders: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn context(&self) -> &ChatContext {
        &self.context
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn current_order(&self) -> Option<&Order> {
        self.current_order.as_ref()
    }

    pub fn completed_orders(&self) -> &[Order] {
        &self.completed_orders
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Records customer activity without changing anything else
    pub fn touch(&self) -> ChatSession {
        self.touched()
    }

    pub fn update_state(&self, state: ChatState) -> ChatSession {
        let mut next = self.touched();
        next.state = state;
        next
    }

    pub fn update_context(&self, patch: ContextPatch) -> ChatSession {
        let mut next = self.touched();
        if let Some(category) = patch.current_category {
            next.context.current_category = Some(category);
        }
        if let Some(items) = patch.selected_items {
            next.context.selected_items = items;
        }
        if let Some(draft) = patch.customer_draft {
            next.context.customer_draft = draft;
        }
        next
    }

    pub fn set_customer(&self, customer: Customer) -> ChatSession {
        let mut next = self.touched();
        next.customer = Some(customer);
        next
    }

    pub fn set_current_order(&self, order: Order) -> ChatSession {
        let mut next = self.touched();
        next.current_order = Some(order);
        next
    }

    /// Confirms the current order, archives it and resets the conversation scratch data
    pub fn complete_order(&self) -> Result<ChatSession, DomainError> {
        let order = self
            .current_order
            .as_ref()
            .ok_or_else(|| DomainError::invalid_operation("Nenhum pedido ativo para completar"))?;

        let confirmed = order.confirm()?;
        let mut next = self.touched();
        next.completed_orders.push(confirmed);
        next.current_order = None;
        next.state = ChatState::OrderCompleted;
        next.context = ChatContext::fresh(next.updated_at);
        Ok(next)
    }

    /// Drops the in-progress order and selection, back to the main menu
    pub fn cancel_order(&self) -> ChatSession {
        let mut next = self.touched();
        next.current_order = None;
        next.state = ChatState::MainMenu;
        next.context = ChatContext::fresh(next.updated_at);
        next
    }

    pub fn is_expired(&self, timeout_ms: u64) -> bool {
        let idle = Utc::now() - self.context.last_message_time;
        idle.num_milliseconds() > i64::try_from(timeout_ms).unwrap_or(i64::MAX)
    }

    pub fn has_active_order(&self) -> bool {
        self.current_order.is_some()
    }

    pub fn orders_count(&self) -> usize {
        self.completed_orders.len()
    }

    pub fn total_spent_cents(&self) -> i64 {
        self.completed_orders.iter().map(Order::total_cents).sum()
    }

    fn touched(&self) -> ChatSession {
        let now = Utc::now();
        let mut next = self.clone();
        next.updated_at = now;
        next.context.last_message_time = now;
        next
    }

    #[cfg(test)]
    pub(crate) fn with_last_message_time(&self, at: DateTime<Utc>) -> ChatSession {
        let mut next = self.clone();
        next.context.last_message_time = at;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::customer::Address;
    use crate::domain::entities::menu_item::MenuItem;
    use crate::domain::entities::order::{OrderItem, OrderStatus, PaymentMethod};
    use chrono::Duration;

    fn customer() -> Customer {
        let address = Address {
            street: "Rua A".to_string(),
            number: "1".to_string(),
            complement: None,
            neighborhood: "Boa Vista".to_string(),
            city: "Recife".to_string(),
            state: "Estado".to_string(),
            zip_code: "00000-000".to_string(),
        };
        Customer::create("Ana", "5581988887777", Some("ana@email.com"), Some(address)).unwrap()
    }

    fn order() -> Order {
        let item = MenuItem::create("7", "Suco Natural", "Laranja", 890, "Bebidas", true, None).unwrap();
        Order::create(customer(), vec![OrderItem::new(item, 1)], PaymentMethod::Pix, None, 500).unwrap()
    }

    #[test]
    fn test_create_starts_at_welcome() {
        let session = ChatSession::create(" 5581988887777 ").unwrap();
        assert_eq!(session.state(), ChatState::Welcome);
        assert_eq!(session.phone_number(), "5581988887777");
        assert!(session.context().selected_items.is_empty());
        assert_eq!(session.context().customer_draft, CustomerDraft::NotStarted);
    }

    #[test]
    fn test_create_rejects_blank_phone() {
        assert!(matches!(ChatSession::create("   "), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_update_state_leaves_original_untouched() {
        let original = ChatSession::create("5581988887777").unwrap();
        let next = original.update_state(ChatState::MainMenu);

        assert_eq!(original.state(), ChatState::Welcome);
        assert_eq!(next.state(), ChatState::MainMenu);
        assert_eq!(next.id(), original.id());
        assert_eq!(next.created_at(), original.created_at());
        assert!(next.updated_at() >= original.updated_at());
        assert!(next.context().last_message_time >= original.context().last_message_time);
    }

    #[test]
    fn test_update_context_merges() {
        let session = ChatSession::create("5581988887777")
            .unwrap()
            .update_context(ContextPatch::new().current_category("Pizzas").selected_items(vec!["1".into()]));
        let next = session.update_context(ContextPatch::new().selected_items(vec!["1".into(), "2".into()]));

        assert_eq!(next.context().current_category.as_deref(), Some("Pizzas"));
        assert_eq!(next.context().selected_items, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(session.context().selected_items, vec!["1".to_string()]);
        assert_eq!(next.state(), session.state());
    }

    #[test]
    fn test_setters_preserve_other_fields() {
        let session = ChatSession::create("5581988887777")
            .unwrap()
            .update_state(ChatState::SelectingPayment)
            .update_context(ContextPatch::new().current_category("Bebidas"));
        let with_customer = session.set_customer(customer());
        let with_order = with_customer.set_current_order(order());

        assert!(session.customer().is_none());
        assert!(with_customer.current_order().is_none());
        assert_eq!(with_order.customer(), Some(&customer()));
        assert_eq!(with_order.state(), ChatState::SelectingPayment);
        assert_eq!(with_order.context().current_category.as_deref(), Some("Bebidas"));
        assert!(with_order.has_active_order());
    }

    #[test]
    fn test_complete_order_requires_current_order() {
        let session = ChatSession::create("5581988887777").unwrap();
        assert!(matches!(session.complete_order(), Err(DomainError::InvalidOperation(_))));
    }

    #[test]
    fn test_complete_order_archives_and_resets() {
        let session = ChatSession::create("5581988887777")
            .unwrap()
            .update_context(ContextPatch::new().current_category("Bebidas").selected_items(vec!["7".into()]))
            .set_customer(customer())
            .set_current_order(order())
            .update_state(ChatState::OrderConfirmation);

        let done = session.complete_order().unwrap();
        assert_eq!(done.state(), ChatState::OrderCompleted);
        assert!(done.current_order().is_none());
        assert_eq!(done.orders_count(), 1);
        assert_eq!(done.completed_orders()[0].status(), OrderStatus::Confirmed);
        assert_eq!(done.total_spent_cents(), 890 + 500);
        assert!(done.context().selected_items.is_empty());
        assert!(done.context().current_category.is_none());
        assert!(session.has_active_order());
    }

    #[test]
    fn test_cancel_order_returns_to_main_menu() {
        let session = ChatSession::create("5581988887777")
            .unwrap()
            .update_context(ContextPatch::new().selected_items(vec!["7".into()]))
            .set_current_order(order())
            .update_state(ChatState::OrderConfirmation);

        let cancelled = session.cancel_order();
        assert_eq!(cancelled.state(), ChatState::MainMenu);
        assert!(cancelled.current_order().is_none());
        assert!(cancelled.context().selected_items.is_empty());
        assert_eq!(cancelled.orders_count(), 0);
    }

    #[test]
    fn test_is_expired() {
        let session = ChatSession::create("5581988887777").unwrap();
        assert!(!session.is_expired(30 * 60 * 1000));

        let stale = session.with_last_message_time(Utc::now() - Duration::minutes(31));
        assert!(stale.is_expired(30 * 60 * 1000));
        assert!(!stale.is_expired(60 * 60 * 1000));
    }

    #[test]
    fn test_unknown_state_deserializes_as_unrecognized() {
        let state: ChatState = serde_json::from_str("\"PAYMENT_PENDING\"").unwrap();
        assert_eq!(state, ChatState::Unrecognized);
        let state: ChatState = serde_json::from_str("\"ASK_TO_ADD_MORE_ITEMS\"").unwrap();
        assert_eq!(state, ChatState::AskToAddMoreItems);
    }

    #[test]
    fn test_session_json_roundtrip_keeps_draft() {
        let session = ChatSession::create("5581988887777").unwrap().update_context(
            ContextPatch::new().customer_draft(CustomerDraft::AwaitingEmail { name: "Ana".into() }),
        );
        let json = serde_json::to_string(&session).unwrap();
        let back: ChatSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
