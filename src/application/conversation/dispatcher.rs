//! Conversation dispatcher - routes each turn to the handler for the session state

use std::sync::Arc;

use super::parser::Input;
use super::replies;
use crate::application::errors::{DomainError, ProcessError};
use crate::domain::entities::{
    Address, ChatSession, ChatState, ContextPatch, Customer, CustomerDraft, Order, OrderItem,
    PaymentMethod,
};
use crate::domain::traits::MenuRepository;

/// Fixed delivery fee added to every order, in cents
pub const DEFAULT_DELIVERY_FEE_CENTS: i64 = 500;

const DEFAULT_CITY: &str = "Cidade";
const PLACEHOLDER_STATE: &str = "Estado";
const PLACEHOLDER_ZIP: &str = "00000-000";

/// Side effect requested by a handler, run by the caller after the session is saved
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SendOrderConfirmation(Order),
}

/// Outcome of one turn: the next session, the reply text and any side effects
#[derive(Debug)]
pub struct Transition {
    pub session: ChatSession,
    pub reply: Option<String>,
    pub effects: Vec<Effect>,
}

impl Transition {
    pub fn reply(session: ChatSession, text: impl Into<String>) -> Self {
        Self {
            session,
            reply: Some(text.into()),
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

pub type HandlerResult = Result<Transition, ProcessError>;

/// Whether going back to the category list keeps the items picked so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    Keep,
    Reset,
}

/// The ordering conversation: one handler per state, reading the menu catalog
/// but never writing anything.
pub struct ConversationFlow {
    menu: Arc<dyn MenuRepository>,
    delivery_fee_cents: i64,
}

impl ConversationFlow {
    pub fn new(menu: Arc<dyn MenuRepository>) -> Self {
        Self {
            menu,
            delivery_fee_cents: DEFAULT_DELIVERY_FEE_CENTS,
        }
    }

    pub fn with_delivery_fee(mut self, cents: i64) -> Self {
        self.delivery_fee_cents = cents;
        self
    }

    pub async fn dispatch(&self, session: &ChatSession, raw: &str) -> HandlerResult {
        let input = Input::parse(session.state(), raw);

        match session.state() {
            ChatState::Welcome
            | ChatState::OrderCompleted
            | ChatState::Cancelled
            | ChatState::Unrecognized => Ok(self.welcome(session)),
            ChatState::MainMenu => self.main_menu(session, &input).await,
            ChatState::BrowsingMenu => self.browsing_menu(session, &input).await,
            ChatState::AddingItems => self.adding_items(session, &input).await,
            ChatState::AskToAddMoreItems => self.ask_to_add_more_items(session, &input).await,
            ChatState::CollectingCustomerData => Ok(self.collecting_customer_data(session, &input)),
            ChatState::CollectingAddress => self.collecting_address(session, &input),
            ChatState::SelectingPayment => self.selecting_payment(session, &input).await,
            ChatState::OrderConfirmation => self.order_confirmation(session, &input),
        }
    }

    fn welcome(&self, session: &ChatSession) -> Transition {
        Transition::reply(session.update_state(ChatState::MainMenu), replies::main_menu())
    }

    async fn main_menu(&self, session: &ChatSession, input: &Input) -> HandlerResult {
        match input.as_str() {
            "1" => self.browse_categories(session, Selection::Reset).await,
            "2" => {
                let items = self.menu.find_available_items().await?;
                Ok(Transition::reply(session.clone(), replies::full_menu(&items)))
            }
            "3" => Ok(Transition::reply(session.clone(), replies::business_hours())),
            "4" => Ok(Transition::reply(session.clone(), replies::transfer_to_agent())),
            _ => Ok(Transition::reply(session.clone(), replies::INVALID_MAIN_MENU_OPTION)),
        }
    }

    async fn browse_categories(&self, session: &ChatSession, selection: Selection) -> HandlerResult {
        let categories = self.menu.get_categories().await?;

        let mut next = session.update_state(ChatState::BrowsingMenu);
        if selection == Selection::Reset {
            next = next.update_context(ContextPatch::new().selected_items(Vec::new()));
        }

        Ok(Transition::reply(next, replies::categories(&categories)))
    }

    async fn browsing_menu(&self, session: &ChatSession, input: &Input) -> HandlerResult {
        if input.is("0") {
            return Ok(self.welcome(session));
        }

        let categories = self.menu.get_categories().await?;
        let Some(index) = input.choice(categories.len()) else {
            return Ok(Transition::reply(session.clone(), replies::INVALID_CATEGORY));
        };

        let category = &categories[index];
        let items = self.menu.find_items_by_category(category).await?;

        Ok(Transition::reply(
            session
                .update_state(ChatState::AddingItems)
                .update_context(ContextPatch::new().current_category(category.as_str())),
            replies::category_items(category, &items),
        ))
    }

    async fn adding_items(&self, session: &ChatSession, input: &Input) -> HandlerResult {
        let category = match &session.context().current_category {
            Some(category) if !input.is("0") => category,
            _ => return self.browse_categories(session, Selection::Reset).await,
        };

        let items = self.menu.find_items_by_category(category).await?;
        let Some(index) = input.choice(items.len()) else {
            return Ok(Transition::reply(session.clone(), replies::INVALID_ITEM));
        };

        let item = &items[index];
        let mut selected = session.context().selected_items.clone();
        selected.push(item.id().to_string());

        Ok(Transition::reply(
            session
                .update_state(ChatState::AskToAddMoreItems)
                .update_context(ContextPatch::new().selected_items(selected)),
            replies::item_added(item),
        ))
    }

    async fn ask_to_add_more_items(&self, session: &ChatSession, input: &Input) -> HandlerResult {
        match input.as_str() {
            "1" => {
                let Some(category) = &session.context().current_category else {
                    return self.browse_categories(session, Selection::Reset).await;
                };
                let items = self.menu.find_items_by_category(category).await?;
                Ok(Transition::reply(
                    session.update_state(ChatState::AddingItems),
                    replies::category_items(category, &items),
                ))
            }
            // only path back to the categories that keeps the cart
            "2" => self.browse_categories(session, Selection::Keep).await,
            "3" => {
                if session.context().selected_items.is_empty() {
                    return self.browse_categories(session, Selection::Reset).await;
                }
                Ok(Transition::reply(
                    session
                        .update_state(ChatState::CollectingCustomerData)
                        .update_context(ContextPatch::new().customer_draft(CustomerDraft::AwaitingName)),
                    replies::ASK_NAME,
                ))
            }
            "0" => self.browse_categories(session, Selection::Reset).await,
            _ => Ok(Transition::reply(session.clone(), replies::invalid_add_more_option())),
        }
    }

    /// Name and email are stored as typed; they are validated when the
    /// customer is built from the address step.
    fn collecting_customer_data(&self, session: &ChatSession, input: &Input) -> Transition {
        let ask_name = |session: &ChatSession| {
            Transition::reply(
                session.update_context(ContextPatch::new().customer_draft(CustomerDraft::AwaitingName)),
                replies::ASK_NAME,
            )
        };

        match &session.context().customer_draft {
            CustomerDraft::NotStarted | CustomerDraft::AwaitingAddress { .. } => ask_name(session),
            CustomerDraft::AwaitingName => Transition::reply(
                session.update_context(ContextPatch::new().customer_draft(CustomerDraft::AwaitingEmail {
                    name: input.as_str().to_string(),
                })),
                replies::ASK_EMAIL,
            ),
            CustomerDraft::AwaitingEmail { name } => Transition::reply(
                session
                    .update_context(ContextPatch::new().customer_draft(CustomerDraft::AwaitingAddress {
                        name: name.clone(),
                        email: input.as_str().to_string(),
                    }))
                    .update_state(ChatState::CollectingAddress),
                replies::ASK_ADDRESS,
            ),
        }
    }

    fn collecting_address(&self, session: &ChatSession, input: &Input) -> HandlerResult {
        let parts = input.comma_parts();
        if parts.len() < 3 {
            return Ok(Transition::reply(session.clone(), replies::INCOMPLETE_ADDRESS));
        }

        let city = parts.get(3).filter(|c| !c.is_empty()).unwrap_or(&DEFAULT_CITY);
        let address = Address {
            street: parts[0].to_string(),
            number: parts[1].to_string(),
            complement: None,
            neighborhood: parts[2].to_string(),
            city: city.to_string(),
            state: PLACEHOLDER_STATE.to_string(),
            zip_code: PLACEHOLDER_ZIP.to_string(),
        };

        let (name, email) = match &session.context().customer_draft {
            CustomerDraft::AwaitingAddress { name, email } => (name.as_str(), Some(email.as_str())),
            CustomerDraft::AwaitingEmail { name } => (name.as_str(), None),
            CustomerDraft::NotStarted | CustomerDraft::AwaitingName => ("", None),
        };

        let customer = Customer::create(name, session.phone_number(), email, Some(address))?;

        Ok(Transition::reply(
            session.set_customer(customer).update_state(ChatState::SelectingPayment),
            replies::payment_selection(),
        ))
    }

    async fn selecting_payment(&self, session: &ChatSession, input: &Input) -> HandlerResult {
        let Some(payment_method) = PaymentMethod::from_option(input.as_str()) else {
            return Ok(Transition::reply(session.clone(), replies::INVALID_PAYMENT_OPTION));
        };

        let mut lines = Vec::new();
        for id in &session.context().selected_items {
            match self.menu.find_item_by_id(id).await? {
                Some(item) => lines.push(OrderItem::new(item, 1)),
                None => tracing::debug!(item_id = %id, "Selected item no longer on the menu, skipping"),
            }
        }

        if lines.is_empty() {
            return self.browse_categories(session, Selection::Reset).await;
        }

        let customer = session
            .customer()
            .cloned()
            .ok_or_else(|| DomainError::invalid_operation("Dados do cliente não informados"))?;
        let order = Order::create(customer, lines, payment_method, None, self.delivery_fee_cents)?;
        let reply = replies::order_confirmation(&order);

        Ok(Transition::reply(
            session.set_current_order(order).update_state(ChatState::OrderConfirmation),
            reply,
        ))
    }

    fn order_confirmation(&self, session: &ChatSession, input: &Input) -> HandlerResult {
        match input.as_str() {
            "1" => {
                let completed = session.complete_order()?;
                let confirmed = completed.completed_orders().last().cloned();
                let mut transition = Transition::reply(completed, replies::order_confirmed());
                if let Some(order) = confirmed {
                    transition = transition.with_effect(Effect::SendOrderConfirmation(order));
                }
                Ok(transition)
            }
            "2" => Ok(Transition::reply(session.cancel_order(), replies::order_cancelled())),
            _ => Ok(Transition::reply(session.clone(), replies::INVALID_CONFIRMATION_OPTION)),
        }
    }
}
