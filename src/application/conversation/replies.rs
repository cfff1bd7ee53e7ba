//! Reply texts sent to the customer

use std::collections::BTreeMap;

use crate::domain::entities::{MenuItem, Order};

pub const INVALID_MAIN_MENU_OPTION: &str = "Opção inválida. Por favor, digite um número de 1 a 4.";
pub const INVALID_CATEGORY: &str = "Categoria inválida. Por favor, escolha um número válido.";
pub const INVALID_ITEM: &str = "Item inválido. Por favor, escolha um número válido.";
pub const INVALID_PAYMENT_OPTION: &str = "Opção inválida. Por favor, escolha 1, 2 ou 3.";
pub const INVALID_CONFIRMATION_OPTION: &str = "Por favor, digite 1 para confirmar ou 2 para cancelar.";
pub const INCOMPLETE_ADDRESS: &str = "Por favor, informe o endereço completo: Rua, Número, Bairro, Cidade";

pub const ASK_NAME: &str = "👤 *Dados do cliente*\n\nPor favor, informe seu nome completo:";
pub const ASK_EMAIL: &str = "📧 Agora informe seu email:";
pub const ASK_ADDRESS: &str =
    "📍 *Endereço de entrega*\n\nInforme seu endereço completo (rua, número, bairro, cidade):";

pub fn main_menu() -> String {
    "🍕 *Bem-vindo ao nosso restaurante!*\n\n\
     Olá! Que bom ter você aqui! 😊\n\n\
     Como posso ajudá-lo hoje?\n\n\
     *1* - 🛒 Fazer um pedido\n\
     *2* - 📋 Ver cardápio completo\n\
     *3* - 🕐 Horário de funcionamento\n\
     *4* - 📞 Falar com atendente\n\n\
     Digite o número da opção desejada:"
        .to_string()
}

pub fn categories(categories: &[String]) -> String {
    let mut text = String::from("🍽️ *NOSSO CARDÁPIO*\n\nEscolha uma categoria:\n\n");
    for (n, category) in categories.iter().enumerate() {
        text.push_str(&format!("*{}* - {}\n", n + 1, category));
    }
    text.push_str("\n*0* - Voltar ao menu principal");
    text
}

pub fn category_items(category: &str, items: &[MenuItem]) -> String {
    let mut text = format!("🍽️ *{}*\n\n", category.to_uppercase());
    for (n, item) in items.iter().enumerate() {
        text.push_str(&format!("*{}* - {}\n\n", n + 1, item.display_text()));
    }
    text.push_str("*0* - Voltar às categorias");
    text
}

/// Whole catalog grouped by category, categories in alphabetical order
pub fn full_menu(items: &[MenuItem]) -> String {
    let mut by_category: BTreeMap<&str, Vec<&MenuItem>> = BTreeMap::new();
    for item in items {
        by_category.entry(item.category()).or_default().push(item);
    }

    let mut text = String::from("📋 *CARDÁPIO COMPLETO*\n\n");
    for (category, items) in by_category {
        text.push_str(&format!("*{}*\n", category.to_uppercase()));
        for item in items {
            text.push_str(&format!("{}\n\n", item.display_text()));
        }
    }
    text.push_str("*1* - Fazer pedido\n*0* - Voltar");
    text
}

pub fn business_hours() -> String {
    "🕐 *HORÁRIO DE FUNCIONAMENTO*\n\n\
     Segunda a Quinta: 18:00 - 23:00\n\
     Sexta e Sábado: 18:00 - 00:00\n\
     Domingo: 18:00 - 22:00\n\n\
     🚚 *Delivery disponível em todo o horário!*\n\n\
     *1* - Fazer pedido\n\
     *0* - Voltar ao menu principal"
        .to_string()
}

pub fn transfer_to_agent() -> String {
    "👤 *Transferindo para atendente...*\n\n\
     Em breve um de nossos atendentes entrará em contato com você.\n\n\
     Enquanto isso, você pode:\n\
     *1* - Fazer pedido\n\
     *0* - Voltar ao menu principal"
        .to_string()
}

pub fn item_added(item: &MenuItem) -> String {
    format!(
        "✅ *{}* adicionado ao pedido!\n\n{}\n\n{}",
        item.name(),
        item.display_text(),
        ADD_MORE_OPTIONS
    )
}

const ADD_MORE_OPTIONS: &str = "*1* - Adicionar mais itens desta categoria\n\
     *2* - Escolher outra categoria\n\
     *3* - Finalizar pedido\n\
     *0* - Cancelar pedido";

pub fn invalid_add_more_option() -> String {
    format!("Opção inválida. Por favor, escolha:\n{}", ADD_MORE_OPTIONS)
}

pub fn payment_selection() -> String {
    "💳 *Forma de pagamento*\n\n\
     Escolha a forma de pagamento:\n\n\
     *1* - 💰 Dinheiro\n\
     *2* - 💳 Cartão (na entrega)\n\
     *3* - 📱 PIX\n\n\
     Digite o número da opção:"
        .to_string()
}

pub fn order_confirmation(order: &Order) -> String {
    let customer = order.customer();
    let address = customer
        .address()
        .map(|a| format!("{}, {}\n{}, {}", a.street, a.number, a.neighborhood, a.city))
        .unwrap_or_default();

    format!(
        "📋 *CONFIRMAÇÃO DO PEDIDO*\n\n{}\n\n\
         *Dados do cliente:*\nNome: {}\nTelefone: {}\nEmail: {}\n\n\
         *Endereço:*\n{}\n\n\
         *Pagamento:* {}\n\n\
         *1* - ✅ Confirmar pedido\n\
         *2* - ❌ Cancelar pedido",
        order.summary_text(),
        customer.name(),
        customer.phone(),
        customer.email().unwrap_or_default(),
        address,
        order.payment_method().label()
    )
}

pub fn order_confirmed() -> String {
    "🎉 *PEDIDO CONFIRMADO!*\n\n\
     Seu pedido foi recebido e está sendo preparado!\n\n\
     📧 Enviamos uma confirmação por email\n\
     ⏰ Tempo estimado: 30-45 minutos\n\
     📱 Você receberá atualizações do status\n\n\
     Obrigado pela preferência! 😊"
        .to_string()
}

pub fn order_cancelled() -> String {
    "❌ Pedido cancelado.\n\n\
     Como posso ajudá-lo?\n\n\
     *1* - 🛒 Fazer um pedido\n\
     *2* - 📋 Ver cardápio completo\n\
     *3* - 🕐 Horário de funcionamento\n\
     *4* - 📞 Falar com atendente"
        .to_string()
}
