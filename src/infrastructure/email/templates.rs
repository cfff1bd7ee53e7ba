//! Email subjects and bodies for order notifications

use crate::domain::entities::{format_cents, Order, OrderStatus};

/// Rendered email ready to hand to a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
    pub text: String,
}

const STYLE: &str = "body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
.container { max-width: 600px; margin: 0 auto; padding: 20px; }
.header { color: white; padding: 20px; text-align: center; }
.confirmed { background-color: #4CAF50; }
.update { background-color: #2196F3; }
table { width: 100%; border-collapse: collapse; margin: 20px 0; }
th, td { padding: 10px; text-align: left; border-bottom: 1px solid #ddd; }
.footer { text-align: center; margin-top: 30px; padding-top: 20px; border-top: 1px solid #ddd; }";

const FOOTER: &str = "Em caso de dúvidas, entre em contato conosco pelo WhatsApp";

pub fn status_message(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "Recebemos seu pedido e ele aguarda confirmação.",
        OrderStatus::Confirmed => "Seu pedido foi confirmado e está sendo preparado.",
        OrderStatus::Preparing => "Estamos preparando seu pedido com muito carinho.",
        OrderStatus::Ready => "Seu pedido está pronto! O entregador já saiu para a entrega.",
        OrderStatus::Delivered => "Pedido entregue com sucesso! Esperamos que tenha gostado.",
        OrderStatus::Cancelled => "Seu pedido foi cancelado. Em caso de dúvidas, entre em contato conosco.",
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, header_class: &str, heading: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<div class=\"container\">\n<div class=\"header {header_class}\"><h1>{heading}</h1></div>\n<div class=\"content\">\n{body}\n</div>\n<div class=\"footer\"><p>{FOOTER}</p></div>\n</div>\n</body>\n</html>\n"
    )
}

fn address_lines(order: &Order) -> Vec<String> {
    match order.customer().address() {
        Some(a) => vec![
            format!("{}, {}", a.street, a.number),
            a.neighborhood.clone(),
            format!("{} - {}", a.city, a.state),
        ],
        None => Vec::new(),
    }
}

pub fn order_confirmation(order: &Order) -> EmailContent {
    let subject = format!("Pedido Confirmado #{}", order.short_id());
    let name = order.customer().name();

    let mut rows = String::new();
    for item in order.items() {
        rows.push_str(&format!(
            "<tr><td>{}x</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            item.quantity,
            escape(item.menu_item.name()),
            item.menu_item.format_price(),
            format_cents(item.subtotal_cents())
        ));
    }
    if order.delivery_fee_cents() > 0 {
        rows.push_str(&format!(
            "<tr><td></td><td><strong>Taxa de Entrega</strong></td><td></td><td>{}</td></tr>\n",
            format_cents(order.delivery_fee_cents())
        ));
    }
    rows.push_str(&format!(
        "<tr><td></td><td><strong>TOTAL</strong></td><td></td><td><strong>{}</strong></td></tr>\n",
        order.format_total()
    ));

    let address_html = address_lines(order)
        .iter()
        .map(|l| escape(l))
        .collect::<Vec<_>>()
        .join("<br>\n");

    let body = format!(
        "<p>Olá <strong>{}</strong>,</p>\n\
         <p>Seu pedido foi confirmado com sucesso! Estamos preparando tudo com muito carinho.</p>\n\
         <h3>Detalhes do Pedido #{}</h3>\n\
         <table>\n<thead><tr><th>Qtd</th><th>Item</th><th>Preço Unit.</th><th>Subtotal</th></tr></thead>\n<tbody>\n{}</tbody>\n</table>\n\
         <p><strong>Endereço de Entrega:</strong></p>\n<p>{}</p>\n\
         <p><strong>Forma de Pagamento:</strong> {}</p>\n\
         <p><strong>⏰ Tempo estimado:</strong> 30-45 minutos</p>\n\
         <p>Obrigado pela preferência!</p>",
        escape(name),
        order.short_id(),
        rows,
        address_html,
        order.payment_method().label()
    );

    let items_text = order
        .items()
        .iter()
        .map(|i| format!("{}x {} - {}", i.quantity, i.menu_item.name(), format_cents(i.subtotal_cents())))
        .collect::<Vec<_>>()
        .join("\n");
    let fee_text = if order.delivery_fee_cents() > 0 {
        format!("\nTaxa de Entrega: {}", format_cents(order.delivery_fee_cents()))
    } else {
        String::new()
    };

    let text = format!(
        "PEDIDO CONFIRMADO!\n\nOlá {},\n\nSeu pedido foi confirmado com sucesso!\n\nPedido #{}\n\nITENS:\n{}{}\n\nTOTAL: {}\n\nENDEREÇO:\n{}\n\nPAGAMENTO: {}\n\nTempo estimado: 30-45 minutos\n\nObrigado pela preferência!\n",
        name,
        order.short_id(),
        items_text,
        fee_text,
        order.format_total(),
        address_lines(order).join("\n"),
        order.payment_method().label()
    );

    EmailContent {
        subject,
        html: page("Pedido Confirmado", "confirmed", "🎉 Pedido Confirmado!", &body),
        text,
    }
}

pub fn status_update(order: &Order, status: OrderStatus) -> EmailContent {
    let subject = format!("Atualização do Pedido #{} - {}", order.short_id(), status.label());
    let name = order.customer().name();
    let message = status_message(status);

    let body = format!(
        "<p>Olá <strong>{}</strong>,</p>\n<h3>Pedido #{}</h3>\n<p><strong>Status:</strong> {}</p>\n<p>{}</p>\n<p>Obrigado pela preferência!</p>",
        escape(name),
        order.short_id(),
        status.label(),
        message
    );

    let text = format!(
        "ATUALIZAÇÃO DO PEDIDO\n\nOlá {},\n\nPedido #{}\nStatus: {}\n\n{}\n\nObrigado pela preferência!\n",
        name,
        order.short_id(),
        status.label(),
        message
    );

    EmailContent {
        subject,
        html: page("Atualização do Pedido", "update", "📱 Atualização do Pedido", &body),
        text,
    }
}
