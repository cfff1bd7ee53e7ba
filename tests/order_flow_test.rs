//! Order flow integration tests against the SQLite store
//! Run with: cargo test --test order_flow_test

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use order_bot::application::services::{ProcessMessageRequest, ProcessMessageUseCase, SessionCleanupService};
use order_bot::domain::entities::{ChatState, PaymentMethod};
use order_bot::domain::traits::{ChatSessionRepository, OutboundMessage};
use order_bot::infrastructure::adapters::ConsoleMessenger;
use order_bot::infrastructure::database::SqliteStore;
use order_bot::infrastructure::email::LogEmailService;
use order_bot::infrastructure::storage::default_catalog;

const PHONE: &str = "5511987654321";

fn build_use_case(store: Arc<SqliteStore>) -> (ProcessMessageUseCase, mpsc::UnboundedReceiver<OutboundMessage>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let use_case = ProcessMessageUseCase::new(
        store.clone(),
        store,
        Arc::new(ConsoleMessenger::new().with_sender(tx)),
        Arc::new(LogEmailService),
    );
    (use_case, rx)
}

async fn say(use_case: &ProcessMessageUseCase, messages: &[&str]) {
    for message in messages {
        let response = use_case.execute(ProcessMessageRequest::new(PHONE, *message)).await;
        assert!(response.success, "'{}' failed: {:?}", message, response.error);
    }
}

fn temp_db() -> PathBuf {
    std::env::temp_dir().join(format!("order-bot-{}.db", uuid::Uuid::new_v4()))
}

#[tokio::test]
async fn test_full_order_with_sqlite_store() {
    let store = Arc::new(SqliteStore::open_in_memory(&default_catalog()).unwrap());
    let (use_case, mut replies) = build_use_case(store.clone());

    say(
        &use_case,
        &[
            "oi",
            "1",
            "4",
            "2",
            "2",
            "2",
            "1",
            "3",
            "Maria Souza",
            "maria@example.com",
            "Rua das Flores, 123, Centro, São Paulo",
            "3",
        ],
    )
    .await;

    let session = store.find_by_phone_number(PHONE).await.unwrap().unwrap();
    assert_eq!(session.state(), ChatState::OrderConfirmation);
    let order = session.current_order().unwrap();
    assert_eq!(order.payment_method(), PaymentMethod::Pix);
    assert_eq!(order.total_cents(), 5240);

    say(&use_case, &["1"]).await;

    let session = store.find_by_phone_number(PHONE).await.unwrap().unwrap();
    assert_eq!(session.state(), ChatState::OrderCompleted);
    assert_eq!(session.orders_count(), 1);

    let mut sent = Vec::new();
    while let Ok(message) = replies.try_recv() {
        sent.push(message);
    }
    assert_eq!(sent.len(), 13);
    assert!(sent.iter().all(|m| m.chat_number == PHONE));
    assert!(sent[11].text.contains("*Total: R$ 52,40*"));
}

#[tokio::test]
async fn test_conversation_survives_reopening_the_database() {
    let path = temp_db();

    {
        let store = Arc::new(SqliteStore::open(&path, &default_catalog()).unwrap());
        let (use_case, _replies) = build_use_case(store);
        say(&use_case, &["oi", "1", "4", "1"]).await;
    }

    let store = Arc::new(SqliteStore::open(&path, &default_catalog()).unwrap());
    let session = store.find_by_phone_number(PHONE).await.unwrap().unwrap();
    assert_eq!(session.state(), ChatState::AskToAddMoreItems);
    assert_eq!(session.context().selected_items, vec!["1"]);

    let (use_case, _replies) = build_use_case(store.clone());
    say(&use_case, &["3"]).await;
    let session = store.find_by_phone_number(PHONE).await.unwrap().unwrap();
    assert_eq!(session.state(), ChatState::CollectingCustomerData);

    drop(use_case);
    drop(store);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_cleanup_removes_idle_sessions() {
    let store = Arc::new(SqliteStore::open_in_memory(&default_catalog()).unwrap());
    let (use_case, _replies) = build_use_case(store.clone());
    say(&use_case, &["oi"]).await;

    let cleanup = SessionCleanupService::new(store.clone(), 60_000);
    assert_eq!(cleanup.run_once().await.unwrap(), 0);
    assert!(store.find_by_phone_number(PHONE).await.unwrap().is_some());

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let cleanup = SessionCleanupService::new(store.clone(), 5);
    assert_eq!(cleanup.run_once().await.unwrap(), 1);
    assert!(store.find_by_phone_number(PHONE).await.unwrap().is_none());
}
