//! End-to-end lifecycle scenarios against an in-memory store and a
//! recording push sender: the full ready → reminder → lost-turn arc, and
//! the manager PIN first-access semantics.

use std::sync::Arc;

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use pager_server::db::MIGRATOR;
use pager_server::db::repository::{manager_pin, order as order_repo};
use pager_server::lifecycle::LifecycleEngine;
use pager_server::message::MessageBus;
use pager_server::push::MockPushSender;
use shared::models::{OrderCreate, OrderStatus, OrderUpdate};
use shared::push::PushKind;

async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    pool
}

fn engine_for(pool: &SqlitePool, sender: &MockPushSender) -> LifecycleEngine {
    LifecycleEngine::new(pool.clone(), Arc::new(sender.clone()), MessageBus::new(32))
}

#[tokio::test]
async fn ready_reminder_lost_turn_arc() {
    let pool = test_pool().await;
    let sender = MockPushSender::new();
    let engine = engine_for(&pool, &sender);

    // Guest ticket sits in the preparation queue with a push token
    let order = order_repo::create(
        &pool,
        OrderCreate {
            status: Some(OrderStatus::Pending),
            fcm_token: Some("T".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let original_created_at = order.created_at;

    // Manager marks it ready: the write-triggered path fires exactly once
    let (before, after) = order_repo::update(
        &pool,
        order.id,
        OrderUpdate {
            status: Some(OrderStatus::Ready),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let t0 = 1_000_000;
    engine.handle_update(&before, &after, t0).await;

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].data.kind, PushKind::InitialReady);
    assert_eq!(sent[0].data.pin, order.pin);

    let stored = order_repo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(stored.notification_sent_at, Some(t0));
    assert_eq!(stored.notification_count, 0);

    // 31 s later the first reminder goes out
    assert_eq!(engine.run_escalations(t0 + 31_000).await, 1);
    let stored = order_repo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(stored.notification_count, 1);
    assert!(stored.is_relance());

    // 65 s: second reminder (due at 60 s)
    assert_eq!(engine.run_escalations(t0 + 65_000).await, 1);
    let stored = order_repo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(stored.notification_count, 2);

    // 95 s: third firing is the lost turn, not a third reminder
    assert_eq!(engine.run_escalations(t0 + 95_000).await, 1);

    let sent = sender.sent();
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[1].data.kind, PushKind::Reminder);
    assert_eq!(sent[2].data.kind, PushKind::Reminder);
    assert_eq!(sent[3].data.kind, PushKind::LostTurn);
    // The lost-turn payload tells the guest screen to show pending again
    assert_eq!(sent[3].data.status, OrderStatus::Pending);

    let stored = order_repo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
    assert_eq!(stored.notification_count, 0);
    assert!(stored.notification_sent_at.is_none());
    // Back of the preparation queue
    assert_eq!(stored.created_at, t0 + 95_000);
    assert!(stored.created_at > original_created_at);

    // Recycled order is quiet until a manager marks it ready again
    assert_eq!(engine.run_escalations(t0 + 1_000_000).await, 0);
    assert_eq!(sender.sent_count(), 4);
}

#[tokio::test]
async fn tokenless_order_goes_through_the_arc_silently() {
    let pool = test_pool().await;
    let sender = MockPushSender::new();
    let engine = engine_for(&pool, &sender);

    let order = order_repo::create(
        &pool,
        OrderCreate {
            status: Some(OrderStatus::Pending),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let (before, after) = order_repo::update(
        &pool,
        order.id,
        OrderUpdate {
            status: Some(OrderStatus::Ready),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    engine.handle_update(&before, &after, 0).await;
    engine.run_escalations(120_000).await;

    // Zero sends, zero engine patches
    assert_eq!(sender.sent_count(), 0);
    let stored = order_repo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Ready);
    assert!(stored.notification_sent_at.is_none());
    assert_eq!(stored.notification_count, 0);
}

#[tokio::test]
async fn manager_pin_first_access_is_idempotent() {
    let pool = test_pool().await;

    // Two "screens" load the manager PIN at the same time on an empty
    // store: exactly one effective value, consistent across both
    let (a, b) = tokio::join!(
        manager_pin::get_or_create(&pool),
        manager_pin::get_or_create(&pool)
    );
    let a = a.unwrap();
    let b = b.unwrap();
    assert_eq!(a.pin, b.pin);
    assert_eq!(a.pin, manager_pin::DEFAULT_PIN);

    // A manager changes it; subsequent reads agree
    manager_pin::set(&pool, "AB12").await.unwrap();
    assert_eq!(manager_pin::get_or_create(&pool).await.unwrap().pin, "AB12");
}
