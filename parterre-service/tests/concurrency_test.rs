use std::collections::HashSet;
use std::sync::Arc;

use parterre_service::{HoldStrategy, ReservationService, SeatStatus};
use parterre_store::app_config::ReservationRules;
use parterre_store::{MemoryLockProvider, MemorySeatStore};
use rand::Rng;

fn seats(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

fn service() -> ReservationService {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();

    ReservationService::new(
        Arc::new(MemorySeatStore::new()),
        Arc::new(MemoryLockProvider::new()),
        &ReservationRules::default(),
    )
    .unwrap()
}

/// Across N concurrent holds on one seat with distinct claimants, exactly
/// one wins.
async fn assert_single_winner(strategy: HoldStrategy, contenders: usize) {
    let svc = Arc::new(service());
    svc.init_seats(&seats(&["A1"])).await.unwrap();

    let mut handles = Vec::with_capacity(contenders);
    for i in 0..contenders {
        let svc = svc.clone();
        handles.push(tokio::spawn(async move {
            svc.hold_with(strategy, "A1", &format!("user{}", i))
                .await
                .unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_mutual_exclusion_optimistic() {
    assert_single_winner(HoldStrategy::Optimistic, 100).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_mutual_exclusion_pessimistic() {
    assert_single_winner(HoldStrategy::Pessimistic, 100).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_sale_confirmed_at_most_once_under_concurrency() {
    let svc = Arc::new(service());
    svc.init_seats(&seats(&["A1"])).await.unwrap();
    assert!(svc.hold("A1", "u1").await.unwrap());

    let mut handles = Vec::new();
    for _ in 0..50 {
        let svc = svc.clone();
        handles.push(tokio::spawn(
            async move { svc.confirm("A1", "u1").await.unwrap() },
        ));
    }

    let mut confirmed = 0;
    for handle in handles {
        if handle.await.unwrap() {
            confirmed += 1;
        }
    }
    assert_eq!(confirmed, 1);
    assert_eq!(svc.status("A1").await.unwrap(), SeatStatus::Sold);
}

/// Repeated hold-then-confirm-or-release cycles with random payment
/// failures: every seat must eventually sell and none may wedge in HELD.
async fn churn_until_sold_out(strategy: HoldStrategy) {
    let svc = service();
    let ids = seats(&["A1", "A2", "A3", "A4", "A5"]);
    svc.init_seats(&ids).await.unwrap();

    let mut sold: HashSet<String> = HashSet::new();
    let mut next_user = 0u32;
    let mut attempts = 0u32;

    while sold.len() < ids.len() {
        attempts += 1;
        assert!(attempts < 10_000, "seats never sold out");

        let open: Vec<&String> = ids.iter().filter(|s| !sold.contains(*s)).collect();
        let seat = open[rand::thread_rng().gen_range(0..open.len())];
        let claimant = format!("user{}", next_user);
        next_user += 1;

        if !svc.hold_with(strategy, seat, &claimant).await.unwrap() {
            continue;
        }

        // Payment succeeds or fails at random
        let confirmed = if rand::thread_rng().gen_bool(0.5) {
            svc.confirm(seat, &claimant).await.unwrap()
        } else {
            false
        };

        if confirmed {
            sold.insert(seat.clone());
        } else {
            svc.release(seat, &claimant).await.unwrap();
        }
    }

    for seat in &ids {
        assert_eq!(svc.status(seat).await.unwrap(), SeatStatus::Sold);
    }
}

#[tokio::test]
async fn test_churn_sells_out_optimistic() {
    churn_until_sold_out(HoldStrategy::Optimistic).await;
}

#[tokio::test]
async fn test_churn_sells_out_pessimistic() {
    churn_until_sold_out(HoldStrategy::Pessimistic).await;
}
