//! Performance benchmarks for critical game systems

use server::catalog::Catalog;
use server::inventory::BoosterInventory;
use server::player::{Outbound, Player, PlayerId};
use server::session::{Match, MatchId};
use shared::parse_line;
use std::sync::Arc;
use std::time::Instant;

/// Benchmarks line classification, the hottest path on every connection
#[test]
fn benchmark_line_parsing() {
    let lines = [
        "/entrar",
        "/jogar 12",
        r#"{"action": "play_card", "card_id": 7}"#,
        r#"{"acao": "fim_turno"}"#,
        "hello everyone",
        "/dance",
    ];

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let _ = parse_line(lines[i % lines.len()]);
    }

    let duration = start.elapsed();
    println!(
        "Line parsing: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 1s for 100k lines
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks dealing starting hands
#[test]
fn benchmark_hand_dealing() {
    let catalog = Catalog::standard();
    let mut rng = rand::thread_rng();

    let iterations = 50_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let hand = catalog.deal(&mut rng, 5);
        assert_eq!(hand.len(), 5);
    }

    let duration = start.elapsed();
    println!("Hand dealing: {} hands in {:?}", iterations, duration);

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks booster inventory generation at a much larger size than the default
#[tokio::test]
async fn benchmark_booster_generation() {
    let catalog = Catalog::standard();

    let start = Instant::now();
    let inventory = BoosterInventory::generate(&catalog, 20_000, &mut rand::thread_rng());
    let generated = start.elapsed();

    let start = Instant::now();
    let mut taken = 0;
    while inventory.take_one().await.is_some() {
        taken += 1;
    }
    let drained = start.elapsed();

    println!(
        "Boosters: generated 20000 in {:?}, drained {} in {:?}",
        generated, taken, drained
    );

    assert_eq!(taken, 20_000);
    assert!(generated.as_millis() < 1000);
    assert!(drained.as_millis() < 1000);
}

/// Stress test: many short matches played to completion
#[test]
fn stress_test_many_matches() {
    let catalog = Catalog::standard();
    let epic = catalog.get(21).unwrap().clone();

    let matches = 10_000;
    let start = Instant::now();

    for i in 0..matches {
        let (alice_out, _alice_rx) = Outbound::channel(1);
        let (bob_out, _bob_rx) = Outbound::channel(1);
        let alice = Arc::new(Player::new(PlayerId(1), "Alice", alice_out));
        let bob = Arc::new(Player::new(PlayerId(2), "Bob", bob_out));

        let mut game = Match::new(
            MatchId(i),
            alice,
            bob,
            [vec![epic.clone(); 3], vec![epic.clone(); 3]],
            100,
        );
        for _ in 0..3 {
            game.play_card(PlayerId(1), 21).unwrap();
        }
        assert!(game.is_finished());
    }

    let duration = start.elapsed();
    println!("Played {} matches in {:?}", matches, duration);

    assert!(duration.as_millis() < 2000);
}
