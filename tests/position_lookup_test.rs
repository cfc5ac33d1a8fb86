//! Integration tests: explorer and evaluation lookups are cached per
//! position for the life of a session.

mod common;

use common::{session, FakeContentStore, FakePositionService, RUY_LOPEZ};
use viewer::position_cache::CacheStatus;
use viewer::{GameRef, ViewerError};

const MASTER_ID: &str = "AbCd1234";

async fn until(cond: impl Fn() -> bool) {
    while !cond() {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_lookups_cached_per_position() {
    let positions = FakePositionService::default();
    let s = session(&FakeContentStore::default(), &positions);
    s.load_game(GameRef::Archive("1".into()), RUY_LOPEZ).unwrap();

    assert_eq!(s.view().unwrap().exploration, CacheStatus::Miss);
    let first = s.explore_current().await.unwrap();
    let again = s.explore_current().await.unwrap();
    assert_eq!(positions.explore_calls(), 1);
    assert_eq!(first, again);
    assert_eq!(s.view().unwrap().exploration, CacheStatus::Hit);

    s.step_forward();
    s.explore_current().await.unwrap();
    assert_eq!(positions.explore_calls(), 2);

    s.step_backward();
    s.explore_current().await.unwrap();
    assert_eq!(positions.explore_calls(), 2);
}

#[tokio::test]
async fn test_concurrent_lookups_share_one_fetch() {
    let positions = FakePositionService::default();
    let gate = positions.gate_explore();
    let s = session(&FakeContentStore::default(), &positions);
    s.load_game(GameRef::Archive("1".into()), RUY_LOPEZ).unwrap();

    let (a, b, ()) = tokio::join!(s.explore_current(), s.explore_current(), async {
        until(|| positions.explore_calls() == 1).await;
        assert_eq!(s.view().unwrap().exploration, CacheStatus::Pending);
        gate.add_permits(1);
    });

    assert_eq!(positions.explore_calls(), 1);
    assert_eq!(a.unwrap(), b.unwrap());
}

#[tokio::test]
async fn test_evaluation_lookup() {
    let positions = FakePositionService::default();
    let s = session(&FakeContentStore::default(), &positions);
    s.load_game(GameRef::Archive("1".into()), RUY_LOPEZ).unwrap();

    let eval = s.evaluate_current().await.unwrap();
    assert_eq!(eval.suggested_move().as_deref(), Some("Nf3"));
    assert_eq!(eval.summary(), "Depth: 30 | Nodes: 5M");

    s.evaluate_current().await.unwrap();
    assert_eq!(positions.eval_calls(), 1);
    assert_eq!(s.view().unwrap().evaluation, CacheStatus::Hit);
}

#[tokio::test]
async fn test_cache_survives_master_switch_but_not_reload() {
    let positions = FakePositionService::default();
    positions.with_master_game(MASTER_ID, "1. e4 e5 2. Nf3 Nf6 *");
    let s = session(&FakeContentStore::default(), &positions);
    s.load_game(GameRef::Archive("1".into()), RUY_LOPEZ).unwrap();
    s.go_to(2);
    s.explore_current().await.unwrap();

    s.switch_to_master_game(MASTER_ID).await.unwrap();
    assert_eq!(s.current_index(), 2);
    s.explore_current().await.unwrap();
    assert_eq!(positions.explore_calls(), 1);

    s.load_game(GameRef::Archive("1".into()), RUY_LOPEZ).unwrap();
    assert!(s.exploration_cache().is_empty());
    s.go_to(2);
    s.explore_current().await.unwrap();
    assert_eq!(positions.explore_calls(), 2);
}

#[tokio::test]
async fn test_lookup_without_game() {
    let s = session(&FakeContentStore::default(), &FakePositionService::default());
    assert!(matches!(
        s.explore_current().await,
        Err(ViewerError::NoGameLoaded)
    ));
}
