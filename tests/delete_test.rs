mod common;

use std::sync::Arc;

use common::{write_failed, Fixture};
use oneword::core::optimistic::Mutation;
use oneword::core::rate_limiter::{ActionClass, RateLimiter};
use oneword::error::OneWordError;
use oneword::feed::{DeleteControl, DeletePhase};
use oneword::models::ReactionEmoji;
use oneword::storage::{ReactionStorage, StoreOp, StoredWord, WordStorage};

async fn setup() -> (Fixture, StoredWord) {
    let fx = Fixture::new().await;
    let prompt = fx.prompt_today().await;
    let word = fx.post("ada", "quiet", &prompt).await;
    (fx, word)
}

fn control(fx: &Fixture, word: &StoredWord) -> DeleteControl {
    DeleteControl::new(
        word,
        Some("ada".to_string()),
        fx.limiter(ActionClass::Delete),
        fx.provider(),
    )
}

#[tokio::test]
async fn test_confirmed_delete_removes_word() {
    let (fx, word) = setup().await;
    fx.store
        .insert_reaction(&word.id, "bob", ReactionEmoji::Fire)
        .await
        .unwrap();
    let control = control(&fx, &word);

    control.request().unwrap();
    assert_eq!(control.confirm().await, Ok(Mutation::Applied(())));
    assert_eq!(control.phase(), DeletePhase::Deleted);
    assert!(!control.is_visible());

    assert_eq!(fx.store.get_word(&word.id).await.unwrap(), None);
    assert!(fx
        .store
        .reactions_for_words(&[word.id.clone()])
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_failed_delete_keeps_word_visible() {
    let (fx, word) = setup().await;
    let control = control(&fx, &word);

    fx.store.fail_next(StoreOp::DeleteWord, write_failed("offline"));
    control.request().unwrap();
    assert!(matches!(
        control.confirm().await,
        Err(OneWordError::WriteFailed { .. })
    ));
    assert_eq!(control.phase(), DeletePhase::Idle);
    assert!(control.is_visible());
    assert!(fx.store.get_word(&word.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_word_already_gone() {
    let (fx, word) = setup().await;
    let control = control(&fx, &word);
    fx.store.delete_word(&word.id, "ada").await.unwrap();

    control.request().unwrap();
    assert!(matches!(
        control.confirm().await,
        Err(OneWordError::NotFound(_))
    ));
    assert_eq!(control.phase(), DeletePhase::Idle);
}

#[tokio::test]
async fn test_rate_limited_delete_resets_control() {
    let (fx, word) = setup().await;
    let mut limiter = RateLimiter::new(1, 60_000, Arc::new(fx.clock.clone()));
    assert!(limiter.check());
    let control = DeleteControl::new(&word, Some("ada".to_string()), limiter, fx.provider());

    control.request().unwrap();
    assert_eq!(
        control.confirm().await,
        Err(OneWordError::RateLimited { retry_after_secs: 60 })
    );
    assert_eq!(control.phase(), DeletePhase::Idle);
    assert!(fx.store.get_word(&word.id).await.unwrap().is_some());

    fx.advance(60);
    control.request().unwrap();
    assert_eq!(control.confirm().await, Ok(Mutation::Applied(())));
}

#[tokio::test]
async fn test_second_confirm_while_deleting_is_ignored() {
    let (fx, word) = setup().await;
    let control = Arc::new(control(&fx, &word));

    let paused = fx.store.pause_next(StoreOp::DeleteWord);
    control.request().unwrap();
    let first = tokio::spawn({
        let control = control.clone();
        async move { control.confirm().await }
    });
    paused.entered().await;

    assert_eq!(control.phase(), DeletePhase::Deleting);
    assert_eq!(control.confirm().await, Ok(Mutation::Ignored));
    assert_eq!(control.cancel(), DeletePhase::Deleting);

    paused.release();
    assert_eq!(first.await.unwrap(), Ok(Mutation::Applied(())));
    assert_eq!(control.phase(), DeletePhase::Deleted);
}

#[tokio::test]
async fn test_other_users_cannot_delete() {
    let (fx, word) = setup().await;
    let control = DeleteControl::new(
        &word,
        Some("bob".to_string()),
        fx.limiter(ActionClass::Delete),
        fx.provider(),
    );
    assert_eq!(control.request(), Err(OneWordError::Forbidden));
    assert_eq!(control.confirm().await, Err(OneWordError::Forbidden));
    assert!(fx.store.get_word(&word.id).await.unwrap().is_some());
}
