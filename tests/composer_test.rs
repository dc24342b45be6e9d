mod common;

use std::sync::Arc;

use common::{write_failed, Fixture};
use oneword::core::rate_limiter::{ActionClass, RateLimiter};
use oneword::error::OneWordError;
use oneword::feed::{PostOutcome, WordComposer};
use oneword::storage::{ProfileStorage, StoreOp, StoredPrompt};
use oneword::validation::WordError;

fn composer(fx: &Fixture, user: &str, prompt: &StoredPrompt) -> WordComposer {
    WordComposer::new(
        user,
        Some(prompt.id.clone()),
        fx.limiter(ActionClass::Post),
        fx.provider(),
    )
}

#[tokio::test]
async fn test_post_is_normalized() {
    let fx = Fixture::new().await;
    let prompt = fx.prompt_today().await;
    let composer = composer(&fx, "ada", &prompt);

    let outcome = composer.submit("  Sunny \n").await.unwrap();
    let PostOutcome::Posted(word) = outcome else {
        panic!("expected a posted word, got {:?}", outcome);
    };
    assert_eq!(word.word, "sunny");
    assert_eq!(word.prompt_id.as_deref(), Some(prompt.id.as_str()));

    let profile = fx.store.get_profile("ada").await.unwrap().unwrap();
    assert_eq!(profile.current_streak, 1);
}

#[tokio::test]
async fn test_second_post_for_prompt() {
    let fx = Fixture::new().await;
    let prompt = fx.prompt_today().await;
    let composer = composer(&fx, "ada", &prompt);

    composer.submit("first").await.unwrap();
    assert_eq!(composer.submit("second").await, Ok(PostOutcome::AlreadyPosted));
}

#[tokio::test]
async fn test_invalid_words_are_rejected() {
    let fx = Fixture::new().await;
    let prompt = fx.prompt_today().await;
    let composer = WordComposer::new(
        "ada",
        Some(prompt.id.clone()),
        RateLimiter::new(10, 60_000, Arc::new(fx.clock.clone())),
        fx.provider(),
    );

    assert_eq!(
        composer.submit("   ").await,
        Err(OneWordError::InvalidWord(WordError::Empty))
    );
    assert_eq!(
        composer.submit("two words").await,
        Err(OneWordError::InvalidWord(WordError::MultiWord))
    );
    assert_eq!(
        composer.submit("caf\u{e9}").await,
        Err(OneWordError::InvalidWord(WordError::InvalidChars))
    );
    assert_eq!(
        composer.submit(&"a".repeat(46)).await,
        Err(OneWordError::InvalidWord(WordError::TooLong))
    );
    assert!(matches!(
        composer.submit("don't").await,
        Ok(PostOutcome::Posted(_))
    ));
}

#[tokio::test]
async fn test_rate_limit_applies_before_validation() {
    let fx = Fixture::new().await;
    let prompt = fx.prompt_today().await;
    let composer = composer(&fx, "ada", &prompt);

    for _ in 0..3 {
        assert!(composer.submit("two words").await.is_err());
    }
    assert_eq!(
        composer.submit("fine").await,
        Err(OneWordError::RateLimited { retry_after_secs: 60 })
    );

    fx.advance(60);
    assert!(matches!(
        composer.submit("fine").await,
        Ok(PostOutcome::Posted(_))
    ));
}

#[tokio::test]
async fn test_submit_while_posting_is_ignored() {
    let fx = Fixture::new().await;
    let prompt = fx.prompt_today().await;
    let composer = Arc::new(WordComposer::new(
        "ada",
        Some(prompt.id.clone()),
        RateLimiter::new(2, 60_000, Arc::new(fx.clock.clone())),
        fx.provider(),
    ));

    let paused = fx.store.pause_next(StoreOp::InsertWord);
    let first = tokio::spawn({
        let composer = composer.clone();
        async move { composer.submit("sunny").await }
    });
    paused.entered().await;

    assert!(composer.is_posting());
    assert_eq!(composer.submit("rainy").await, Ok(PostOutcome::Ignored));

    paused.release();
    let PostOutcome::Posted(word) = first.await.unwrap().unwrap() else {
        panic!("expected the first submit to post");
    };
    assert_eq!(word.word, "sunny");
    assert!(!composer.is_posting());

    // the ignored submit left the second slot free
    assert_eq!(composer.submit("rainy").await, Ok(PostOutcome::AlreadyPosted));
    assert!(matches!(
        composer.submit("rainy").await,
        Err(OneWordError::RateLimited { .. })
    ));
}

#[tokio::test]
async fn test_write_failures_surface() {
    let fx = Fixture::new().await;
    let prompt = fx.prompt_today().await;

    let composer = composer(&fx, "ada", &prompt);
    fx.store.fail_next(StoreOp::InsertWord, write_failed("offline"));
    assert!(matches!(
        composer.submit("hello").await,
        Err(OneWordError::WriteFailed { .. })
    ));
    assert!(!composer.is_posting());

    // no profile row, so the foreign key rejects it
    let ghost = WordComposer::new(
        "ghost",
        Some(prompt.id.clone()),
        fx.limiter(ActionClass::Post),
        fx.provider(),
    );
    assert_eq!(
        ghost.submit("boo").await,
        Err(OneWordError::WriteFailed {
            code: Some("23503".to_string()),
            message: "insert or update violates foreign key constraint \"words_user_id_fkey\""
                .to_string(),
        })
    );
}

#[tokio::test]
async fn test_connections_find_matching_words() {
    let fx = Fixture::new().await;
    let prompt = fx.prompt_today().await;
    fx.post("bob", "tired", &prompt).await;
    fx.post("cy", "wired", &prompt).await;

    let composer = composer(&fx, "ada", &prompt);
    let PostOutcome::Posted(word) = composer.submit("Tired").await.unwrap() else {
        panic!("expected a posted word");
    };

    let matches = composer.connections(&word).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].user_id, "bob");

    fx.store
        .fail_next(StoreOp::FindMatchingWords, write_failed("timeout"));
    assert!(composer.connections(&word).await.is_err());
}
