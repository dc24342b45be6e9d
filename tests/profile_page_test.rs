mod common;

use chrono::{Days, Utc};

use common::Fixture;
use oneword::error::OneWordError;
use oneword::feed::load_profile;
use oneword::models::ReactionEmoji;
use oneword::storage::{FollowStorage, PromptStorage, ReactionStorage};

#[tokio::test]
async fn test_profile_counts_and_words() {
    let fx = Fixture::new().await;
    let today = fx.prompt_today().await;
    let yesterday = fx
        .store
        .insert_prompt("Yesterday?", Utc::now().date_naive() - Days::new(1))
        .await
        .unwrap();
    let old = fx.post("ada", "sleepy", &yesterday).await;
    fx.post("ada", "sunny", &today).await;
    fx.post("bob", "rainy", &today).await;

    fx.store.insert_follow("bob", "ada").await.unwrap();
    fx.store.insert_follow("cy", "ada").await.unwrap();
    fx.store.insert_follow("ada", "bob").await.unwrap();
    fx.store
        .insert_reaction(&old.id, "bob", ReactionEmoji::Heart)
        .await
        .unwrap();

    let page = load_profile(fx.store.as_ref(), Some("bob"), "ada")
        .await
        .unwrap();
    assert_eq!(page.profile.id, "ada");
    assert_eq!(page.total_posts, 2);
    assert_eq!(page.follower_count, 2);
    assert_eq!(page.following_count, 1);
    assert_eq!(page.viewer_follows, Some(true));
    assert_eq!(page.profile.current_streak, 1);

    let words: Vec<&str> = page.words.iter().map(|i| i.word.word.as_str()).collect();
    assert_eq!(words, vec!["sunny", "sleepy"]);
    let sleepy = &page.words[1];
    assert_eq!(sleepy.reactions.count(ReactionEmoji::Heart), 1);
    assert_eq!(sleepy.reactions.selected, Some(ReactionEmoji::Heart));
    assert_eq!(sleepy.author.as_ref().map(|a| a.username.as_str()), Some("ada"));
}

#[tokio::test]
async fn test_viewer_follow_flag() {
    let fx = Fixture::new().await;
    fx.store.insert_follow("bob", "cy").await.unwrap();

    let own = load_profile(fx.store.as_ref(), Some("cy"), "cy").await.unwrap();
    assert_eq!(own.viewer_follows, None);
    assert!(own.is_own(Some("cy")));

    let anonymous = load_profile(fx.store.as_ref(), None, "cy").await.unwrap();
    assert_eq!(anonymous.viewer_follows, None);
    assert!(anonymous.words.is_empty());

    let stranger = load_profile(fx.store.as_ref(), Some("ada"), "cy")
        .await
        .unwrap();
    assert_eq!(stranger.viewer_follows, Some(false));
    assert_eq!(stranger.follower_count, 1);
}

#[tokio::test]
async fn test_unknown_username() {
    let fx = Fixture::new().await;
    assert!(matches!(
        load_profile(fx.store.as_ref(), None, "nobody").await,
        Err(OneWordError::NotFound(_))
    ));
}
