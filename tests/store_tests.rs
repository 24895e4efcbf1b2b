use news_portal::{
    AppConfig, ArticleStore, AuthorRegistry, CredentialStore, InMemoryRepository,
    auth::{Identity, authorize},
    config::DeletePolicy,
    error::ApiError,
    repository::RepositoryState,
    stores::{ArticleChanges, UpdateOutcome},
};
use std::sync::Arc;

// --- Test Utilities ---

struct Stores {
    users: CredentialStore,
    authors: AuthorRegistry,
    articles: ArticleStore,
}

fn stores_with(delete_policy: DeletePolicy, search_limit: i64) -> Stores {
    let config = AppConfig::default();
    let repo: RepositoryState = Arc::new(InMemoryRepository::new());
    Stores {
        users: CredentialStore::new(repo.clone(), config.hashing, delete_policy),
        authors: AuthorRegistry::new(repo.clone()),
        articles: ArticleStore::new(repo, search_limit),
    }
}

fn stores() -> Stores {
    stores_with(DeletePolicy::SelfOnly, 100)
}

async fn sign_in(users: &CredentialStore, username: &str, password: &str) -> Identity {
    users.create(username, password).await.unwrap();
    authorize(users, username, password).await.unwrap()
}

fn titles(articles: &[news_portal::models::Article]) -> Vec<&str> {
    articles.iter().map(|a| a.title.as_str()).collect()
}

// --- CredentialStore ---

#[tokio::test]
async fn test_verify_accepts_only_the_registered_password() {
    let s = stores();
    s.users.create("alice", "pw1").await.unwrap();

    assert!(s.users.verify("alice", "pw1").await.unwrap());
    assert!(!s.users.verify("alice", "pw2").await.unwrap());
    assert!(!s.users.verify("bob", "pw1").await.unwrap());
}

#[tokio::test]
async fn test_duplicate_username_is_a_conflict() {
    let s = stores();
    s.users.create("alice", "pw1").await.unwrap();

    let err = s.users.create("alice", "other").await.unwrap_err();

    assert!(matches!(err, ApiError::Conflict(ref msg) if msg == "Username already in use"));
    // The original password still verifies.
    assert!(s.users.verify("alice", "pw1").await.unwrap());
}

#[tokio::test]
async fn test_create_rejects_empty_password() {
    let s = stores();

    let err = s.users.create("alice", "").await.unwrap_err();

    assert!(matches!(err, ApiError::InvalidInput(_)));
    assert!(!s.users.exists("alice").await.unwrap());
}

#[tokio::test]
async fn test_update_user_without_fields_is_unchanged() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;

    let outcome = s.users.update(&alice, None, Some("")).await.unwrap();

    assert_eq!(outcome, UpdateOutcome::Unchanged);
    assert!(s.users.verify("alice", "pw1").await.unwrap());
}

#[tokio::test]
async fn test_update_user_renames_and_rehashes_together() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;

    let outcome = s
        .users
        .update(&alice, Some("alicia"), Some("pw2"))
        .await
        .unwrap();

    assert_eq!(outcome, UpdateOutcome::Updated);
    assert!(!s.users.exists("alice").await.unwrap());
    assert!(s.users.verify("alicia", "pw2").await.unwrap());
    assert!(!s.users.verify("alicia", "pw1").await.unwrap());
}

#[tokio::test]
async fn test_update_user_password_only_keeps_username() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;

    s.users.update(&alice, None, Some("pw2")).await.unwrap();

    assert!(s.users.verify("alice", "pw2").await.unwrap());
}

#[tokio::test]
async fn test_update_user_to_taken_name_is_a_conflict() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;
    s.users.create("bob", "pw2").await.unwrap();

    let err = s.users.update(&alice, Some("bob"), None).await.unwrap_err();

    assert!(matches!(err, ApiError::Conflict(_)));
    assert!(s.users.verify("alice", "pw1").await.unwrap());
    assert!(s.users.verify("bob", "pw2").await.unwrap());
}

#[tokio::test]
async fn test_self_only_policy_forbids_deleting_others() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;
    s.users.create("bob", "pw2").await.unwrap();

    let err = s.users.delete(&alice, "bob").await.unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));
    assert!(s.users.exists("bob").await.unwrap());

    s.users.delete(&alice, "alice").await.unwrap();
    assert!(!s.users.exists("alice").await.unwrap());
}

#[tokio::test]
async fn test_privileged_policy_allows_deleting_others() {
    let s = stores_with(DeletePolicy::Privileged, 100);
    let alice = sign_in(&s.users, "alice", "pw1").await;
    s.users.create("bob", "pw2").await.unwrap();

    s.users.delete(&alice, "bob").await.unwrap();
    assert!(!s.users.exists("bob").await.unwrap());

    let err = s.users.delete(&alice, "bob").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

// --- AuthorRegistry ---

#[tokio::test]
async fn test_duplicate_author_is_a_conflict() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;
    s.authors.create(&alice, "Jane Roe").await.unwrap();

    let err = s.authors.create(&alice, "Jane Roe").await.unwrap_err();

    assert!(matches!(err, ApiError::Conflict(ref msg) if msg == "Author already registered"));
}

#[tokio::test]
async fn test_author_rename_cascades_to_articles() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;
    s.authors.create(&alice, "Jane Roe").await.unwrap();
    s.authors.create(&alice, "John Doe").await.unwrap();
    s.articles
        .create(&alice, "First", "one", "Jane Roe")
        .await
        .unwrap();
    s.articles
        .create(&alice, "Second", "two", "Jane Roe")
        .await
        .unwrap();
    s.articles
        .create(&alice, "Third", "three", "John Doe")
        .await
        .unwrap();

    let reassigned = s
        .authors
        .rename(&alice, "Jane Roe", "Jane Smith")
        .await
        .unwrap();

    assert_eq!(reassigned, 2);
    assert!(!s.authors.exists("Jane Roe").await.unwrap());
    assert!(s.authors.exists("Jane Smith").await.unwrap());

    let all = s.articles.search(None).await.unwrap();
    assert!(all.iter().all(|a| a.authorname != "Jane Roe"));
    assert_eq!(
        all.iter().filter(|a| a.authorname == "Jane Smith").count(),
        2
    );
    assert_eq!(
        all.iter().filter(|a| a.authorname == "John Doe").count(),
        1
    );
}

#[tokio::test]
async fn test_rename_unknown_author_is_not_found() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;

    let err = s.authors.rename(&alice, "Nobody", "Somebody").await.unwrap_err();

    assert!(matches!(err, ApiError::NotFound(ref msg) if msg == "Author is not registered"));
    assert!(!s.authors.exists("Somebody").await.unwrap());
}

#[tokio::test]
async fn test_rename_onto_existing_author_is_a_conflict() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;
    s.authors.create(&alice, "Jane Roe").await.unwrap();
    s.authors.create(&alice, "John Doe").await.unwrap();

    let err = s.authors.rename(&alice, "Jane Roe", "John Doe").await.unwrap_err();

    assert!(matches!(err, ApiError::Conflict(_)));
    assert!(s.authors.exists("Jane Roe").await.unwrap());
}

#[tokio::test]
async fn test_delete_author_keeps_their_articles() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;
    s.authors.create(&alice, "Jane Roe").await.unwrap();
    s.articles
        .create(&alice, "Orphan", "still here", "Jane Roe")
        .await
        .unwrap();

    s.authors.delete(&alice, "Jane Roe").await.unwrap();

    assert!(!s.authors.exists("Jane Roe").await.unwrap());
    assert!(s.articles.exists("Orphan").await.unwrap());
    let err = s.authors.delete(&alice, "Jane Roe").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

// --- ArticleStore ---

#[tokio::test]
async fn test_post_with_unknown_author_inserts_nothing() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;

    let err = s
        .articles
        .create(&alice, "Ghost", "boo", "Nobody")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(ref msg) if msg == "Author is not registered"));
    assert!(!s.articles.exists("Ghost").await.unwrap());
}

#[tokio::test]
async fn test_duplicate_title_is_a_conflict_and_keeps_first() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;
    s.authors.create(&alice, "Jane Roe").await.unwrap();
    s.articles
        .create(&alice, "Headline", "first version", "Jane Roe")
        .await
        .unwrap();

    let err = s
        .articles
        .create(&alice, "Headline", "second version", "Jane Roe")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Conflict(ref msg) if msg == "News already posted"));
    let all = s.articles.search(None).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].content, "first version");
}

#[tokio::test]
async fn test_update_content_only_keeps_title_and_author() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;
    s.authors.create(&alice, "Jane Roe").await.unwrap();
    let posted = s
        .articles
        .create(&alice, "Headline", "draft", "Jane Roe")
        .await
        .unwrap();

    let outcome = s
        .articles
        .update(
            &alice,
            "Headline",
            ArticleChanges {
                content: Some("final"),
                ..ArticleChanges::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome, UpdateOutcome::Updated);
    let all = s.articles.search(None).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "Headline");
    assert_eq!(all[0].content, "final");
    assert_eq!(all[0].authorname, "Jane Roe");
    assert_eq!(all[0].posted_at, posted.posted_at);
}

#[tokio::test]
async fn test_update_without_changes_is_unchanged() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;
    s.authors.create(&alice, "Jane Roe").await.unwrap();
    s.articles
        .create(&alice, "Headline", "draft", "Jane Roe")
        .await
        .unwrap();

    let outcome = s
        .articles
        .update(
            &alice,
            "Headline",
            ArticleChanges {
                title: Some(" "),
                ..ArticleChanges::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome, UpdateOutcome::Unchanged);
}

#[tokio::test]
async fn test_update_missing_article_is_not_found() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;

    let err = s
        .articles
        .update(&alice, "Nothing", ArticleChanges::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(ref msg) if msg == "News do not exist"));
}

#[tokio::test]
async fn test_retitle_onto_existing_title_is_a_conflict() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;
    s.authors.create(&alice, "Jane Roe").await.unwrap();
    s.articles.create(&alice, "A", "a", "Jane Roe").await.unwrap();
    s.articles.create(&alice, "B", "b", "Jane Roe").await.unwrap();

    let err = s
        .articles
        .update(
            &alice,
            "A",
            ArticleChanges {
                title: Some("B"),
                ..ArticleChanges::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Conflict(_)));
    assert!(s.articles.exists("A").await.unwrap());
}

#[tokio::test]
async fn test_delete_article_then_not_found() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;
    s.authors.create(&alice, "Jane Roe").await.unwrap();
    s.articles.create(&alice, "A", "a", "Jane Roe").await.unwrap();

    s.articles.delete(&alice, "A").await.unwrap();

    assert!(!s.articles.exists("A").await.unwrap());
    let err = s.articles.delete(&alice, "A").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

// --- Search ---

async fn seeded_library() -> Stores {
    let s = stores_with(DeletePolicy::SelfOnly, 2);
    let alice = sign_in(&s.users, "alice", "pw1").await;
    s.authors.create(&alice, "Jane Roe").await.unwrap();
    s.articles
        .create(&alice, "Rust 2.0 released", "Big changes to Rust", "Jane Roe")
        .await
        .unwrap();
    s.articles
        .create(&alice, "Gardening tips", "Plant tomatoes in spring", "Jane Roe")
        .await
        .unwrap();
    s.articles
        .create(&alice, "Weekly roundup", "Some rust news, and a garden", "Jane Roe")
        .await
        .unwrap();
    s
}

#[tokio::test]
async fn test_search_ranks_by_relevance() {
    let s = seeded_library().await;

    let results = s.articles.search(Some("rust")).await.unwrap();

    assert_eq!(titles(&results), vec!["Rust 2.0 released", "Weekly roundup"]);
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let s = seeded_library().await;

    let lower = s.articles.search(Some("tomatoes")).await.unwrap();
    let upper = s.articles.search(Some("TOMATOES")).await.unwrap();

    assert_eq!(titles(&lower), vec!["Gardening tips"]);
    assert_eq!(lower, upper);
}

#[tokio::test]
async fn test_search_matches_any_term() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;
    s.authors.create(&alice, "Jane Roe").await.unwrap();
    s.articles
        .create(&alice, "Rust news", "compiler", "Jane Roe")
        .await
        .unwrap();
    s.articles
        .create(&alice, "Garden news", "tomatoes", "Jane Roe")
        .await
        .unwrap();
    s.articles
        .create(&alice, "Sports", "football", "Jane Roe")
        .await
        .unwrap();

    let results = s.articles.search(Some("tomatoes compiler")).await.unwrap();

    assert_eq!(titles(&results), vec!["Garden news", "Rust news"]);
}

#[tokio::test]
async fn test_search_without_matches_is_empty() {
    let s = seeded_library().await;

    assert!(s.articles.search(Some("cricket")).await.unwrap().is_empty());
    assert!(s.articles.search(Some("!!!")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_respects_limit() {
    let s = seeded_library().await;

    let all = s.articles.search(None).await.unwrap();
    let matches = s.articles.search(Some("rust garden spring")).await.unwrap();

    assert_eq!(all.len(), 2);
    assert_eq!(matches.len(), 2);
}

#[tokio::test]
async fn test_blank_search_lists_newest_first() {
    let s = seeded_library().await;

    let results = s.articles.search(Some("   ")).await.unwrap();

    assert_eq!(results.len(), 2);
    assert!(results[0].posted_at >= results[1].posted_at);
}

#[tokio::test]
async fn test_keys_are_matched_exactly_as_sent() {
    let s = stores();
    let alice = sign_in(&s.users, "alice", "pw1").await;
    s.authors.create(&alice, "Jane Roe").await.unwrap();

    assert!(!s.authors.exists(" Jane Roe").await.unwrap());
    assert!(!s.users.verify("alice ", "pw1").await.unwrap());

    let err = s
        .articles
        .create(&alice, "Padded", "text", "Jane Roe ")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
