use news_portal::password::{
    HashingConfig, PasswordError, hash_blocking, hash_password, verify_blocking, verify_password,
};

fn cheap() -> HashingConfig {
    HashingConfig {
        memory_cost_kib: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}

#[test]
fn test_hash_is_salted_argon2id() {
    let first = hash_password("pw1", &cheap()).unwrap();
    let second = hash_password("pw1", &cheap()).unwrap();

    assert!(first.starts_with("$argon2id$"));
    assert_ne!(first, second);
    assert!(!first.contains("pw1"));
}

#[test]
fn test_verify_matches_only_the_original_password() {
    let hash = hash_password("pw1", &cheap()).unwrap();

    assert!(verify_password("pw1", &hash));
    assert!(!verify_password("pw2", &hash));
}

#[test]
fn test_malformed_hash_never_verifies() {
    assert!(!verify_password("pw1", "not-a-phc-string"));
    assert!(!verify_password("", ""));
}

#[test]
fn test_invalid_params_are_reported() {
    let config = HashingConfig {
        memory_cost_kib: 1,
        time_cost: 0,
        parallelism: 1,
    };

    assert!(matches!(
        hash_password("pw1", &config),
        Err(PasswordError::Params(_))
    ));
}

#[tokio::test]
async fn test_blocking_wrappers_round_trip_off_the_runtime() {
    let hash = hash_blocking("pw1".to_string(), cheap()).await.unwrap();

    assert!(verify_blocking("pw1".to_string(), hash.clone()).await.unwrap());
    assert!(!verify_blocking("nope".to_string(), hash).await.unwrap());
}
