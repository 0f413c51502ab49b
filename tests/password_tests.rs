use envio_portal::password::{HASH_COST, hash_password, verify_password};

#[test]
fn test_hashes_are_salted() {
    // Two hashes of the same input must differ, and both must verify.
    let first = hash_password("reparto-seguro").unwrap();
    let second = hash_password("reparto-seguro").unwrap();

    assert_ne!(first, second);
    assert!(verify_password("reparto-seguro", &first));
    assert!(verify_password("reparto-seguro", &second));
}

#[test]
fn test_wrong_password_is_rejected() {
    let hash = hash_password("reparto-seguro").unwrap();

    assert!(!verify_password("reparto-inseguro", &hash));
    assert!(!verify_password("", &hash));
}

#[test]
fn test_cost_factor_is_embedded_in_the_hash() {
    let hash = hash_password("reparto-seguro").unwrap();

    // Modular crypt format: $2b$<cost>$...
    assert!(hash.starts_with(&format!("$2b${HASH_COST}$")));
}

#[test]
fn test_malformed_stored_hash_fails_closed() {
    // A corrupted stored value must read as "wrong password", never a panic.
    assert!(!verify_password("reparto-seguro", "not-a-bcrypt-hash"));
    assert!(!verify_password("reparto-seguro", ""));
}
