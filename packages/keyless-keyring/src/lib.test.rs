use crate::{generate, sign, verify, Keyring};

fn keyring_with(key_id: &str, public_pem: &str) -> Keyring {
    let mut keyring = Keyring::new();
    keyring.add(key_id, public_pem);
    keyring
}

#[test]
fn generated_public_key_is_pem_encoded() {
    let key = generate().unwrap();
    assert!(key.public_pem.starts_with("-----BEGIN PUBLIC KEY-----"));
    assert!(key.public_pem.trim_end().ends_with("-----END PUBLIC KEY-----"));
    assert_eq!(key.key_id.len(), 16);
    assert!(key.key_id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn key_id_is_deterministic_for_the_same_seed() {
    let a = generate().unwrap();
    let b = crate::sign(b"anything", &a.private_seed).unwrap();
    assert_eq!(a.key_id, b.key_id);
}

#[test]
fn round_trip_signature_verifies() {
    let key = generate().unwrap();
    let keyring = keyring_with(&key.key_id, &key.public_pem);

    let data = b"package tarball bytes";
    let signature = sign(data, &key.private_seed).unwrap();

    assert_eq!(signature.algorithm, "ed25519");
    assert_eq!(signature.key_id, key.key_id);
    assert!(verify(data, &signature, &keyring).is_ok());
}

#[test]
fn tampered_data_fails_verification() {
    let key = generate().unwrap();
    let keyring = keyring_with(&key.key_id, &key.public_pem);

    let signature = sign(b"original bytes", &key.private_seed).unwrap();
    assert!(verify(b"different bytes", &signature, &keyring).is_err());
}

#[test]
fn unknown_key_id_is_rejected() {
    let key = generate().unwrap();
    let other = generate().unwrap();
    let keyring = keyring_with(&other.key_id, &other.public_pem);

    let signature = sign(b"data", &key.private_seed).unwrap();
    assert!(verify(b"data", &signature, &keyring).is_err());
}

#[test]
fn malformed_seed_length_is_rejected() {
    assert!(sign(b"data", &[0u8; 10]).is_err());
}

#[test]
fn key_url_builder_sets_the_field() {
    let key = generate().unwrap();
    let signature = sign(b"data", &key.private_seed).unwrap().with_key_url("https://example.com/keys/abc");
    assert_eq!(signature.key_url.as_deref(), Some("https://example.com/keys/abc"));
}

#[test]
fn keyring_add_get_remove_round_trip() {
    let mut keyring = Keyring::new();
    assert!(keyring.is_empty());

    keyring.add("abc123", "-----BEGIN PUBLIC KEY-----\n-----END PUBLIC KEY-----\n");
    assert_eq!(keyring.len(), 1);
    assert!(keyring.get("abc123").is_some());

    let removed = keyring.remove("abc123");
    assert!(removed.is_some());
    assert!(keyring.is_empty());
}
