// Copyright 2023 Remi Bernotavicius

//! Short, URL-safe recipe identifiers. A random UUID is written in base 57 using an alphabet
//! without look-alike characters (no `0`, `1`, `I`, `O` or `l`), the same encoding `shortuuid`
//! produces.

const ALPHABET: &[u8; 57] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Digits needed for any 128-bit value.
pub const LENGTH: usize = 22;

pub fn encode(mut value: u128) -> String {
    let base = ALPHABET.len() as u128;
    let mut digits = [ALPHABET[0]; LENGTH];
    for slot in digits.iter_mut().rev() {
        *slot = ALPHABET[(value % base) as usize];
        value /= base;
    }
    debug_assert_eq!(value, 0);
    digits.iter().map(|&b| b as char).collect()
}

pub fn generate() -> String {
    encode(uuid::Uuid::new_v4().as_u128())
}

#[test]
fn encoding() {
    assert_eq!(encode(0), "2222222222222222222222");
    assert_eq!(encode(1), "2222222222222222222223");
    assert_eq!(encode(57), "2222222222222222222232");
    assert_eq!(encode(u128::MAX), "oZEq7ovRbLq6UnGMPwc8B5");
}

#[test]
fn generated_links() {
    let a = generate();
    let b = generate();
    assert_ne!(a, b);
    for link in [a, b] {
        assert_eq!(link.len(), LENGTH);
        assert!(link.bytes().all(|c| ALPHABET.contains(&c)), "{link}");
    }
}
