// Copyright 2023 Remi Bernotavicius

use serde::Deserialize;
use std::path::Path;

/// One catalog entry as it appears in an ingredient dump:
/// `[{"name": "salt", "measurement_unit": "g"}, ...]`
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub name: String,
    pub measurement_unit: String,
}

pub fn decode_ingredients(bytes: &[u8]) -> serde_json::Result<Vec<Ingredient>> {
    serde_json::from_slice(bytes)
}

pub fn decode_ingredients_from_path(path: impl AsRef<Path>) -> crate::Result<Vec<Ingredient>> {
    let bytes = std::fs::read(path)?;
    Ok(decode_ingredients(&bytes)?)
}

#[test]
fn decode() {
    let decoded = decode_ingredients(
        br#"[
            {"name": "abrikosovoe varenye", "measurement_unit": "g"},
            {"name": "salt", "measurement_unit": "pinch", "comment": "ignored"}
        ]"#,
    )
    .unwrap();
    assert_eq!(
        decoded,
        [
            Ingredient {
                name: "abrikosovoe varenye".into(),
                measurement_unit: "g".into(),
            },
            Ingredient {
                name: "salt".into(),
                measurement_unit: "pinch".into(),
            },
        ]
    );

    assert!(decode_ingredients(br#"[{"name": "salt"}]"#).is_err());
    assert!(decode_ingredients(br#"{"name": "salt", "measurement_unit": "g"}"#).is_err());
}
