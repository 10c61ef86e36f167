// Copyright 2023 Remi Bernotavicius

use crate::database::models::Entity;
use crate::database::validate::ValidationError;
use derive_more::{Display, From};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

#[derive(Debug, Display, derive_more::Error, From)]
pub enum Error {
    #[display("invalid {_0}")]
    Validation(ValidationError),
    #[display("{entity} already exists ({detail})")]
    #[from(ignore)]
    Conflict {
        entity: Entity,
        detail: String,
    },
    #[display("{entity} not found")]
    #[from(ignore)]
    NotFound { entity: Entity },
    #[display("{entity} refers to a missing row ({detail})")]
    #[from(ignore)]
    MissingReference {
        entity: Entity,
        detail: String,
    },
    #[display("database error: {_0}")]
    Database(DieselError),
    #[display("connection error: {_0}")]
    Connection(diesel::ConnectionError),
    #[display("migration error: {_0}")]
    #[from(ignore)]
    Migration(#[error(not(source))] String),
}

impl Error {
    /// Classifies a failure reported by SQLite while reading or writing `entity`.
    pub fn from_diesel(entity: Entity, error: DieselError) -> Self {
        match error {
            DieselError::NotFound => Self::NotFound { entity },
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::Conflict {
                    entity,
                    detail: info.message().to_owned(),
                }
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                Self::MissingReference {
                    entity,
                    detail: info.message().to_owned(),
                }
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                Self::Validation(ValidationError::new("record", info.message()))
            }
            error => Self::Database(error),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[test]
fn classifies_diesel_errors() {
    let not_found = Error::from_diesel(Entity::Recipe, DieselError::NotFound);
    assert!(not_found.is_not_found());
    assert!(!not_found.is_conflict());
    assert_eq!(not_found.to_string(), "recipe not found");

    let other = Error::from_diesel(Entity::User, DieselError::RollbackTransaction);
    assert!(matches!(other, Error::Database(DieselError::RollbackTransaction)));
}

#[test]
fn error_sources() {
    use std::error::Error as _;

    let invalid = Error::from(ValidationError::new("email", "Enter a valid email address."));
    assert_eq!(
        invalid.to_string(),
        "invalid email: Enter a valid email address."
    );
    assert!(invalid.source().is_some());

    let conflict = Error::Conflict {
        entity: Entity::Ingredient,
        detail: "UNIQUE constraint failed: ingredients.name".into(),
    };
    assert!(conflict.is_conflict());
    assert_eq!(
        conflict.to_string(),
        "ingredient already exists (UNIQUE constraint failed: ingredients.name)"
    );
    assert!(conflict.source().is_none());

    assert!(Error::Migration("boom".into()).source().is_none());
}
