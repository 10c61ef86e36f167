// Copyright 2023 Remi Bernotavicius

use diesel::prelude::Connection as _;
use diesel::RunQueryDsl as _;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::path::Path;

mod error;
pub mod models;
pub mod query;
pub mod schema;
pub mod validate;

pub use error::{Error, Result};

pub type Connection = diesel::sqlite::SqliteConnection;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

fn prepare(mut connection: Connection) -> Result<Connection> {
    // SQLite leaves foreign keys (and therefore ON DELETE CASCADE) off unless asked per connection.
    diesel::sql_query("PRAGMA foreign_keys = ON").execute(&mut connection)?;
    let applied = connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::Migration(e.to_string()))?;
    for version in applied {
        log::info!("applied migration {version}");
    }
    Ok(connection)
}

pub fn establish_connection(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    let url = path.to_str().ok_or_else(|| {
        diesel::ConnectionError::InvalidConnectionUrl(format!("{path:?} is not valid UTF-8"))
    })?;
    log::debug!("opening database at {url}");
    prepare(Connection::establish(url)?)
}

pub fn establish_in_memory() -> Result<Connection> {
    prepare(Connection::establish(":memory:")?)
}

#[cfg(test)]
pub mod fixtures {
    use super::models::{
        Ingredient, IngredientAmount, NewIngredient, NewRecipe, NewUser, Recipe, User,
    };
    use super::{query, Connection};

    pub fn connection() -> Connection {
        super::establish_in_memory().unwrap()
    }

    pub fn user(conn: &mut Connection, username: &str) -> User {
        let email = format!("{username}@example.com");
        query::create_user(
            conn,
            &NewUser {
                username,
                password: "pbkdf2_sha256$hash",
                first_name: "Test",
                last_name: "User",
                email: &email,
                is_staff: false,
                is_superuser: false,
            },
        )
        .unwrap()
    }

    pub fn ingredient(conn: &mut Connection, name: &str, measurement_unit: &str) -> Ingredient {
        query::create_ingredient(
            conn,
            &NewIngredient {
                name,
                measurement_unit,
            },
        )
        .unwrap()
    }

    pub fn recipe(
        conn: &mut Connection,
        author: &User,
        name: &str,
        ingredients: &[(&Ingredient, i32)],
    ) -> Recipe {
        let ingredients: Vec<_> = ingredients
            .iter()
            .map(|(i, amount)| IngredientAmount {
                ingredient_id: i.id,
                amount: *amount,
            })
            .collect();
        query::create_recipe(
            conn,
            author.id,
            &NewRecipe {
                name,
                text: "Mix everything together.",
                cooking_time: 15,
            },
            &ingredients,
        )
        .unwrap()
    }
}

#[test]
fn migrations() {
    let mut conn = establish_in_memory().unwrap();
    assert!(!conn.has_pending_migration(MIGRATIONS).unwrap());

    conn.revert_all_migrations(MIGRATIONS).unwrap();
    assert!(conn.has_pending_migration(MIGRATIONS).unwrap());

    conn.run_pending_migrations(MIGRATIONS).unwrap();
    assert!(!conn.has_pending_migration(MIGRATIONS).unwrap());
}

#[test]
fn file_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.sqlite");

    {
        let mut conn = establish_connection(&path).unwrap();
        fixtures::ingredient(&mut conn, "salt", "g");
    }

    let mut conn = establish_connection(&path).unwrap();
    let names: Vec<_> = query::list_ingredients(&mut conn)
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(names, ["salt"]);
}
