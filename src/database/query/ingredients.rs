// Copyright 2023 Remi Bernotavicius

use crate::database::models::{Entity, Ingredient, IngredientId, NewIngredient};
use crate::database::validate::Validate as _;
use crate::database::{self, Error, Result};
use diesel::prelude::OptionalExtension as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;

pub fn create_ingredient(
    conn: &mut database::Connection,
    new_ingredient: &NewIngredient<'_>,
) -> Result<Ingredient> {
    use database::schema::ingredients::dsl::*;

    new_ingredient.validate()?;
    let ingredient = diesel::insert_into(ingredients)
        .values(new_ingredient)
        .returning(Ingredient::as_returning())
        .get_result(conn)
        .map_err(|e| Error::from_diesel(Entity::Ingredient, e))?;
    log::info!("created ingredient {ingredient}");
    Ok(ingredient)
}

pub fn get_ingredient(
    conn: &mut database::Connection,
    ingredient_id: IngredientId,
) -> Result<Ingredient> {
    use database::schema::ingredients::dsl::*;

    ingredients
        .find(ingredient_id)
        .select(Ingredient::as_select())
        .get_result(conn)
        .map_err(|e| Error::from_diesel(Entity::Ingredient, e))
}

pub fn find_ingredient_by_name(
    conn: &mut database::Connection,
    wanted: &str,
) -> Result<Option<Ingredient>> {
    use database::schema::ingredients::dsl::*;

    Ok(ingredients
        .filter(name.eq(wanted))
        .select(Ingredient::as_select())
        .get_result(conn)
        .optional()?)
}

pub fn list_ingredients(conn: &mut database::Connection) -> Result<Vec<Ingredient>> {
    use database::schema::ingredients::dsl::*;

    Ok(ingredients
        .order(name.asc())
        .select(Ingredient::as_select())
        .load(conn)?)
}

/// Ingredients whose name starts with `prefix`, ignoring case in any script. Sorted
/// byte-wise, so capitalized names come first.
pub fn search_ingredients(
    conn: &mut database::Connection,
    prefix: &str,
) -> Result<Vec<Ingredient>> {
    // SQLite's LIKE only folds ASCII, so the comparison happens here
    let prefix = prefix.to_lowercase();
    log::debug!("searching ingredients for {prefix:?}");
    Ok(list_ingredients(conn)?
        .into_iter()
        .filter(|i| i.name.to_lowercase().starts_with(&prefix))
        .collect())
}

/// Also drops the ingredient from every recipe that uses it.
pub fn delete_ingredient(conn: &mut database::Connection, delete_id: IngredientId) -> Result<()> {
    use database::schema::ingredients::dsl::*;

    let deleted = diesel::delete(ingredients.filter(id.eq(delete_id))).execute(conn)?;
    if deleted == 0 {
        return Err(Error::NotFound {
            entity: Entity::Ingredient,
        });
    }
    log::info!("deleted ingredient {delete_id}");
    Ok(())
}

#[cfg(test)]
use crate::database::fixtures;

#[test]
fn name_is_unique_regardless_of_unit() {
    let mut conn = fixtures::connection();
    fixtures::ingredient(&mut conn, "Salt", "g");

    let err = create_ingredient(
        &mut conn,
        &NewIngredient {
            name: "Salt",
            measurement_unit: "kg",
        },
    )
    .unwrap_err();
    assert!(err.is_conflict(), "{err}");
    assert_eq!(list_ingredients(&mut conn).unwrap().len(), 1);
}

#[test]
fn field_limits() {
    let mut conn = fixtures::connection();
    let long_name = "x".repeat(61);
    let err = create_ingredient(
        &mut conn,
        &NewIngredient {
            name: &long_name,
            measurement_unit: "g",
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::Validation(ref v) if v.field == "name"), "{err}");

    let long_unit = "x".repeat(31);
    let err = create_ingredient(
        &mut conn,
        &NewIngredient {
            name: "sugar",
            measurement_unit: &long_unit,
        },
    )
    .unwrap_err();
    assert!(
        matches!(err, Error::Validation(ref v) if v.field == "measurement_unit"),
        "{err}"
    );
}

#[test]
fn listing_is_ordered_by_name() {
    let mut conn = fixtures::connection();
    for (n, unit) in [("sugar", "g"), ("egg", "pcs"), ("milk", "ml"), ("salt", "g")] {
        fixtures::ingredient(&mut conn, n, unit);
    }
    let names: Vec<_> = list_ingredients(&mut conn)
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(names, ["egg", "milk", "salt", "sugar"]);
}

#[test]
fn prefix_search() {
    let mut conn = fixtures::connection();
    for n in ["Salt", "salmon", "sugar", "basalt", "50%_cream"] {
        fixtures::ingredient(&mut conn, n, "g");
    }

    let names = |found: Vec<Ingredient>| found.into_iter().map(|i| i.name).collect::<Vec<_>>();
    assert_eq!(
        names(search_ingredients(&mut conn, "sal").unwrap()),
        ["Salt", "salmon"]
    );
    assert_eq!(
        names(search_ingredients(&mut conn, "50%_").unwrap()),
        ["50%_cream"]
    );
    assert!(search_ingredients(&mut conn, "5_%").unwrap().is_empty());
}

#[test]
fn prefix_search_folds_cyrillic_case() {
    let mut conn = fixtures::connection();
    for n in ["Соль", "Сахар", "Salt", "мука"] {
        fixtures::ingredient(&mut conn, n, "г");
    }

    let names = |found: Vec<Ingredient>| found.into_iter().map(|i| i.name).collect::<Vec<_>>();
    assert_eq!(names(search_ingredients(&mut conn, "сол").unwrap()), ["Соль"]);
    assert_eq!(names(search_ingredients(&mut conn, "САХ").unwrap()), ["Сахар"]);
    assert_eq!(
        names(search_ingredients(&mut conn, "с").unwrap()),
        ["Сахар", "Соль"]
    );
    assert_eq!(names(search_ingredients(&mut conn, "МУ").unwrap()), ["мука"]);
    assert_eq!(names(search_ingredients(&mut conn, "sal").unwrap()), ["Salt"]);
}

#[test]
fn get_and_delete() {
    let mut conn = fixtures::connection();
    let egg = fixtures::ingredient(&mut conn, "egg", "pcs");
    assert_eq!(get_ingredient(&mut conn, egg.id).unwrap(), egg);
    assert_eq!(
        find_ingredient_by_name(&mut conn, "egg").unwrap(),
        Some(egg.clone())
    );

    delete_ingredient(&mut conn, egg.id).unwrap();
    assert!(get_ingredient(&mut conn, egg.id).unwrap_err().is_not_found());
    assert!(delete_ingredient(&mut conn, egg.id)
        .unwrap_err()
        .is_not_found());
}
