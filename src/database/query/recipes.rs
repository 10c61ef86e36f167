// Copyright 2023 Remi Bernotavicius

use crate::database::models::{
    Entity, Ingredient, IngredientAmount, IngredientId, NewIngredientInRecipe, NewRecipe, Recipe,
    RecipeChanges, RecipeId, RecipeIngredient, UserId,
};
use crate::database::validate::Validate as _;
use crate::database::{self, Error, Result};
use diesel::prelude::Connection as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use std::collections::HashSet;

fn check_composition(composition: &[IngredientAmount]) -> Result<()> {
    let mut seen = HashSet::new();
    for item in composition {
        item.validate()?;
        if !seen.insert(item.ingredient_id) {
            return Err(Error::Conflict {
                entity: Entity::IngredientInRecipe,
                detail: format!(
                    "ingredient {} is listed more than once",
                    item.ingredient_id
                ),
            });
        }
    }
    Ok(())
}

fn insert_composition(
    conn: &mut database::Connection,
    recipe: RecipeId,
    composition: &[IngredientAmount],
) -> Result<()> {
    use database::schema::ingredients_in_recipes::dsl::*;

    if composition.is_empty() {
        return Ok(());
    }
    let rows: Vec<_> = composition
        .iter()
        .map(|i| NewIngredientInRecipe {
            recipe_id: recipe,
            ingredient_id: i.ingredient_id,
            amount: i.amount,
        })
        .collect();
    diesel::insert_into(ingredients_in_recipes)
        .values(&rows)
        .execute(conn)
        .map_err(|e| Error::from_diesel(Entity::IngredientInRecipe, e))?;
    Ok(())
}

/// Publishes a recipe together with its ingredients. Nothing is written if any part is rejected.
pub fn create_recipe(
    conn: &mut database::Connection,
    author: UserId,
    new_recipe: &NewRecipe<'_>,
    composition: &[IngredientAmount],
) -> Result<Recipe> {
    use database::schema::recipes::dsl::*;

    new_recipe.validate()?;
    check_composition(composition)?;

    let recipe = conn.transaction::<_, Error, _>(|conn| {
        let recipe = diesel::insert_into(recipes)
            .values((
                author_id.eq(author),
                name.eq(new_recipe.name),
                text.eq(new_recipe.text),
                cooking_time.eq(new_recipe.cooking_time),
                pub_date.eq(chrono::Utc::now().naive_utc()),
                short_link.eq(crate::short_link::generate()),
            ))
            .returning(Recipe::as_returning())
            .get_result(conn)
            .map_err(|e| Error::from_diesel(Entity::Recipe, e))?;
        insert_composition(conn, recipe.id, composition)?;
        Ok(recipe)
    })?;
    log::info!(
        "created recipe {recipe} ({}) with {} ingredients",
        recipe.short_link,
        composition.len()
    );
    Ok(recipe)
}

pub fn get_recipe(conn: &mut database::Connection, recipe_id: RecipeId) -> Result<Recipe> {
    use database::schema::recipes::dsl::*;

    recipes
        .find(recipe_id)
        .select(Recipe::as_select())
        .get_result(conn)
        .map_err(|e| Error::from_diesel(Entity::Recipe, e))
}

pub fn get_recipe_by_short_link(conn: &mut database::Connection, link: &str) -> Result<Recipe> {
    use database::schema::recipes::dsl::*;

    recipes
        .filter(short_link.eq(link))
        .select(Recipe::as_select())
        .get_result(conn)
        .map_err(|e| Error::from_diesel(Entity::Recipe, e))
}

/// Newest first.
pub fn list_recipes(conn: &mut database::Connection) -> Result<Vec<Recipe>> {
    use database::schema::recipes::dsl::*;

    Ok(recipes
        .order((pub_date.desc(), id.desc()))
        .select(Recipe::as_select())
        .load(conn)?)
}

pub fn list_recipes_by_author(
    conn: &mut database::Connection,
    author: UserId,
) -> Result<Vec<Recipe>> {
    use database::schema::recipes::dsl::*;

    Ok(recipes
        .filter(author_id.eq(author))
        .order((pub_date.desc(), id.desc()))
        .select(Recipe::as_select())
        .load(conn)?)
}

/// Applies `changes` and, when given, replaces the whole ingredient list. The publication date
/// and short link never change.
pub fn update_recipe(
    conn: &mut database::Connection,
    recipe_id: RecipeId,
    changes: &RecipeChanges<'_>,
    composition: Option<&[IngredientAmount]>,
) -> Result<Recipe> {
    changes.validate()?;
    if let Some(composition) = composition {
        check_composition(composition)?;
    }

    let recipe = conn.transaction::<_, Error, _>(|conn| {
        use database::schema::{ingredients_in_recipes, recipes};

        let recipe = if changes.is_empty() {
            get_recipe(conn, recipe_id)?
        } else {
            diesel::update(recipes::table.find(recipe_id))
                .set(changes)
                .returning(Recipe::as_returning())
                .get_result(conn)
                .map_err(|e| Error::from_diesel(Entity::Recipe, e))?
        };
        if let Some(composition) = composition {
            diesel::delete(
                ingredients_in_recipes::table
                    .filter(ingredients_in_recipes::recipe_id.eq(recipe.id)),
            )
            .execute(conn)?;
            insert_composition(conn, recipe.id, composition)?;
        }
        Ok(recipe)
    })?;
    log::info!("updated recipe {recipe} ({})", recipe.short_link);
    Ok(recipe)
}

/// Also removes the recipe's ingredient list and every cart and favorite entry pointing at it.
pub fn delete_recipe(conn: &mut database::Connection, delete_id: RecipeId) -> Result<()> {
    use database::schema::recipes::dsl::*;

    let deleted = diesel::delete(recipes.filter(id.eq(delete_id))).execute(conn)?;
    if deleted == 0 {
        return Err(Error::NotFound {
            entity: Entity::Recipe,
        });
    }
    log::info!("deleted recipe {delete_id}");
    Ok(())
}

pub fn add_recipe_ingredient(
    conn: &mut database::Connection,
    recipe: RecipeId,
    item: IngredientAmount,
) -> Result<()> {
    item.validate()?;
    insert_composition(conn, recipe, &[item])?;
    log::info!("added ingredient {} to recipe {recipe}", item.ingredient_id);
    Ok(())
}

pub fn remove_recipe_ingredient(
    conn: &mut database::Connection,
    recipe: RecipeId,
    ingredient: IngredientId,
) -> Result<bool> {
    use database::schema::ingredients_in_recipes::dsl::*;

    let deleted = diesel::delete(
        ingredients_in_recipes
            .filter(recipe_id.eq(recipe))
            .filter(ingredient_id.eq(ingredient)),
    )
    .execute(conn)?;
    Ok(deleted > 0)
}

/// The recipe's ingredients, alphabetically.
pub fn recipe_ingredients(
    conn: &mut database::Connection,
    recipe_id: RecipeId,
) -> Result<Vec<RecipeIngredient>> {
    use database::schema::{ingredients, ingredients_in_recipes};

    let recipe = get_recipe(conn, recipe_id)?;
    let rows: Vec<(Ingredient, i32)> = ingredients_in_recipes::table
        .inner_join(ingredients::table)
        .filter(ingredients_in_recipes::recipe_id.eq(recipe_id))
        .order(ingredients::name.asc())
        .select((Ingredient::as_select(), ingredients_in_recipes::amount))
        .load(conn)?;
    log::debug!("recipe {recipe} has {} ingredients", rows.len());

    Ok(rows
        .into_iter()
        .map(|(ingredient, amount)| RecipeIngredient {
            recipe: recipe.clone(),
            ingredient,
            amount,
        })
        .collect())
}

#[cfg(test)]
use crate::database::fixtures;

#[cfg(test)]
fn amounts(conn: &mut database::Connection, recipe: RecipeId) -> Vec<(String, i32)> {
    recipe_ingredients(conn, recipe)
        .unwrap()
        .into_iter()
        .map(|r| (r.ingredient.name, r.amount))
        .collect()
}

#[test]
fn create_with_ingredients() {
    let mut conn = fixtures::connection();
    let author = fixtures::user(&mut conn, "chef");
    let flour = fixtures::ingredient(&mut conn, "flour", "g");
    let egg = fixtures::ingredient(&mut conn, "egg", "pcs");

    let recipe = fixtures::recipe(&mut conn, &author, "Pancakes", &[(&flour, 200), (&egg, 2)]);
    assert_eq!(recipe.author_id, author.id);
    assert_eq!(recipe.cooking_time, 15);
    assert_eq!(recipe.short_link.len(), crate::short_link::LENGTH);

    assert_eq!(
        amounts(&mut conn, recipe.id),
        [("egg".to_owned(), 2), ("flour".to_owned(), 200)]
    );
    let listed = recipe_ingredients(&mut conn, recipe.id).unwrap();
    assert_eq!(listed[0].to_string(), "Pancakes - 2 egg (pcs)");

    assert_eq!(get_recipe(&mut conn, recipe.id).unwrap(), recipe);
    assert_eq!(
        get_recipe_by_short_link(&mut conn, &recipe.short_link).unwrap(),
        recipe
    );
    assert!(get_recipe_by_short_link(&mut conn, "missing")
        .unwrap_err()
        .is_not_found());
}

#[test]
fn cooking_time_must_be_positive() {
    let mut conn = fixtures::connection();
    let author = fixtures::user(&mut conn, "chef");

    let err = create_recipe(
        &mut conn,
        author.id,
        &NewRecipe {
            name: "Instant",
            text: "Nothing to do.",
            cooking_time: 0,
        },
        &[],
    )
    .unwrap_err();
    assert!(
        matches!(err, Error::Validation(ref v) if v.field == "cooking_time"),
        "{err}"
    );
    assert!(list_recipes(&mut conn).unwrap().is_empty());
}

#[test]
fn cooking_time_is_checked_by_the_database() {
    use database::schema::recipes::dsl::*;

    let mut conn = fixtures::connection();
    let author = fixtures::user(&mut conn, "chef");
    let recipe = fixtures::recipe(&mut conn, &author, "Tea", &[]);

    let result = diesel::update(recipes.find(recipe.id))
        .set(cooking_time.eq(0))
        .execute(&mut conn);
    let err = Error::from_diesel(Entity::Recipe, result.unwrap_err());
    assert!(matches!(err, Error::Validation(_)), "{err}");
}

#[test]
fn amounts_must_be_positive_and_unique() {
    let mut conn = fixtures::connection();
    let author = fixtures::user(&mut conn, "chef");
    let salt = fixtures::ingredient(&mut conn, "salt", "g");
    let new_recipe = NewRecipe {
        name: "Brine",
        text: "Dissolve.",
        cooking_time: 5,
    };

    let err = create_recipe(
        &mut conn,
        author.id,
        &new_recipe,
        &[IngredientAmount {
            ingredient_id: salt.id,
            amount: 0,
        }],
    )
    .unwrap_err();
    assert!(
        matches!(err, Error::Validation(ref v) if v.field == "amount"),
        "{err}"
    );

    let twice = IngredientAmount {
        ingredient_id: salt.id,
        amount: 10,
    };
    let err = create_recipe(&mut conn, author.id, &new_recipe, &[twice, twice]).unwrap_err();
    assert!(err.is_conflict(), "{err}");
    assert!(list_recipes(&mut conn).unwrap().is_empty());

    let recipe = fixtures::recipe(&mut conn, &author, "Brine", &[(&salt, 10)]);
    let err = add_recipe_ingredient(&mut conn, recipe.id, twice).unwrap_err();
    assert!(err.is_conflict(), "{err}");
    assert_eq!(amounts(&mut conn, recipe.id), [("salt".to_owned(), 10)]);
}

#[test]
fn failed_composition_rolls_back_recipe() {
    let mut conn = fixtures::connection();
    let author = fixtures::user(&mut conn, "chef");
    let salt = fixtures::ingredient(&mut conn, "salt", "g");
    crate::database::query::delete_ingredient(&mut conn, salt.id).unwrap();

    let err = create_recipe(
        &mut conn,
        author.id,
        &NewRecipe {
            name: "Ghost soup",
            text: "Add the missing salt.",
            cooking_time: 5,
        },
        &[IngredientAmount {
            ingredient_id: salt.id,
            amount: 1,
        }],
    )
    .unwrap_err();
    assert!(matches!(err, Error::MissingReference { .. }), "{err}");
    assert!(list_recipes(&mut conn).unwrap().is_empty());
}

#[test]
fn short_links_are_unique() {
    use database::schema::recipes::dsl::*;

    let mut conn = fixtures::connection();
    let author = fixtures::user(&mut conn, "chef");
    let a = fixtures::recipe(&mut conn, &author, "A", &[]);
    let b = fixtures::recipe(&mut conn, &author, "B", &[]);
    assert_ne!(a.short_link, b.short_link);

    let result = diesel::update(recipes.find(b.id))
        .set(short_link.eq(&a.short_link))
        .execute(&mut conn);
    let err = Error::from_diesel(Entity::Recipe, result.unwrap_err());
    assert!(err.is_conflict(), "{err}");
}

#[test]
fn newest_first() {
    let mut conn = fixtures::connection();
    let anna = fixtures::user(&mut conn, "anna");
    let boris = fixtures::user(&mut conn, "boris");
    fixtures::recipe(&mut conn, &anna, "first", &[]);
    fixtures::recipe(&mut conn, &boris, "second", &[]);
    fixtures::recipe(&mut conn, &anna, "third", &[]);

    let names = |found: Vec<Recipe>| found.into_iter().map(|r| r.name).collect::<Vec<_>>();
    assert_eq!(
        names(list_recipes(&mut conn).unwrap()),
        ["third", "second", "first"]
    );
    assert_eq!(
        names(list_recipes_by_author(&mut conn, anna.id).unwrap()),
        ["third", "first"]
    );
}

#[test]
fn edits_keep_publication_date_and_link() {
    let mut conn = fixtures::connection();
    let author = fixtures::user(&mut conn, "chef");
    let flour = fixtures::ingredient(&mut conn, "flour", "g");
    let milk = fixtures::ingredient(&mut conn, "milk", "ml");
    let recipe = fixtures::recipe(&mut conn, &author, "Crepes", &[(&flour, 100)]);

    let edited = update_recipe(
        &mut conn,
        recipe.id,
        &RecipeChanges {
            name: Some("Thin crepes"),
            cooking_time: Some(25),
            ..Default::default()
        },
        Some(&[
            IngredientAmount {
                ingredient_id: flour.id,
                amount: 120,
            },
            IngredientAmount {
                ingredient_id: milk.id,
                amount: 300,
            },
        ]),
    )
    .unwrap();
    assert_eq!(edited.name, "Thin crepes");
    assert_eq!(edited.cooking_time, 25);
    assert_eq!(edited.text, recipe.text);
    assert_eq!(edited.pub_date, recipe.pub_date);
    assert_eq!(edited.short_link, recipe.short_link);
    assert_eq!(
        amounts(&mut conn, recipe.id),
        [("flour".to_owned(), 120), ("milk".to_owned(), 300)]
    );

    let untouched = update_recipe(&mut conn, recipe.id, &RecipeChanges::default(), None).unwrap();
    assert_eq!(untouched, edited);
    assert_eq!(amounts(&mut conn, recipe.id).len(), 2);

    assert!(remove_recipe_ingredient(&mut conn, recipe.id, milk.id).unwrap());
    assert!(!remove_recipe_ingredient(&mut conn, recipe.id, milk.id).unwrap());
    assert_eq!(amounts(&mut conn, recipe.id), [("flour".to_owned(), 120)]);

    let err = update_recipe(
        &mut conn,
        recipe.id,
        &RecipeChanges {
            cooking_time: Some(0),
            ..Default::default()
        },
        None,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "{err}");
}

#[test]
fn deleting_an_ingredient_drops_it_from_recipes() {
    let mut conn = fixtures::connection();
    let author = fixtures::user(&mut conn, "chef");
    let flour = fixtures::ingredient(&mut conn, "flour", "g");
    let egg = fixtures::ingredient(&mut conn, "egg", "pcs");
    let recipe = fixtures::recipe(&mut conn, &author, "Pasta", &[(&flour, 100), (&egg, 1)]);

    crate::database::query::delete_ingredient(&mut conn, egg.id).unwrap();
    assert_eq!(amounts(&mut conn, recipe.id), [("flour".to_owned(), 100)]);
    assert_eq!(get_recipe(&mut conn, recipe.id).unwrap(), recipe);
}
