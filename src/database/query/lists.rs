// Copyright 2023 Remi Bernotavicius

//! Per-user recipe lists: the shopping cart and favorites. Both are plain (user, recipe) pairs
//! that may appear at most once.

use crate::database::models::{
    Entity, Favorite, Ingredient, Recipe, RecipeId, ShoppingCart, ShoppingListItem, UserId,
};
use crate::database::{self, Error, Result};
use diesel::ExpressionMethods as _;
use diesel::JoinOnDsl as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use std::collections::BTreeMap;

pub fn add_to_shopping_cart(
    conn: &mut database::Connection,
    user: UserId,
    recipe: RecipeId,
) -> Result<ShoppingCart> {
    use database::schema::shopping_carts::dsl::*;

    let entry = diesel::insert_into(shopping_carts)
        .values((user_id.eq(user), recipe_id.eq(recipe)))
        .returning(ShoppingCart::as_returning())
        .get_result(conn)
        .map_err(|e| Error::from_diesel(Entity::ShoppingCart, e))?;
    log::info!("user {user} added recipe {recipe} to their shopping cart");
    Ok(entry)
}

/// Returns whether the recipe was in the cart.
pub fn remove_from_shopping_cart(
    conn: &mut database::Connection,
    user: UserId,
    recipe: RecipeId,
) -> Result<bool> {
    use database::schema::shopping_carts::dsl::*;

    let deleted = diesel::delete(
        shopping_carts
            .filter(user_id.eq(user))
            .filter(recipe_id.eq(recipe)),
    )
    .execute(conn)?;
    if deleted > 0 {
        log::info!("user {user} removed recipe {recipe} from their shopping cart");
    }
    Ok(deleted > 0)
}

pub fn is_in_shopping_cart(
    conn: &mut database::Connection,
    user: UserId,
    recipe: RecipeId,
) -> Result<bool> {
    use database::schema::shopping_carts::dsl::*;

    Ok(diesel::select(diesel::dsl::exists(
        shopping_carts
            .filter(user_id.eq(user))
            .filter(recipe_id.eq(recipe)),
    ))
    .get_result(conn)?)
}

pub fn shopping_cart_recipes(
    conn: &mut database::Connection,
    user: UserId,
) -> Result<Vec<Recipe>> {
    use database::schema::{recipes, shopping_carts};

    Ok(shopping_carts::table
        .inner_join(recipes::table)
        .filter(shopping_carts::user_id.eq(user))
        .order((recipes::pub_date.desc(), recipes::id.desc()))
        .select(Recipe::as_select())
        .load(conn)?)
}

/// Everything needed to cook the recipes in the user's cart, summed per ingredient and ordered
/// by ingredient name.
pub fn shopping_list(
    conn: &mut database::Connection,
    user: UserId,
) -> Result<Vec<ShoppingListItem>> {
    use database::schema::{ingredients, ingredients_in_recipes, shopping_carts};

    let usages: Vec<(Ingredient, i32)> = shopping_carts::table
        .inner_join(
            ingredients_in_recipes::table
                .on(ingredients_in_recipes::recipe_id.eq(shopping_carts::recipe_id)),
        )
        .inner_join(
            ingredients::table.on(ingredients::id.eq(ingredients_in_recipes::ingredient_id)),
        )
        .filter(shopping_carts::user_id.eq(user))
        .select((Ingredient::as_select(), ingredients_in_recipes::amount))
        .load(conn)?;

    let mut totals: BTreeMap<String, ShoppingListItem> = BTreeMap::new();
    for (i, amount) in usages {
        totals
            .entry(i.name.clone())
            .or_insert_with(|| ShoppingListItem {
                name: i.name,
                measurement_unit: i.measurement_unit,
                amount: 0,
            })
            .amount += i64::from(amount);
    }
    log::debug!("shopping list for user {user} has {} items", totals.len());
    Ok(totals.into_values().collect())
}

pub fn add_favorite(
    conn: &mut database::Connection,
    user: UserId,
    recipe: RecipeId,
) -> Result<Favorite> {
    use database::schema::favorites::dsl::*;

    let entry = diesel::insert_into(favorites)
        .values((user_id.eq(user), recipe_id.eq(recipe)))
        .returning(Favorite::as_returning())
        .get_result(conn)
        .map_err(|e| Error::from_diesel(Entity::Favorite, e))?;
    log::info!("user {user} favorited recipe {recipe}");
    Ok(entry)
}

/// Returns whether the recipe was a favorite.
pub fn remove_favorite(
    conn: &mut database::Connection,
    user: UserId,
    recipe: RecipeId,
) -> Result<bool> {
    use database::schema::favorites::dsl::*;

    let deleted = diesel::delete(
        favorites
            .filter(user_id.eq(user))
            .filter(recipe_id.eq(recipe)),
    )
    .execute(conn)?;
    if deleted > 0 {
        log::info!("user {user} unfavorited recipe {recipe}");
    }
    Ok(deleted > 0)
}

pub fn is_favorited(
    conn: &mut database::Connection,
    user: UserId,
    recipe: RecipeId,
) -> Result<bool> {
    use database::schema::favorites::dsl::*;

    Ok(diesel::select(diesel::dsl::exists(
        favorites.filter(user_id.eq(user)).filter(recipe_id.eq(recipe)),
    ))
    .get_result(conn)?)
}

pub fn favorite_recipes(conn: &mut database::Connection, user: UserId) -> Result<Vec<Recipe>> {
    use database::schema::{favorites, recipes};

    Ok(favorites::table
        .inner_join(recipes::table)
        .filter(favorites::user_id.eq(user))
        .order((recipes::pub_date.desc(), recipes::id.desc()))
        .select(Recipe::as_select())
        .load(conn)?)
}

#[cfg(test)]
use crate::database::{fixtures, query};

#[test]
fn cart_entries_are_unique() {
    let mut conn = fixtures::connection();
    let user = fixtures::user(&mut conn, "anna");
    let recipe = fixtures::recipe(&mut conn, &user, "Soup", &[]);

    let entry = add_to_shopping_cart(&mut conn, user.id, recipe.id).unwrap();
    assert_eq!((entry.user_id, entry.recipe_id), (user.id, recipe.id));
    assert!(is_in_shopping_cart(&mut conn, user.id, recipe.id).unwrap());

    let err = add_to_shopping_cart(&mut conn, user.id, recipe.id).unwrap_err();
    assert!(err.is_conflict(), "{err}");

    // another user may hold the same recipe
    let other = fixtures::user(&mut conn, "boris");
    add_to_shopping_cart(&mut conn, other.id, recipe.id).unwrap();
    assert_eq!(query::count(&mut conn, Entity::ShoppingCart).unwrap(), 2);

    assert!(remove_from_shopping_cart(&mut conn, user.id, recipe.id).unwrap());
    assert!(!remove_from_shopping_cart(&mut conn, user.id, recipe.id).unwrap());
    assert!(!is_in_shopping_cart(&mut conn, user.id, recipe.id).unwrap());
    assert!(is_in_shopping_cart(&mut conn, other.id, recipe.id).unwrap());
}

#[test]
fn favorites_are_unique() {
    let mut conn = fixtures::connection();
    let user = fixtures::user(&mut conn, "anna");
    let soup = fixtures::recipe(&mut conn, &user, "Soup", &[]);
    let salad = fixtures::recipe(&mut conn, &user, "Salad", &[]);

    add_favorite(&mut conn, user.id, soup.id).unwrap();
    add_favorite(&mut conn, user.id, salad.id).unwrap();
    let err = add_favorite(&mut conn, user.id, soup.id).unwrap_err();
    assert!(err.is_conflict(), "{err}");

    assert_eq!(
        favorite_recipes(&mut conn, user.id).unwrap(),
        vec![salad.clone(), soup.clone()]
    );
    assert!(remove_favorite(&mut conn, user.id, salad.id).unwrap());
    assert!(!is_favorited(&mut conn, user.id, salad.id).unwrap());
    assert!(is_favorited(&mut conn, user.id, soup.id).unwrap());
}

#[test]
fn missing_recipe_is_reported() {
    let mut conn = fixtures::connection();
    let user = fixtures::user(&mut conn, "anna");
    let recipe = fixtures::recipe(&mut conn, &user, "Soup", &[]);
    query::delete_recipe(&mut conn, recipe.id).unwrap();

    let err = add_favorite(&mut conn, user.id, recipe.id).unwrap_err();
    assert!(matches!(err, Error::MissingReference { .. }), "{err}");
}

#[test]
fn shopping_list_sums_amounts() {
    use maplit::btreemap;

    let mut conn = fixtures::connection();
    let user = fixtures::user(&mut conn, "anna");
    let flour = fixtures::ingredient(&mut conn, "flour", "g");
    let egg = fixtures::ingredient(&mut conn, "egg", "pcs");
    let milk = fixtures::ingredient(&mut conn, "milk", "ml");
    let pancakes = fixtures::recipe(
        &mut conn,
        &user,
        "Pancakes",
        &[(&flour, 200), (&egg, 2), (&milk, 300)],
    );
    let bread = fixtures::recipe(&mut conn, &user, "Bread", &[(&flour, 500)]);
    let omelette = fixtures::recipe(&mut conn, &user, "Omelette", &[(&egg, 3)]);

    add_to_shopping_cart(&mut conn, user.id, pancakes.id).unwrap();
    add_to_shopping_cart(&mut conn, user.id, bread.id).unwrap();

    // in the cart of someone else only
    let other = fixtures::user(&mut conn, "boris");
    add_to_shopping_cart(&mut conn, other.id, omelette.id).unwrap();

    let items = shopping_list(&mut conn, user.id).unwrap();
    let list: BTreeMap<_, _> = items
        .iter()
        .map(|i| (i.name.as_str(), (i.measurement_unit.as_str(), i.amount)))
        .collect();
    assert_eq!(
        list,
        btreemap! {
            "egg" => ("pcs", 2),
            "flour" => ("g", 700),
            "milk" => ("ml", 300),
        }
    );
    assert_eq!(items[1].to_string(), "flour (g) - 700");

    assert_eq!(
        shopping_cart_recipes(&mut conn, user.id).unwrap(),
        vec![bread, pancakes]
    );
    let empty_cart = fixtures::user(&mut conn, "vera");
    assert!(shopping_list(&mut conn, empty_cart.id).unwrap().is_empty());
}

#[test]
fn deleting_a_recipe_cascades() {
    let mut conn = fixtures::connection();
    let author = fixtures::user(&mut conn, "anna");
    let fan = fixtures::user(&mut conn, "boris");
    let salt = fixtures::ingredient(&mut conn, "salt", "g");
    let recipe = fixtures::recipe(&mut conn, &author, "Brine", &[(&salt, 30)]);
    let kept = fixtures::recipe(&mut conn, &author, "Pickles", &[(&salt, 10)]);

    for user in [&author, &fan] {
        add_to_shopping_cart(&mut conn, user.id, recipe.id).unwrap();
        add_favorite(&mut conn, user.id, recipe.id).unwrap();
    }
    add_favorite(&mut conn, fan.id, kept.id).unwrap();

    query::delete_recipe(&mut conn, recipe.id).unwrap();
    assert!(query::delete_recipe(&mut conn, recipe.id)
        .unwrap_err()
        .is_not_found());

    assert_eq!(query::count(&mut conn, Entity::Recipe).unwrap(), 1);
    assert_eq!(query::count(&mut conn, Entity::IngredientInRecipe).unwrap(), 1);
    assert_eq!(query::count(&mut conn, Entity::ShoppingCart).unwrap(), 0);
    assert_eq!(query::count(&mut conn, Entity::Favorite).unwrap(), 1);
    // catalog and accounts are untouched
    assert_eq!(query::count(&mut conn, Entity::Ingredient).unwrap(), 1);
    assert_eq!(query::count(&mut conn, Entity::User).unwrap(), 2);
}

#[test]
fn deleting_a_user_cascades() {
    let mut conn = fixtures::connection();
    let author = fixtures::user(&mut conn, "anna");
    let fan = fixtures::user(&mut conn, "boris");
    let salt = fixtures::ingredient(&mut conn, "salt", "g");
    let by_author = fixtures::recipe(&mut conn, &author, "Brine", &[(&salt, 30)]);
    let by_fan = fixtures::recipe(&mut conn, &fan, "Pickles", &[(&salt, 10)]);

    add_favorite(&mut conn, fan.id, by_author.id).unwrap();
    add_to_shopping_cart(&mut conn, fan.id, by_author.id).unwrap();
    add_favorite(&mut conn, author.id, by_fan.id).unwrap();
    add_to_shopping_cart(&mut conn, author.id, by_fan.id).unwrap();

    query::delete_user(&mut conn, author.id).unwrap();

    assert_eq!(query::list_recipes(&mut conn).unwrap(), vec![by_fan.clone()]);
    assert_eq!(query::count(&mut conn, Entity::IngredientInRecipe).unwrap(), 1);
    assert_eq!(query::count(&mut conn, Entity::ShoppingCart).unwrap(), 0);
    assert_eq!(query::count(&mut conn, Entity::Favorite).unwrap(), 0);
    assert!(favorite_recipes(&mut conn, fan.id).unwrap().is_empty());
    assert_eq!(query::list_users(&mut conn).unwrap(), vec![fan]);
}
