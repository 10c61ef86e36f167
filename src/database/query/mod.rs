// Copyright 2023 Remi Bernotavicius

use crate::database::models::Entity;
use crate::database::{self, Result};
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;

mod ingredients;
mod lists;
mod recipes;
mod users;

pub use ingredients::*;
pub use lists::*;
pub use recipes::*;
pub use users::*;

pub fn count(conn: &mut database::Connection, entity: Entity) -> Result<i64> {
    use database::schema;

    let count = match entity {
        Entity::User => schema::users::table.count().get_result(conn),
        Entity::Ingredient => schema::ingredients::table.count().get_result(conn),
        Entity::Recipe => schema::recipes::table.count().get_result(conn),
        Entity::IngredientInRecipe => {
            schema::ingredients_in_recipes::table.count().get_result(conn)
        }
        Entity::ShoppingCart => schema::shopping_carts::table.count().get_result(conn),
        Entity::Favorite => schema::favorites::table.count().get_result(conn),
    };
    Ok(count?)
}
