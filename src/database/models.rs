// Copyright 2023 Remi Bernotavicius

use derive_more::Display;
use diesel::associations::{Associations, Identifiable};
use diesel::deserialize::Queryable;
use diesel::expression::Selectable;
use diesel::prelude::{AsChangeset, Insertable};
use diesel_derive_newtype::DieselNewType;
use std::fmt;
use strum::EnumIter;

pub const MAX_LEN_USERNAME: usize = 150;
pub const MAX_LEN_FIRST_NAME: usize = 32;
pub const MAX_LEN_LAST_NAME: usize = 32;
pub const MAX_LEN_EMAIL: usize = 50;
pub const MAX_LEN_INGREDIENT_NAME: usize = 60;
pub const MAX_LEN_MEASUREMENT_UNIT: usize = 30;
pub const MAX_LEN_RECIPE_NAME: usize = 256;

pub const MIN_COOKING_TIME: i32 = 1;
pub const MIN_AMOUNT: i32 = 1;

/// Every persisted entity, with the labels used when presenting it to people.
#[derive(Debug, Display, EnumIter, Hash, Copy, Clone, PartialEq, Eq)]
pub enum Entity {
    #[display("user")]
    User,
    #[display("ingredient")]
    Ingredient,
    #[display("recipe")]
    Recipe,
    #[display("recipe ingredient")]
    IngredientInRecipe,
    #[display("shopping cart entry")]
    ShoppingCart,
    #[display("favorite")]
    Favorite,
}

impl Entity {
    pub fn iter() -> impl Iterator<Item = Self> {
        <Self as strum::IntoEnumIterator>::iter()
    }

    pub fn verbose_name(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Ingredient => "Ingredient",
            Self::Recipe => "Recipe",
            Self::IngredientInRecipe => "Recipe ingredient",
            Self::ShoppingCart => "Shopping cart",
            Self::Favorite => "Favorite recipe",
        }
    }

    pub fn verbose_name_plural(&self) -> &'static str {
        match self {
            Self::User => "Users",
            Self::Ingredient => "Ingredients",
            Self::Recipe => "Recipes",
            Self::IngredientInRecipe => "Recipe ingredients",
            Self::ShoppingCart => "Shopping carts",
            Self::Favorite => "Favorite recipes",
        }
    }
}

#[derive(DieselNewType, Debug, Display, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct UserId(i32);

/// An account. The identity fields (password hash, flags, join date) live directly on the row.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::database::schema::users)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: chrono::NaiveDateTime,
    pub last_login: Option<chrono::NaiveDateTime>,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.username)
    }
}

/// `password` is stored as given; hashing belongs to whatever authenticates users.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::database::schema::users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(AsChangeset, Default, Debug, Clone)]
#[diesel(table_name = crate::database::schema::users)]
pub struct UserChanges<'a> {
    pub username: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub is_active: Option<bool>,
}

impl UserChanges<'_> {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.is_active.is_none()
    }
}

#[derive(DieselNewType, Debug, Display, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct IngredientId(i32);

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.measurement_unit)
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct NewIngredient<'a> {
    pub name: &'a str,
    pub measurement_unit: &'a str,
}

#[derive(DieselNewType, Debug, Display, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct RecipeId(i32);

#[derive(Associations, Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(belongs_to(User, foreign_key = author_id))]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct Recipe {
    pub id: RecipeId,
    pub author_id: UserId,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: chrono::NaiveDateTime,
    pub short_link: String,
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The author-supplied part of a recipe. The publication date and short link are filled in on
/// creation.
#[derive(Debug, Clone)]
pub struct NewRecipe<'a> {
    pub name: &'a str,
    pub text: &'a str,
    pub cooking_time: i32,
}

#[derive(AsChangeset, Default, Debug, Clone)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct RecipeChanges<'a> {
    pub name: Option<&'a str>,
    pub text: Option<&'a str>,
    pub cooking_time: Option<i32>,
}

impl RecipeChanges<'_> {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.text.is_none() && self.cooking_time.is_none()
    }
}

#[derive(DieselNewType, Debug, Display, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct IngredientInRecipeId(i32);

#[derive(Associations, Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(belongs_to(Recipe))]
#[diesel(belongs_to(Ingredient))]
#[diesel(table_name = crate::database::schema::ingredients_in_recipes)]
pub struct IngredientInRecipe {
    pub id: IngredientInRecipeId,
    pub recipe_id: RecipeId,
    pub ingredient_id: IngredientId,
    pub amount: i32,
}

/// One line of a recipe's composition as supplied by its author.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IngredientAmount {
    pub ingredient_id: IngredientId,
    pub amount: i32,
}

#[derive(Insertable, Debug, Copy, Clone)]
#[diesel(table_name = crate::database::schema::ingredients_in_recipes)]
pub struct NewIngredientInRecipe {
    pub recipe_id: RecipeId,
    pub ingredient_id: IngredientId,
    pub amount: i32,
}

/// A composition row joined with the recipe and catalog entry it connects.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeIngredient {
    pub recipe: Recipe,
    pub ingredient: Ingredient,
    pub amount: i32,
}

impl fmt::Display for RecipeIngredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} {}", self.recipe, self.amount, self.ingredient)
    }
}

#[derive(DieselNewType, Debug, Display, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct ShoppingCartId(i32);

#[derive(Associations, Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Recipe))]
#[diesel(table_name = crate::database::schema::shopping_carts)]
pub struct ShoppingCart {
    pub id: ShoppingCartId,
    pub user_id: UserId,
    pub recipe_id: RecipeId,
}

#[derive(DieselNewType, Debug, Display, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct FavoriteId(i32);

#[derive(Associations, Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Recipe))]
#[diesel(table_name = crate::database::schema::favorites)]
pub struct Favorite {
    pub id: FavoriteId,
    pub user_id: UserId,
    pub recipe_id: RecipeId,
}

/// Total amount of one ingredient across every recipe in a user's shopping cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

impl fmt::Display for ShoppingListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) - {}", self.name, self.measurement_unit, self.amount)
    }
}

#[test]
fn entity_labels() {
    let plural: Vec<_> = Entity::iter().map(|e| e.verbose_name_plural()).collect();
    assert_eq!(
        plural,
        [
            "Users",
            "Ingredients",
            "Recipes",
            "Recipe ingredients",
            "Shopping carts",
            "Favorite recipes"
        ]
    );
    assert_eq!(Entity::IngredientInRecipe.to_string(), "recipe ingredient");
    assert_eq!(Entity::Favorite.verbose_name(), "Favorite recipe");
}

#[test]
fn display_renderings() {
    let salt = Ingredient {
        id: IngredientId(1),
        name: "salt".into(),
        measurement_unit: "g".into(),
    };
    assert_eq!(salt.to_string(), "salt (g)");

    let recipe = Recipe {
        id: RecipeId(1),
        author_id: UserId(1),
        name: "Soup".into(),
        text: "Boil water.".into(),
        cooking_time: 10,
        pub_date: chrono::NaiveDateTime::default(),
        short_link: "2222222222222222222223".into(),
    };
    assert_eq!(recipe.to_string(), "Soup");

    let usage = RecipeIngredient {
        recipe,
        ingredient: salt,
        amount: 5,
    };
    assert_eq!(usage.to_string(), "Soup - 5 salt (g)");

    let item = ShoppingListItem {
        name: "salt".into(),
        measurement_unit: "g".into(),
        amount: 15,
    };
    assert_eq!(item.to_string(), "salt (g) - 15");
}
