// Copyright 2023 Remi Bernotavicius

//! Field validators. These mirror the constraints declared in the migrations so that bad input
//! is reported with a readable message before it ever reaches SQLite.

use crate::database::models::{
    IngredientAmount, NewIngredient, NewRecipe, NewUser, RecipeChanges, UserChanges,
    MAX_LEN_EMAIL, MAX_LEN_FIRST_NAME, MAX_LEN_INGREDIENT_NAME, MAX_LEN_LAST_NAME,
    MAX_LEN_MEASUREMENT_UNIT, MAX_LEN_RECIPE_NAME, MAX_LEN_USERNAME, MIN_AMOUNT,
    MIN_COOKING_TIME,
};
use derive_more::{Display, Error};

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
#[display("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub type Result = std::result::Result<(), ValidationError>;

pub trait Validate {
    fn validate(&self) -> Result;
}

pub fn required(field: &'static str, value: &str) -> Result {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "This field may not be blank."));
    }
    Ok(())
}

pub fn max_length(field: &'static str, value: &str, max: usize) -> Result {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::new(
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        ));
    }
    Ok(())
}

pub fn min_value(field: &'static str, value: i32, min: i32, message: &str) -> Result {
    if value < min {
        return Err(ValidationError::new(field, message));
    }
    Ok(())
}

pub fn email(field: &'static str, value: &str) -> Result {
    let invalid = || ValidationError::new(field, "Enter a valid email address.");

    if value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<_> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

/// Letters, digits and `@.+-_` only.
pub fn username(field: &'static str, value: &str) -> Result {
    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(ValidationError::new(
            field,
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

fn recipe_name(value: &str) -> Result {
    required("name", value)?;
    max_length("name", value, MAX_LEN_RECIPE_NAME)
}

fn cooking_time(value: i32) -> Result {
    min_value(
        "cooking_time",
        value,
        MIN_COOKING_TIME,
        "Cooking time must be greater than 0.",
    )
}

fn user_username(value: &str) -> Result {
    required("username", value)?;
    max_length("username", value, MAX_LEN_USERNAME)?;
    username("username", value)
}

fn user_email(value: &str) -> Result {
    max_length("email", value, MAX_LEN_EMAIL)?;
    email("email", value)
}

impl Validate for NewUser<'_> {
    fn validate(&self) -> Result {
        user_username(self.username)?;
        required("first_name", self.first_name)?;
        max_length("first_name", self.first_name, MAX_LEN_FIRST_NAME)?;
        required("last_name", self.last_name)?;
        max_length("last_name", self.last_name, MAX_LEN_LAST_NAME)?;
        user_email(self.email)
    }
}

impl Validate for UserChanges<'_> {
    fn validate(&self) -> Result {
        if let Some(v) = self.username {
            user_username(v)?;
        }
        if let Some(v) = self.first_name {
            required("first_name", v)?;
            max_length("first_name", v, MAX_LEN_FIRST_NAME)?;
        }
        if let Some(v) = self.last_name {
            required("last_name", v)?;
            max_length("last_name", v, MAX_LEN_LAST_NAME)?;
        }
        if let Some(v) = self.email {
            user_email(v)?;
        }
        Ok(())
    }
}

impl Validate for NewIngredient<'_> {
    fn validate(&self) -> Result {
        required("name", self.name)?;
        max_length("name", self.name, MAX_LEN_INGREDIENT_NAME)?;
        required("measurement_unit", self.measurement_unit)?;
        max_length(
            "measurement_unit",
            self.measurement_unit,
            MAX_LEN_MEASUREMENT_UNIT,
        )
    }
}

impl Validate for NewRecipe<'_> {
    fn validate(&self) -> Result {
        recipe_name(self.name)?;
        required("text", self.text)?;
        cooking_time(self.cooking_time)
    }
}

impl Validate for RecipeChanges<'_> {
    fn validate(&self) -> Result {
        if let Some(v) = self.name {
            recipe_name(v)?;
        }
        if let Some(v) = self.text {
            required("text", v)?;
        }
        if let Some(v) = self.cooking_time {
            cooking_time(v)?;
        }
        Ok(())
    }
}

impl Validate for IngredientAmount {
    fn validate(&self) -> Result {
        min_value(
            "amount",
            self.amount,
            MIN_AMOUNT,
            "Amount must be greater than 0.",
        )
    }
}

#[test]
fn lengths() {
    assert!(max_length("name", "salt", 4).is_ok());
    assert_eq!(
        max_length("name", "salts", 4),
        Err(ValidationError::new(
            "name",
            "Ensure this value has at most 4 characters (it has 5)."
        ))
    );
    // counted in characters, not bytes
    assert!(max_length("name", "щука", 4).is_ok());
}

#[test]
fn emails() {
    for good in ["a@b.io", "first.last+tag@mail.example.com"] {
        assert!(email("email", good).is_ok(), "{good}");
    }
    for bad in ["", "plain", "@b.io", "a@b", "a@@b.io", "a@b..io", "a b@c.io"] {
        assert!(email("email", bad).is_err(), "{bad}");
    }
}

#[test]
fn usernames() {
    assert!(username("username", "chef_anna.b+1@x-y").is_ok());
    assert!(username("username", "chef anna").is_err());
    assert!(username("username", "chef/anna").is_err());
}

#[test]
fn recipe_minimums() {
    let recipe = NewRecipe {
        name: "Tea",
        text: "Steep.",
        cooking_time: 0,
    };
    assert_eq!(
        recipe.validate(),
        Err(ValidationError::new(
            "cooking_time",
            "Cooking time must be greater than 0."
        ))
    );
    assert!(NewRecipe {
        cooking_time: 1,
        ..recipe
    }
    .validate()
    .is_ok());

    let long_name = "x".repeat(MAX_LEN_RECIPE_NAME + 1);
    assert_eq!(
        RecipeChanges {
            name: Some(&long_name),
            ..Default::default()
        }
        .validate()
        .unwrap_err()
        .field,
        "name"
    );
}

#[test]
fn user_fields() {
    let user = NewUser {
        username: "anna",
        password: "hash",
        first_name: "Anna",
        last_name: "Karenina",
        email: "anna@example.com",
        is_staff: false,
        is_superuser: false,
    };
    assert!(user.validate().is_ok());

    let long_first = "a".repeat(MAX_LEN_FIRST_NAME + 1);
    let err = NewUser {
        first_name: &long_first,
        ..user.clone()
    }
    .validate()
    .unwrap_err();
    assert_eq!(err.field, "first_name");

    let long_email = format!("{}@example.com", "a".repeat(MAX_LEN_EMAIL));
    let err = NewUser {
        email: &long_email,
        ..user
    }
    .validate()
    .unwrap_err();
    assert_eq!(err.field, "email");
}
