// Copyright 2023 Remi Bernotavicius

use crate::database::models::{Entity, NewUser, User, UserChanges, UserId};
use crate::database::validate::Validate as _;
use crate::database::{self, Error, Result};
use diesel::prelude::OptionalExtension as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;

pub fn create_user(conn: &mut database::Connection, new_user: &NewUser<'_>) -> Result<User> {
    use database::schema::users::dsl::*;

    new_user.validate()?;
    let user = diesel::insert_into(users)
        .values((new_user, date_joined.eq(chrono::Utc::now().naive_utc())))
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(|e| Error::from_diesel(Entity::User, e))?;
    log::info!("created user {user} ({})", user.id);
    Ok(user)
}

pub fn get_user(conn: &mut database::Connection, user_id: UserId) -> Result<User> {
    use database::schema::users::dsl::*;

    users
        .find(user_id)
        .select(User::as_select())
        .get_result(conn)
        .map_err(|e| Error::from_diesel(Entity::User, e))
}

pub fn find_user_by_username(
    conn: &mut database::Connection,
    wanted: &str,
) -> Result<Option<User>> {
    use database::schema::users::dsl::*;

    Ok(users
        .filter(username.eq(wanted))
        .select(User::as_select())
        .get_result(conn)
        .optional()?)
}

pub fn list_users(conn: &mut database::Connection) -> Result<Vec<User>> {
    use database::schema::users::dsl::*;

    Ok(users.order(id.asc()).select(User::as_select()).load(conn)?)
}

pub fn update_user(
    conn: &mut database::Connection,
    user_id: UserId,
    changes: &UserChanges<'_>,
) -> Result<User> {
    use database::schema::users::dsl::*;

    changes.validate()?;
    if changes.is_empty() {
        return get_user(conn, user_id);
    }
    let user = diesel::update(users.find(user_id))
        .set(changes)
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(|e| Error::from_diesel(Entity::User, e))?;
    log::info!("updated user {user} ({})", user.id);
    Ok(user)
}

pub fn record_login(conn: &mut database::Connection, user_id: UserId) -> Result<User> {
    use database::schema::users::dsl::*;

    diesel::update(users.find(user_id))
        .set(last_login.eq(chrono::Utc::now().naive_utc()))
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(|e| Error::from_diesel(Entity::User, e))
}

/// Removes the account together with its recipes, cart entries and favorites.
pub fn delete_user(conn: &mut database::Connection, delete_id: UserId) -> Result<()> {
    use database::schema::users::dsl::*;

    let deleted = diesel::delete(users.filter(id.eq(delete_id))).execute(conn)?;
    if deleted == 0 {
        return Err(Error::NotFound {
            entity: Entity::User,
        });
    }
    log::info!("deleted user {delete_id}");
    Ok(())
}

#[cfg(test)]
use crate::database::fixtures;

#[test]
fn email_and_username_are_unique() {
    let mut conn = fixtures::connection();
    let anna = fixtures::user(&mut conn, "anna");

    let same_email = NewUser {
        username: "anna2",
        password: "hash",
        first_name: "Anna",
        last_name: "Two",
        email: &anna.email,
        is_staff: false,
        is_superuser: false,
    };
    let err = create_user(&mut conn, &same_email).unwrap_err();
    assert!(err.is_conflict(), "{err}");

    let same_username = NewUser {
        username: "anna",
        email: "other@example.com",
        ..same_email
    };
    let err = create_user(&mut conn, &same_username).unwrap_err();
    assert!(err.is_conflict(), "{err}");

    assert_eq!(list_users(&mut conn).unwrap(), vec![anna]);
}

#[test]
fn new_users_are_active_and_unprivileged() {
    let mut conn = fixtures::connection();
    let user = fixtures::user(&mut conn, "boris");
    assert!(user.is_active);
    assert!(!user.is_staff);
    assert!(!user.is_superuser);
    assert_eq!(user.last_login, None);
    assert_eq!(user.to_string(), "boris");

    let user = record_login(&mut conn, user.id).unwrap();
    assert!(user.last_login.is_some());
}

#[test]
fn profile_edits() {
    let mut conn = fixtures::connection();
    let user = fixtures::user(&mut conn, "vera");
    fixtures::user(&mut conn, "gleb");

    let changed = update_user(
        &mut conn,
        user.id,
        &UserChanges {
            first_name: Some("Vera"),
            email: Some("vera@mail.example.com"),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(changed.first_name, "Vera");
    assert_eq!(changed.last_name, "User");
    assert_eq!(changed.email, "vera@mail.example.com");
    assert_eq!(changed.date_joined, user.date_joined);

    let unchanged = update_user(&mut conn, user.id, &UserChanges::default()).unwrap();
    assert_eq!(unchanged, changed);

    let err = update_user(
        &mut conn,
        user.id,
        &UserChanges {
            email: Some("gleb@example.com"),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(err.is_conflict(), "{err}");

    let err = update_user(
        &mut conn,
        user.id,
        &UserChanges {
            email: Some("not-an-email"),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "{err}");
}

#[test]
fn lookup_and_delete() {
    let mut conn = fixtures::connection();
    let user = fixtures::user(&mut conn, "dina");

    assert_eq!(
        find_user_by_username(&mut conn, "dina").unwrap(),
        Some(user.clone())
    );
    assert_eq!(find_user_by_username(&mut conn, "nobody").unwrap(), None);

    delete_user(&mut conn, user.id).unwrap();
    assert!(get_user(&mut conn, user.id).unwrap_err().is_not_found());
    assert!(delete_user(&mut conn, user.id).unwrap_err().is_not_found());
}
