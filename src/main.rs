// Copyright 2023 Remi Bernotavicius

use clap::Parser;
use clap::Subcommand;
use foodgram::database::models::{Entity, NewUser, User};
use foodgram::database::{self, query};
use foodgram::{import, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    /// Use this database file instead of the one in the user data directory.
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the database or bring it up to date.
    Migrate,
    /// Print how many rows each table holds.
    Stats,
    ImportIngredients {
        path: PathBuf,
    },
    ListIngredients {
        #[arg(long)]
        prefix: Option<String>,
    },
    ListRecipes,
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Already-hashed password, stored as given.
        #[arg(long)]
        password_hash: String,
        #[arg(long)]
        staff: bool,
        #[arg(long)]
        superuser: bool,
    },
    /// Delete a user along with their recipes, cart and favorites.
    DeleteUser {
        username: String,
    },
    ShoppingList {
        username: String,
    },
}

/// This is where the database and other user-data lives on-disk. On Linux it should be like:
/// `~/.local/share/foodgram/`
fn data_path() -> Result<PathBuf> {
    let dirs = directories::BaseDirs::new().ok_or("failed to get user home directory")?;
    let path = dirs.data_dir().join("foodgram");
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

fn user_by_name(conn: &mut database::Connection, username: &str) -> Result<User> {
    Ok(query::find_user_by_username(conn, username)?
        .ok_or_else(|| format!("no user named {username:?}"))?)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    simple_logger::SimpleLogger::new().with_level(level).init()?;

    let path = match args.database {
        Some(path) => path,
        None => data_path()?.join("data.sqlite"),
    };
    let mut conn = database::establish_connection(&path)?;

    match args.commands {
        Commands::Migrate => log::info!("database at {} is up to date", path.display()),
        Commands::Stats => {
            for entity in Entity::iter() {
                let count = query::count(&mut conn, entity)?;
                println!("{}: {count}", entity.verbose_name_plural());
            }
        }
        Commands::ImportIngredients { path } => {
            let importer = import::import_ingredients(&mut conn, path)?;
            println!(
                "imported {} ingredients, skipped {} already in the catalog",
                importer.num_imported(),
                importer.num_skipped()
            );
        }
        Commands::ListIngredients { prefix } => {
            let ingredients = match prefix {
                Some(prefix) => query::search_ingredients(&mut conn, &prefix)?,
                None => query::list_ingredients(&mut conn)?,
            };
            for i in ingredients {
                println!("{i}");
            }
        }
        Commands::ListRecipes => {
            for recipe in query::list_recipes(&mut conn)? {
                let author = query::get_user(&mut conn, recipe.author_id)?;
                println!(
                    "{} {recipe} by {author}, {} min",
                    recipe.short_link, recipe.cooking_time
                );
            }
        }
        Commands::CreateUser {
            username,
            email,
            first_name,
            last_name,
            password_hash,
            staff,
            superuser,
        } => {
            let user = query::create_user(
                &mut conn,
                &NewUser {
                    username: &username,
                    password: &password_hash,
                    first_name: &first_name,
                    last_name: &last_name,
                    email: &email,
                    is_staff: staff || superuser,
                    is_superuser: superuser,
                },
            )?;
            println!("created {user} ({})", user.id);
        }
        Commands::DeleteUser { username } => {
            let user = user_by_name(&mut conn, &username)?;
            query::delete_user(&mut conn, user.id)?;
            println!("deleted {user}");
        }
        Commands::ShoppingList { username } => {
            let user = user_by_name(&mut conn, &username)?;
            for item in query::shopping_list(&mut conn, user.id)? {
                println!("{item}");
            }
        }
    }
    Ok(())
}
