use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use coaching_server::membership::Tier;
use coaching_server::user::{
    is_valid_email, PasswordCredentials, SqliteUserStore, User, UserAuthCredentialsStore,
    UserRole, UserStore,
};

/// Administrative operations on the user database. The server never exposes
/// these over HTTP; run this tool on the host instead.
#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to user.db.
    #[clap(long)]
    pub user_db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a user with the free tier and no password.
    CreateUser { name: String, email: String },
    /// Set or replace a user's password.
    SetPassword { email: String, password: String },
    /// Change a user's membership tier.
    SetTier { email: String, tier: String },
    /// Grant a user the admin role.
    Promote { email: String },
    /// Revert a user to the member role.
    Demote { email: String },
}

fn require_user(store: &SqliteUserStore, email: &str) -> Result<User> {
    store
        .get_user_by_email(email)
        .with_context(|| format!("No user with email {}", email))
}

fn parse_tier(s: &str) -> Result<Tier> {
    match Tier::ALL.iter().find(|tier| tier.as_str() == s) {
        Some(tier) => Ok(*tier),
        None => bail!("Unknown tier '{}', expected one of: free, bronze, silver, gold", s),
    }
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    let store = SqliteUserStore::new(&args.user_db)?;

    match args.command {
        Command::CreateUser { name, email } => {
            if !is_valid_email(&email) {
                bail!("Invalid email address: {}", email);
            }
            let user_id = store.create_user(&name, &email)?;
            println!("Created user {} ({})", user_id, email);
        }
        Command::SetPassword { email, password } => {
            let user = require_user(&store, &email)?;
            store.set_password_credentials(PasswordCredentials::new(user.id, &password)?)?;
            println!("Password updated for {}", email);
        }
        Command::SetTier { email, tier } => {
            let user = require_user(&store, &email)?;
            let tier = parse_tier(&tier)?;
            store.set_membership_tier(user.id, tier)?;
            println!("{} is now on the {} tier", email, tier);
        }
        Command::Promote { email } => {
            let user = require_user(&store, &email)?;
            store.set_role(user.id, UserRole::Admin)?;
            println!("{} is now an admin", email);
        }
        Command::Demote { email } => {
            let user = require_user(&store, &email)?;
            store.set_role(user.id, UserRole::Member)?;
            println!("{} is now a regular member", email);
        }
    }
    Ok(())
}
