//! `userdesk`: console front end for the user-directory API.
//!
//! Each subcommand is one operation of the client library; results are printed
//! as JSON on stdout, logs go to stderr.

use std::io::BufRead;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{Map, Value};

use userdesk_client::{ClientConfig, ClientContext, SessionState, SessionStorage};
use userdesk_core::{ID_FIELD, NewUser, UserFilter, UserId, UserPatch, UserRecord};

/// Administrative client for the user directory.
#[derive(Parser, Debug)]
#[command(name = "userdesk", about = "User directory admin client")]
struct Cli {
    /// Directory API base URL (default: $USERDESK_API_URL).
    #[arg(long = "api-url", global = true)]
    api_url: Option<String>,

    /// Session storage: `memory`, `none`, or a database path (default: $USERDESK_SESSION).
    #[arg(long = "session", global = true)]
    session: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and persist the session.
    Login {
        username: String,
        /// Password (read from stdin when omitted).
        #[arg(long)]
        password: Option<String>,
    },

    /// Drop the local session.
    Logout,

    /// Show the signed-in user.
    Whoami,

    /// Check the stored token with the server; clears the session when rejected.
    Validate,

    /// Exchange the stored token for a new one.
    Refresh,

    /// Operations on the `users` collection (requires a session).
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
}

#[derive(Subcommand, Debug)]
enum UsersAction {
    /// List one page.
    List {
        #[arg(long, default_value_t = 0)]
        skip: u64,
        #[arg(long, default_value_t = userdesk_client::users::DEFAULT_LIMIT)]
        limit: u64,
    },
    /// Show one user.
    Get { id: UserId },
    /// Free-text search.
    Search { query: String },
    /// Filter by attributes; unset filters are not sent.
    Filter {
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long = "blood-group")]
        blood_group: Option<String>,
        #[arg(long = "eye-color")]
        eye_color: Option<String>,
    },
    /// Create a user from a JSON document.
    Add {
        #[arg(long = "json")]
        json_body: String,
    },
    /// Replace a whole record: fetch, apply `--set` edits, PUT back.
    Update {
        id: UserId,
        /// `field=value` edits; values are parsed as JSON, else taken as strings.
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,
    },
    /// Send only the given fields.
    Patch {
        id: UserId,
        #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
        set: Vec<String>,
    },
    /// Delete a user.
    Delete { id: UserId },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    userdesk_observability::init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if let Some(session) = cli.session.as_deref() {
        config.session = SessionStorage::parse(session);
    }

    let ctx = ClientContext::new(&config)?;

    match cli.command {
        Commands::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };
            let profile = ctx.auth.login(&username, &password).await?;
            print_json(&profile)?;
        }

        Commands::Logout => {
            ctx.auth.logout().await;
        }

        Commands::Whoami => match ctx.auth.restore().await {
            SessionState::Authenticated(profile) => print_json(&profile)?,
            SessionState::Anonymous => anyhow::bail!("Not signed in. Run `userdesk login <username>`."),
        },

        Commands::Validate => {
            let valid = ctx.auth.validate_token().await;
            if !valid {
                ctx.auth.logout().await;
            }
            print_json(&serde_json::json!({ "valid": valid }))?;
        }

        Commands::Refresh => {
            ctx.auth.refresh_token().await?;
            print_json(&serde_json::json!({ "refreshed": true }))?;
        }

        Commands::Users { action } => {
            ctx.auth.restore().await;
            ctx.auth
                .require_user()
                .await
                .context("Sign in first with `userdesk login <username>`")?;
            run_users(&ctx, action).await?;
        }
    }

    Ok(())
}

async fn run_users(ctx: &ClientContext, action: UsersAction) -> anyhow::Result<()> {
    let users = &ctx.users;

    match action {
        UsersAction::List { skip, limit } => print_json(&users.list(skip, limit).await?),
        UsersAction::Get { id } => print_json(&users.get(id).await?),
        UsersAction::Search { query } => print_json(&users.search(&query).await?),
        UsersAction::Filter {
            age,
            gender,
            blood_group,
            eye_color,
        } => {
            let filter = UserFilter {
                age,
                gender,
                blood_group,
                eye_color,
            };
            print_json(&users.filter(&filter).await?)
        }
        UsersAction::Add { json_body } => {
            let new_user: NewUser = serde_json::from_str(&json_body)
                .map_err(|e| anyhow::anyhow!("Invalid user JSON: {}", e))?;
            print_json(&users.create(&new_user).await?)
        }
        UsersAction::Update { id, set } => {
            let edits = record_edits(&set)?;
            let mut record: UserRecord = users.get(id).await?;
            for (field, value) in edits {
                record.set(field, value);
            }
            print_json(&users.update(id, &record).await?)
        }
        UsersAction::Patch { id, set } => {
            let patch = UserPatch::from(parse_assignments(&set)?);
            print_json(&users.patch(id, &patch).await?)
        }
        UsersAction::Delete { id } => print_json(&users.delete(id).await?),
    }
}

/// Parse `field=value` pairs; a value that is valid JSON keeps its type.
fn parse_assignments(items: &[String]) -> anyhow::Result<Map<String, Value>> {
    let mut fields = Map::new();
    for item in items {
        let (field, raw) = item
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Expected FIELD=VALUE, got {:?}", item))?;
        if field.is_empty() {
            anyhow::bail!("Empty field name in {:?}", item);
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        fields.insert(field.to_string(), value);
    }
    Ok(fields)
}

/// Edits for a whole-record update; the record key itself cannot be edited.
fn record_edits(items: &[String]) -> anyhow::Result<Map<String, Value>> {
    let fields = parse_assignments(items)?;
    if fields.contains_key(ID_FIELD) {
        anyhow::bail!("`{ID_FIELD}` cannot be changed; pass the target id as the argument");
    }
    Ok(fields)
}

fn read_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
