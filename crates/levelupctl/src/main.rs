//! levelupctl - command dispatch

use anyhow::{Context, Result};
use clap::Parser;
use levelupctl::cli::{AdminCommands, Cli, Commands, HabitCommands};
use levelupctl::client::{parse_attribute, parse_difficulty, parse_onboarding_habit, ApiClient};
use levelupctl::display;
use uuid::Uuid;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let client = ApiClient::from_env(cli.server.clone(), cli.token.clone());

    if let Err(err) = run(&client, cli.command).await {
        eprintln!("levelupctl: {err}");
        std::process::exit(1);
    }
}

async fn run(client: &ApiClient, command: Commands) -> Result<()> {
    match command {
        Commands::Signup { email } => {
            let response = client.signup(&email).await?;
            println!("Account created: {}", response.user_id);
            println!();
            println!("Session token (shown once, store it safely):");
            println!("  {}", response.token);
            println!();
            println!("  export LEVELUP_TOKEN={}", response.token);
        }

        Commands::Whoami => {
            let who = client.whoami().await?;
            println!("{} ({})", who.email, who.user_id);
            println!("Role: {}", who.role.as_str());
            if !who.has_profile {
                println!("No profile yet. Run `levelupctl onboard <name>`.");
            }
        }

        Commands::Onboard { full_name, habits } => {
            let habits = habits
                .iter()
                .map(|spec| parse_onboarding_habit(spec))
                .collect::<Result<Vec<_>>>()?;
            let profile = client.onboard(&full_name, habits).await?;
            println!("Welcome, hunter.");
            display::render_status(&profile);
        }

        Commands::Status => {
            let profile = client.profile().await?;
            display::render_status(&profile);
        }

        Commands::Habits { action } => run_habits(client, action).await?,

        Commands::Skills => {
            let skills = client.skills().await?;
            display::render_skills(&skills);
        }

        Commands::Admin { action } => run_admin(client, action).await?,
    }
    Ok(())
}

async fn run_habits(client: &ApiClient, action: HabitCommands) -> Result<()> {
    match action {
        HabitCommands::List => {
            let habits = client.habits().await?;
            let today = client.today_completions().await?;
            display::render_habits(&habits, &today);
        }

        HabitCommands::Add {
            name,
            attribute,
            difficulty,
        } => {
            let habit = client
                .create_habit(&name, parse_attribute(&attribute)?, parse_difficulty(&difficulty)?)
                .await?;
            println!(
                "Added '{}' ({}, {}, +{} XP)",
                habit.name, habit.attribute, habit.difficulty, habit.xp_value
            );
        }

        HabitCommands::Done { habit } => {
            let habit = client.resolve_habit(&habit).await?;
            let outcome = client.toggle(habit.id).await?;
            if outcome.completed {
                println!("✓ {} (+{} XP)", habit.name, outcome.xp_delta);
            } else {
                println!("Unchecked {} ({} XP)", habit.name, outcome.xp_delta);
            }
            display::render_status(&outcome.profile);
        }

        HabitCommands::Remove { habit } => {
            let habit = client.resolve_habit(&habit).await?;
            client.deactivate_habit(habit.id).await?;
            println!("Deactivated '{}'. Its history and XP are kept.", habit.name);
        }
    }
    Ok(())
}

async fn run_admin(client: &ApiClient, action: AdminCommands) -> Result<()> {
    match action {
        AdminCommands::Users => {
            let users = client.admin_users().await?;
            display::render_admin_users(&users);
        }

        AdminCommands::Delete { user_id } => {
            let user_id = parse_user_id(&user_id)?;
            client.admin_delete(user_id).await?;
            println!("Deleted user {user_id} and all their data.");
        }

        AdminCommands::Reset { user_id } => {
            let user_id = parse_user_id(&user_id)?;
            client.admin_reset(user_id).await?;
            println!("Reset progress for user {user_id}.");
        }
    }
    Ok(())
}

fn parse_user_id(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).with_context(|| format!("'{s}' is not a user id"))
}
