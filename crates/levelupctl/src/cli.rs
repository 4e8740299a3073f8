//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap. Keeps argument parsing separate
//! from execution logic.

use clap::{Parser, Subcommand};

/// LevelUp CLI
#[derive(Parser)]
#[command(name = "levelupctl")]
#[command(about = "LevelUp - gamified habit tracking", long_about = None)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Server URL (overrides $LEVELUP_URL)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Session token (overrides $LEVELUP_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create an account and print the session token
    Signup {
        /// Account email
        email: String,
    },

    /// Show who the current token belongs to
    Whoami,

    /// Create your hunter profile with an initial habit set
    Onboard {
        /// Display name for the profile
        full_name: String,

        /// Habit as "name:attribute:difficulty", repeatable
        #[arg(short = 'H', long = "habit")]
        habits: Vec<String>,
    },

    /// Show the hunter profile: XP, level, rank, streak
    Status,

    /// Manage daily habits
    Habits {
        #[command(subcommand)]
        action: HabitCommands,
    },

    /// Show per-attribute skill progression
    Skills,

    /// Administrative overrides (admin role required)
    Admin {
        #[command(subcommand)]
        action: AdminCommands,
    },
}

#[derive(Subcommand)]
pub enum HabitCommands {
    /// List active habits with today's completion state
    List,

    /// Add a habit
    Add {
        name: String,

        /// brain, health, skill, discipline or focus
        #[arg(long)]
        attribute: String,

        /// trivial, easy, medium or hard
        #[arg(long)]
        difficulty: String,
    },

    /// Toggle today's completion for a habit (by name or id prefix)
    Done { habit: String },

    /// Deactivate a habit (history and attribute XP are kept)
    Remove { habit: String },
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// List all users with level, XP and streak
    Users,

    /// Delete a user and every row they own
    Delete { user_id: String },

    /// Reset a user's progress to a fresh profile
    Reset { user_id: String },
}
