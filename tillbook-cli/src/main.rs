//! Tillbook CLI - branch banking in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{
    admin, backup, dashboard, demo, deposit, loan, logs, open, profile, query, setup, status,
    transfer, withdraw,
};

/// Tillbook - branch banking in your terminal
#[derive(Parser)]
#[command(name = "tb", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// First-run setup (provision the admin credential)
    Setup {
        /// Admin identifier to create
        #[arg(long)]
        admin_id: String,
    },

    /// Open a new customer account
    Open {
        /// Account holder name
        #[arg(long)]
        name: String,
        /// Date of birth
        #[arg(long)]
        date_of_birth: Option<String>,
        /// Postal address
        #[arg(long)]
        address: Option<String>,
        /// Nationality
        #[arg(long)]
        nationality: Option<String>,
        /// National ID number
        #[arg(long)]
        national_id: Option<String>,
        /// Phone number
        #[arg(long)]
        phone: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Deposit money into an account
    Deposit {
        /// Account number
        account: String,
        /// Amount to deposit
        amount: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Withdraw money from an account
    Withdraw {
        /// Account number
        account: String,
        /// Amount to withdraw
        amount: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Transfer money between accounts
    Transfer {
        /// Source account number
        from: String,
        /// Target account number
        to: String,
        /// Amount to transfer
        amount: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply for or repay a loan
    Loan {
        #[command(subcommand)]
        command: loan::LoanCommands,
    },

    /// Show balance, loans and recent activity for an account
    Dashboard {
        /// Account number
        account: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit account profile fields and optionally the password
    Profile {
        /// Account number
        account: String,
        /// New account holder name
        #[arg(long)]
        name: Option<String>,
        /// Date of birth
        #[arg(long)]
        date_of_birth: Option<String>,
        /// Postal address
        #[arg(long)]
        address: Option<String>,
        /// Nationality
        #[arg(long)]
        nationality: Option<String>,
        /// National ID number
        #[arg(long)]
        national_id: Option<String>,
        /// Phone number
        #[arg(long)]
        phone: Option<String>,
        /// Prompt for a new password as well
        #[arg(long)]
        change_password: bool,
    },

    /// Administrator operations
    Admin {
        /// Admin identifier to authenticate as
        #[arg(long = "as", value_name = "ADMIN_ID")]
        admin_id: String,
        #[command(subcommand)]
        command: admin::AdminCommands,
    },

    /// Execute a read-only SQL query against the ledger (admin)
    Query {
        /// Admin identifier to authenticate as
        #[arg(long = "as", value_name = "ADMIN_ID")]
        admin_id: String,
        /// SQL query to execute
        sql: Option<String>,
        /// Read SQL from file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show store status and summary
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage backups
    Backup {
        #[command(subcommand)]
        command: backup::BackupCommands,
    },

    /// View and export event logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// Manage demo mode
    Demo {
        #[command(subcommand)]
        command: Option<demo::DemoCommands>,
    },
}

fn main() -> ExitCode {
    // No color codes when output is piped
    if !atty::is(atty::Stream::Stdout) {
        colored::control::set_override(false);
    }

    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Setup { admin_id } => setup::run(&admin_id),
        Commands::Open {
            name,
            date_of_birth,
            address,
            nationality,
            national_id,
            phone,
            json,
        } => open::run(
            &name,
            date_of_birth,
            address,
            nationality,
            national_id,
            phone,
            json,
        ),
        Commands::Deposit { account, amount, json } => deposit::run(&account, &amount, json),
        Commands::Withdraw { account, amount, json } => withdraw::run(&account, &amount, json),
        Commands::Transfer { from, to, amount, json } => transfer::run(&from, &to, &amount, json),
        Commands::Loan { command } => loan::run(command),
        Commands::Dashboard { account, json } => dashboard::run(&account, json),
        Commands::Profile {
            account,
            name,
            date_of_birth,
            address,
            nationality,
            national_id,
            phone,
            change_password,
        } => profile::run(
            &account,
            name,
            date_of_birth,
            address,
            nationality,
            national_id,
            phone,
            change_password,
        ),
        Commands::Admin { admin_id, command } => admin::run(&admin_id, command),
        Commands::Query { admin_id, sql, file, json } => {
            query::run(&admin_id, sql.as_deref(), file.as_deref(), json)
        }
        Commands::Status { json } => status::run(json),
        Commands::Backup { command } => backup::run(command),
        Commands::Logs { command } => logs::run(command),
        Commands::Demo { command } => demo::run(command),
    }
}
