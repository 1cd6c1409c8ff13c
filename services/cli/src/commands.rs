//! Command line definition

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

use common::money::parse_amount;

/// Command line client for mete
#[derive(Parser, Debug)]
#[command(name = "metecli", version, about)]
pub struct Cli {
    /// Settings file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Do not ask for confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Configure the server to use
    Setup {
        /// Base URL of the mete server
        url: String,
    },

    /// Show or modify your account
    #[command(subcommand)]
    Account(AccountCommands),

    /// Show or modify users
    #[command(subcommand)]
    Users(UserCommands),

    /// Show or modify drinks
    #[command(subcommand)]
    Drinks(DrinkCommands),

    /// Show or modify barcodes
    #[command(subcommand)]
    Barcodes(BarcodeCommands),

    /// Show the audit log
    Audits {
        /// Only show this user (name or id)
        #[arg(long)]
        user: Option<String>,

        /// First day to show (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day to show (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Show information about the server
    Info,

    /// Show or modify the settings
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Print the version of metecli
    Version,
}

#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// Show your balance
    Show,

    /// Buy a drink
    Buy {
        /// Drink name or id
        #[arg(required_unless_present = "barcode")]
        drink: Option<String>,

        /// Buy the drink this barcode belongs to
        #[arg(long, conflicts_with = "drink")]
        barcode: Option<String>,
    },

    /// Subtract an amount from your balance
    Pay {
        #[arg(value_parser = parse_amount)]
        amount: Decimal,
    },

    /// Add an amount to your balance
    Deposit {
        #[arg(value_parser = parse_amount)]
        amount: Decimal,
    },

    /// Move money to another user
    Transfer {
        /// Receiving user (name or id)
        receiver: String,

        #[arg(value_parser = parse_amount)]
        amount: Decimal,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List all users
    List,

    /// Show one user
    Show {
        /// Name or id
        user: String,
    },

    /// Delete a user
    Delete {
        /// Name or id
        user: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum DrinkCommands {
    /// List all drinks
    List,

    /// Delete a drink
    Delete {
        /// Name or id
        drink: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum BarcodeCommands {
    /// List all barcodes
    List,

    /// Delete a barcode
    Delete {
        /// The code itself
        barcode: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the settings file
    Show,

    /// Print one value
    Get {
        /// Dotted key, e.g. connection.base_url
        key: String,
    },

    /// Set one value
    Set {
        /// Dotted key, e.g. connection.uid
        key: String,

        value: String,
    },
}
