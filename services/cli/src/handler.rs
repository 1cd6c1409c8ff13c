//! Command execution

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

use common::money::MoneyFormat;
use common::{ApiVersion, Candidate, Diagnostics, MeteError, MeteResult, fuzzy_search};
use connection::models::AuditFilter;
use connection::{Connection, Connector, MeteApi, SettingsStore, Transport, normalize_base_url};

use crate::commands::{
    AccountCommands, BarcodeCommands, Commands, ConfigCommands, DrinkCommands, UserCommands,
};
use crate::display;
use crate::prompt::Confirm;
use crate::settings::SettingsFile;

/// Everything a command needs from the outside world
pub struct App<'a> {
    pub transport: Arc<dyn Transport>,
    pub diagnostics: Diagnostics,
    pub settings: &'a mut SettingsFile,
    pub confirm: &'a mut dyn Confirm,
    pub out: &'a mut dyn Write,
}

fn id_of<T: Candidate>(thing: &T) -> MeteResult<i64> {
    thing
        .candidate_id()
        .ok_or_else(|| MeteError::malformed(format!("{} has no id", thing.candidate_name())))
}

impl App<'_> {
    pub async fn execute(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Setup { url } => self.setup(&url).await,
            Commands::Config(command) => self.config(command),
            Commands::Version => {
                writeln!(self.out, "metecli {}", env!("CARGO_PKG_VERSION"))?;
                Ok(())
            }
            command => {
                let connection = self.connect()?;
                self.remote(connection.api(), command).await
            }
        }
    }

    fn connector(&self) -> Connector {
        Connector::new(Arc::clone(&self.transport), self.diagnostics.clone())
    }

    /// Connect with the stored (url, version) pair; only `setup` probes
    fn connect(&self) -> Result<Connection> {
        let settings = self.settings.settings().connection_settings();
        Ok(self.connector().from_settings(&settings)?)
    }

    async fn remote(&mut self, api: &dyn MeteApi, command: Commands) -> Result<()> {
        match command {
            Commands::Account(command) => self.account(api, command).await,
            Commands::Users(command) => self.users(api, command).await,
            Commands::Drinks(command) => self.drinks(api, command).await,
            Commands::Barcodes(command) => self.barcodes(api, command).await,
            Commands::Audits { user, from, to } => {
                let user = match user {
                    Some(query) => {
                        let users = api.list_users().await?;
                        Some(id_of(self.resolve(&users, &query)?)?)
                    }
                    None => None,
                };
                let filter = AuditFilter {
                    user,
                    from_date: from,
                    to_date: to,
                };
                let audits = api.audits(&filter).await?;
                let drinks = api.list_drinks().await?;
                let money = money_format(api).await?;
                write!(self.out, "{}", display::audits(&audits, &drinks, &money))?;
                Ok(())
            }
            Commands::Info => {
                let info = api.server_info().await?;
                write!(self.out, "{}", display::server_info(&info))?;
                Ok(())
            }
            Commands::Setup { .. } | Commands::Config(_) | Commands::Version => Ok(()),
        }
    }

    fn resolve<'t, T: Candidate>(&self, things: &'t [T], query: &str) -> MeteResult<&'t T> {
        fuzzy_search(things, query, &self.diagnostics).into_result(query)
    }

    fn uid(&self) -> MeteResult<i64> {
        self.settings.settings().connection.uid.ok_or_else(|| {
            MeteError::config(
                "No user configured. Set one with 'metecli config set connection.uid <id>'.",
            )
        })
    }

    fn confirmed(&mut self, question: &str) -> Result<bool> {
        if self.confirm.confirm(question)? {
            Ok(true)
        } else {
            writeln!(self.out, "Aborted.")?;
            Ok(false)
        }
    }

    async fn setup(&mut self, raw_url: &str) -> Result<()> {
        let url = normalize_base_url(raw_url)?;
        match url.scheme() {
            "https" => {}
            "http" => self
                .diagnostics
                .warn("Using HTTP. The connection won't be secure."),
            other => {
                return Err(MeteError::invalid_input(format!(
                    "Unknown URL scheme '{}'. Use http or https.",
                    other
                ))
                .into());
            }
        }

        let connection = self.connector().establish(url.as_str(), None).await?;
        if !connection.api().try_connect().await {
            return Err(MeteError::transport(format!(
                "Couldn't connect to the server at {}.",
                connection.base_url()
            ))
            .into());
        }

        self.settings
            .save_connection(connection.base_url().as_str(), connection.api_version())
            .context("Cannot save the settings")?;
        writeln!(
            self.out,
            "Configured {} (API version '{}').",
            connection.base_url(),
            connection.api_version()
        )?;
        Ok(())
    }

    fn config(&mut self, command: ConfigCommands) -> Result<()> {
        match command {
            ConfigCommands::Show => {
                let yaml = serde_yaml::to_string(self.settings.stored())?;
                write!(self.out, "{}", yaml)?;
            }
            ConfigCommands::Get { key } => {
                let rendered = match self.settings.get(&key)? {
                    serde_yaml::Value::Null => "null".to_string(),
                    serde_yaml::Value::String(text) => text.clone(),
                    other => serde_yaml::to_string(other)?.trim_end().to_string(),
                };
                writeln!(self.out, "{}", rendered)?;
            }
            ConfigCommands::Set { key, value } => {
                self.settings.set(&key, &value)?;
            }
        }
        Ok(())
    }

    async fn account(&mut self, api: &dyn MeteApi, command: AccountCommands) -> Result<()> {
        let uid = self.uid()?;
        match command {
            AccountCommands::Show => {
                let user = api.get_user(uid).await?;
                let money = money_format(api).await?;
                write!(self.out, "{}", display::user(&user, &money))?;
            }
            AccountCommands::Buy {
                drink: Some(query),
                barcode: None,
            } => {
                let drinks = api.list_drinks().await?;
                let drink = self.resolve(&drinks, &query)?;
                info!("Buying drink {}...", drink.candidate_label());
                api.purchase(uid, id_of(drink)?).await?;
                writeln!(self.out, "Bought {}.", drink.name)?;
            }
            AccountCommands::Buy {
                barcode: Some(code),
                ..
            } => {
                let barcodes = api.list_barcodes().await?;
                let barcode = barcodes
                    .iter()
                    .find(|barcode| barcode.id == code)
                    .ok_or_else(|| MeteError::NoMatch {
                        query: code.clone(),
                        candidates: Vec::new(),
                    })?;
                let drink_id = barcode.drink.ok_or_else(|| {
                    MeteError::invalid_input(format!("Barcode {} does not belong to a drink", code))
                })?;
                let drinks = api.list_drinks().await?;
                info!("Buying drink {} by barcode {}...", drink_id, code);
                api.purchase(uid, drink_id).await?;
                writeln!(
                    self.out,
                    "Bought {}.",
                    connection::models::Drink::name_of(&drinks, Some(drink_id))
                )?;
            }
            AccountCommands::Buy {
                drink: None,
                barcode: None,
            } => {
                return Err(MeteError::invalid_input("Name a drink or a barcode").into());
            }
            AccountCommands::Pay { amount } => {
                info!("Paying {}...", amount);
                api.pay(uid, amount).await?;
                let money = money_format(api).await?;
                writeln!(self.out, "Paid {}.", money.format(amount))?;
            }
            AccountCommands::Deposit { amount } => {
                info!("Depositing {}...", amount);
                api.deposit(uid, amount).await?;
                let money = money_format(api).await?;
                writeln!(self.out, "Deposited {}.", money.format(amount))?;
            }
            AccountCommands::Transfer { receiver, amount } => {
                let users = api.list_users().await?;
                let receiver = self.resolve(&users, &receiver)?;
                info!("Transferring {} to {}...", amount, receiver.candidate_label());
                api.transfer(uid, id_of(receiver)?, amount).await?;
                let money = money_format(api).await?;
                writeln!(
                    self.out,
                    "Transferred {} to {}.",
                    money.format(amount),
                    receiver.name
                )?;
            }
        }
        Ok(())
    }

    async fn users(&mut self, api: &dyn MeteApi, command: UserCommands) -> Result<()> {
        match command {
            UserCommands::List => {
                let users = api.list_users().await?;
                let money = money_format(api).await?;
                write!(self.out, "{}", display::users(&users, &money))?;
            }
            UserCommands::Show { user } => {
                let users = api.list_users().await?;
                let user = self.resolve(&users, &user)?;
                let money = money_format(api).await?;
                write!(self.out, "{}", display::user(user, &money))?;
            }
            UserCommands::Delete { user } => {
                let users = api.list_users().await?;
                let user = self.resolve(&users, &user)?;
                let question = format!(
                    "Do you really want to delete the user {}?",
                    user.candidate_label()
                );
                if self.confirmed(&question)? {
                    api.delete_user(id_of(user)?).await?;
                    writeln!(self.out, "Deleted {}.", user.candidate_label())?;
                }
            }
        }
        Ok(())
    }

    async fn drinks(&mut self, api: &dyn MeteApi, command: DrinkCommands) -> Result<()> {
        match command {
            DrinkCommands::List => {
                let drinks = api.list_drinks().await?;
                let money = money_format(api).await?;
                write!(self.out, "{}", display::drinks(&drinks, &money))?;
            }
            DrinkCommands::Delete { drink } => {
                let drinks = api.list_drinks().await?;
                let drink = self.resolve(&drinks, &drink)?;
                let question = format!(
                    "Do you really want to delete the drink {}?",
                    drink.candidate_label()
                );
                if self.confirmed(&question)? {
                    api.delete_drink(id_of(drink)?).await?;
                    writeln!(self.out, "Deleted {}.", drink.candidate_label())?;
                }
            }
        }
        Ok(())
    }

    async fn barcodes(&mut self, api: &dyn MeteApi, command: BarcodeCommands) -> Result<()> {
        match command {
            BarcodeCommands::List => {
                let barcodes = api.list_barcodes().await?;
                let drinks = api.list_drinks().await?;
                write!(self.out, "{}", display::barcodes(&barcodes, &drinks))?;
            }
            BarcodeCommands::Delete { barcode } => {
                let question = format!("Do you really want to delete the barcode {}?", barcode);
                if self.confirmed(&question)? {
                    api.delete_barcode(&barcode).await?;
                    writeln!(self.out, "Deleted barcode {}.", barcode)?;
                }
            }
        }
        Ok(())
    }
}

/// Amount formatting: v3 servers describe it, everyone else gets ours
async fn money_format(api: &dyn MeteApi) -> MeteResult<MoneyFormat> {
    match api.api_version() {
        ApiVersion::V3 => Ok(api.server_info().await?.money_format()),
        _ => Ok(MoneyFormat::default()),
    }
}

/// Exit code for an error returned by [`App::execute`]
pub fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<MeteError>()
        .map_or(1, MeteError::exit_code)
}
