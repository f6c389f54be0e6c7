use clap::Parser;
use log::debug;

use crate::core::{cli, configuration, core as app, logger};

mod core;
mod resources;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = cli::Cli::parse();

    let conf_path = cli
        .configuration_file
        .to_owned()
        .unwrap_or_else(|| "config.toml".to_string());

    let conf = configuration::get_configuration(conf_path).await?;

    conf.assert_data_dir_permissions()?;

    let _logger = logger::init(&conf.log, cli.verbosity)?;

    debug!("configuration loaded, dispatching command");

    match cli.command {
        cli::Command::Login {
            access_token,
            email,
            first_name,
        } => app::login(&conf, access_token, email, first_name).await,
        cli::Command::Logout => app::logout(&conf).await,
        cli::Command::Profile => app::profile(&conf).await,
        cli::Command::Dashboard => app::dashboard(&conf).await,
        cli::Command::Evaluations {
            page,
            limit,
            order_by,
        } => app::evaluations(&conf, page, limit, order_by).await,
        cli::Command::Catalog {
            page,
            limit,
            order_by,
        } => app::catalog(&conf, page, limit, order_by).await,
        cli::Command::Assessment { id } => app::assessment(&conf, id).await,
        cli::Command::Checkout { quantity } => app::checkout(&conf, quantity).await,
        cli::Command::SessionDiagnostic { show_token } => {
            app::session_diagnostic(&conf, show_token.unwrap_or(false)).await
        }
    }
}
