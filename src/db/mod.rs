use mongodb::{options::ClientOptions, Client, Database};

use crate::config::Config;

pub mod decimal;
pub mod object_id;

pub async fn connect(config: &Config) -> Result<Database, mongodb::error::Error> {
    let mut options = ClientOptions::parse(&config.mongodb_uri).await?;
    options.app_name = Some(config.app_name.clone());

    let client = Client::with_options(options)?;
    Ok(client.database(&config.database_name))
}
