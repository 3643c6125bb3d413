use config::{Config, Environment, File, FileFormat, Source};
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Storage {
    /// Campaigns live in process memory and are lost on restart.
    Memory,
    Sqlite,
}

/// Server settings, layered from defaults, `config/default.toml` and
/// `CAMPAIGNS_*` environment variables.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub storage: Storage,
    pub database_url: String,
    pub max_connections: u32,
    pub seed: bool,
    /// Default log filter, used when `RUST_LOG` is not set.
    pub log: String,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            host: "127.0.0.1".to_string(),
            port: 8080,
            storage: Storage::Sqlite,
            database_url: "sqlite://campaigns.db".to_string(),
            max_connections: 5,
            seed: true,
            log: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Settings, Error> {
        Settings::load_with(
            File::with_name("config/default")
                .required(false)
                .format(FileFormat::Toml),
            environment(),
        )
    }

    fn load_with<S>(file: S, environment: Environment) -> Result<Settings, Error>
    where
        S: Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("CAMPAIGNS").try_parsing(true)
}
