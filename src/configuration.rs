use std::{env, fs, ops::Deref, sync::Arc};

use crate::{
    dao::get_path,
    error::Error,
    provider::{DatabasePool, Mailer},
};

#[derive(Debug)]
pub struct AppState<T>(Arc<T>);

impl<T> AppState<T> {
    pub fn new(state: T) -> AppState<T> {
        AppState(Arc::new(state))
    }
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> AppState<T> {
        AppState(Arc::clone(&self.0))
    }
}

impl<T> Deref for AppState<T> {
    type Target = Arc<T>;

    fn deref(&self) -> &Arc<T> {
        &self.0
    }
}

#[derive(Debug)]
pub struct State {
    pub config: Config,
    pub database: DatabasePool,
    pub mailer: Mailer,
}

impl State {
    pub async fn new(
        config: Config,
        database: DatabasePool,
        mailer: Mailer,
    ) -> Result<State, Error> {
        Self::init_migrations(&database).await?;
        Ok(Self {
            config,
            database,
            mailer,
        })
    }

    async fn init_migrations(database: &DatabasePool) -> Result<(), Error> {
        let files = vec![
            "user.sql",
            "position.sql",
            "subscription_charge.sql",
            "accounting_report.sql",
        ];

        let dir = env!("CARGO_MANIFEST_DIR");

        for file in files {
            let data = get_path(dir, file)?;
            sqlx::query(data.as_str()).execute(&database.pool).await?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub email_api_url: String,
    pub email_api_key: String,
    pub email_from: String,
    pub payment_webhook_token: String,
}

pub fn set_configuration() -> Result<(), Error> {
    let config_file: &str = ".env";

    let directory = env!("CARGO_MANIFEST_DIR");
    let path = format!("{}/{}", directory, config_file);

    let config_string = fs::read_to_string(path)?;

    parse_config_string(config_string)?;

    Ok(())
}

fn parse_config_string(config: String) -> Result<(), Error> {
    let params: Vec<Option<(&str, &str)>> = config
        .split('\n')
        .map(|s| {
            let element = s.find('=');
            if let Some(e) = element {
                return Some(s.split_at(e));
            }
            None
        })
        .map(|value| {
            if let Some((k, v)) = value {
                return Some((k, &v[1..]));
            }
            None
        })
        .collect();

    for (key, value) in params.into_iter().flatten() {
        std::env::set_var(key, value);
    }

    Ok(())
}

pub fn get_configuration() -> Result<Config, Error> {
    let database_url = env::var("DATABASE_URL")?;
    let server_host = env::var("SERVER_HOST")?;
    let port: u16 = env::var("PORT")?.parse()?;
    let allowed_origins = env::var("ALLOWED_ORIGINS")?
        .split(',')
        .map(|s| s.trim().to_owned())
        .collect();
    let jwt_secret = env::var("JWT_SECRET")?;
    let token_ttl_hours: i64 = env::var("TOKEN_TTL_HOURS")?.parse()?;
    let email_api_url = env::var("EMAIL_API_URL")?;
    let email_api_key = env::var("EMAIL_API_KEY")?;
    let email_from = env::var("EMAIL_FROM")?;
    let payment_webhook_token = env::var("PAYMENT_WEBHOOK_TOKEN")?;

    Ok(Config {
        database_url,
        server_host,
        port,
        allowed_origins,
        jwt_secret,
        token_ttl_hours,
        email_api_url,
        email_api_key,
        email_from,
        payment_webhook_token,
    })
}
