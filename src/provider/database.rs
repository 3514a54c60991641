use crate::{
    configuration::Config,
    dao::{PoolOption, PoolType},
    error::Error,
    model::{Accounting_Report, Position, Subscription_Charge, Table, User},
};

#[derive(Debug)]
pub struct DatabasePool {
    pub position: Table<Position>,
    pub user: Table<User>,
    pub subscription_charge: Table<Subscription_Charge>,
    pub accounting_report: Table<Accounting_Report>,
    pub pool: PoolType,
}

impl DatabasePool {
    pub async fn new(config: &Config) -> Result<DatabasePool, Error> {
        let pool = PoolOption::new()
            .max_connections(20)
            .connect(config.database_url.as_str())
            .await?;

        Ok(DatabasePool {
            pool: pool.clone(),
            position: Table::new(pool.clone()),
            user: Table::new(pool.clone()),
            subscription_charge: Table::new(pool.clone()),
            accounting_report: Table::new(pool),
        })
    }

    pub fn get_pool(&self) -> &PoolType {
        &self.pool
    }
}
