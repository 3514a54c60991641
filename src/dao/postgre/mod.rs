pub use self::{
    path::get_path,
    types::{DBRow, DataBase, PoolOption, PoolType, QueryResult},
};
mod accounting_report;
mod path;
mod position;
mod subscription_charge;
mod types;
mod user;
