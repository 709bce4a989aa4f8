pub mod accounts;
pub mod chain;
pub mod middlewares;
pub mod server;

pub use crate::domain::model::{Account, Credentials, Role};
pub use crate::domain::ports::{AccountStore, Middleware};
pub use crate::utils::error::Result;
