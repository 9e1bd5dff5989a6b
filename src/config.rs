pub use self::parser::{Config, LoggingConfig};
pub use self::validator::ConfigError;

mod parser;
mod validator;
