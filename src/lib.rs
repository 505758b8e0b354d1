mod codec;
mod connection;
mod errors;
mod path;

pub use self::codec::{encode_data, parse_body};
pub use self::connection::{rev_info, Connection};
pub use self::errors::{ApiError, Error};
pub use self::path::clean_path;

pub use reqwest::Method;
