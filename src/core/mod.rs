pub mod domains;
pub mod http;
pub mod processing;
pub mod search;

pub use crate::domain::model::{LogoFormat, LogoResult};
pub use crate::domain::ports::{LogoSource, SearchEvent, Storage};
pub use crate::utils::error::Result;
