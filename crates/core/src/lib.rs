mod assets;
mod provider;

pub mod completion;
pub mod config;
pub mod registry;
pub mod session;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use crate::assets::{get_config_dir, get_data_dir};
pub use crate::provider::get_completion_llm;
