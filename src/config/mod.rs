pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::*;
pub use utils::{load_config_from_path, parse_config, validate_config, CONFIG_FILE_PATH};
