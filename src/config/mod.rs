mod core;
mod loader;

pub use core::{
    default_max_additional_files, default_max_import_depth, default_search_dir_limit,
    default_token_limit, GrapherConfig,
};
pub use loader::{
    apply_token_limit_override, directory_ancestors, load_config, load_config_from,
    parse_and_validate_config, CONFIG_FILE_NAME, TOKEN_LIMIT_ENV,
};
