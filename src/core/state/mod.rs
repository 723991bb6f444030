mod app_state;
mod layout;

pub use app_state::{
    default_data_dir, LauncherSettings, DEFAULT_LEGACY_CLIENT_BASE, DEFAULT_MANIFEST_URL,
    DEFAULT_RESOURCES_URL, MAX_ASSET_CONCURRENCY,
};
pub use layout::GameLayout;
