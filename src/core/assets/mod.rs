mod asset_index;
mod sync;

pub use asset_index::AssetIndex;
pub use sync::{object_url, AssetFetchOutcome, AssetSyncReport, AssetSynchronizer};
