use std::{path::PathBuf, sync::Arc};

use hopper::{config::Tuning, location::NearestStopCache, model::Repository, walking_router::WalkingRouter};
use tokio::sync::RwLock;

pub struct AppState {
    pub data_dir: PathBuf,
    pub repository: RwLock<Option<Repository>>,
    pub tuning: Tuning,
    pub router: Arc<dyn WalkingRouter>,
    pub nearest_stop_cache: NearestStopCache,
}
