//! Voxel raytracer viewer

use voxray::app;
use voxray::core::config::{ViewerConfig, CONFIG_FILE_NAME};
use voxray::core::logging;

fn main() {
    logging::init();
    log::info!("voxray starting...");

    let result = ViewerConfig::load_or_default(CONFIG_FILE_NAME).and_then(|config| {
        log::info!("Scene: {}", config.scene_path.display());
        app::run(config)
    });

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
