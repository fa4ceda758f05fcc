#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Project assets at or above this size are left out of the artifact
    pub max_asset_size: u64,
    /// Asset files sampled per directory
    pub max_assets_per_dir: usize,
    /// Attempt the framework's real build command during the build phase
    pub run_build_command: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_asset_size: 1024 * 1024,
            max_assets_per_dir: 5,
            run_build_command: true,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_asset_size(mut self, max_asset_size: u64) -> Self {
        self.max_asset_size = max_asset_size;
        self
    }

    pub fn with_max_assets_per_dir(mut self, max_assets_per_dir: usize) -> Self {
        self.max_assets_per_dir = max_assets_per_dir;
        self
    }

    pub fn with_build_command(mut self, run_build_command: bool) -> Self {
        self.run_build_command = run_build_command;
        self
    }
}
