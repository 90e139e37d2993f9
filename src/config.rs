use std::path::PathBuf;

/// Which timestamp a writer stamps on records it copies from another dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampSource {
    /// Wall-clock time of the write. Original capture times are discarded.
    #[default]
    WriteTime,
    /// The timestamp of the source index entry.
    Source,
}

/// Configuration for filtering and viewing dumps
#[derive(Debug, Clone)]
pub struct DumpConfig {
    /// Bound of the channel between the scanning and writing tasks (default: 1024)
    pub channel_capacity: usize,

    /// Timestamps given to filtered records (default: write time)
    pub timestamp_source: TimestampSource,

    /// Fsync output files when a writer finishes (default: true)
    pub sync_on_finish: bool,

    /// Neighbours rendered on each side of the viewer cursor (default: 2)
    pub window_radius: usize,

    /// Directory for exported records (default: system temp dir)
    pub export_dir: Option<PathBuf>,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            timestamp_source: TimestampSource::WriteTime,
            sync_on_finish: true,
            window_radius: 2,
            export_dir: None,
        }
    }
}

impl DumpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scan/write channel bound. Zero is raised to one.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Set where filtered record timestamps come from
    pub fn timestamp_source(mut self, source: TimestampSource) -> Self {
        self.timestamp_source = source;
        self
    }

    /// Enable or disable fsync on finish
    pub fn sync_on_finish(mut self, enabled: bool) -> Self {
        self.sync_on_finish = enabled;
        self
    }

    /// Set the viewer window radius
    pub fn window_radius(mut self, radius: usize) -> Self {
        self.window_radius = radius;
        self
    }

    /// Set the export directory
    pub fn export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DumpConfig::default();
        assert_eq!(config.channel_capacity, 1024);
        assert_eq!(config.timestamp_source, TimestampSource::WriteTime);
        assert!(config.sync_on_finish);
        assert_eq!(config.window_radius, 2);
        assert!(config.export_dir.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = DumpConfig::new()
            .channel_capacity(0)
            .timestamp_source(TimestampSource::Source)
            .sync_on_finish(false)
            .window_radius(5)
            .export_dir("/tmp/exports");

        assert_eq!(config.channel_capacity, 1);
        assert_eq!(config.timestamp_source, TimestampSource::Source);
        assert!(!config.sync_on_finish);
        assert_eq!(config.window_radius, 5);
        assert_eq!(config.export_dir, Some(PathBuf::from("/tmp/exports")));
    }
}
