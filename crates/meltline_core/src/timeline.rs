use crate::error::Result;
use crate::types::*;
use std::path::Path;

impl Timeline {
    /// Create a new empty timeline with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            global_start: None,
            tracks: Stack::new(),
        }
    }

    /// Overall duration: the length of the longest track.
    pub fn duration(&self) -> Frames {
        self.tracks.duration()
    }

    /// Save the timeline to a file as pretty-printed JSON.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Load a timeline from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let timeline: Timeline = serde_json::from_str(&data)?;
        Ok(timeline)
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new("timeline")
    }
}
