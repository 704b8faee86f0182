use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use dealer::TurretEvent;
use serde::{Deserialize, Serialize};

use crate::SessionOutcome;

/// Writes the journal of each session into its own JSON file.
pub struct Recorder {
    num: usize,
    directory: PathBuf,
    events: Vec<TurretEvent>,
}

impl Recorder {
    pub fn new(directory: PathBuf) -> anyhow::Result<Self> {
        if !directory.is_dir() {
            anyhow::bail!("Directory '{}' does not exist", directory.display());
        }
        Ok(Self {
            num: 1,
            directory,
            events: Vec::new(),
        })
    }

    pub fn store_events(&mut self, events: impl IntoIterator<Item = TurretEvent>) {
        self.events.extend(events);
    }

    /// Writes `session_000001.json`, `session_000002.json`, … and clears the
    /// stored events. Returns the path written.
    pub fn write_session_recording(&mut self, outcome: &SessionOutcome) -> anyhow::Result<PathBuf> {
        let filepath = self.directory.join(format!("session_{:0>6}.json", self.num));
        let writer = BufWriter::new(File::create(&filepath)?);
        let recording = SessionRecording {
            outcome: outcome.clone(),
            events: std::mem::take(&mut self.events),
        };
        serde_json::to_writer_pretty(writer, &recording)?;
        self.num += 1;
        Ok(filepath)
    }
}

#[derive(Serialize, Deserialize)]
pub struct SessionRecording {
    pub outcome: SessionOutcome,
    pub events: Vec<TurretEvent>,
}
