//! Utility functions for CLI commands

use std::io::{self, Read};
use std::path::Path;

use cdcr::{SecondaryEntitySelection, Settings, Task};

/// Read a file, or stdin when the path is `-`.
pub fn read_input(path: &Path) -> Result<String, String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        return Ok(buffer);
    }
    std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read file {}: {}", path.display(), e))
}

/// Parse a task file.
pub fn load_task(path: &Path) -> Result<Task, String> {
    let json = read_input(path)?;
    Task::from_json(&json).map_err(|e| format!("{}: {}", path.display(), e))
}

/// Parse a selection file, or seed one from the task's related answers.
pub fn load_selection(path: Option<&Path>, task: &Task) -> Result<SecondaryEntitySelection, String> {
    match path {
        Some(path) => {
            let json = read_input(path)?;
            serde_json::from_str(&json)
                .map_err(|e| format!("Failed to parse selection {}: {}", path.display(), e))
        }
        None => Ok(SecondaryEntitySelection::seeded(task)),
    }
}

/// Load settings from `--config`, or the defaults.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, String> {
    match path {
        Some(path) => Settings::load(path).map_err(|e| e.to_string()),
        None => Ok(Settings::default()),
    }
}
