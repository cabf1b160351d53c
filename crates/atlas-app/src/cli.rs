//! Command line arguments and settings loading

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use atlas_core::AtlasSettings;
use clap::Parser;
use tracing::{info, warn};

const DEFAULT_TICKS: usize = 20;

#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "chronoatlas")]
#[command(about = "Play historical datasets back along a timeline")]
pub struct Args {
    /// People dataset, a JSON array or a `humans` envelope
    pub persons: PathBuf,

    /// Military events dataset
    pub events: Option<PathBuf>,

    /// Works dataset
    pub works: Option<PathBuf>,

    /// Engine settings (JSON); a missing file means defaults
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Playback ticks to run before exiting
    #[arg(long, default_value_t = DEFAULT_TICKS)]
    pub ticks: usize,
}

/// Load settings from `path`. A missing file falls back to defaults; a malformed one is an error.
pub fn load_settings(path: Option<&Path>) -> Result<AtlasSettings> {
    let Some(path) = path else {
        return Ok(AtlasSettings::default());
    };

    if !path.exists() {
        warn!("Settings file {:?} not found, using defaults", path);
        return Ok(AtlasSettings::default());
    }

    let settings = AtlasSettings::from_json_file(path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    info!("Loaded settings from {:?}", path);
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_command_line() {
        let args = Args::try_parse_from([
            "chronoatlas",
            "people.json",
            "--ticks",
            "5",
            "events.json",
            "--settings",
            "atlas.json",
            "works.json",
        ])
        .unwrap();

        assert_eq!(args.persons, PathBuf::from("people.json"));
        assert_eq!(args.events, Some(PathBuf::from("events.json")));
        assert_eq!(args.works, Some(PathBuf::from("works.json")));
        assert_eq!(args.settings, Some(PathBuf::from("atlas.json")));
        assert_eq!(args.ticks, 5);
    }

    #[test]
    fn test_parse_defaults_and_errors() {
        let args = Args::try_parse_from(["chronoatlas", "people.json"]).unwrap();
        assert_eq!(args.ticks, DEFAULT_TICKS);
        assert_eq!(args.events, None);
        assert_eq!(args.settings, None);

        assert!(Args::try_parse_from(["chronoatlas"]).is_err());
        assert!(Args::try_parse_from(["chronoatlas", "people.json", "--ticks", "many"]).is_err());
        assert!(Args::try_parse_from(["chronoatlas", "people.json", "--verbose"]).is_err());
        assert!(Args::try_parse_from(["chronoatlas", "a", "b", "c", "d"]).is_err());
    }

    #[test]
    fn test_command_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_load_settings() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert_eq!(load_settings(Some(&missing)).unwrap(), AtlasSettings::default());
        assert_eq!(load_settings(None).unwrap(), AtlasSettings::default());

        let path = dir.path().join("atlas.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{ "playback": {{ "interval_ms": 250 }} }}"#).unwrap();
        assert_eq!(load_settings(Some(&path)).unwrap().playback.interval_ms, 250);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_settings(Some(&path)).is_err());
    }
}
