use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use dealer::DealerConfig;

/// Reads a JSON config, or uses the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<DealerConfig> {
    let config = match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Could not open config file '{}'", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Invalid config file '{}'", path.display()))?
        }
        None => DealerConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_without_path() {
        assert_eq!(load_config(None).unwrap(), DealerConfig::default());
    }

    #[test]
    fn reads_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "dispense": {{ "reverse_margin_ms": 0 }}, "park_heading_deg": 45.0 }}"#).unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.dispense.reverse_margin_ms, 0);
        assert_eq!(config.park_heading_deg, 45.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "drive": {{ "min_power": 90.0 }} }}"#).unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Minimum drive power"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Some(Path::new("/definitely/not/here.json"))).is_err());
    }
}
