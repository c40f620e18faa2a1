use crate::error::{FitError, Result};
use crate::io::Configuration;
use log::info;
use std::fs;
use std::path::Path;

/// Reads the configuration file. If it does not exist the default settings are used
/// and written to `path`, so that the user can see all available options.
pub fn read_input<P: AsRef<Path>>(path: P) -> Result<Configuration> {
    let config_file_path: &Path = path.as_ref();
    let config_string: String = if config_file_path.exists() {
        fs::read_to_string(config_file_path)?
    } else {
        String::new()
    };
    let config: Configuration = toml::from_str(&config_string).map_err(|err| FitError::Parse {
        file: config_file_path.display().to_string(),
        message: err.to_string(),
    })?;
    if !config_file_path.exists() {
        let config_string: String = toml::to_string(&config)
            .map_err(|err| FitError::Serialization(err.to_string()))?;
        fs::write(config_file_path, config_string)?;
        info!(
            "default configuration written to {}",
            config_file_path.display()
        );
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let path = env::temp_dir().join(format!("dftb2nnsk-config-{}.toml", std::process::id()));
        let _ = fs::remove_file(&path);
        let config = read_input(&path).unwrap();
        assert_eq!(config, Configuration::default());
        assert!(path.is_file());
        assert_eq!(read_input(&path).unwrap(), config);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let path = env::temp_dir().join(format!("dftb2nnsk-broken-{}.toml", std::process::id()));
        fs::write(&path, "[train_options]\nnstep = \"many\"\n").unwrap();
        match read_input(&path) {
            Err(FitError::Parse { .. }) => {}
            _ => panic!("expected a parse error"),
        }
        fs::remove_file(path).unwrap();
    }
}
