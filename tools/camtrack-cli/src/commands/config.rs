//! Show or initialize the configuration file.

use std::path::Path;

use camtrack_common::config::{config_file_path, AppConfig};
use camtrack_framing_core::FramingParams;

pub fn run(config: &AppConfig, path: Option<&Path>, init: bool, force: bool) -> anyhow::Result<()> {
    let target = path.map_or_else(config_file_path, Path::to_path_buf);

    if init {
        if target.exists() && !force {
            anyhow::bail!(
                "Configuration already exists at {} (use --force to overwrite)",
                target.display()
            );
        }
        let defaults = AppConfig::default();
        let written = match path {
            Some(path) => defaults.save_to(path).map(|()| path.to_path_buf()),
            None => defaults.save(),
        }
        .map_err(|e| anyhow::anyhow!("Failed to write configuration: {e}"))?;
        println!("Wrote default configuration to {}", written.display());
        return Ok(());
    }

    println!("# {}", target.display());
    println!("{}", serde_json::to_string_pretty(config)?);

    if let Err(e) = FramingParams::try_from(&config.tuning) {
        println!("# warning: tuning is not usable: {e}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_defaults_and_respects_force() {
        let dir = std::env::temp_dir().join(format!("camtrack-init-{}", std::process::id()));
        let path = dir.join("config.json");
        let _ = std::fs::remove_dir_all(&dir);

        run(&AppConfig::default(), Some(&path), true, false).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), AppConfig::default());

        assert!(run(&AppConfig::default(), Some(&path), true, false).is_err());
        run(&AppConfig::default(), Some(&path), true, true).unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }
}
