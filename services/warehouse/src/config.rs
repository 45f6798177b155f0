//! Staging configuration loading.
//!
//! Loads the YAML staging config with environment variable substitution
//! (`${VAR}` and `${VAR:-default}`) and `~` expansion for paths.

use anyhow::{Context, Result};
use serde::Deserialize;
use staging::{discover_resolution_dir, DataType, MapfileConfig, PathResolver, TransferMode, TransferOptions};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use timecheck::RawComponent;

fn default_grid() -> String {
    "180x360_aave".to_string()
}

fn default_ensemble() -> String {
    "ens1".to_string()
}

fn default_workers() -> usize {
    8
}

/// One experiment's staging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StagingConfig {
    /// Root of the publication tree
    pub publication_root: PathBuf,
    pub experiment: String,
    /// Discovered under `publication_root/experiment` when unset
    #[serde(default)]
    pub resolution_dir: Option<String>,
    /// Grid name for regridded data types
    #[serde(default = "default_grid")]
    pub grid: String,
    #[serde(default = "default_ensemble")]
    pub ensemble: String,
    #[serde(default)]
    pub transfer_mode: TransferMode,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Source directory per data type
    #[serde(default)]
    pub data_paths: BTreeMap<DataType, PathBuf>,
    #[serde(default)]
    pub mapfile: Option<MapfileConfig>,
    /// Raw history directories per component
    #[serde(default)]
    pub raw: BTreeMap<RawComponent, PathBuf>,
}

impl StagingConfig {
    pub fn transfer_options(&self) -> TransferOptions {
        TransferOptions {
            mode: self.transfer_mode,
            overwrite: self.overwrite,
            workers: self.workers,
        }
    }

    /// Build the path resolver, discovering the resolution directory if needed.
    pub fn resolver(&self) -> Result<PathResolver> {
        let resolution = match &self.resolution_dir {
            Some(dir) => dir.clone(),
            None => discover_resolution_dir(&self.publication_root, &self.experiment)
                .context("resolution_dir is not set and could not be discovered")?,
        };
        Ok(PathResolver::new(
            &self.publication_root,
            &self.experiment,
            resolution,
            &self.grid,
            &self.ensemble,
        ))
    }

    fn expand_paths(&mut self) {
        self.publication_root = expand_path(&self.publication_root);
        for path in self.data_paths.values_mut().chain(self.raw.values_mut()) {
            *path = expand_path(path);
        }
        if let Some(mapfile) = &mut self.mapfile {
            mapfile.ini_dir = expand_path(&mapfile.ini_dir);
            mapfile.output_dir = expand_path(&mapfile.output_dir);
        }
    }
}

/// Load and validate a staging config file.
pub fn load_staging_config<P: AsRef<Path>>(path: P) -> Result<StagingConfig> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read staging config from {:?}", path.as_ref()))?;

    let expanded = expand_env_vars(&content)?;

    let mut config: StagingConfig = serde_yaml::from_str(&expanded)
        .with_context(|| format!("Failed to parse staging config from {:?}", path.as_ref()))?;
    config.expand_paths();

    validate_staging_config(&config)?;

    Ok(config)
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

/// Expand `${VAR}` and `${VAR:-default}` references.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut var_expr = String::new();
            let mut depth = 1;
            while depth > 0 {
                match chars.next() {
                    Some('{') => {
                        depth += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        depth -= 1;
                        if depth > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

fn validate_staging_config(config: &StagingConfig) -> Result<()> {
    anyhow::ensure!(!config.experiment.is_empty(), "experiment cannot be empty");
    anyhow::ensure!(
        !config.experiment.contains('/'),
        "experiment must be a single directory name: {}",
        config.experiment
    );
    anyhow::ensure!(config.workers > 0, "workers must be greater than 0");
    anyhow::ensure!(!config.ensemble.is_empty(), "ensemble cannot be empty");

    if let Some(mapfile) = &config.mapfile {
        anyhow::ensure!(!mapfile.command.is_empty(), "mapfile.command cannot be empty");
        anyhow::ensure!(
            mapfile.max_processes > 0,
            "mapfile.max_processes must be greater than 0"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("staging.yaml");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_expand_env_vars_simple() {
        std::env::set_var("WAREHOUSE_TEST_EXPERIMENT", "piControl");
        let result = expand_env_vars("experiment: ${WAREHOUSE_TEST_EXPERIMENT}").unwrap();
        assert_eq!(result, "experiment: piControl");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        std::env::remove_var("WAREHOUSE_TEST_UNSET");
        let result = expand_env_vars("root: ${WAREHOUSE_TEST_UNSET:-/p/user_pub}/work").unwrap();
        assert_eq!(result, "root: /p/user_pub/work");
    }

    #[test]
    fn test_expand_env_vars_missing_required() {
        std::env::remove_var("WAREHOUSE_TEST_REQUIRED");
        assert!(expand_env_vars("${WAREHOUSE_TEST_REQUIRED}").is_err());
    }

    #[test]
    fn test_expand_env_vars_unclosed() {
        assert!(expand_env_vars("root: ${PUB_ROOT").is_err());
    }

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
publication_root: /p/user_pub/work/E3SM/1_0
experiment: piControl
resolution_dir: 1deg_atm_60-30km_ocean
transfer_mode: copy
workers: 4
data_paths:
  atmos: /raw/atm
  climo: /post/climo
  ocean: /raw/ocn
mapfile:
  command: [conda, run, -n, pub, esgmapfile]
  ini_dir: /esg/ini
  output_dir: /esg/mapfiles
raw:
  atmos: /raw/atm
  sea-ice: /raw/ice
"#,
        );

        let config = load_staging_config(&path).unwrap();
        assert_eq!(config.transfer_mode, TransferMode::Copy);
        assert_eq!(config.grid, "180x360_aave");
        assert_eq!(config.ensemble, "ens1");
        assert_eq!(config.data_paths.len(), 3);
        assert_eq!(config.data_paths[&DataType::Climatology], PathBuf::from("/post/climo"));
        assert_eq!(config.raw[&RawComponent::SeaIce], PathBuf::from("/raw/ice"));

        let mapfile = config.mapfile.as_ref().unwrap();
        assert_eq!(mapfile.project, "e3sm");
        assert_eq!(mapfile.max_processes, 4);
        assert_eq!(mapfile.command[0], "conda");

        let resolver = config.resolver().unwrap();
        assert_eq!(
            resolver.resolve(DataType::Ocean, "o.nc"),
            PathBuf::from(
                "/p/user_pub/work/E3SM/1_0/piControl/1deg_atm_60-30km_ocean/ocean/native/model-output/mon/ens1/v1/o.nc"
            )
        );
    }

    #[test]
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "publication_root: /pub\nexperiment: hist\n");
        let config = load_staging_config(&path).unwrap();
        assert_eq!(config.transfer_mode, TransferMode::Link);
        assert!(!config.overwrite);
        assert_eq!(config.workers, 8);
        assert!(config.mapfile.is_none());
        assert!(config.data_paths.is_empty());
    }

    #[test]
    fn test_tilde_expansion() {
        let home = std::env::var("HOME").unwrap_or_default();
        if home.is_empty() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "publication_root: ~/pub\nexperiment: hist\n");
        let config = load_staging_config(&path).unwrap();
        assert_eq!(config.publication_root, Path::new(&home).join("pub"));
    }

    #[test]
    fn test_unknown_data_type_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "publication_root: /pub\nexperiment: hist\ndata_paths:\n  glacier: /raw/glc\n",
        );
        let err = load_staging_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("glacier is an invalid data type"));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "publication_root: /pub\nexperiment: hist\nworkers: 0\n");
        let err = load_staging_config(&path).unwrap_err();
        assert!(err.to_string().contains("workers"));
    }

    #[test]
    fn test_resolution_dir_discovery() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("hist/ne30")).unwrap();
        let config = StagingConfig {
            publication_root: dir.path().to_path_buf(),
            experiment: "hist".to_string(),
            resolution_dir: None,
            grid: default_grid(),
            ensemble: default_ensemble(),
            transfer_mode: TransferMode::Link,
            overwrite: false,
            workers: 2,
            data_paths: BTreeMap::new(),
            mapfile: None,
            raw: BTreeMap::new(),
        };
        let resolver = config.resolver().unwrap();
        assert_eq!(
            resolver.dataset_dir(DataType::Land),
            dir.path().join("hist/ne30/land/native/model-output/mon/ens1/v1")
        );
    }
}
