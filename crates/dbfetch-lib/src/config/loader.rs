use super::Config;
use crate::error::DbFetchError;
use config::Config as ConfigBuilder;

pub fn load_config(config_path: &str) -> Result<Config, DbFetchError> {
    let config_builder = ConfigBuilder::builder()
        .add_source(config::File::with_name(config_path))
        .build()?;

    config_builder.try_deserialize().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_load_yaml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbfetch.yaml");
        std::fs::write(
            &path,
            r#"
resources:
  - url: https://storage.example.com/models/a.3dm.gz
    expected_hash: "0cc175b9c0f1b6a831c399e269772661"
  - url: https://storage.example.com/models/b.obj
allowed_hashes:
  - "92eb5ffee6ae2fec3ad71c777531578f"
staging_dir: temp
download:
  max_retries: 1
"#,
        )
        .unwrap();

        let config = load_config(path.to_str().unwrap()).unwrap();

        assert_eq!(config.resources.len(), 2);
        assert_eq!(
            config.resources[0].expected_hash.as_deref(),
            Some("0cc175b9c0f1b6a831c399e269772661")
        );
        assert_eq!(config.resources[1].expected_hash, None);
        assert_eq!(config.staging_dir, Some(PathBuf::from("temp")));
        assert_eq!(config.extracted_dir, None);
        assert_eq!(config.download.max_retries, 1);
        assert_eq!(config.download.timeout_secs, 30);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbfetch.toml");
        std::fs::write(&path, "staging_dir = \"temp\"\nunzip = true\n").unwrap();

        assert!(matches!(
            load_config(path.to_str().unwrap()),
            Err(DbFetchError::Config(_))
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");

        assert!(load_config(path.to_str().unwrap()).is_err());
    }
}
