#[cfg(test)]
mod tests {
    use crate::config::{
        ConfigBuilder, ConfigLoader, LogFormat, LogLevel, RegistryConfig, StorageBackend,
        validation,
    };
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.format, LogFormat::Default);
        assert!(config.logging.stdout);
    }

    #[test]
    fn test_config_builder_with_rocksdb() {
        let config = ConfigBuilder::new()
            .with_data_dir("/tmp/test_data")
            .with_rocksdb_storage()
            .with_log_level(LogLevel::Debug)
            .build()
            .unwrap();

        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/test_data"));
        assert_eq!(config.storage.backend, StorageBackend::RocksDb);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_validation() {
        assert!(ConfigBuilder::new().build().is_ok());
        assert!(validation::validate_config(&RegistryConfig::default()).is_ok());

        let mut no_sink = RegistryConfig::default();
        no_sink.logging.stdout = false;
        assert!(validation::validate_config(&no_sink).is_err());

        let empty_dir = ConfigBuilder::new()
            .with_rocksdb_storage()
            .with_data_dir("")
            .build();
        assert!(empty_dir.is_err());
    }

    #[test]
    fn test_predefined_configs() {
        let dev = ConfigBuilder::development().build().unwrap();
        let prod = ConfigBuilder::production().build().unwrap();

        assert_eq!(dev.storage.backend, StorageBackend::Memory);
        assert_eq!(dev.logging.level, LogLevel::Debug);
        assert_eq!(prod.storage.backend, StorageBackend::RocksDb);
        assert_eq!(prod.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_config_serialization() {
        let config = ConfigBuilder::new()
            .with_data_dir("/tmp/test_data")
            .with_rocksdb_storage()
            .build()
            .unwrap();

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""backend":"rocksdb""#));
        let deserialized: RegistryConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.storage.data_dir, deserialized.storage.data_dir);
        assert_eq!(deserialized.storage.backend, StorageBackend::RocksDb);
    }

    #[test]
    fn test_loader_reads_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[storage]\nbackend = \"rocksdb\"\ndata_dir = \"/var/lib/citizens\"\n\n[logging]\nlevel = \"warn\""
        )
        .unwrap();

        let config = ConfigLoader::new().load_file(file.path()).unwrap().extract().unwrap();

        assert_eq!(config.storage.backend, StorageBackend::RocksDb);
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/citizens"));
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert!(config.logging.stdout);
    }

    #[test]
    fn test_loader_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(ConfigLoader::new().load_file(file.path()).is_err());
        assert!(ConfigLoader::new().load_file("/nonexistent/citizens.toml").is_err());
    }

    #[test]
    fn test_loader_reads_environment() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("CITIZENS_STORAGE__BACKEND", "rocksdb");
            jail.set_env("CITIZENS_LOGGING__LEVEL", "error");

            let config = ConfigLoader::new().load_env().extract().unwrap();

            assert_eq!(config.storage.backend, StorageBackend::RocksDb);
            assert_eq!(config.logging.level, LogLevel::Error);
            Ok(())
        });
    }

    #[test]
    fn test_loader_layers_file_then_environment() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("citizens.yaml", "logging:\n  level: error\n")?;
            jail.create_file(
                "citizens.toml",
                "[storage]\nbackend = \"rocksdb\"\n\n[logging]\nlevel = \"warn\"",
            )?;
            jail.set_env("CITIZENS_LOGGING__LEVEL", "debug");

            let from_file = ConfigLoader::new().load_default_files().extract().unwrap();
            assert_eq!(from_file.storage.backend, StorageBackend::RocksDb);
            assert_eq!(from_file.logging.level, LogLevel::Warn);

            let layered = ConfigLoader::new()
                .load_default_files()
                .load_env()
                .extract()
                .unwrap();
            assert_eq!(layered.storage.backend, StorageBackend::RocksDb);
            assert_eq!(layered.logging.level, LogLevel::Debug);
            Ok(())
        });
    }

    #[test]
    fn test_level_and_backend_parse() {
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!("rocksdb".parse::<StorageBackend>(), Ok(StorageBackend::RocksDb));
        assert_eq!(StorageBackend::Memory.to_string(), "memory");
    }
}
