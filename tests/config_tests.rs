use lifecycle::core::config::HandlerConfig;
use lifecycle::errors::ConfigError;

#[test]
fn test_valid_config() {
    let config = HandlerConfig::new(
        "bank_db",
        ["defaultMongo.username", "defaultMongo.password"],
    )
    .unwrap();

    assert_eq!(config.db_name(), "bank_db");
    assert_eq!(config.keys(), ["defaultMongo.username", "defaultMongo.password"]);
}

#[test]
fn test_empty_key_list_is_accepted() {
    let config = HandlerConfig::new("bank_db", Vec::<String>::new()).unwrap();
    assert!(config.keys().is_empty());
}

#[test]
fn test_blank_db_name_is_rejected() {
    for name in ["", "   "] {
        let err = HandlerConfig::new(name, ["defaultMongo.username"]).unwrap_err();
        assert_eq!(err, ConfigError::InvalidDbName);
    }
}

#[test]
fn test_blank_key_is_rejected() {
    let err = HandlerConfig::new("bank_db", ["defaultMongo.username", ""]).unwrap_err();
    assert_eq!(err, ConfigError::InvalidKey(1));
}

#[test]
fn test_duplicate_key_is_rejected() {
    let err = HandlerConfig::new(
        "bank_db",
        ["defaultMongo.username", "defaultMongo.password", "defaultMongo.username"],
    )
    .unwrap_err();
    assert_eq!(err, ConfigError::DuplicateKey("defaultMongo.username".to_string()));
}
