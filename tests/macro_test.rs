use std::path::PathBuf;
use tagconf::{define_loadable, ConfigError, ConfigStore, Loadable, MemberKind, DEFAULT_TAG};

define_loadable! {
    #[derive(Debug, Default)]
    pub struct TestConfig {
        #[loadable(default = "100", key = "Width")]
        pub width: f64,

        #[loadable(default = "100", key = "Height")]
        pub height: f64,

        #[loadable(default = 100, key = "X")]
        pub x: i64,

        #[loadable(default = "100", key = "Y")]
        pub y: i64,

        #[loadable(default = "Hello, world!", key = "Str")]
        label: String,

        // Not bound to the store
        pub scratch: u32,
    }
}

define_loadable! {
    #[derive(Debug, Default)]
    pub struct GraphicConfig {
        #[loadable(default = "1920", tag = "Graphic")]
        pub width: u32,

        #[loadable(default = true, tag = "Graphic", key = "VSync")]
        pub vsync: bool,

        #[loadable(default = "Common value")]
        pub r#type: String,
    }
}

define_loadable! {
    #[derive(Debug, Default)]
    pub struct UnsupportedConfig {
        #[loadable(default = "/tmp")]
        pub root: PathBuf,
    }
}

const INPUT: &str = "Width = 140\n\nX = 50\n\nStr = Hi, world!\n";

fn loaded_store() -> ConfigStore {
    let mut store = ConfigStore::new();
    store.load_str(INPUT).unwrap();
    store
}

#[test]
fn test_macro_loads_present_values() {
    let mut store = loaded_store();
    let config = TestConfig::from_store(&mut store).unwrap();

    assert_eq!(config.width, 140.0);
    assert_eq!(config.x, 50);
    assert_eq!(config.label, "Hi, world!");
    assert_eq!(config.scratch, 0);
}

#[test]
fn test_macro_seeds_missing_defaults() {
    let mut store = loaded_store();
    let config = TestConfig::from_store(&mut store).unwrap();

    assert_eq!(config.height, 100.0);
    assert_eq!(&store["Height"], "100");
    assert_eq!(config.y, 100);
    assert_eq!(&store["Y"], "100");
}

#[test]
fn test_macro_integer_default_seeded_as_string() {
    let mut store = ConfigStore::new();
    let config = TestConfig::from_store(&mut store).unwrap();

    assert_eq!(config.x, 100);
    assert_eq!(store.raw(DEFAULT_TAG, "X"), Some("100"));
}

#[test]
fn test_macro_descriptors() {
    let bindings = TestConfig::binder().bindings();

    assert_eq!(bindings.len(), 5);
    assert_eq!(bindings[0].name(), "width");
    assert_eq!(bindings[0].key(), "Width");
    assert_eq!(bindings[0].tag(), DEFAULT_TAG);
    assert_eq!(bindings[0].kind(), MemberKind::Field);
    assert_eq!(bindings[4].name(), "label");
    assert_eq!(bindings[4].default(), Some("Hello, world!"));

    // Built once and shared
    assert!(std::ptr::eq(TestConfig::binder(), TestConfig::binder()));
}

#[test]
fn test_macro_tag_and_name_defaults() {
    let mut store = ConfigStore::new();
    let config = GraphicConfig::from_store(&mut store).unwrap();

    assert_eq!(config.width, 1920);
    assert!(config.vsync);
    assert_eq!(config.r#type, "Common value");
    assert_eq!(&store[("Graphic", "width")], "1920");
    assert_eq!(&store[("Graphic", "VSync")], "true");
    assert_eq!(&store["type"], "Common value");
}

#[test]
fn test_macro_save_round_trip() {
    let mut store = ConfigStore::new();
    let mut config = GraphicConfig::from_store(&mut store).unwrap();

    config.width = 2560;
    config.vsync = false;
    config.save_to(&mut store).unwrap();

    let mut reloaded = ConfigStore::new();
    reloaded.load_str(&store.to_text()).unwrap();
    let again = GraphicConfig::from_store(&mut reloaded).unwrap();

    assert_eq!(again.width, 2560);
    assert!(!again.vsync);
}

#[test]
fn test_macro_repeated_load_is_stable() {
    let mut store = loaded_store();
    let mut config = TestConfig::default();

    config.load_from(&mut store).unwrap();
    config.load_from(&mut store).unwrap();

    assert_eq!(config.height, 100.0);
    assert_eq!(store.keys(DEFAULT_TAG).unwrap().count(), 5);
}

#[test]
fn test_macro_unsupported_type_fails_load() {
    let mut store = ConfigStore::new();
    let result = UnsupportedConfig::from_store(&mut store);

    assert!(matches!(result, Err(ConfigError::Conversion { .. })));
}
