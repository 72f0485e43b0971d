use std::io::Write;
use tagconf::{ConfigError, ConfigStore, StoreLayout, TextEncoding, DEFAULT_TAG};

#[derive(Debug, PartialEq)]
struct Resolution {
    width: u32,
    height: u32,
}

#[derive(Debug, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

const INPUT: &str = "
NoTag = AAA

[Graphic]
Resolution = 1920 * 1080
Point1 = (100, 20)
Point2 = (20, 100)

[String]

Hello = Hello world!
";

fn parse_resolution(raw: &str) -> Result<Resolution, String> {
    let (w, h) = raw
        .split_once(" * ")
        .ok_or_else(|| format!("'{}' is not <W> * <H>", raw))?;
    Ok(Resolution {
        width: w.trim().parse().map_err(|_| "bad width".to_string())?,
        height: h.trim().parse().map_err(|_| "bad height".to_string())?,
    })
}

fn parse_point(raw: &str) -> Result<Point, String> {
    let inner = raw
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or("missing parentheses")?;
    let (x, y) = inner.split_once(',').ok_or("missing comma")?;
    Ok(Point {
        x: x.trim().parse().map_err(|_| "bad x")?,
        y: y.trim().parse().map_err(|_| "bad y")?,
    })
}

fn graphic_store() -> ConfigStore {
    let mut store = ConfigStore::new();
    store.load(INPUT.as_bytes()).unwrap();
    store.register_parser(parse_resolution);
    store.register_parser(parse_point);
    store
}

#[test]
fn test_custom_parsers() {
    let store = graphic_store();

    assert_eq!(
        store.get_value::<Resolution>("Graphic", "Resolution").unwrap(),
        Resolution {
            width: 1920,
            height: 1080
        }
    );
    assert_eq!(
        store.get_value::<Point>("Graphic", "Point1").unwrap(),
        Point { x: 100, y: 20 }
    );
    assert_eq!(
        store.get_value::<Point>("Graphic", "Point2").unwrap(),
        Point { x: 20, y: 100 }
    );
    assert_eq!(
        store.get_value::<String>("String", "Hello").unwrap(),
        "Hello world!"
    );
    assert_eq!(store.get_value::<String>(DEFAULT_TAG, "NoTag").unwrap(), "AAA");
    assert_eq!(&store["NoTag"], "AAA");
}

#[test]
fn test_custom_parser_rejection_names_entry() {
    let mut store = graphic_store();
    store.set_raw("Graphic", "Resolution", "wide").unwrap();

    match store.get_value::<Resolution>("Graphic", "Resolution") {
        Err(ConfigError::Conversion {
            tag, key, value, ..
        }) => {
            assert_eq!(tag, "Graphic");
            assert_eq!(key, "Resolution");
            assert_eq!(value.as_deref(), Some("wide"));
        }
        other => panic!("Expected Conversion error, got {:?}", other),
    }
}

#[test]
fn test_custom_writer() {
    let mut store = graphic_store();
    store.register_writer(|r: &Resolution| format!("{} * {}", r.width, r.height));

    store
        .set_value(
            "Graphic",
            "Resolution",
            &Resolution {
                width: 1280,
                height: 720,
            },
        )
        .unwrap();

    assert_eq!(&store[("Graphic", "Resolution")], "1280 * 720");
    assert_eq!(
        store.get_value::<Resolution>("Graphic", "Resolution").unwrap(),
        Resolution {
            width: 1280,
            height: 720
        }
    );
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.conf");
    let store = graphic_store();

    store.save_file(&path).unwrap();

    let mut reloaded = ConfigStore::new();
    reloaded.load_file(&path).unwrap();
    for tag in store.tags() {
        for key in store.keys(tag).unwrap() {
            assert_eq!(reloaded.raw(tag, key), store.raw(tag, key));
        }
    }
    assert_eq!(reloaded.to_text(), store.to_text());
}

#[test]
fn test_load_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ConfigStore::new();

    let result = store.load_file(dir.path().join("absent.conf"));

    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_load_utf8_bom_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[0xEF, 0xBB, 0xBF]).unwrap();
    file.write_all("[Ünicode]\nName = Grüße\n".as_bytes()).unwrap();
    file.flush().unwrap();

    let mut store = ConfigStore::new();
    store.load_file(file.path()).unwrap();

    assert_eq!(&store[("Ünicode", "Name")], "Grüße");
}

#[test]
fn test_load_with_requested_encoding() {
    let bytes: Vec<u8> = "Key = 16\n"
        .encode_utf16()
        .flat_map(|unit| unit.to_le_bytes())
        .collect();
    let mut store = ConfigStore::new();

    store
        .load_with_encoding(bytes.as_slice(), Some(TextEncoding::Utf16Le))
        .unwrap();

    assert_eq!(store.get_value::<u8>(DEFAULT_TAG, "Key").unwrap(), 16);
}

#[test]
fn test_sorted_layout_save_order() {
    let mut store = ConfigStore::with_layout(StoreLayout::sorted());
    store.load_str(INPUT).unwrap();

    let text = store.to_text();
    let common = text.find("[Common]").unwrap();
    let graphic = text.find("[Graphic]").unwrap();
    let string = text.find("[String]").unwrap();
    assert!(common < graphic && graphic < string);
    assert!(text.find("Point1").unwrap() < text.find("Resolution").unwrap());
}
