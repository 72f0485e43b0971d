use crate::error::ConversionFailure;
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    str::FromStr,
};
use tracing::trace;

type ParseFn<T> = Box<dyn Fn(&str) -> Result<T, ConversionFailure>>;
type WriteFn<T> = Box<dyn Fn(&T) -> Result<String, ConversionFailure>>;

/// An enumeration-like type that converts to and from its variant names
///
/// Usually derived with `#[derive(ConfigEnum)]`. Names are matched
/// case-insensitively when parsing.
pub trait ConfigEnum: Clone + PartialEq + 'static {
    const VARIANTS: &'static [(&'static str, Self)];

    fn variant_name(&self) -> Option<&'static str> {
        Self::VARIANTS
            .iter()
            .find(|(_, variant)| variant == self)
            .map(|(name, _)| *name)
    }
}

/// Per-type string conversions used by typed store access
///
/// Parsers and writers are registered independently and keyed by type
/// identity. Registering again for the same type replaces the previous
/// conversion.
pub struct ConversionRegistry {
    parsers: HashMap<TypeId, Box<dyn Any>>,
    writers: HashMap<TypeId, Box<dyn Any>>,
}

macro_rules! register_numeric {
    ($registry:expr, $($ty:ty),* $(,)?) => {
        $(
            $registry.register_parser(|raw: &str| raw.trim().parse::<$ty>());
            $registry.register_writer(|value: &$ty| value.to_string());
        )*
    };
}

impl ConversionRegistry {
    /// A registry with no conversions at all
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
            writers: HashMap::new(),
        }
    }

    /// A registry seeded with the built-in scalar conversions
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_parser(|raw: &str| Ok::<_, String>(raw.to_string()));
        registry.register_writer(|value: &String| value.clone());
        registry.register_parser(parse_bool);
        registry.register_writer(|value: &bool| value.to_string());
        registry.register_parser(|raw: &str| raw.trim().parse::<char>());
        registry.register_writer(|value: &char| value.to_string());
        register_numeric!(
            registry, i64, i32, i16, i8, isize, u64, u32, u16, u8, usize, f64, f32,
        );
        registry
    }

    /// Register the parser for `T`, replacing any existing one
    ///
    /// An `Err` from the parser surfaces as a conversion error carrying the
    /// error's message.
    pub fn register_parser<T, E, F>(&mut self, parser: F)
    where
        T: 'static,
        E: fmt::Display,
        F: Fn(&str) -> Result<T, E> + 'static,
    {
        let boxed: ParseFn<T> = Box::new(move |raw| {
            parser(raw).map_err(|e| ConversionFailure::Rejected {
                reason: e.to_string(),
            })
        });
        self.parsers.insert(TypeId::of::<T>(), Box::new(boxed));
    }

    /// Register the writer for `T`, replacing any existing one
    pub fn register_writer<T, F>(&mut self, writer: F)
    where
        T: 'static,
        F: Fn(&T) -> String + 'static,
    {
        let boxed: WriteFn<T> = Box::new(move |value: &T| Ok(writer(value)));
        self.writers.insert(TypeId::of::<T>(), Box::new(boxed));
    }

    /// Convert `T` through its own `FromStr` and `Display` implementations
    pub fn register_from_str<T>(&mut self)
    where
        T: FromStr + fmt::Display + 'static,
        T::Err: fmt::Display,
    {
        self.register_parser(|raw: &str| raw.parse::<T>());
        self.register_writer(|value: &T| value.to_string());
    }

    /// Convert `T` by variant name
    ///
    /// Rendering a value missing from `T::VARIANTS` fails with
    /// [`ConversionFailure::UnknownVariant`].
    pub fn register_enum<T: ConfigEnum>(&mut self) {
        let parser: ParseFn<T> = Box::new(parse_variant::<T>);
        self.parsers.insert(TypeId::of::<T>(), Box::new(parser));
        let writer: WriteFn<T> = Box::new(|value: &T| {
            value
                .variant_name()
                .map(str::to_string)
                .ok_or_else(unknown_variant::<T>)
        });
        self.writers.insert(TypeId::of::<T>(), Box::new(writer));
    }

    pub fn has_parser<T: 'static>(&self) -> bool {
        self.parsers.contains_key(&TypeId::of::<T>())
    }

    pub fn has_writer<T: 'static>(&self) -> bool {
        self.writers.contains_key(&TypeId::of::<T>())
    }

    /// Convert a raw string into `T`
    pub fn convert<T: 'static>(&self, raw: &str) -> Result<T, ConversionFailure> {
        trace!(type_name = std::any::type_name::<T>(), raw, "converting");
        self.parsers
            .get(&TypeId::of::<T>())
            .and_then(|parser| parser.downcast_ref::<ParseFn<T>>())
            .ok_or(ConversionFailure::Unsupported)
            .and_then(|parser| parser(raw))
    }

    /// Render `value` as a raw string
    pub fn render<T: 'static>(&self, value: &T) -> Result<String, ConversionFailure> {
        self.writers
            .get(&TypeId::of::<T>())
            .and_then(|writer| writer.downcast_ref::<WriteFn<T>>())
            .ok_or(ConversionFailure::Unsupported)
            .and_then(|writer| writer(value))
    }
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRegistry")
            .field("parsers", &self.parsers.len())
            .field("writers", &self.writers.len())
            .finish()
    }
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(format!("'{}' is not a boolean", raw))
    }
}

fn parse_variant<T: ConfigEnum>(raw: &str) -> Result<T, ConversionFailure> {
    let wanted = raw.trim();
    T::VARIANTS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
        .map(|(_, variant)| variant.clone())
        .ok_or_else(unknown_variant::<T>)
}

fn unknown_variant<T: ConfigEnum>() -> ConversionFailure {
    ConversionFailure::UnknownVariant {
        expected: T::VARIANTS.iter().map(|(name, _)| *name).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Quality {
        Low,
        High,
    }

    impl ConfigEnum for Quality {
        const VARIANTS: &'static [(&'static str, Self)] =
            &[("Low", Quality::Low), ("High", Quality::High)];
    }

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_builtin_scalars() {
        let registry = ConversionRegistry::new();

        assert_eq!(registry.convert::<String>(" keep ").unwrap(), " keep ");
        assert_eq!(registry.convert::<i64>("-9000000000").unwrap(), -9_000_000_000);
        assert_eq!(registry.convert::<i32>(" 42 ").unwrap(), 42);
        assert_eq!(registry.convert::<i16>("-7").unwrap(), -7);
        assert_eq!(registry.convert::<u8>("255").unwrap(), 255);
        assert_eq!(registry.convert::<f64>("1.5").unwrap(), 1.5);
        assert!(registry.convert::<bool>("True").unwrap());
        assert!(!registry.convert::<bool>("false").unwrap());
    }

    #[test]
    fn test_builtin_rejects_bad_input() {
        let registry = ConversionRegistry::new();

        assert!(matches!(
            registry.convert::<u8>("256"),
            Err(ConversionFailure::Rejected { .. })
        ));
        assert!(matches!(
            registry.convert::<bool>("yes"),
            Err(ConversionFailure::Rejected { .. })
        ));
    }

    #[test]
    fn test_unregistered_type_unsupported() {
        let registry = ConversionRegistry::new();

        assert_eq!(
            registry.convert::<Point>("1,2"),
            Err(ConversionFailure::Unsupported)
        );
        assert_eq!(
            registry.render(&Point { x: 1, y: 2 }),
            Err(ConversionFailure::Unsupported)
        );
        assert!(ConversionRegistry::empty().convert::<i32>("1").is_err());
    }

    #[test]
    fn test_custom_parser_and_writer() {
        let mut registry = ConversionRegistry::new();
        registry.register_parser(|raw: &str| -> Result<Point, &'static str> {
            let (x, y) = raw.split_once(',').ok_or("missing comma")?;
            let x = x.trim().parse::<i32>().map_err(|_| "bad x")?;
            let y = y.trim().parse::<i32>().map_err(|_| "bad y")?;
            Ok(Point { x, y })
        });
        registry.register_writer(|p: &Point| format!("{}, {}", p.x, p.y));

        let point = registry.convert::<Point>("3, 4").unwrap();
        assert_eq!(point, Point { x: 3, y: 4 });
        assert_eq!(registry.render(&point).unwrap(), "3, 4");
        assert_eq!(
            registry.convert::<Point>("34"),
            Err(ConversionFailure::Rejected {
                reason: "missing comma".to_string()
            })
        );
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = ConversionRegistry::new();
        registry.register_parser(|_: &str| Ok::<_, String>(1i32));
        registry.register_parser(|_: &str| Ok::<_, String>(2i32));
        registry.register_writer(|v: &i32| format!("#{}", v));

        assert_eq!(registry.convert::<i32>("anything").unwrap(), 2);
        assert_eq!(registry.render(&5i32).unwrap(), "#5");
    }

    #[test]
    fn test_enum_case_insensitive() {
        let mut registry = ConversionRegistry::new();
        registry.register_enum::<Quality>();

        assert_eq!(registry.convert::<Quality>("high").unwrap(), Quality::High);
        assert_eq!(registry.convert::<Quality>("LOW").unwrap(), Quality::Low);
        assert_eq!(registry.render(&Quality::High).unwrap(), "High");
        assert_eq!(
            registry.convert::<Quality>("medium"),
            Err(ConversionFailure::UnknownVariant {
                expected: vec!["Low", "High"]
            })
        );
    }

    #[test]
    fn test_enum_missing_from_table_fails_to_render() {
        #[derive(Debug, Clone, PartialEq)]
        enum Mode {
            A,
            B,
        }

        impl ConfigEnum for Mode {
            const VARIANTS: &'static [(&'static str, Self)] = &[("A", Mode::A)];
        }

        let mut registry = ConversionRegistry::new();
        registry.register_enum::<Mode>();

        assert_eq!(registry.render(&Mode::A).unwrap(), "A");
        assert_eq!(
            registry.render(&Mode::B),
            Err(ConversionFailure::UnknownVariant { expected: vec!["A"] })
        );
    }

    #[test]
    fn test_from_str_fallback() {
        let mut registry = ConversionRegistry::new();
        assert!(!registry.has_parser::<std::net::Ipv4Addr>());

        registry.register_from_str::<std::net::Ipv4Addr>();

        let addr = registry.convert::<std::net::Ipv4Addr>("127.0.0.1").unwrap();
        assert_eq!(addr, std::net::Ipv4Addr::LOCALHOST);
        assert_eq!(registry.render(&addr).unwrap(), "127.0.0.1");
        assert!(registry.has_writer::<std::net::Ipv4Addr>());
    }

    #[test]
    fn test_parser_writer_pairs_are_inverse() {
        let registry = ConversionRegistry::new();

        for value in [0i32, -1, i32::MAX, i32::MIN] {
            let raw = registry.render(&value).unwrap();
            assert_eq!(registry.convert::<i32>(&raw).unwrap(), value);
        }
        for value in [true, false] {
            let raw = registry.render(&value).unwrap();
            assert_eq!(registry.convert::<bool>(&raw).unwrap(), value);
        }
    }
}
