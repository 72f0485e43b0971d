use crate::error::ConfigError;
use crate::registry::ConversionRegistry;
use crate::store::{ConfigStore, DEFAULT_TAG};
use std::{any::type_name, fmt};
use tracing::debug;

type LoadFn<T> =
    Box<dyn Fn(&mut T, &ConfigStore, &str, &str) -> Result<(), ConfigError> + Send + Sync>;
type SaveFn<T> =
    Box<dyn Fn(&T, &mut ConfigStore, &str, &str) -> Result<(), ConfigError> + Send + Sync>;

/// Hooks a bound object uses to extend the store's conversions
///
/// `register_parsers` runs once before every load, `register_writers`
/// once before every save.
pub trait ConfigHooks {
    fn register_parsers(&self, _registry: &mut ConversionRegistry) {}

    fn register_writers(&self, _registry: &mut ConversionRegistry) {}
}

/// How a bound member is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Read and written in place through a reference
    Field,
    /// Read through a getter returning a value, written through a setter
    Property,
}

/// Declaration of one loadable member
///
/// # Example
/// ```rust
/// use tagconf::Member;
///
/// let member = Member::new("width").default("100").tag("Graphic").key("Width");
/// ```
#[derive(Debug, Clone)]
pub struct Member {
    name: String,
    tag: Option<String>,
    key: Option<String>,
    default: Option<String>,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: None,
            key: None,
            default: None,
        }
    }

    /// Raw string seeded into the store when the entry is missing
    pub fn default(mut self, raw: impl Into<String>) -> Self {
        self.default = Some(raw.into());
        self
    }

    /// Tag override; the default tag otherwise
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Key override; the member name otherwise
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// Resolved binding of one member to a store entry
pub struct Binding<T> {
    name: String,
    tag: String,
    key: String,
    default: Option<String>,
    kind: MemberKind,
    type_name: &'static str,
    load: LoadFn<T>,
    save: SaveFn<T>,
}

impl<T> Binding<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn require_default(&self) -> Result<&str, ConfigError> {
        self.default
            .as_deref()
            .ok_or_else(|| ConfigError::MissingDefault {
                member: self.name.clone(),
            })
    }
}

impl<T> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("key", &self.key)
            .field("default", &self.default)
            .field("kind", &self.kind)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Synchronizes the members of `T` with a [`ConfigStore`]
///
/// Bindings are resolved once when they are added and applied in the
/// order they were added.
///
/// # Example
/// ```rust
/// use tagconf::{Binder, ConfigHooks, ConfigStore, Member};
///
/// #[derive(Default)]
/// struct Window {
///     width: u32,
/// }
///
/// impl ConfigHooks for Window {}
///
/// let binder = Binder::new().field(
///     Member::new("Width").default("640").tag("Window"),
///     |w: &Window| &w.width,
///     |w: &mut Window, v| w.width = v,
/// );
///
/// let mut store = ConfigStore::new();
/// let mut window = Window::default();
/// binder.load_into(&mut window, &mut store).unwrap();
/// assert_eq!(window.width, 640);
/// assert_eq!(store.raw("Window", "Width"), Some("640"));
/// ```
pub struct Binder<T> {
    bindings: Vec<Binding<T>>,
}

impl<T: 'static> Binder<T> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Bind a member read through a reference
    pub fn field<V, G, S>(self, member: Member, get: G, set: S) -> Self
    where
        V: 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.bind::<V>(
            member,
            MemberKind::Field,
            Box::new(
                move |target: &mut T, store: &ConfigStore, tag: &str, key: &str| {
                    set(target, store.get_value::<V>(tag, key)?);
                    Ok(())
                },
            ),
            Box::new(
                move |target: &T, store: &mut ConfigStore, tag: &str, key: &str| {
                    store.set_value(tag, key, get(target))
                },
            ),
        )
    }

    /// Bind a member read through a getter that produces a value
    pub fn property<V, G, S>(self, member: Member, get: G, set: S) -> Self
    where
        V: 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.bind::<V>(
            member,
            MemberKind::Property,
            Box::new(
                move |target: &mut T, store: &ConfigStore, tag: &str, key: &str| {
                    set(target, store.get_value::<V>(tag, key)?);
                    Ok(())
                },
            ),
            Box::new(
                move |target: &T, store: &mut ConfigStore, tag: &str, key: &str| {
                    store.set_value(tag, key, &get(target))
                },
            ),
        )
    }

    fn bind<V: 'static>(
        mut self,
        member: Member,
        kind: MemberKind,
        load: LoadFn<T>,
        save: SaveFn<T>,
    ) -> Self {
        let Member {
            name,
            tag,
            key,
            default,
        } = member;
        self.bindings.push(Binding {
            tag: tag.unwrap_or_else(|| DEFAULT_TAG.to_string()),
            key: key.unwrap_or_else(|| name.clone()),
            name,
            default,
            kind,
            type_name: type_name::<V>(),
            load,
            save,
        });
        self
    }

    pub fn bindings(&self) -> &[Binding<T>] {
        &self.bindings
    }

    /// Populate `target` from `store`, seeding missing entries with defaults
    ///
    /// Missing tags are created. The first failing member aborts the load;
    /// members before it keep their new values.
    pub fn load_into(&self, target: &mut T, store: &mut ConfigStore) -> Result<(), ConfigError>
    where
        T: ConfigHooks,
    {
        target.register_parsers(store.registry_mut());
        for binding in &self.bindings {
            let default = binding.require_default()?;
            store.add_tag(&binding.tag);
            if !store.has_key(&binding.tag, &binding.key) {
                debug!(
                    member = %binding.name,
                    tag = %binding.tag,
                    key = %binding.key,
                    default,
                    "seeding default"
                );
                store.set_raw(&binding.tag, &binding.key, default)?;
            }
            (binding.load)(target, store, &binding.tag, &binding.key)?;
        }
        Ok(())
    }

    /// Write the current member values of `target` into `store`
    pub fn save_from(&self, target: &T, store: &mut ConfigStore) -> Result<(), ConfigError>
    where
        T: ConfigHooks,
    {
        target.register_writers(store.registry_mut());
        for binding in &self.bindings {
            binding.require_default()?;
            store.add_tag(&binding.tag);
            (binding.save)(target, store, &binding.tag, &binding.key)?;
        }
        Ok(())
    }
}

impl<T: 'static> Default for Binder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Binder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.bindings).finish()
    }
}

/// A type whose members are bound to configuration entries
///
/// Implemented by `define_loadable!`, or by hand around a cached [`Binder`].
pub trait Loadable: ConfigHooks + Sized + 'static {
    /// The bindings of this type, built once
    fn binder() -> &'static Binder<Self>;

    fn load_from(&mut self, store: &mut ConfigStore) -> Result<(), ConfigError> {
        Self::binder().load_into(self, store)
    }

    fn save_to(&self, store: &mut ConfigStore) -> Result<(), ConfigError> {
        Self::binder().save_from(self, store)
    }

    /// Build from defaults, then load
    fn from_store(store: &mut ConfigStore) -> Result<Self, ConfigError>
    where
        Self: Default,
    {
        let mut loaded = Self::default();
        loaded.load_from(store)?;
        Ok(loaded)
    }
}
