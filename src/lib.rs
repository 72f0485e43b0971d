pub mod binder;
pub mod codec;
pub mod encoding;
pub mod error;
#[doc(hidden)]
pub mod macros;
pub mod ordered;
pub mod registry;
pub mod store;

// Re-export main types
pub use binder::{Binder, Binding, ConfigHooks, Loadable, Member, MemberKind};
pub use encoding::TextEncoding;
pub use error::{ConfigError, ConversionFailure};
pub use ordered::KeyOrder;
pub use registry::{ConfigEnum, ConversionRegistry};
pub use store::{ConfigStore, DuplicateKeys, Lookup, StoreLayout, DEFAULT_TAG};

// Re-export macros
pub use tagconf_macros::{define_loadable, ConfigEnum};
