//! Provider registry infrastructure macros.
//!
//! Used by `registry/` modules for compile-time auto-registration via `linkme`, so a
//! provider crate registers itself with `#[linkme::distributed_slice(EMBEDDING_PROVIDERS)]`
//! and is discoverable at runtime without reflection.

/// Implement registry infrastructure for a provider type resolved by exact name match.
#[macro_export]
macro_rules! impl_registry {
    (
        provider_trait: $trait:path,
        config_type: $config:ty,
        entry_type: $entry:ident,
        slice_name: $slice:ident,
        resolve_fn: $resolve:ident,
        list_fn: $list:ident
    ) => {
        /// Registry entry for a provider.
        pub struct $entry {
            /// Unique provider name.
            pub name: &'static str,
            /// Human-readable description.
            pub description: &'static str,
            /// Constructor invoked when this entry is selected.
            pub build: fn(&$config) -> std::result::Result<std::sync::Arc<dyn $trait>, String>,
        }

        #[linkme::distributed_slice]
        /// Compile-time registered provider entries.
        pub static $slice: [$entry] = [..];

        /// Resolve a provider by exact name.
        ///
        /// # Errors
        ///
        /// Returns a configuration error listing the available providers if none match
        /// `config.provider`, or if the matched constructor fails.
        pub fn $resolve(config: &$config) -> $crate::error::Result<std::sync::Arc<dyn $trait>> {
            let provider_name = &config.provider;

            for entry in $slice {
                if entry.name == provider_name {
                    return (entry.build)(config).map_err($crate::error::Error::configuration);
                }
            }

            let available: Vec<&str> = $slice.iter().map(|e| e.name).collect();
            Err($crate::error::Error::configuration(format!(
                "unknown provider '{provider_name}'. available providers: {available:?}"
            )))
        }

        /// List all registered provider names and descriptions.
        #[must_use]
        pub fn $list() -> Vec<(&'static str, &'static str)> {
            $slice.iter().map(|e| (e.name, e.description)).collect()
        }
    };
}

/// Generate `new()`, builder methods, and `with_extra()` for a provider config struct.
///
/// Fields marked `into` generate `impl Into<T>` parameters; others take the type
/// directly. The target struct must derive `Default` and carry a `provider: String`
/// field plus an `extra: HashMap<String, String>` field.
#[macro_export]
macro_rules! impl_config_builder {
    (
        $config:ident {
            $(
                $(#[doc = $doc:literal])*
                $field:ident : $method:ident ( $($kind:tt)+ )
            ),* $(,)?
        }
    ) => {
        impl $config {
            /// Create a new config with the given provider name.
            #[must_use]
            pub fn new(provider: impl Into<String>) -> Self {
                Self { provider: provider.into(), ..Default::default() }
            }

            $(
                impl_config_builder!(@builder_method $(#[doc = $doc])* ; $field ; $method ; $($kind)+);
            )*

            /// Add a provider-specific extra field.
            #[must_use]
            pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
                self.extra.insert(key.into(), value.into());
                self
            }
        }
    };

    (@builder_method $(#[$meta:meta])* ; $field:ident ; $method:ident ; into $ty:ty) => {
        $(#[$meta])*
        #[must_use]
        pub fn $method(mut self, value: impl Into<$ty>) -> Self {
            self.$field = Some(value.into());
            self
        }
    };

    (@builder_method $(#[$meta:meta])* ; $field:ident ; $method:ident ; $ty:ty) => {
        $(#[$meta])*
        #[must_use]
        pub fn $method(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}
