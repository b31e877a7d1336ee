/// Configuration macros for zero-repetition config definitions
///
/// `config_struct!` defines a configuration section with its defaults in a
/// single declaration.

/// Define a configuration struct with embedded defaults
///
/// # Example
/// ```ignore
/// config_struct! {
///     pub struct CacheConfig {
///         directory: String = "cache".to_string(),
///         prune_stale: bool = false,
///     }
/// }
/// ```
///
/// This generates:
/// - A struct with public fields
/// - A Default implementation with the specified values
/// - Serde support with `#[serde(default)]`, so a TOML file may set any subset
///   of the fields
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
