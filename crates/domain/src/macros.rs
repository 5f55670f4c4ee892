//! Macro for implementing Display and FromStr for label enums
//!
//! Several small enums in this crate (error kinds, HTTP methods, cache
//! policies) need a stable lowercase label for logs and config files and a
//! case-insensitive parser for the reverse direction. This macro provides
//! both from a single variant/label table.
//!
//! # Example
//!
//! ```rust
//! use console_domain::impl_label_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Environment {
//!     Sandbox,
//!     Production,
//! }
//!
//! impl_label_conversions!(Environment {
//!     Sandbox => "sandbox",
//!     Production => "production",
//! });
//!
//! assert_eq!(Environment::Sandbox.to_string(), "sandbox");
//! assert_eq!("PRODUCTION".parse::<Environment>(), Ok(Environment::Production));
//! ```

/// Implements Display and FromStr traits for label enums
///
/// This macro generates:
/// - Display trait: writes the variant's label
/// - FromStr trait: parses case-insensitive strings to enum variants
///
/// Labels must be lowercase.
#[macro_export]
macro_rules! impl_label_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
