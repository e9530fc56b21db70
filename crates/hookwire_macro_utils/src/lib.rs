//! Shared utilities for hookwire procedural macro crates.
//!
//! Generated code must name hookwire items by a path that resolves in the
//! consuming crate, whether it depends on an individual hookwire crate
//! directly or only on the `hookwire` umbrella crate.

use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// Name of the umbrella crate re-exporting every hookwire crate.
const UMBRELLA: &str = "hookwire";

/// A hookwire crate that macro-generated code may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookwireCrate {
    /// `hookwire_binding`
    Binding,
}

impl HookwireCrate {
    /// Returns the `Cargo.toml` package name for this crate.
    fn as_str(self) -> &'static str {
        match self {
            Self::Binding => "hookwire_binding",
        }
    }
}

/// Returns a [`TokenStream`] path for the given hookwire crate.
///
/// Resolution order:
/// 1. Direct dependency (possibly renamed in `Cargo.toml`).
/// 2. Indirect access via the umbrella crate (`hookwire::<name>`).
/// 3. Fallback to the literal crate name, so the compile error names the
///    missing dependency.
pub fn resolve_crate_path(krate: HookwireCrate) -> TokenStream {
    let name = krate.as_str();

    match crate_name(name) {
        Ok(FoundCrate::Itself) => {
            let ident = format_ident!("{}", name);
            quote!(#ident)
        }
        Ok(FoundCrate::Name(found)) => {
            let ident = format_ident!("{}", found);
            quote!(#ident)
        }
        Err(_) => match crate_name(UMBRELLA) {
            Ok(FoundCrate::Name(found)) => {
                let umbrella = format_ident!("{}", found);
                let ident = format_ident!("{}", name);
                quote!(#umbrella::#ident)
            }
            _ => {
                let ident = format_ident!("{}", name);
                quote!(#ident)
            }
        },
    }
}

/// Returns the last path segment of `ty`, looking through references.
#[must_use]
pub fn last_segment_ident(ty: &syn::Type) -> Option<&syn::Ident> {
    match ty {
        syn::Type::Reference(reference) => last_segment_ident(&reference.elem),
        syn::Type::Path(type_path) => type_path.path.segments.last().map(|s| &s.ident),
        _ => None,
    }
}
