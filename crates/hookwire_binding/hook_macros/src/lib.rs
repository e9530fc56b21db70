//! Procedural macros for hookwire hook definitions.
//!
//! Provides `#[hooks]`, which turns an impl block of marked hook methods
//! into a `HookDefinition`.

mod args;
mod hooks;

use proc_macro::TokenStream;

/// Defines a hook definition from an impl block.
///
/// Generates a `HookDefinition` impl whose declared methods are the marked
/// methods of the block. Unmarked methods stay ordinary methods.
///
/// # Attribute Arguments
///
/// - `target = "..."` - the target type name; without it the definition is
///   bound to the no-op type and skipped
/// - `loader = "..."` - the loader to resolve the target through
/// - `name = "..."` - the definition name used in diagnostics
/// - `all_methods` / `all_constructors` - also hook every remaining member;
///   the type must implement `AllMethodsHook` / `AllConstructorsHook`
///
/// # Method Markers
///
/// - `#[before_method("a", ...)]`, `#[after_method(..)]`, `#[replace_method(..)]`,
///   `#[before_constructor(..)]`, `#[after_constructor(..)]`,
///   `#[replace_constructor(..)]` - intents with their target member names
/// - `#[return_type("...")]` - only bind members returning this type
/// - `#[one_shot]` - every binding runs at most once
///
/// # Parameter Markers
///
/// - `#[param("...")]` - match this type instead of the declared one
/// - `#[param]` - match any type
/// - `#[placeholder]` - no constraint of its own; keeps later overrides in
///   position
///
/// Hook methods take `&self` (or no receiver), then `&mut CallContext`, then
/// owned `HookParam` types for the intercepted arguments. Any
/// `IntoHookResult` type may be returned.
///
/// # Example
///
/// ```
/// use hookwire_binding::{hooks, CallContext, HookDefinition, Value};
/// use std::sync::Arc;
///
/// struct Audit;
///
/// #[hooks(target = "com.example.Account", name = "audit")]
/// impl Audit {
///     #[before_method("deposit", "withdraw")]
///     fn log(&self, ctx: &mut CallContext, #[param] amount: Value) {
///         let _ = (ctx.member().name(), amount);
///     }
///
///     #[after_constructor]
///     #[one_shot]
///     fn first_account(&self, ctx: &mut CallContext, owner: String) {
///         let _ = (ctx.this(), owner);
///     }
/// }
///
/// let audit = Arc::new(Audit);
/// assert_eq!(audit.name(), "audit");
/// assert_eq!(audit.target().name(), "com.example.Account");
/// assert_eq!(audit.declared_methods().len(), 2);
/// ```
#[proc_macro_attribute]
pub fn hooks(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match args::HooksArgs::parse(attr.into()) {
        Ok(args) => args,
        Err(err) => return err.write_errors().into(),
    };
    let input = syn::parse_macro_input!(item as syn::ItemImpl);
    hooks::generate_hooks(&args, &input).into()
}
