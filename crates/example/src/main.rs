//! Example cart CLI.
//!
//! Opens a cart, fills it and checks out twice, with store promotions
//! hooked onto the cart type.
//!
//! # Usage
//!
//! ```bash
//! cart [owner] [--json]
//! ```

use std::sync::Arc;

use example::{Promotions, Shop, ShopError};
use hookwire::prelude::*;

/// Hooks for a type the shop never defines. Binding them fails and is
/// reported through diagnostics.
struct WishlistHooks;

#[hooks(target = "com.example.shop.Wishlist", name = "shop.Wishlist")]
impl WishlistHooks {
    #[before_method("add")]
    fn remember(&self, _ctx: &mut CallContext, _item: String) {}
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let json = args.iter().any(|arg| arg == "--json");
    let owner = args
        .iter()
        .find(|arg| !arg.starts_with("--"))
        .map_or("guest", String::as_str);

    let format = if json {
        TracingFormat::Json
    } else {
        TracingFormat::Compact
    };
    TracingConfig::new().with_format(format).init();

    if let Err(e) = run(owner) {
        tracing::error!(error = %e, "cart example failed");
        std::process::exit(1);
    }
}

fn run(owner: &str) -> Result<(), ShopError> {
    let shop = Shop::new()?;
    let engine = shop.engine();

    let promotions = Arc::new(Promotions::new(5, 15));
    let hooks = engine.bind(promotions.clone());
    tracing::info!(
        definition = hooks.name(),
        state = %hooks.state(),
        bindings = hooks.len(),
        "promotions bound"
    );

    let wishlist = engine.bind(Arc::new(WishlistHooks));
    tracing::info!(
        definition = wishlist.name(),
        state = %wishlist.state(),
        "wishlist bound"
    );

    let cart = shop.open(owner)?;
    shop.add(&cart, "apple", 12)?;
    shop.add(&cart, "coffee", 1)?;
    tracing::info!(receipt = %shop.checkout(&cart)?, "first checkout");

    let cart = shop.open(owner)?;
    shop.add(&cart, "bread", 2)?;
    tracing::info!(receipt = %shop.checkout(&cart)?, "second checkout");

    tracing::info!(opened = promotions.opened(), "done");
    Ok(())
}
