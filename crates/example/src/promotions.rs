//! Store promotions applied to the cart through hooks.

use std::sync::atomic::{AtomicUsize, Ordering};

use hookwire::prelude::*;

/// Caps line quantities, discounts totals and greets the first order.
///
/// Also counts every cart opened, through the constructor catch-all.
pub struct Promotions {
    max_quantity: i32,
    discount_percent: i64,
    opened: AtomicUsize,
}

impl Promotions {
    /// Creates promotions with the given quantity cap and discount.
    #[must_use]
    pub fn new(max_quantity: i32, discount_percent: i64) -> Self {
        Self {
            max_quantity,
            discount_percent,
            opened: AtomicUsize::new(0),
        }
    }
}

#[hooks(target = "com.example.shop.Cart", name = "shop.Promotions", all_constructors)]
impl Promotions {
    /// Returns how many carts have been opened.
    #[must_use]
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    #[before_method("add")]
    fn cap_quantity(&self, ctx: &mut CallContext, item: String, quantity: i32) {
        if quantity > self.max_quantity {
            tracing::info!(%item, quantity, cap = self.max_quantity, "capping quantity");
            ctx.set_arg(1, Value::from(self.max_quantity));
        }
    }

    #[after_method("total")]
    #[return_type("long")]
    fn apply_discount(&self, ctx: &mut CallContext) -> Result<(), HookError> {
        let total = ctx
            .result()
            .and_then(Value::as_i64)
            .ok_or_else(|| HookError::failed("total produced no amount"))?;
        ctx.set_result(Value::from(total * (100 - self.discount_percent) / 100));
        Ok(())
    }

    #[after_method("checkout")]
    #[one_shot]
    fn welcome(ctx: &mut CallContext) {
        let receipt = ctx
            .result()
            .and_then(Value::as_str)
            .map(|receipt| format!("{receipt} (welcome, first order!)"));
        if let Some(receipt) = receipt {
            ctx.set_result(Value::from(receipt));
        }
    }
}

impl AllConstructorsHook for Promotions {
    fn before_all_constructors(&self, ctx: &mut CallContext) -> Result<(), HookError> {
        tracing::debug!(constructor = %ctx.member().signature(), "opening cart");
        Ok(())
    }

    fn after_all_constructors(&self, ctx: &mut CallContext) -> Result<(), HookError> {
        let count = self.opened.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(cart = ?ctx.this(), count, "cart opened");
        Ok(())
    }
}
