//! Example shopping cart instrumented with hookwire.
//!
//! The cart is described by reflected metadata only. Its "bytecode" is a set
//! of closures the [`Shop`] hands to the interceptor as the original
//! implementation of each member, so every call passes through whatever
//! hooks are installed.
//!
//! ```text
//! Shop::add ──▶ InterceptorRegistry::invoke ──▶ before hooks
//!                                           ──▶ replacement or original
//!                                           ──▶ after hooks
//! ```

mod promotions;

pub use promotions::Promotions;

use std::collections::HashMap;
use std::sync::Arc;

use hookwire::hookwire_reflect::{DescriptorError, ResolutionError, TypeRef};
use hookwire::prelude::*;
use parking_lot::Mutex;
use serde_json::json;

/// Name of the cart type.
pub const CART: &str = "com.example.shop.Cart";

/// Errors raised while driving the cart.
#[derive(Debug, thiserror::Error)]
pub enum ShopError {
    /// The cart metadata is malformed.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    /// The cart type could not be defined or resolved.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    /// The cart declares no member with the given signature.
    #[error("cart has no member {0}")]
    UnknownMember(String),
    /// A call produced a result of the wrong shape.
    #[error("{member} returned {found}")]
    UnexpectedResult {
        /// Signature of the called member.
        member: String,
        /// The result it produced.
        found: Value,
    },
}

/// A cart whose every member call is routed through an interceptor.
pub struct Shop {
    classpath: Arc<ClassPath>,
    interceptor: Arc<InterceptorRegistry>,
    cart: TypeRef,
    prices: HashMap<&'static str, i64>,
    lines: Mutex<Vec<(String, i64)>>,
}

impl Shop {
    /// Defines the cart type on a fresh classpath.
    pub fn new() -> Result<Self, ShopError> {
        let classpath = Arc::new(ClassPath::new());
        let cart = classpath.define(
            &LoaderId::boot(),
            TypeInfo::builder(CART)
                .constructor(&["java.lang.String"])
                .method("add", &["java.lang.String", "int"], "void")
                .method("total", &[], "long")
                .method("checkout", &[], "java.lang.String")
                .build()?,
        )?;

        Ok(Self {
            classpath,
            interceptor: Arc::new(InterceptorRegistry::new()),
            cart,
            prices: HashMap::from([("apple", 40), ("bread", 250), ("coffee", 899)]),
            lines: Mutex::new(Vec::new()),
        })
    }

    /// Returns an engine binding onto this shop's classpath and interceptor.
    #[must_use]
    pub fn engine(&self) -> HookEngine {
        HookEngine::new(self.classpath.clone(), self.interceptor.clone())
    }

    /// Returns the interceptor the cart's calls go through.
    #[must_use]
    pub fn interceptor(&self) -> &InterceptorRegistry {
        &self.interceptor
    }

    /// Constructs a cart owned by `owner`.
    pub fn open(&self, owner: &str) -> Result<Value, ShopError> {
        let ctx = self.call(
            "<init>(java.lang.String)",
            None,
            vec![Value::from(owner)],
            |_, args| json!({ "owner": args.first().cloned().unwrap_or_default() }),
        )?;
        Ok(ctx.this().cloned().unwrap_or_default())
    }

    /// Adds `quantity` units of `item`.
    pub fn add(&self, cart: &Value, item: &str, quantity: i64) -> Result<(), ShopError> {
        self.call(
            "add(java.lang.String,int)",
            Some(cart.clone()),
            vec![Value::from(item), Value::from(quantity)],
            |_, args| {
                if let [item, quantity] = args {
                    let item = item.as_str().unwrap_or_default().to_string();
                    self.lines.lock().push((item, quantity.as_i64().unwrap_or(0)));
                }
                Value::Null
            },
        )?;
        Ok(())
    }

    /// Returns the cart total in cents.
    pub fn total(&self, cart: &Value) -> Result<i64, ShopError> {
        let ctx = self.call("total()", Some(cart.clone()), Vec::new(), |_, _| {
            let total: i64 = self
                .lines
                .lock()
                .iter()
                .map(|(item, quantity)| {
                    self.prices.get(item.as_str()).copied().unwrap_or(0) * quantity
                })
                .sum();
            Value::from(total)
        })?;
        expect_result(&ctx, Value::as_i64)
    }

    /// Empties the cart and returns a receipt line.
    pub fn checkout(&self, cart: &Value) -> Result<String, ShopError> {
        let total = self.total(cart)?;
        let ctx = self.call("checkout()", Some(cart.clone()), Vec::new(), |this, _| {
            let owner = this
                .and_then(|cart| cart.get("owner"))
                .and_then(Value::as_str)
                .unwrap_or("guest");
            let items = core::mem::take(&mut *self.lines.lock()).len();
            Value::from(format!(
                "{owner}: {items} line(s), {}.{:02}",
                total / 100,
                total % 100
            ))
        })?;
        expect_result(&ctx, |value| value.as_str().map(str::to_string))
    }

    fn call(
        &self,
        signature: &str,
        this: Option<Value>,
        args: Vec<Value>,
        original: impl FnOnce(Option<&Value>, &[Value]) -> Value,
    ) -> Result<CallContext, ShopError> {
        let member = self
            .cart
            .members()
            .iter()
            .find(|m| m.signature() == format!("{CART}#{signature}"))
            .ok_or_else(|| ShopError::UnknownMember(signature.to_string()))?;
        Ok(self.interceptor.invoke(member, this, Some(args), original))
    }
}

fn expect_result<T>(
    ctx: &CallContext,
    read: impl FnOnce(&Value) -> Option<T>,
) -> Result<T, ShopError> {
    let found = ctx.result().cloned().unwrap_or_default();
    read(&found).ok_or_else(|| ShopError::UnexpectedResult {
        member: ctx.member().signature(),
        found,
    })
}
