//! Conversions between intercepted values and hook method signatures.
//!
//! - [`HookParam`] - a hook method parameter type: its canonical type name
//!   and how to extract it from the intercepted call's arguments
//! - [`IntoHookResult`] - what a hook method may return

use std::borrow::Cow;

use hookwire_reflect::OBJECT;
use serde_json::Value;

use crate::error::HookError;

// ─────────────────────────────────────────────────────────────────────────────
// HookParam
// ─────────────────────────────────────────────────────────────────────────────

/// A type usable as a non-context parameter of a hook method.
///
/// # Example
///
/// ```
/// use hookwire_binding::HookParam;
/// use serde_json::json;
///
/// assert_eq!(<i32 as HookParam>::type_name(), "int");
/// assert_eq!(<Vec<String> as HookParam>::type_name(), "java.lang.String[]");
///
/// let args = [json!(7), json!("seven")];
/// assert_eq!(i32::extract(&args, 0).unwrap(), 7);
/// assert!(i32::extract(&args, 1).is_err());
/// ```
pub trait HookParam: Sized {
    /// Returns the canonical name of the declared parameter type.
    fn type_name() -> Cow<'static, str>;

    /// Converts one argument value.
    fn from_value(value: &Value) -> Option<Self>;

    /// Extracts the argument at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::MissingArgument`] if there is no such argument
    /// and [`HookError::Argument`] if it has the wrong shape.
    fn extract(args: &[Value], index: usize) -> Result<Self, HookError> {
        let value = args
            .get(index)
            .ok_or(HookError::MissingArgument { index })?;
        Self::from_value(value).ok_or_else(|| HookError::argument(index, Self::type_name(), value))
    }
}

impl HookParam for Value {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed(OBJECT)
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl HookParam for String {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed("java.lang.String")
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl HookParam for bool {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed("boolean")
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl HookParam for char {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed("char")
    }

    fn from_value(value: &Value) -> Option<Self> {
        let mut chars = value.as_str()?.chars();
        let c = chars.next()?;
        chars.next().is_none().then_some(c)
    }
}

macro_rules! impl_integer_param {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl HookParam for $ty {
                fn type_name() -> Cow<'static, str> {
                    Cow::Borrowed($name)
                }

                fn from_value(value: &Value) -> Option<Self> {
                    value.as_i64().and_then(|n| <$ty>::try_from(n).ok())
                }
            }
        )*
    };
}

impl_integer_param!(i8 => "byte", i16 => "short", i32 => "int", i64 => "long");

impl HookParam for f64 {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed("double")
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl HookParam for f32 {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed("float")
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64().map(|n| n as f32)
    }
}

impl<T: HookParam> HookParam for Vec<T> {
    fn type_name() -> Cow<'static, str> {
        Cow::Owned(format!("{}[]", T::type_name()))
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_array()?.iter().map(T::from_value).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// IntoHookResult
// ─────────────────────────────────────────────────────────────────────────────

/// A hook method return type.
///
/// `()` and `None` mean "no value". For replace hooks that becomes
/// [`Value::Null`]; for before and after hooks the value is ignored.
pub trait IntoHookResult {
    /// Converts the return value.
    ///
    /// # Errors
    ///
    /// Returns the hook method's own error, or a serialization error.
    fn into_hook_result(self) -> Result<Option<Value>, HookError>;
}

impl IntoHookResult for () {
    fn into_hook_result(self) -> Result<Option<Value>, HookError> {
        Ok(None)
    }
}

impl IntoHookResult for Value {
    fn into_hook_result(self) -> Result<Option<Value>, HookError> {
        Ok(Some(self))
    }
}

impl<T: IntoHookResult> IntoHookResult for Option<T> {
    fn into_hook_result(self) -> Result<Option<Value>, HookError> {
        match self {
            Some(value) => value.into_hook_result(),
            None => Ok(None),
        }
    }
}

impl<T: IntoHookResult, E: Into<HookError>> IntoHookResult for Result<T, E> {
    fn into_hook_result(self) -> Result<Option<Value>, HookError> {
        self.map_err(Into::into)?.into_hook_result()
    }
}

macro_rules! impl_serialized_result {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoHookResult for $ty {
                fn into_hook_result(self) -> Result<Option<Value>, HookError> {
                    Ok(Some(serde_json::to_value(self)?))
                }
            }
        )*
    };
}

impl_serialized_result!(String, &str, bool, char, i8, i16, i32, i64, f32, f64);

impl<T: serde::Serialize> IntoHookResult for Vec<T> {
    fn into_hook_result(self) -> Result<Option<Value>, HookError> {
        Ok(Some(serde_json::to_value(self)?))
    }
}
