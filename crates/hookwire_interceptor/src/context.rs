//! The callback context handed to every installed hook.

use std::sync::Arc;

use hookwire_reflect::Member;
use serde_json::Value;

/// State of one intercepted call, shared by every hook that runs for it.
///
/// Before hooks see the receiver and the arguments. Setting a result from a
/// before hook skips the original implementation. After hooks additionally
/// see the result produced by the original (or by a replacement) and may
/// overwrite it.
#[derive(Debug, Clone)]
pub struct CallContext {
    member: Arc<Member>,
    this: Option<Value>,
    args: Option<Vec<Value>>,
    result: Option<Value>,
}

impl CallContext {
    /// Creates the context for a call to `member`.
    ///
    /// `args` is `None` when the caller has no argument information at all,
    /// which is distinct from an empty argument list.
    #[must_use]
    pub fn new(member: Arc<Member>, this: Option<Value>, args: Option<Vec<Value>>) -> Self {
        Self {
            member,
            this,
            args,
            result: None,
        }
    }

    /// Returns the intercepted member.
    #[must_use]
    pub fn member(&self) -> &Member {
        &self.member
    }

    /// Returns the receiver instance, if the call has one.
    #[must_use]
    pub fn this(&self) -> Option<&Value> {
        self.this.as_ref()
    }

    /// Replaces the receiver instance.
    pub fn set_this(&mut self, this: Option<Value>) {
        self.this = this;
    }

    /// Returns the call arguments, or `None` when they are unknown.
    #[must_use]
    pub fn args(&self) -> Option<&[Value]> {
        self.args.as_deref()
    }

    /// Returns the argument at `index`.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.as_ref().and_then(|args| args.get(index))
    }

    /// Overwrites the argument at `index`. Returns `false` if there is no
    /// such argument.
    pub fn set_arg(&mut self, index: usize, value: Value) -> bool {
        match self.args.as_mut().and_then(|args| args.get_mut(index)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Returns the result, if one has been produced or set.
    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Returns `true` once a result has been produced or set.
    #[must_use]
    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    /// Sets the result. From a before hook this skips the original call.
    pub fn set_result(&mut self, value: Value) {
        self.result = Some(value);
    }

    /// Removes and returns the result.
    pub fn take_result(&mut self) -> Option<Value> {
        self.result.take()
    }

    /// Consumes the context, returning the result.
    #[must_use]
    pub fn into_result(self) -> Option<Value> {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookwire_reflect::TypeInfo;
    use serde_json::json;

    fn member() -> Arc<Member> {
        let info = TypeInfo::builder("com.example.Greeter")
            .method("greet", &["java.lang.String"], "java.lang.String")
            .build()
            .unwrap();
        Arc::new(info.members()[0].clone())
    }

    #[test]
    fn arguments_can_be_rewritten_in_place() {
        let mut ctx = CallContext::new(member(), None, Some(vec![json!("ada")]));

        assert!(ctx.set_arg(0, json!("grace")));
        assert!(!ctx.set_arg(1, json!("nobody")));
        assert_eq!(ctx.arg(0), Some(&json!("grace")));
    }

    #[test]
    fn missing_arguments_are_not_an_empty_list() {
        let ctx = CallContext::new(member(), None, None);
        assert!(ctx.args().is_none());
        assert!(ctx.arg(0).is_none());

        let ctx = CallContext::new(member(), None, Some(Vec::new()));
        assert_eq!(ctx.args(), Some(&[][..]));
    }

    #[test]
    fn null_is_a_real_result() {
        let mut ctx = CallContext::new(member(), Some(json!({"id": 1})), None);
        assert!(!ctx.has_result());

        ctx.set_result(Value::Null);
        assert!(ctx.has_result());
        assert_eq!(ctx.take_result(), Some(Value::Null));
        assert!(ctx.into_result().is_none());
    }
}
