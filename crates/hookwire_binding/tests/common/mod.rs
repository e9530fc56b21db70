//! Shared fixtures for binding integration tests.

use std::sync::{Arc, Mutex};

use hookwire_binding::{
    CONTEXT_TYPE, CallContext, DeclaredMethod, HookDefinition, HookEngine, HookSet, TargetSpec,
    Value,
};
use hookwire_core::CapturingSink;
use hookwire_interceptor::InterceptorRegistry;
use hookwire_reflect::{ClassPath, LoaderId, Member, TypeInfo, TypeResolver};
use serde_json::json;

/// Name of the target type every fixture defines.
pub const TARGET: &str = "com.example.Target";

/// A concrete type no member of [`TARGET`] takes as a parameter.
pub const UNRELATED: &str = "com.example.Unrelated";

/// Classpath, interceptor, engine and a diagnostics sink wired together.
pub struct Fixture {
    pub classpath: Arc<ClassPath>,
    pub interceptor: Arc<InterceptorRegistry>,
    pub engine: HookEngine,
    pub sink: Arc<CapturingSink>,
}

impl Fixture {
    pub fn new() -> Self {
        let classpath = Arc::new(ClassPath::new());
        let boot = LoaderId::boot();
        classpath
            .define(
                &boot,
                TypeInfo::builder(TARGET)
                    .constructor(&["int"])
                    .constructor(&["java.lang.String"])
                    .method("bar", &["int"], "void")
                    .method("bar", &["java.lang.String"], "java.lang.String")
                    .method("baz", &["int", "int"], "int")
                    .method("describe", &[], "java.lang.String")
                    .method("pair", &["java.lang.String", "int"], "void")
                    .build()
                    .expect("valid target"),
            )
            .expect("target defined");
        classpath
            .define(
                &boot,
                TypeInfo::builder(UNRELATED)
                    .constructor(&[])
                    .build()
                    .expect("valid type"),
            )
            .expect("type defined");

        let interceptor = Arc::new(InterceptorRegistry::new());
        let engine = HookEngine::new(classpath.clone(), interceptor.clone());
        Self {
            classpath,
            interceptor,
            engine,
            sink: Arc::new(CapturingSink::new()),
        }
    }

    /// Binds `definition`, capturing its diagnostics.
    pub fn bind(&self, definition: Arc<dyn HookDefinition>) -> HookSet {
        self.sink.capture(|| self.engine.bind(definition))
    }

    /// Returns the member of [`TARGET`] with the given signature suffix,
    /// e.g. `bar(int)` or `<init>(java.lang.String)`.
    pub fn member(&self, signature: &str) -> Member {
        let target = self.classpath.resolve(TARGET, None).expect("target");
        target
            .members()
            .iter()
            .find(|m| m.signature() == format!("{TARGET}#{signature}"))
            .cloned()
            .unwrap_or_else(|| panic!("no member {signature}"))
    }

    /// Calls `signature` through the interceptor, capturing diagnostics.
    /// The original implementation returns `"original"`.
    pub fn call(&self, signature: &str, this: Option<Value>, args: Vec<Value>) -> CallContext {
        let member = self.member(signature);
        self.sink.capture(|| {
            self.interceptor
                .invoke(&member, this, Some(args), |_, _| json!("original"))
        })
    }
}

/// A hand-assembled hook definition.
pub struct Manual {
    pub target: TargetSpec,
    pub methods: Vec<DeclaredMethod>,
}

impl Manual {
    pub fn new(methods: Vec<DeclaredMethod>) -> Arc<Self> {
        Self::targeting(TargetSpec::new(TARGET), methods)
    }

    pub fn targeting(target: TargetSpec, methods: Vec<DeclaredMethod>) -> Arc<Self> {
        Arc::new(Self { target, methods })
    }
}

impl HookDefinition for Manual {
    fn name(&self) -> String {
        "tests.Manual".to_string()
    }

    fn target(&self) -> TargetSpec {
        self.target.clone()
    }

    fn declared_methods(self: Arc<Self>) -> Vec<DeclaredMethod> {
        self.methods.clone()
    }
}

/// Records one line per hook method invocation.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    /// Returns a hook method named `name`, taking the context first, that
    /// writes `name` plus the arguments it received as JSON, e.g. `spy[1]`.
    pub fn hook(&self, name: &str) -> DeclaredMethod {
        let journal = self.clone();
        let label = name.to_string();
        DeclaredMethod::new(name, move |_: &mut CallContext, args: &[Value]| {
            journal.push(format!("{label}{}", Value::from(args.to_vec())));
            Ok(None)
        })
        .param(CONTEXT_TYPE)
    }

    pub fn push(&self, entry: String) {
        self.0.lock().expect("journal lock").push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().expect("journal lock").clone()
    }
}
