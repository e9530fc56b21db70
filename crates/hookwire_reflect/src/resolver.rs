//! Type resolution through a chain of class loaders.
//!
//! The [`TypeResolver`] trait is the seam the binding engine resolves names
//! through. [`ClassPath`] is the in-memory implementation: a graph of named
//! loaders with parent-first delegation, plus a fallback loader consulted
//! when the hinted loader's chain does not define the type.
//!
//! # Lookup order
//!
//! For `resolve(name, Some(hint))`:
//!
//! 1. the hint's ancestors, root first, then the hint itself,
//! 2. the fallback loader's chain (skipped when it is the same chain),
//! 3. for array names, the component is resolved the same way and the array
//!    type is synthesized.
//!
//! Successful lookups are cached per `(starting loader, name)`; the cache is
//! cleared whenever a type or loader is defined. A lookup that raced with
//! such a change is returned but not cached.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::VecDeque;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;

use crate::descriptor::{self, BaseType, canonical_name};
use crate::error::ResolutionError;
use crate::types::{NO_OP_TYPE, OBJECT, TypeInfo, TypeRef, VOID};

// ─────────────────────────────────────────────────────────────────────────────
// LoaderId
// ─────────────────────────────────────────────────────────────────────────────

/// Name of a class loader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoaderId(Arc<str>);

impl LoaderId {
    /// Name of the bootstrap loader every [`ClassPath`] starts with.
    pub const BOOT: &'static str = "boot";

    /// Creates a loader id.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Returns the bootstrap loader id.
    #[must_use]
    pub fn boot() -> Self {
        Self::new(Self::BOOT)
    }

    /// Returns the loader name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LoaderId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TypeResolver
// ─────────────────────────────────────────────────────────────────────────────

/// Resolves type names to type metadata.
///
/// Implementations must be safe for concurrent lookups.
pub trait TypeResolver: Send + Sync {
    /// Resolves `name` (any spelling accepted by
    /// [`canonical_name`](crate::descriptor::canonical_name)) starting from
    /// `loader`, or from the implementation's default loader when `None`.
    fn resolve(&self, name: &str, loader: Option<&LoaderId>) -> Result<TypeRef, ResolutionError>;

    /// Returns whether a value of type `from` can be used where `to` is
    /// expected.
    ///
    /// Identity always holds. Primitives are only assignable to themselves.
    /// Every reference type (arrays included) is assignable to the top type.
    /// Arrays are covariant in their reference component types. Otherwise the
    /// supertypes of `from` are walked breadth-first through this resolver;
    /// supertypes that fail to resolve are skipped.
    fn is_assignable(&self, to: &str, from: &str, loader: Option<&LoaderId>) -> bool {
        let (Ok(to), Ok(from)) = (canonical_name(to), canonical_name(from)) else {
            return false;
        };

        if to == from {
            return true;
        }
        if descriptor::is_primitive(&to) || descriptor::is_primitive(&from) {
            return false;
        }
        if to == OBJECT {
            return true;
        }

        match (
            descriptor::array_component(&to),
            descriptor::array_component(&from),
        ) {
            (Some(to_component), Some(from_component)) => {
                return self.is_assignable(to_component, from_component, loader);
            }
            (Some(_), None) | (None, Some(_)) => return false,
            (None, None) => {}
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let Ok(info) = self.resolve(&current, loader) else {
                continue;
            };
            for supertype in info.supertypes() {
                if supertype == to {
                    return true;
                }
                queue.push_back(supertype.to_string());
            }
        }
        false
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ClassPath
// ─────────────────────────────────────────────────────────────────────────────

struct Loader {
    parent: Option<LoaderId>,
    types: HashMap<String, TypeRef>,
}

impl Loader {
    fn new(parent: Option<LoaderId>) -> Self {
        Self {
            parent,
            types: HashMap::new(),
        }
    }
}

/// In-memory [`TypeResolver`] backed by a graph of named loaders.
///
/// A new class path holds only the bootstrap loader, which defines the
/// primitives, `void`, a handful of `java.lang` / `java.io` core types and
/// the [`NO_OP_TYPE`] sentinel.
///
/// # Example
///
/// ```
/// use hookwire_reflect::{ClassPath, LoaderId, TypeInfo, TypeResolver};
///
/// let classpath = ClassPath::new();
/// let app = LoaderId::new("app");
/// classpath.define_loader(app.clone(), Some(LoaderId::boot())).unwrap();
/// classpath
///     .define(&app, TypeInfo::builder("com.example.Greeter").build().unwrap())
///     .unwrap();
///
/// assert!(classpath.resolve("com/example/Greeter", Some(&app)).is_ok());
/// assert!(classpath.resolve("com.example.Greeter", None).is_err());
///
/// classpath.set_fallback(app).unwrap();
/// assert!(classpath.resolve("com.example.Greeter", None).is_ok());
/// ```
pub struct ClassPath {
    loaders: RwLock<HashMap<LoaderId, Loader>>,
    fallback: RwLock<LoaderId>,
    cache: RwLock<HashMap<(LoaderId, String), TypeRef>>,
    /// Bumped under the cache write lock on every definition change.
    generation: AtomicU64,
}

impl fmt::Debug for ClassPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loaders = self.loaders.read();
        let mut names: Vec<_> = loaders.keys().map(LoaderId::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ClassPath")
            .field("loaders", &names)
            .field("fallback", &*self.fallback.read())
            .finish()
    }
}

impl Default for ClassPath {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassPath {
    /// Creates a class path holding only the bootstrap loader.
    #[must_use]
    pub fn new() -> Self {
        let mut boot = Loader::new(None);
        for info in builtin_types() {
            boot.types.insert(info.name().to_string(), Arc::new(info));
        }

        let mut loaders = HashMap::new();
        loaders.insert(LoaderId::boot(), boot);

        Self {
            loaders: RwLock::new(loaders),
            fallback: RwLock::new(LoaderId::boot()),
            cache: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Registers a loader delegating to `parent`.
    ///
    /// Re-registering an existing loader replaces its parent and keeps its
    /// types.
    pub fn define_loader(
        &self,
        id: LoaderId,
        parent: Option<LoaderId>,
    ) -> Result<(), ResolutionError> {
        let mut loaders = self.loaders.write();
        if let Some(parent) = &parent
            && !loaders.contains_key(parent)
        {
            return Err(ResolutionError::UnknownLoader(parent.clone()));
        }
        loaders
            .entry(id)
            .and_modify(|loader| loader.parent = parent.clone())
            .or_insert_with(|| Loader::new(parent));
        self.invalidate();
        Ok(())
    }

    /// Sets the loader consulted after the hinted loader's chain, and the
    /// starting loader for unhinted lookups.
    pub fn set_fallback(&self, id: LoaderId) -> Result<(), ResolutionError> {
        if !self.loaders.read().contains_key(&id) {
            return Err(ResolutionError::UnknownLoader(id));
        }
        *self.fallback.write() = id;
        self.invalidate();
        Ok(())
    }

    /// Returns the current fallback loader.
    #[must_use]
    pub fn fallback(&self) -> LoaderId {
        self.fallback.read().clone()
    }

    /// Defines a type in `loader`.
    pub fn define(&self, loader: &LoaderId, info: TypeInfo) -> Result<TypeRef, ResolutionError> {
        let mut loaders = self.loaders.write();
        let entry = loaders
            .get_mut(loader)
            .ok_or_else(|| ResolutionError::UnknownLoader(loader.clone()))?;

        if entry.types.contains_key(info.name()) {
            return Err(ResolutionError::AlreadyDefined {
                name: info.name().to_string(),
                loader: loader.clone(),
            });
        }

        let info = Arc::new(info.defined_by(loader));
        entry.types.insert(info.name().to_string(), Arc::clone(&info));
        self.invalidate();
        tracing::trace!(loader = %loader, type_name = info.name(), "type defined");
        Ok(info)
    }

    fn invalidate(&self) {
        let mut cache = self.cache.write();
        cache.clear();
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Caches `found` unless a definition changed since `generation` was
    /// read. Returns the cached entry when another lookup stored one first.
    fn remember(&self, key: (LoaderId, String), found: TypeRef, generation: u64) -> TypeRef {
        let mut cache = self.cache.write();
        if self.generation.load(Ordering::Acquire) != generation {
            return found;
        }
        Arc::clone(cache.entry(key).or_insert(found))
    }

    /// Returns the loader chain starting at `start`, root first.
    fn chain(
        loaders: &HashMap<LoaderId, Loader>,
        start: &LoaderId,
    ) -> Result<Vec<LoaderId>, ResolutionError> {
        let mut chain = Vec::new();
        let mut current = Some(start.clone());
        while let Some(id) = current {
            if chain.contains(&id) {
                break;
            }
            let loader = loaders
                .get(&id)
                .ok_or_else(|| ResolutionError::UnknownLoader(id.clone()))?;
            current = loader.parent.clone();
            chain.push(id);
        }
        chain.reverse();
        Ok(chain)
    }

    fn find(&self, name: &str, start: &LoaderId) -> Result<Option<TypeRef>, ResolutionError> {
        let loaders = self.loaders.read();
        let fallback = self.fallback.read().clone();

        let mut order = Self::chain(&loaders, start)?;
        for id in Self::chain(&loaders, &fallback)? {
            if !order.contains(&id) {
                order.push(id);
            }
        }

        Ok(order
            .iter()
            .filter_map(|id| loaders.get(id))
            .find_map(|loader| loader.types.get(name).cloned()))
    }
}

impl TypeResolver for ClassPath {
    fn resolve(&self, name: &str, loader: Option<&LoaderId>) -> Result<TypeRef, ResolutionError> {
        let name = canonical_name(name)?;
        let start = loader.cloned().unwrap_or_else(|| self.fallback());
        let key = (start.clone(), name.clone());

        if let Some(hit) = self.cache.read().get(&key) {
            return Ok(Arc::clone(hit));
        }
        let generation = self.generation.load(Ordering::Acquire);

        let found = match self.find(&name, &start)? {
            Some(found) => found,
            None => match descriptor::array_component(&name) {
                Some(component) => {
                    self.resolve(component, Some(&start))?;
                    Arc::new(TypeInfo::array(&name))
                }
                None => return Err(ResolutionError::not_found(name, start)),
            },
        };

        Ok(self.remember(key, found, generation))
    }
}

fn builtin_types() -> Vec<TypeInfo> {
    let mut types: Vec<TypeInfo> = BaseType::ALL
        .into_iter()
        .map(|base| TypeInfo::primitive(base.name()))
        .collect();
    types.push(TypeInfo::primitive(VOID));

    let reference_types = [
        TypeInfo::builder(OBJECT),
        TypeInfo::builder("java.io.Serializable").interface(),
        TypeInfo::builder("java.lang.Comparable").interface(),
        TypeInfo::builder("java.lang.CharSequence").interface(),
        TypeInfo::builder("java.lang.String")
            .implements("java.io.Serializable")
            .implements("java.lang.Comparable")
            .implements("java.lang.CharSequence"),
        TypeInfo::builder("java.lang.Number").implements("java.io.Serializable"),
        TypeInfo::builder("java.lang.Integer")
            .extends("java.lang.Number")
            .implements("java.lang.Comparable"),
        TypeInfo::builder("java.lang.Long")
            .extends("java.lang.Number")
            .implements("java.lang.Comparable"),
        TypeInfo::builder("java.lang.Double")
            .extends("java.lang.Number")
            .implements("java.lang.Comparable"),
        TypeInfo::builder("java.lang.Boolean")
            .implements("java.io.Serializable")
            .implements("java.lang.Comparable"),
        TypeInfo::builder(NO_OP_TYPE),
    ];

    // The builtin names are all canonical already.
    types.extend(reference_types.into_iter().filter_map(|b| b.build().ok()));
    types
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classpath_with_app() -> (ClassPath, LoaderId) {
        let classpath = ClassPath::new();
        let app = LoaderId::new("app");
        classpath
            .define_loader(app.clone(), Some(LoaderId::boot()))
            .unwrap();
        classpath
            .define(
                &app,
                TypeInfo::builder("com.example.Animal").build().unwrap(),
            )
            .unwrap();
        classpath
            .define(
                &app,
                TypeInfo::builder("com.example.Dog")
                    .extends("com.example.Animal")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        (classpath, app)
    }

    #[test]
    fn builtins_resolve_from_boot() {
        let classpath = ClassPath::new();
        for name in ["int", "void", OBJECT, "java.lang.String", NO_OP_TYPE] {
            let info = classpath.resolve(name, None).unwrap();
            assert_eq!(info.name(), name);
        }
        assert!(classpath.resolve("int", None).unwrap().is_primitive());
    }

    #[test]
    fn resolve_accepts_descriptor_spellings() {
        let (classpath, app) = classpath_with_app();
        let dog = classpath.resolve("Lcom/example/Dog;", Some(&app)).unwrap();
        assert_eq!(dog.name(), "com.example.Dog");
    }

    #[test]
    fn child_loader_sees_parent_types_but_not_the_reverse() {
        let (classpath, app) = classpath_with_app();
        assert!(classpath.resolve("java.lang.String", Some(&app)).is_ok());

        let err = classpath
            .resolve("com.example.Dog", Some(&LoaderId::boot()))
            .unwrap_err();
        assert_eq!(
            err,
            ResolutionError::not_found("com.example.Dog", LoaderId::boot())
        );
    }

    #[test]
    fn parent_definitions_shadow_child_definitions() {
        let (classpath, app) = classpath_with_app();
        classpath
            .define(
                &app,
                TypeInfo::builder("java.lang.Integer").build().unwrap(),
            )
            .unwrap();

        let integer = classpath.resolve("java.lang.Integer", Some(&app)).unwrap();
        assert_eq!(integer.superclass(), Some("java.lang.Number"));
    }

    #[test]
    fn fallback_loader_is_consulted_after_the_hint() {
        let (classpath, app) = classpath_with_app();
        let plugin = LoaderId::new("plugin");
        classpath.define_loader(plugin.clone(), None).unwrap();

        assert!(classpath.resolve("com.example.Dog", Some(&plugin)).is_err());
        classpath.set_fallback(app).unwrap();
        assert!(classpath.resolve("com.example.Dog", Some(&plugin)).is_ok());
    }

    #[test]
    fn unknown_loaders_are_errors() {
        let classpath = ClassPath::new();
        let ghost = LoaderId::new("ghost");
        assert_eq!(
            classpath.resolve(OBJECT, Some(&ghost)).unwrap_err(),
            ResolutionError::UnknownLoader(ghost.clone())
        );
        assert!(classpath.define_loader(LoaderId::new("x"), Some(ghost.clone())).is_err());
        assert!(classpath.set_fallback(ghost).is_err());
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        let (classpath, app) = classpath_with_app();
        let err = classpath
            .define(&app, TypeInfo::builder("com.example.Dog").build().unwrap())
            .unwrap_err();
        assert!(matches!(err, ResolutionError::AlreadyDefined { .. }));
    }

    #[test]
    fn arrays_are_synthesized_from_resolvable_components() {
        let (classpath, app) = classpath_with_app();
        let dogs = classpath.resolve("[Lcom/example/Dog;", Some(&app)).unwrap();
        assert_eq!(dogs.name(), "com.example.Dog[]");
        assert!(dogs.is_array());

        assert!(classpath.resolve("[[I", None).is_ok());
        assert!(classpath.resolve("com.example.Cat[]", Some(&app)).is_err());
    }

    #[test]
    fn cache_is_invalidated_by_new_definitions() {
        let classpath = ClassPath::new();
        assert!(classpath.resolve("com.example.Late", None).is_err());
        classpath
            .define(
                &LoaderId::boot(),
                TypeInfo::builder("com.example.Late").build().unwrap(),
            )
            .unwrap();
        assert!(classpath.resolve("com.example.Late", None).is_ok());
    }

    #[test]
    fn lookup_racing_a_definition_is_not_cached() {
        let classpath = ClassPath::new();
        let generation = classpath.generation.load(Ordering::Acquire);
        let stale = classpath.resolve("java.lang.String", None).unwrap();
        classpath.cache.write().clear();

        classpath
            .define(
                &LoaderId::boot(),
                TypeInfo::builder("com.example.Late").build().unwrap(),
            )
            .unwrap();
        let key = (LoaderId::boot(), "java.lang.String".to_string());
        classpath.remember(key.clone(), stale, generation);
        assert!(!classpath.cache.read().contains_key(&key));

        classpath.resolve("java.lang.String", None).unwrap();
        assert!(classpath.cache.read().contains_key(&key));
    }

    #[test]
    fn concurrent_lookups_share_one_cached_entry() {
        let classpath = ClassPath::new();
        let generation = classpath.generation.load(Ordering::Acquire);
        let key = (LoaderId::boot(), "com.example.Twin".to_string());
        let first = Arc::new(TypeInfo::builder("com.example.Twin").build().unwrap());
        let second = Arc::new(TypeInfo::builder("com.example.Twin").build().unwrap());

        let kept = classpath.remember(key.clone(), Arc::clone(&first), generation);
        let returned = classpath.remember(key, second, generation);
        assert!(Arc::ptr_eq(&kept, &first));
        assert!(Arc::ptr_eq(&returned, &first));
    }

    #[test]
    fn defined_members_record_their_loader() {
        let (classpath, app) = classpath_with_app();
        let cat = classpath
            .define(
                &app,
                TypeInfo::builder("com.example.Cat")
                    .constructor(&[])
                    .method("purr", &[], "void")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(cat.members().len(), 2);
        assert!(cat.members().iter().all(|m| m.loader() == Some(&app)));

        let built = TypeInfo::builder("com.example.Loose")
            .method("run", &[], "void")
            .build()
            .unwrap();
        assert_eq!(built.members()[0].loader(), None);
    }

    #[test]
    fn assignability_follows_the_hierarchy() {
        let (classpath, app) = classpath_with_app();
        let app = Some(&app);

        assert!(classpath.is_assignable("com.example.Animal", "com.example.Dog", app));
        assert!(!classpath.is_assignable("com.example.Dog", "com.example.Animal", app));
        assert!(classpath.is_assignable(OBJECT, "com.example.Dog", app));
        assert!(classpath.is_assignable("java.lang.CharSequence", "java.lang.String", app));
        assert!(classpath.is_assignable("java.lang.Comparable", "java.lang.Integer", app));
    }

    #[test]
    fn assignability_of_primitives_and_arrays() {
        let (classpath, app) = classpath_with_app();
        let app = Some(&app);

        assert!(classpath.is_assignable("int", "int", app));
        assert!(!classpath.is_assignable("long", "int", app));
        assert!(!classpath.is_assignable(OBJECT, "int", app));
        assert!(!classpath.is_assignable("java.lang.Integer", "int", app));

        assert!(classpath.is_assignable(OBJECT, "int[]", app));
        assert!(classpath.is_assignable("com.example.Animal[]", "com.example.Dog[]", app));
        assert!(!classpath.is_assignable("long[]", "int[]", app));
        assert!(!classpath.is_assignable("com.example.Dog", "com.example.Dog[]", app));
    }

    #[test]
    fn walk_stops_at_unresolvable_supertypes() {
        let classpath = ClassPath::new();
        classpath
            .define(
                &LoaderId::boot(),
                TypeInfo::builder("com.example.Orphan")
                    .extends("com.example.Missing")
                    .build()
                    .unwrap(),
            )
            .unwrap();

        assert!(classpath.is_assignable("com.example.Missing", "com.example.Orphan", None));
        assert!(!classpath.is_assignable("com.example.Other", "com.example.Orphan", None));
    }
}
