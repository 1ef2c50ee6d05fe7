//! Schema compilation cache and message-id dispatch index.
//!
//! # Concurrency
//!
//! Published schema sets live in a read-mostly map and are handed out as
//! `Arc`s. Compilation is serialized by a single compile lock: a thread that
//! finds a type uncompiled takes the lock, re-checks the published map, and
//! only then walks the type graph. Everything compiled by one request is
//! staged in a [`CompileContext`] and published together once the root type
//! succeeds, so a failed compilation leaves the cache untouched.
//!
//! # Recursion
//!
//! The context marks a type as in progress before running its declaration.
//! Meeting an in-progress type again means the record nests itself; what
//! happens next is decided by [`CyclePolicy`].

use std::{
    any::{Any, TypeId},
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use parking_lot::{Mutex, RwLock};
use recwire_core::{MessageId, Version};
use tracing::{debug, warn};

use crate::{
    declare::{Binding, FieldDecl, FieldSet, Record},
    descriptor::FieldDescriptor,
    error::SchemaError,
    schema::{DynSchema, SchemaSet, TypeSchema},
};

/// What to do when a record nests itself, directly or transitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePolicy {
    /// Fail compilation with [`SchemaError::CyclicSchema`].
    #[default]
    Reject,
    /// Compile the recursive occurrence with no fields and log a warning.
    Truncate,
}

/// What to do when two fields of one version share an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexPolicy {
    /// Fail compilation with [`SchemaError::DuplicateIndex`].
    #[default]
    Strict,
    /// Keep declaration order between the duplicates and log a warning.
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryOptions {
    pub cycle_policy: CyclePolicy,
    pub index_policy: IndexPolicy,
}

type AnySet = Arc<dyn Any + Send + Sync>;

#[derive(Clone, Copy)]
struct Registration {
    type_id: TypeId,
    type_name: &'static str,
    lookup: fn(&SchemaRegistry, Version) -> Result<Arc<dyn DynSchema>, SchemaError>,
    versions: fn(&SchemaRegistry) -> Result<Vec<Version>, SchemaError>,
}

/// Process-wide cache of compiled record schemas.
pub struct SchemaRegistry {
    options: RegistryOptions,
    published: RwLock<HashMap<TypeId, AnySet>>,
    compile_lock: Mutex<()>,
    by_message_id: RwLock<HashMap<MessageId, Registration>>,
}

/// Builder for configuring [`SchemaRegistry`].
pub struct SchemaRegistryBuilder {
    options: RegistryOptions,
    registrations: Vec<fn(&SchemaRegistry) -> Result<(), SchemaError>>,
    warm_up: bool,
}

impl SchemaRegistry {
    /// Create a builder for [`SchemaRegistry`].
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder {
            options: RegistryOptions::default(),
            registrations: Vec::new(),
            warm_up: false,
        }
    }

    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            options,
            published: RwLock::new(HashMap::new()),
            compile_lock: Mutex::new(()),
            by_message_id: RwLock::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    /// Compile `T` and every record it nests, or return the cached result.
    ///
    /// A record that declares no fields compiles to an empty set.
    pub fn compile<T: Record>(&self) -> Result<Arc<SchemaSet<T>>, SchemaError> {
        if let Some(set) = self.published::<T>() {
            return Ok(set);
        }

        let _guard = self.compile_lock.lock();
        // Another thread may have finished while we waited for the lock.
        if let Some(set) = self.published::<T>() {
            return Ok(set);
        }

        let mut cx = CompileContext::new(self);
        let set = cx.resolve::<T>()?.ok_or_else(|| SchemaError::CyclicSchema {
            path: T::type_name().to_string(),
        })?;
        cx.publish();
        Ok(set)
    }

    /// Schema of `T` for `version`, compiling on demand.
    pub fn lookup<T: Record>(&self, version: Version) -> Result<Arc<TypeSchema<T>>, SchemaError> {
        self.compile::<T>()?
            .get(version)
            .cloned()
            .ok_or(SchemaError::NotFound {
                type_name: T::type_name(),
                version,
            })
    }

    pub fn is_compiled<T: Record>(&self) -> bool {
        self.published.read().contains_key(&TypeId::of::<T>())
    }

    /// Register `T` under each id in `T::MESSAGE_IDS`.
    pub fn register<T: Record>(&self) -> Result<(), SchemaError> {
        self.register_as::<T>(T::MESSAGE_IDS.iter().cloned())
    }

    /// Register `T` under explicit message ids.
    ///
    /// Re-registering the same type is a no-op; binding an id that already
    /// belongs to another type fails without registering any of `ids`.
    pub fn register_as<T: Record>(
        &self,
        ids: impl IntoIterator<Item = MessageId>,
    ) -> Result<(), SchemaError> {
        let registration = Registration {
            type_id: TypeId::of::<T>(),
            type_name: T::type_name(),
            lookup: lookup_dyn::<T>,
            versions: versions::<T>,
        };
        let ids: Vec<MessageId> = ids.into_iter().collect();

        let mut index = self.by_message_id.write();
        for id in &ids {
            if let Some(existing) = index.get(id)
                && existing.type_id != registration.type_id
            {
                return Err(SchemaError::ConflictingMessageId {
                    id: id.clone(),
                    registered: existing.type_name,
                    requested: registration.type_name,
                });
            }
        }
        for id in ids {
            debug!(message_id = %id, record = registration.type_name, "registered record type");
            index.insert(id, registration);
        }
        Ok(())
    }

    /// Schema registered under `id` for `version`, compiling on demand.
    pub fn lookup_by_id(
        &self,
        id: &MessageId,
        version: Version,
    ) -> Result<Arc<dyn DynSchema>, SchemaError> {
        let registration = self.registration(id)?;
        (registration.lookup)(self, version)
    }

    /// Versions defined by the record registered under `id`, compiling on demand.
    pub fn versions_by_id(&self, id: &MessageId) -> Result<Vec<Version>, SchemaError> {
        let registration = self.registration(id)?;
        (registration.versions)(self)
    }

    /// Registered message ids with their record type names, sorted by id.
    pub fn message_ids(&self) -> Vec<(MessageId, &'static str)> {
        let mut ids: Vec<_> = self
            .by_message_id
            .read()
            .iter()
            .map(|(id, reg)| (id.clone(), reg.type_name))
            .collect();
        ids.sort();
        ids
    }

    /// Compile every registered record type, surfacing configuration errors
    /// before the first message arrives.
    pub fn warm_up(&self) -> Result<(), SchemaError> {
        let mut seen = HashMap::new();
        for reg in self.by_message_id.read().values() {
            seen.entry(reg.type_id).or_insert(reg.versions);
        }
        for compile in seen.into_values() {
            compile(self)?;
        }
        Ok(())
    }

    fn registration(&self, id: &MessageId) -> Result<Registration, SchemaError> {
        self.by_message_id
            .read()
            .get(id)
            .copied()
            .ok_or_else(|| SchemaError::UnknownMessageId { id: id.clone() })
    }

    fn published<T: Record>(&self) -> Option<Arc<SchemaSet<T>>> {
        let set = self.published.read().get(&TypeId::of::<T>()).cloned()?;
        set.downcast::<SchemaSet<T>>().ok()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup_dyn<T: Record>(
    registry: &SchemaRegistry,
    version: Version,
) -> Result<Arc<dyn DynSchema>, SchemaError> {
    let schema: Arc<dyn DynSchema> = registry.lookup::<T>(version)?;
    Ok(schema)
}

fn versions<T: Record>(registry: &SchemaRegistry) -> Result<Vec<Version>, SchemaError> {
    Ok(registry.compile::<T>()?.versions().collect())
}

impl SchemaRegistryBuilder {
    pub fn with_options(mut self, options: RegistryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.options.cycle_policy = policy;
        self
    }

    pub fn with_index_policy(mut self, policy: IndexPolicy) -> Self {
        self.options.index_policy = policy;
        self
    }

    /// Register `T` under its declared message ids when the registry is built.
    pub fn register<T: Record>(mut self) -> Self {
        self.registrations.push(SchemaRegistry::register::<T>);
        self
    }

    /// Compile every registered type in [`build`](Self::build).
    pub fn with_warm_up(mut self, warm_up: bool) -> Self {
        self.warm_up = warm_up;
        self
    }

    pub fn build(self) -> Result<SchemaRegistry, SchemaError> {
        let registry = SchemaRegistry::with_options(self.options);
        for register in self.registrations {
            register(&registry)?;
        }
        if self.warm_up {
            registry.warm_up()?;
        }
        Ok(registry)
    }
}

enum Stage {
    InProgress,
    Done(AnySet),
}

/// State of one compilation request: the types it has staged and the chain
/// of records currently being compiled.
pub(crate) struct CompileContext<'r> {
    registry: &'r SchemaRegistry,
    staged: HashMap<TypeId, Stage>,
    stack: Vec<&'static str>,
}

impl<'r> CompileContext<'r> {
    fn new(registry: &'r SchemaRegistry) -> Self {
        Self {
            registry,
            staged: HashMap::new(),
            stack: Vec::new(),
        }
    }

    /// Compiled schemas of `U`, or `None` for a recursive occurrence that the
    /// truncating cycle policy compiles without fields.
    pub(crate) fn resolve<U: Record>(&mut self) -> Result<Option<Arc<SchemaSet<U>>>, SchemaError> {
        if let Some(set) = self.registry.published::<U>() {
            return Ok(Some(set));
        }

        let key = TypeId::of::<U>();
        let staged = self.staged.get(&key).map(|stage| match stage {
            Stage::InProgress => None,
            Stage::Done(set) => Some(Arc::clone(set)),
        });
        match staged {
            Some(Some(set)) => return Ok(set.downcast::<SchemaSet<U>>().ok()),
            Some(None) => return self.cycle::<U>(),
            None => {}
        }

        self.staged.insert(key, Stage::InProgress);
        self.stack.push(U::type_name());
        let compiled = compile_record::<U>(self);
        self.stack.pop();

        match compiled {
            Ok(set) => {
                let set = Arc::new(set);
                self.staged.insert(key, Stage::Done(set.clone()));
                Ok(Some(set))
            }
            Err(e) => {
                self.staged.remove(&key);
                Err(e)
            }
        }
    }

    fn cycle<U: Record>(&self) -> Result<Option<Arc<SchemaSet<U>>>, SchemaError> {
        let mut path = self.stack.join(" -> ");
        path.push_str(" -> ");
        path.push_str(U::type_name());
        match self.registry.options.cycle_policy {
            CyclePolicy::Reject => Err(SchemaError::CyclicSchema { path }),
            CyclePolicy::Truncate => {
                warn!(%path, "self-referential record: recursive occurrence compiled without fields");
                Ok(None)
            }
        }
    }

    fn publish(self) {
        let mut published = self.registry.published.write();
        let mut count = 0usize;
        for (key, stage) in self.staged {
            if let Stage::Done(set) = stage {
                published.entry(key).or_insert(set);
                count += 1;
            }
        }
        debug!(types = count, "published compiled schemas");
    }
}

/// Run `U`'s declaration and build one [`TypeSchema`] per declared version.
fn compile_record<U: Record>(cx: &mut CompileContext<'_>) -> Result<SchemaSet<U>, SchemaError> {
    let owner = U::type_name();
    let mut fields = FieldSet::<U>::new();
    U::declare(&mut fields);

    let mut by_version: BTreeMap<Version, Vec<Arc<FieldDescriptor<U>>>> = BTreeMap::new();
    for FieldDecl { field, binding } in fields.into_decls() {
        if field.versions.is_empty() {
            return Err(SchemaError::MissingVersions {
                type_name: owner,
                index: field.index,
                label: field.label.to_string(),
            });
        }

        match binding {
            Binding::Scalar(access) => {
                if !access.accepts(field.data_type) {
                    return Err(SchemaError::IncompatibleAccessor {
                        type_name: owner,
                        index: field.index,
                        label: field.label.to_string(),
                        data_type: field.data_type,
                        value_type: access.value_type(),
                    });
                }
                if let (Some(declared), Some(expected)) =
                    (field.length, field.data_type.canonical_len())
                    && declared != expected
                {
                    return Err(SchemaError::LengthMismatch {
                        type_name: owner,
                        index: field.index,
                        label: field.label.to_string(),
                        data_type: field.data_type,
                        declared,
                        expected,
                    });
                }
                let descriptor = Arc::new(FieldDescriptor::scalar(owner, &field, access));
                for &version in &field.versions {
                    by_version
                        .entry(version)
                        .or_default()
                        .push(Arc::clone(&descriptor));
                }
            }
            Binding::Nested(nested) => {
                if field.data_type != nested.expected_kind() {
                    return Err(SchemaError::MalformedComposite {
                        type_name: owner,
                        index: field.index,
                        label: field.label.to_string(),
                        detail: format!(
                            "declared as {} but bound to {} as {}",
                            field.data_type,
                            nested.nested_type(),
                            nested.expected_kind()
                        ),
                    });
                }
                for (version, codec) in nested.resolve(cx, owner, &field)? {
                    by_version
                        .entry(version)
                        .or_default()
                        .push(Arc::new(FieldDescriptor::composite(owner, &field, codec)));
                }
            }
        }
    }

    let policy = cx.registry.options.index_policy;
    let mut schemas = BTreeMap::new();
    for (version, mut fields) in by_version {
        fields.sort_by_key(|f| f.index());
        for pair in fields.windows(2) {
            if pair[0].index() != pair[1].index() {
                continue;
            }
            match policy {
                IndexPolicy::Strict => {
                    return Err(SchemaError::DuplicateIndex {
                        type_name: owner,
                        version,
                        index: pair[0].index(),
                    });
                }
                IndexPolicy::Stable => warn!(
                    record = owner,
                    version,
                    index = pair[0].index(),
                    "duplicate field index, keeping declaration order"
                ),
            }
        }
        schemas.insert(version, Arc::new(TypeSchema::new(owner, version, fields)));
    }

    debug!(
        record = owner,
        versions = ?schemas.keys().collect::<Vec<_>>(),
        "compiled record schema"
    );
    Ok(SchemaSet::new(owner, schemas))
}
