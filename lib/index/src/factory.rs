use crate::handle::IndexHandle;
use crate::index::Index;
use parliament_common::{IndexResult, Properties};
use parliament_storage::Graph;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Creates the indexes of one kind for graphs.
pub trait IndexFactory: Send + Sync {
    type Index: Index + 'static;

    fn label(&self) -> &str;

    /// Applies the configuration of the factory. Fails with
    /// [IndexError::ConfigurationInvalid](parliament_common::error::IndexError::ConfigurationInvalid)
    /// if a property is missing or malformed.
    fn configure(&mut self, properties: &Properties) -> IndexResult<()>;

    /// Creates a new, not yet opened, index for `graph`.
    fn create_index(&self, graph: &Graph) -> IndexResult<Self::Index>;
}

/// A type-erased [IndexFactory].
pub trait AnyIndexFactory: Send + Sync {
    fn label(&self) -> &str;

    fn create_handle(&self, graph: &Graph) -> IndexResult<Arc<dyn IndexHandle>>;
}

impl<F: IndexFactory> AnyIndexFactory for F {
    fn label(&self) -> &str {
        IndexFactory::label(self)
    }

    fn create_handle(&self, graph: &Graph) -> IndexResult<Arc<dyn IndexHandle>> {
        Ok(Arc::new(self.create_index(graph)?))
    }
}

/// Builds a configured factory from its properties.
pub type FactoryConstructor =
    Box<dyn Fn(&Properties) -> IndexResult<Arc<dyn AnyIndexFactory>> + Send + Sync>;

/// One entry of the index configuration of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactoryConfig {
    /// The id the constructor of the factory was registered under.
    pub id: String,
    /// Whether indexes of this factory are created for new graphs. [None] defers to
    /// [IndexFactoryRegistry::is_indexing_enabled_by_default].
    pub enabled: Option<bool>,
    pub properties: Properties,
}

impl FactoryConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }
}

struct RegisteredFactory {
    factory: Arc<dyn AnyIndexFactory>,
    enabled: Option<bool>,
}

/// The registry of the index factories of a store.
///
/// Factories are looked up by a string id in an explicit table of constructors that is filled at
/// startup. Unknown ids and invalid configurations are skipped with a warning, as indexing never
/// blocks the availability of the base graph.
pub struct IndexFactoryRegistry {
    constructors: BTreeMap<String, FactoryConstructor>,
    factories: Vec<RegisteredFactory>,
    indexing_enabled_by_default: bool,
}

impl IndexFactoryRegistry {
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
            factories: Vec::new(),
            indexing_enabled_by_default: true,
        }
    }

    /// Makes a factory constructor available under `id`.
    pub fn add_constructor(
        &mut self,
        id: impl Into<String>,
        constructor: impl Fn(&Properties) -> IndexResult<Arc<dyn AnyIndexFactory>> + Send + Sync + 'static,
    ) {
        self.constructors.insert(id.into(), Box::new(constructor));
    }

    /// Instantiates and registers the factories described by `entries`.
    ///
    /// Returns the number of registered factories.
    pub fn configure(&mut self, entries: &[FactoryConfig]) -> usize {
        let mut registered = 0;
        for entry in entries {
            let Some(constructor) = self.constructors.get(&entry.id) else {
                tracing::warn!(factory = %entry.id, "Unknown index factory, skipping");
                continue;
            };
            match constructor(&entry.properties) {
                Ok(factory) => {
                    self.insert(RegisteredFactory {
                        factory,
                        enabled: entry.enabled,
                    });
                    registered += 1;
                }
                Err(error) => {
                    tracing::warn!(factory = %entry.id, error = %error, "Could not configure index factory, skipping");
                }
            }
        }
        registered
    }

    /// Registers an already configured factory. It replaces a factory with the same label.
    pub fn register(&mut self, factory: Arc<dyn AnyIndexFactory>) {
        self.insert(RegisteredFactory {
            factory,
            enabled: None,
        });
    }

    fn insert(&mut self, registered: RegisteredFactory) {
        let label = registered.factory.label();
        self.factories
            .retain(|existing| existing.factory.label() != label);
        self.factories.push(registered);
    }

    /// Unregisters all factories with the given label. Returns whether a factory was removed.
    pub fn unregister(&mut self, label: &str) -> bool {
        let before = self.factories.len();
        self.factories
            .retain(|registered| registered.factory.label() != label);
        before != self.factories.len()
    }

    pub fn set_indexing_enabled_by_default(&mut self, enabled: bool) {
        self.indexing_enabled_by_default = enabled;
    }

    pub fn is_indexing_enabled_by_default(&self) -> bool {
        self.indexing_enabled_by_default
    }

    /// Sets whether the factory with `label` creates indexes for new graphs.
    pub fn set_enabled(&mut self, label: &str, enabled: bool) {
        for registered in &mut self.factories {
            if registered.factory.label() == label {
                registered.enabled = Some(enabled);
            }
        }
    }

    /// The number of registered factories.
    pub fn size(&self) -> usize {
        self.factories.len()
    }

    /// Returns the factories that create indexes for new graphs.
    pub fn enabled_factories(&self) -> Vec<Arc<dyn AnyIndexFactory>> {
        self.factories
            .iter()
            .filter(|registered| {
                registered
                    .enabled
                    .unwrap_or(self.indexing_enabled_by_default)
            })
            .map(|registered| Arc::clone(&registered.factory))
            .collect()
    }
}

impl Default for IndexFactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IndexFactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexFactoryRegistry")
            .field("constructors", &self.constructors.keys().collect::<Vec<_>>())
            .field(
                "factories",
                &self
                    .factories
                    .iter()
                    .map(|registered| registered.factory.label())
                    .collect::<Vec<_>>(),
            )
            .field(
                "indexing_enabled_by_default",
                &self.indexing_enabled_by_default,
            )
            .finish()
    }
}
