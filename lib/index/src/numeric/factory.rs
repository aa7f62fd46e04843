use super::{Number, NumericIndex};
use crate::factory::{AnyIndexFactory, IndexFactory};
use crate::persistence::{encode_for_filename, RecordFile};
use parliament_common::error::IndexError;
use parliament_common::{IndexResult, Properties};
use parliament_model::NamedNode;
use parliament_storage::Graph;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

/// The property holding the IRI of the indexed predicate.
pub const PREDICATE_PROPERTY: &str = "predicate";

/// The optional property holding the directory for persisted indexes.
pub const DIRECTORY_PROPERTY: &str = "indexDir";

/// The property selecting the number type, `integer` (the default) or `double`.
pub const TYPE_PROPERTY: &str = "type";

/// Creates the numeric index factory described by `properties`.
pub fn numeric_factory(properties: &Properties) -> IndexResult<Arc<dyn AnyIndexFactory>> {
    match properties.get(TYPE_PROPERTY).map(String::as_str) {
        None | Some("integer") => Ok(Arc::new(NumericIndexFactory::<i64>::from_properties(
            properties,
        )?)),
        Some("double") => Ok(Arc::new(NumericIndexFactory::<f64>::from_properties(
            properties,
        )?)),
        Some(other) => Err(IndexError::configuration(format!(
            "unknown numeric index type '{other}'"
        ))),
    }
}

/// Creates [NumericIndex]es for a configured predicate.
///
/// Without a directory the indexes are kept in memory and are rebuilt from the graph when they are
/// registered.
#[derive(Debug, Clone)]
pub struct NumericIndexFactory<N> {
    label: String,
    predicate: Option<NamedNode>,
    directory: Option<PathBuf>,
    number: PhantomData<N>,
}

impl<N: Number> NumericIndexFactory<N> {
    /// Creates an unconfigured factory.
    pub fn new() -> Self {
        Self {
            label: format!("numeric {} index factory", N::TYPE_NAME),
            predicate: None,
            directory: None,
            number: PhantomData,
        }
    }

    /// Creates a factory for the given predicate.
    pub fn for_predicate(predicate: NamedNode) -> Self {
        let mut factory = Self::new();
        factory.set_predicate(predicate);
        factory
    }

    /// Creates a factory from its properties.
    pub fn from_properties(properties: &Properties) -> IndexResult<Self> {
        let mut factory = Self::new();
        factory.configure(properties)?;
        Ok(factory)
    }

    #[must_use]
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    fn set_predicate(&mut self, predicate: NamedNode) {
        self.label = format!("numeric {} index factory for {predicate}", N::TYPE_NAME);
        self.predicate = Some(predicate);
    }

    fn file_for(&self, graph: &Graph, predicate: &NamedNode) -> Option<RecordFile> {
        let directory = self.directory.as_ref()?;
        let graph_name = graph
            .name()
            .map_or_else(|| "default".to_owned(), |name| encode_for_filename(name.as_str()));
        Some(RecordFile::new(directory.join(graph_name).join(format!(
            "numeric_{}_{}.txt",
            N::TYPE_NAME,
            encode_for_filename(predicate.as_str())
        ))))
    }
}

impl<N: Number> Default for NumericIndexFactory<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Number> IndexFactory for NumericIndexFactory<N> {
    type Index = NumericIndex<N>;

    fn label(&self) -> &str {
        &self.label
    }

    fn configure(&mut self, properties: &Properties) -> IndexResult<()> {
        let Some(predicate) = properties.get(PREDICATE_PROPERTY) else {
            return Err(IndexError::configuration(format!(
                "the '{PREDICATE_PROPERTY}' property of the {} is missing",
                self.label
            )));
        };
        let predicate = NamedNode::new(predicate.as_str()).map_err(|error| {
            IndexError::configuration(format!("invalid predicate IRI '{predicate}': {error}"))
        })?;
        self.set_predicate(predicate);
        if let Some(directory) = properties.get(DIRECTORY_PROPERTY) {
            self.directory = Some(PathBuf::from(directory));
        }
        Ok(())
    }

    fn create_index(&self, graph: &Graph) -> IndexResult<NumericIndex<N>> {
        let Some(predicate) = &self.predicate else {
            return Err(IndexError::configuration(format!(
                "the {} has no predicate",
                self.label
            )));
        };
        Ok(match self.file_for(graph, predicate) {
            Some(file) => NumericIndex::persistent(predicate.clone(), file),
            None => NumericIndex::new(predicate.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Index;
    use parliament_common::error::IndexErrorKind;

    #[test]
    fn configuration_requires_a_valid_predicate() {
        let error = NumericIndexFactory::<i64>::from_properties(&Properties::new()).unwrap_err();
        assert_eq!(error.kind(), IndexErrorKind::ConfigurationInvalid);

        let properties = Properties::from([(PREDICATE_PROPERTY.to_owned(), "not an iri".to_owned())]);
        let error = NumericIndexFactory::<i64>::from_properties(&properties).unwrap_err();
        assert_eq!(error.kind(), IndexErrorKind::ConfigurationInvalid);

        let properties = Properties::from([
            (PREDICATE_PROPERTY.to_owned(), "http://ex/age".to_owned()),
            (TYPE_PROPERTY.to_owned(), "complex".to_owned()),
        ]);
        let error = numeric_factory(&properties).err().unwrap();
        assert_eq!(error.kind(), IndexErrorKind::ConfigurationInvalid);
    }

    #[test]
    fn configured_factories_create_indexes() -> IndexResult<()> {
        let properties = Properties::from([(
            PREDICATE_PROPERTY.to_owned(),
            "http://ex/age".to_owned(),
        )]);
        let factory = NumericIndexFactory::<f64>::from_properties(&properties)?;
        let index = factory.create_index(&Graph::new())?;
        assert_eq!(index.predicate().as_str(), "http://ex/age");
        assert_eq!(Index::label(&index), "numeric double index for <http://ex/age>");

        let factory = numeric_factory(&properties)?;
        assert_eq!(factory.label(), "numeric integer index factory for <http://ex/age>");
        Ok(())
    }
}
