use crate::index::TemporalIndex;
use parliament_common::{IndexResult, Properties};
use parliament_index::{encode_for_filename, AnyIndexFactory, IndexFactory, RecordFile};
use parliament_storage::Graph;
use std::path::PathBuf;
use std::sync::Arc;

/// The optional property holding the directory for persisted indexes.
pub const DIRECTORY_PROPERTY: &str = "indexDir";

/// Creates the temporal index factory described by `properties`.
pub fn temporal_factory(properties: &Properties) -> IndexResult<Arc<dyn AnyIndexFactory>> {
    let mut factory = TemporalIndexFactory::new();
    factory.configure(properties)?;
    Ok(Arc::new(factory))
}

/// Creates a [TemporalIndex] per graph.
#[derive(Debug, Clone, Default)]
pub struct TemporalIndexFactory {
    directory: Option<PathBuf>,
}

impl TemporalIndexFactory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }
}

impl IndexFactory for TemporalIndexFactory {
    type Index = TemporalIndex;

    fn label(&self) -> &str {
        "temporal index factory"
    }

    fn configure(&mut self, properties: &Properties) -> IndexResult<()> {
        if let Some(directory) = properties.get(DIRECTORY_PROPERTY) {
            self.directory = Some(PathBuf::from(directory));
        }
        Ok(())
    }

    fn create_index(&self, graph: &Graph) -> IndexResult<TemporalIndex> {
        let Some(directory) = &self.directory else {
            return Ok(TemporalIndex::new());
        };
        let graph_name = graph
            .name()
            .map_or_else(|| "default".to_owned(), |name| encode_for_filename(name.as_str()));
        Ok(TemporalIndex::persistent(RecordFile::new(
            directory.join(graph_name).join("temporal.txt"),
        )))
    }
}
