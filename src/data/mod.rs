//! Dataset resolution and staging.
//!
//! A [`DataDescriptor`] names datasets through the analysis parameters and
//! selects content by data type. Bound to a [`ParameterRepository`] and a
//! [`PathResolver`], it fetches datasets from a [`DatasetRepository`] and hard
//! links their files into the workflow directory, recording the result in
//! [`CollectedDataFiles`] and a [`SampleDatasetMap`].

mod collected;
mod dataset;
mod descriptor;
mod parameters;
mod resolver;
mod staging;


pub use collected::{CollectedDataFiles, SampleDatasetMap};
pub use dataset::{
    ContentItem, DataType, DataTypeRef, Dataset, DatasetRepository, InMemoryDatasetRepository,
};
pub use descriptor::{
    BoundDataDescriptor, ComputeFn, DataDescriptor, DataSource, PulledDataset, StagedData,
};
pub use parameters::ParameterRepository;
pub use resolver::{PathResolver, ResolveContext, ResolveFn};
pub use staging::{is_same_file, LinkMode, Stager};
