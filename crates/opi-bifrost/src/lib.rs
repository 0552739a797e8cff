//! Platform-facing façade of the desire pipeline.
//!
//! [`Bifrost`] converts platform desire requests into LRPs and hands them to an
//! [`opi_core::Desirer`]; [`Stager`] turns staging requests into bounded tasks.

mod error;
pub use error::{BifrostError, ConvertError, StagingError};

mod convert;
pub use convert::{ConvertFn, Converter, LrpConverter, env_to_map, flatten_vcap};

mod registry;
pub use registry::{ImageResolver, RegistryConfig, RegistryStager};

mod bifrost;
pub use bifrost::Bifrost;

mod stager;
pub use stager::{Stager, StagerConfig, replace_host};
