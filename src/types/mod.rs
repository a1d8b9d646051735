//! Public types for the Mimir API.

mod message;
mod provider;
mod request;
mod response;

pub use message::{InvokeRequest, Message, Role};
pub use provider::ProviderDescriptor;
pub use request::{
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, GenerationKind, GenerationRequest,
    GenerationRequestBuilder,
};
pub use response::{CACHE_SOURCE, NormalizedResult, RawCompletion, TEMPLATE_SOURCE};
