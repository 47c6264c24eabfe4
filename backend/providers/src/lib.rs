pub mod gemini;
mod http;
pub mod mock;
pub mod ollama;
pub mod openrouter;
pub mod registry;

pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openrouter::OpenRouterProvider;
pub use registry::{build_provider, ProviderSettings, PROVIDER_NAMES};
