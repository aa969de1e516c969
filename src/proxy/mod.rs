pub mod executor;
pub mod headers;
pub mod page;
pub mod service;
pub mod types;
pub mod upstream;
pub mod validator;

pub use executor::Executor;
pub use headers::{resolve, resolve_with_strategy, HeaderStrategy};
pub use page::{first_page, no_pages};
pub use service::{FigmaProxyService, ProxyFuture, ProxyService, ProxyServiceExt};
pub use types::*;
pub use upstream::{redact_auth, UpstreamClient, UpstreamReply, AUTH_HEADER};
pub use validator::{validate, validate_page};
