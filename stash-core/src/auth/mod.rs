//! Credentials, execution contexts, and the request dispatcher.

mod context;
mod cookies;
mod dispatcher;

pub use context::{login_redirect_path, ClientContext, ExecutionContext, Navigator, RequestScope, ServerContext};
pub use cookies::{AppCookie, CookieCredentials, CookieJar, CredentialStore};
pub use dispatcher::{DispatchOptions, Dispatcher};
