//! Shared fixtures: a scripted API and a recording navigator.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use stash_core::api::{ApiKey, DevPackage, DevPackageRelease, Role, TransportConfig, UserInfo};
use stash_core::auth::{ClientContext, CookieJar, Navigator, RequestScope, ServerContext};
use stash_core::{ApiClient, ApiResponse, ClientConfig, Dispatcher, ExecutionContext, StashResult, StateRegistry, Stores};

type Script<T> = Mutex<VecDeque<StashResult<ApiResponse<T>>>>;

#[derive(Default)]
struct Scripts {
    configs: Mutex<Vec<TransportConfig>>,
    calls: Mutex<Vec<String>>,
    /// Authorization header each call went out with.
    authorizations: Mutex<Vec<Option<String>>>,
    account: Script<UserInfo>,
    packages: Script<Vec<DevPackage>>,
    package: Script<DevPackage>,
    releases: Script<Vec<DevPackageRelease>>,
    keys: Script<Vec<ApiKey>>,
}

/// In-memory API answering from per-operation queues.
///
/// Handles derived with `with_config` share the queues and the call log.
/// An empty queue answers 404 so unscripted calls are visible in asserts.
pub struct ScriptedApi {
    scripts: Arc<Scripts>,
    config: Option<TransportConfig>,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            scripts: Arc::default(),
            config: None,
        })
    }

    pub fn push_account(&self, response: StashResult<ApiResponse<UserInfo>>) {
        self.scripts.account.lock().push_back(response);
    }

    pub fn push_packages(&self, response: StashResult<ApiResponse<Vec<DevPackage>>>) {
        self.scripts.packages.lock().push_back(response);
    }

    pub fn push_package(&self, response: StashResult<ApiResponse<DevPackage>>) {
        self.scripts.package.lock().push_back(response);
    }

    pub fn push_releases(&self, response: StashResult<ApiResponse<Vec<DevPackageRelease>>>) {
        self.scripts.releases.lock().push_back(response);
    }

    pub fn push_keys(&self, response: StashResult<ApiResponse<Vec<ApiKey>>>) {
        self.scripts.keys.lock().push_back(response);
    }

    pub fn calls(&self) -> Vec<String> {
        self.scripts.calls.lock().clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.scripts.calls.lock().iter().filter(|c| c.as_str() == operation).count()
    }

    pub fn last_config(&self) -> Option<TransportConfig> {
        self.scripts.configs.lock().last().cloned()
    }

    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.scripts.authorizations.lock().clone()
    }

    fn answer<T>(&self, operation: &str, script: &Script<T>) -> StashResult<ApiResponse<T>> {
        self.scripts.calls.lock().push(operation.to_owned());
        let authorization = self.config.as_ref().and_then(|c| c.authorization().map(str::to_owned));
        self.scripts.authorizations.lock().push(authorization);
        script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(ApiResponse::failure(404, format!("{operation} not scripted"))))
    }
}

#[async_trait]
impl ApiClient for ScriptedApi {
    fn with_config(&self, config: TransportConfig) -> Arc<dyn ApiClient> {
        self.scripts.configs.lock().push(config.clone());
        Arc::new(Self {
            scripts: Arc::clone(&self.scripts),
            config: Some(config),
        })
    }

    async fn get_account(&self) -> StashResult<ApiResponse<UserInfo>> {
        self.answer("get_account", &self.scripts.account)
    }

    async fn get_dev_packages(&self) -> StashResult<ApiResponse<Vec<DevPackage>>> {
        self.answer("get_dev_packages", &self.scripts.packages)
    }

    async fn get_dev_package(&self, name: &str) -> StashResult<ApiResponse<DevPackage>> {
        self.answer(&format!("get_dev_package:{name}"), &self.scripts.package)
    }

    async fn get_dev_package_releases(&self, name: &str) -> StashResult<ApiResponse<Vec<DevPackageRelease>>> {
        self.answer(&format!("get_dev_package_releases:{name}"), &self.scripts.releases)
    }

    async fn get_api_keys(&self) -> StashResult<ApiResponse<Vec<ApiKey>>> {
        self.answer("get_api_keys", &self.scripts.keys)
    }
}

/// Navigator that remembers every navigation.
pub struct RecordingNavigator {
    current: Mutex<String>,
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn at(path: &str) -> Arc<Self> {
        Arc::new(Self {
            current: Mutex::new(path.to_owned()),
            visited: Mutex::new(Vec::new()),
        })
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.current.lock().clone()
    }

    fn navigate_to(&self, path: &str) {
        self.visited.lock().push(path.to_owned());
        *self.current.lock() = path.to_owned();
    }
}

/// Everything a test needs to drive one context.
pub struct Harness {
    pub api: Arc<ScriptedApi>,
    pub navigator: Arc<RecordingNavigator>,
    pub jar: CookieJar,
    pub registry: StateRegistry,
    pub dispatcher: Arc<Dispatcher>,
    pub ctx: ExecutionContext,
}

impl Harness {
    /// A client at `path`, optionally holding a session token.
    pub fn client(token: Option<&str>, path: &str) -> Self {
        let jar = CookieJar::new();
        if let Some(token) = token {
            jar.set("session_token", Some(token.to_owned()));
        }
        let navigator = RecordingNavigator::at(path);
        let ctx = ExecutionContext::Client(ClientContext::new(jar.clone(), navigator.clone()));
        Self::build(jar, navigator, ctx)
    }

    /// A server context serving `path` with the given `Cookie` header.
    pub fn server(cookie_header: &str, path: &str) -> Self {
        let scope = RequestScope::new(path, cookie_header);
        let jar = scope.cookies.clone();
        let ctx = ExecutionContext::Server(ServerContext::for_request(scope));
        Self::build(jar, RecordingNavigator::at(path), ctx)
    }

    /// A context with no request and no client.
    pub fn with_context(ctx: ExecutionContext) -> Self {
        Self::build(CookieJar::new(), RecordingNavigator::at("/"), ctx)
    }

    fn build(jar: CookieJar, navigator: Arc<RecordingNavigator>, ctx: ExecutionContext) -> Self {
        let api = ScriptedApi::new();
        let transport: Arc<dyn ApiClient> = api.clone();
        let dispatcher = Arc::new(Dispatcher::new(transport, ClientConfig::default()));
        Self {
            api,
            navigator,
            jar,
            registry: StateRegistry::new(),
            dispatcher,
            ctx,
        }
    }

    pub fn stores(&self) -> Stores {
        Stores::new(self.registry.clone(), Arc::clone(&self.dispatcher), self.ctx.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.jar.value("session_token")
    }
}

pub fn user(username: &str, role: Role) -> UserInfo {
    UserInfo {
        id: 1,
        username: username.to_owned(),
        display_name: username.to_uppercase(),
        email: format!("{username}@example.org"),
        role,
    }
}

pub fn package(name: &str) -> DevPackage {
    DevPackage {
        name: name.to_owned(),
        description: format!("{name} package"),
        owner_user_id: 1,
        homepage_url: None,
        requires_patching: false,
        created_at: 1_700_000_000,
    }
}

pub fn release(package_name: &str, version: &str) -> DevPackageRelease {
    DevPackageRelease {
        id: 1,
        package_name: package_name.to_owned(),
        version: version.to_owned(),
        architectures: vec!["x86_64".into()],
        created_at: 1_700_000_000,
    }
}

/// Events recorded by [`capture_logs`], as `(level, message)`.
pub type CapturedLogs = Arc<Mutex<Vec<(Level, String)>>>;

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

struct Capture(CapturedLogs);

impl<S: Subscriber> Layer<S> for Capture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.0.lock().push((*event.metadata().level(), visitor.0));
    }
}

/// Record events on this thread until the guard drops.
pub fn capture_logs() -> (DefaultGuard, CapturedLogs) {
    let events = CapturedLogs::default();
    let subscriber = tracing_subscriber::registry().with(Capture(Arc::clone(&events)));
    (tracing::subscriber::set_default(subscriber), events)
}
