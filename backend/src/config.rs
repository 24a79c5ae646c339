use std::fmt;

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "Admin123!";
pub const DEFAULT_ADMIN_NAME: &str = "Admin User";
pub const DEFAULT_EMBEDDED_URL: &str = "sqlite::memory:";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";
pub const DEFAULT_DRAFT_COOKIE: &str = "__prerender_bypass";

/// Deployment mode taken from `NODE_ENV`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
    Test,
    Other(String),
}

impl Environment {
    pub fn from_node_env(value: Option<&str>) -> Self {
        match value {
            Some("production") => Environment::Production,
            Some("development") => Environment::Development,
            Some("test") => Environment::Test,
            Some(other) => Environment::Other(other.to_string()),
            None => Environment::Other("unknown".to_string()),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => f.write_str("production"),
            Environment::Development => f.write_str("development"),
            Environment::Test => f.write_str("test"),
            Environment::Other(name) => f.write_str(name),
        }
    }
}

/// Which adapter initializer the host should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Managed,
    Embedded,
}

impl AdapterKind {
    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "managed" | "neon" | "postgres" => Some(AdapterKind::Managed),
            "embedded" | "memory" => Some(AdapterKind::Embedded),
            _ => None,
        }
    }
}

/// Transport used to reach the managed database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Long-lived socket connections held by the pool.
    WebSocket,
    /// One HTTPS request per query.
    Http,
}

impl Transport {
    fn detect(value: Option<&str>) -> Self {
        match value.map(|v| v.to_lowercase()) {
            Some(v) if v == "http" || v == "https" => Transport::Http,
            _ => Transport::WebSocket,
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::WebSocket => f.write_str("websocket"),
            Transport::Http => f.write_str("http"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            email: DEFAULT_ADMIN_EMAIL.to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
            name: DEFAULT_ADMIN_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: Environment,
    pub database_uri: Option<String>,
    pub adapter: AdapterKind,
    pub transport: Transport,
    pub embedded_url: String,
    pub bind_address: String,
    pub draft_cookie_name: String,
    pub admin: AdminCredentials,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`. Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let adapter = match get("DATABASE_ADAPTER") {
            Some(value) => AdapterKind::parse(&value).unwrap_or_else(|| {
                tracing::warn!(value = %value, "Unknown DATABASE_ADAPTER, using embedded");
                AdapterKind::Embedded
            }),
            None => AdapterKind::Embedded,
        };

        Self {
            environment: Environment::from_node_env(get("NODE_ENV").as_deref()),
            database_uri: get("DATABASE_URI"),
            adapter,
            transport: Transport::detect(get("DATABASE_TRANSPORT").as_deref()),
            embedded_url: get("EMBEDDED_DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_EMBEDDED_URL.to_string()),
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            draft_cookie_name: get("DRAFT_COOKIE_NAME")
                .unwrap_or_else(|| DEFAULT_DRAFT_COOKIE.to_string()),
            admin: AdminCredentials {
                email: get("ADMIN_EMAIL").unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
                password: get("ADMIN_PASSWORD")
                    .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
                name: get("ADMIN_NAME").unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_string()),
            },
        }
    }
}
