use authz::{Access, NavItem, NavSection};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of issued bearer tokens.
    pub token_ttl_hours: i64,
}

/// Bootstrap account created on startup.
#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    pub superadmin_email: String,
    pub superadmin_name: String,
    /// The superadmin user is only created when a password is configured.
    pub superadmin_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub seed: SeedConfig,
    /// Static menu tree; filtered per viewer on every request.
    #[serde(default = "default_navigation")]
    pub navigation: Vec<NavSection>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.max_connections", 20)?
            .set_default("auth.token_ttl_hours", 168)?
            .set_default("seed.superadmin_email", "superadmin@example.com")?
            .set_default("seed.superadmin_name", "Superadministrator")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., WARDEN__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("WARDEN").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

/// Menu shipped with the service when `navigation` is not configured.
pub fn default_navigation() -> Vec<NavSection> {
    let keyed = |key: &str| Access::Permission(key.to_string());

    vec![
        NavSection {
            label: "General".into(),
            items: vec![NavItem::new(
                "Dashboard",
                "/dashboard",
                "pi pi-chart-bar",
                keyed("dashboard.view"),
            )],
        },
        NavSection {
            label: "Administration".into(),
            items: vec![
                NavItem::new("Users", "/admin/users", "pi pi-users", keyed("users.view")),
                NavItem::new("Roles", "/admin/roles", "pi pi-id-card", keyed("roles.view")),
                NavItem::new(
                    "Permissions",
                    "/admin/permissions",
                    "pi pi-lock",
                    keyed("permissions.view"),
                ),
            ],
        },
        NavSection {
            label: "Settings".into(),
            items: vec![
                NavItem::new(
                    "Profile",
                    "/settings/profile",
                    "pi pi-user",
                    Access::Authenticated,
                ),
                NavItem::new(
                    "Appearance",
                    "/settings/appearance",
                    "pi pi-palette",
                    Access::Authenticated,
                ),
            ],
        },
    ]
}
