//! Engine configuration from the environment
//!
//! Variables are read with the `AXOAPI_` prefix after loading a `.env` file
//! if one exists:
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `AXOAPI_ADDR` | listen address for `run_default` |
//! | `AXOAPI_SCHEMA_PATH` | path of the JSON document |
//! | `AXOAPI_SCHEMA_UI_PATH` | path of the Redoc page |
//! | `AXOAPI_DISABLE_SCHEMA` | `true` to serve neither |
//! | `PORT` | port on all interfaces, when `AXOAPI_ADDR` is unset |

use crate::error::Result;
use axoapi_openapi::OpenApiConfig;
use serde::Deserialize;

/// Prefix of every environment variable read by [`EngineConfig::from_env`]
pub const ENV_PREFIX: &str = "AXOAPI_";

/// Listen address used when neither `AXOAPI_ADDR` nor `PORT` is set
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Settings an engine needs before it starts serving
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Address `run_default` binds to
    pub addr: String,
    pub openapi: OpenApiConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnvVars {
    addr: Option<String>,
    schema_path: Option<String>,
    schema_ui_path: Option<String>,
    disable_schema: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            openapi: OpenApiConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load `.env` (if present) and read the process environment
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_vars(std::env::vars())
    }

    /// Read configuration from an explicit list of variables
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();
        let port = vars
            .iter()
            .find(|(key, _)| key == "PORT")
            .map(|(_, value)| value.clone());
        let env: EnvVars = envy::prefixed(ENV_PREFIX).from_iter(vars)?;

        let mut openapi = OpenApiConfig::default();
        if let Some(path) = env.schema_path {
            openapi.schema_path = path;
        }
        if let Some(path) = env.schema_ui_path {
            openapi.schema_ui_path = path;
        }
        openapi.enabled = !env.disable_schema;

        let addr = match (env.addr, port) {
            (Some(addr), _) => listen_address(&addr),
            (None, Some(port)) => format!("0.0.0.0:{}", port.trim()),
            (None, None) => {
                tracing::debug!("PORT is undefined, using {} by default", DEFAULT_ADDR);
                DEFAULT_ADDR.to_string()
            }
        };

        Ok(Self { addr, openapi })
    }
}

/// Listen address when none is given: `PORT` on all interfaces, or
/// [`DEFAULT_ADDR`]
pub fn default_addr() -> String {
    match std::env::var("PORT") {
        Ok(port) if !port.trim().is_empty() => format!("0.0.0.0:{}", port.trim()),
        _ => {
            tracing::debug!("PORT is undefined, using {} by default", DEFAULT_ADDR);
            DEFAULT_ADDR.to_string()
        }
    }
}

/// Expand a `:port` shorthand to all interfaces; other addresses pass through
pub fn listen_address(addr: &str) -> String {
    let addr = addr.trim();
    if addr.is_empty() {
        DEFAULT_ADDR.to_string()
    } else if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    }
}
