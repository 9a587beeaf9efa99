//! Configuration: schema, file discovery/loading, env substitution.
//!
//! Config lives in `herald.{toml,yaml,yml,json}`, project-local or under
//! `~/.config/herald/`. Every section is optional and serde-defaulted;
//! `${ENV_VAR}` placeholders in string values are substituted at load.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{clear_config_dir, config_dir, discover_and_load, load_config, set_config_dir},
    schema::{GatewayConfig, HeraldConfig, PacingConfig, ReconnectMode, SessionsConfig},
};
