//! Environment variable access.

use std::env;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(level = "trace", skip(self))]
    pub(crate) fn env_var_impl(&self, key: &str) -> Result<String, env::VarError> {
        env::var(key)
    }
}
