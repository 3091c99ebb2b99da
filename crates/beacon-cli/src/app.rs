//! Router, transport and shutdown wiring shared by all commands.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use beacon_alerts::{AlertRouter, AlertsConfig, NotificationTransport, WebhookRobotTransport};
use beacon_pool::ShutdownHooks;

/// A configured alert router and the hooks that shut it down.
pub struct App {
    config: AlertsConfig,
    router: Arc<AlertRouter>,
    hooks: Arc<ShutdownHooks>,
}

impl App {
    /// Loads the configuration file and builds the webhook-backed router.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails validation.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config = AlertsConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
        Self::build(config)
    }

    /// Builds the router with a [`WebhookRobotTransport`].
    ///
    /// # Errors
    ///
    /// Returns an error if a channel fails validation.
    pub fn build(config: AlertsConfig) -> anyhow::Result<Self> {
        let transport = Arc::new(WebhookRobotTransport::new(Duration::from_secs(
            config.timeout_secs,
        )));
        let hooks = Arc::new(ShutdownHooks::new());

        // Hooks run in reverse: the router drains its queue before robots close.
        let robots = Arc::clone(&transport);
        hooks.register("robot pool", move || {
            robots.close();
        });

        Self::assemble(config, transport, hooks)
    }

    /// Builds the router on top of an arbitrary transport.
    ///
    /// # Errors
    ///
    /// Returns an error if a channel fails validation.
    pub fn with_transport(
        config: AlertsConfig,
        transport: Arc<dyn NotificationTransport>,
    ) -> anyhow::Result<Self> {
        Self::assemble(config, transport, Arc::new(ShutdownHooks::new()))
    }

    fn assemble(
        config: AlertsConfig,
        transport: Arc<dyn NotificationTransport>,
        hooks: Arc<ShutdownHooks>,
    ) -> anyhow::Result<Self> {
        let router = Arc::new(
            AlertRouter::from_config(&config, transport).context("invalid alert configuration")?,
        );

        let closing = Arc::clone(&router);
        hooks.register("alert router", move || closing.close());

        Ok(Self {
            config,
            router,
            hooks,
        })
    }

    /// The loaded configuration.
    #[must_use]
    pub const fn config(&self) -> &AlertsConfig {
        &self.config
    }

    /// The router.
    #[must_use]
    pub const fn router(&self) -> &Arc<AlertRouter> {
        &self.router
    }

    /// Shutdown hooks, shareable with a signal handler.
    #[must_use]
    pub const fn hooks(&self) -> &Arc<ShutdownHooks> {
        &self.hooks
    }

    /// Runs the shutdown hooks. Safe to call more than once.
    pub fn shutdown(&self) -> usize {
        self.hooks.run()
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("channels", &self.router.channel_names())
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}
