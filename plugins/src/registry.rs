//! Registration, activation, and fan-out across tool plugins.
//!
//! The registry keeps plugins in registration order, which also defines
//! the order diagnostics merge in. The active set is the subset whose
//! availability probe succeeded at the last activation cycle; it is the
//! invariant `active ⊆ registered` that every mutation preserves.

use crate::plugin::{PluginError, RunOptions, ToolPlugin};
use bosun_types::{
    CheckReport, Diagnostic, DocumentSnapshot, FormatReport, PluginInfo, RegistryStats, Severity,
};
use futures_util::future::join_all;
use std::collections::HashSet;

#[derive(Default)]
pub struct PluginRegistry {
    entries: Vec<Box<dyn ToolPlugin>>,
    active: HashSet<String>,
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin under its name. Re-registering an existing name
    /// replaces the instance in place, keeping its registration position
    /// and activation state.
    pub fn register(&mut self, plugin: Box<dyn ToolPlugin>) {
        let name = plugin.name();
        match self.entries.iter().position(|entry| entry.name() == name) {
            Some(index) => {
                tracing::warn!(plugin = name, "re-registering replaces existing instance");
                self.entries[index] = plugin;
            }
            None => {
                tracing::debug!(plugin = name, "registered");
                self.entries.push(plugin);
            }
        }
    }

    /// Remove a plugin entirely, deactivating it first if needed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let Some(index) = self.entries.iter().position(|entry| entry.name() == name) else {
            tracing::warn!(plugin = name, "cannot unregister unknown plugin");
            return false;
        };
        if self.active.remove(name) {
            self.entries[index].on_deactivate();
        }
        self.entries.remove(index);
        tracing::debug!(plugin = name, "unregistered");
        true
    }

    /// Probe one plugin and admit it to the active set on success.
    /// Never retries; a failed activation waits for the next cycle.
    pub async fn activate(&mut self, name: &str) -> bool {
        if self.active.contains(name) {
            return true;
        }
        let Some(plugin) = self.entries.iter().find(|entry| entry.name() == name) else {
            tracing::warn!(plugin = name, "cannot activate unknown plugin");
            return false;
        };
        if plugin.probe().await {
            self.active.insert(name.to_string());
            plugin.on_activate();
            tracing::info!(plugin = name, "activated");
            true
        } else {
            tracing::warn!(plugin = name, "activation failed, tool unavailable");
            false
        }
    }

    /// Activate several plugins, probing them concurrently so total
    /// latency tracks the slowest probe. Failures are collected and
    /// logged together; siblings are unaffected. Returns the number of
    /// plugins active among those requested.
    pub async fn activate_many<'n, I>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = &'n str>,
    {
        let mut activated = 0;
        let mut failures: Vec<&str> = Vec::new();
        let mut probes = Vec::new();
        for name in names {
            if self.active.contains(name) {
                activated += 1;
                continue;
            }
            match self.entries.iter().find(|entry| entry.name() == name) {
                Some(plugin) => probes.push(async move { (name, plugin.probe().await) }),
                None => failures.push(name),
            }
        }

        for (name, available) in join_all(probes).await {
            if available {
                if let Some(plugin) = self.entries.iter().find(|entry| entry.name() == name) {
                    self.active.insert(name.to_string());
                    plugin.on_activate();
                    activated += 1;
                }
            } else {
                failures.push(name);
            }
        }

        if !failures.is_empty() {
            tracing::warn!(plugins = ?failures, "activation failed");
        }
        tracing::debug!(activated, "activation cycle complete");
        activated
    }

    pub fn deactivate(&mut self, name: &str) -> bool {
        if !self.active.remove(name) {
            return false;
        }
        if let Some(plugin) = self.entries.iter().find(|entry| entry.name() == name) {
            plugin.on_deactivate();
        }
        tracing::debug!(plugin = name, "deactivated");
        true
    }

    pub fn deactivate_all(&mut self) {
        for plugin in &self.entries {
            if self.active.contains(plugin.name()) {
                plugin.on_deactivate();
            }
        }
        self.active.clear();
    }

    /// Deactivate everything, then activate the requested subset. Used
    /// after configuration changes that may alter tool paths.
    pub async fn reactivate<'n, I>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = &'n str>,
    {
        self.deactivate_all();
        self.activate_many(names).await
    }

    #[must_use]
    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    /// Whether any registered plugin understands the given extension.
    #[must_use]
    pub fn supports_extension(&self, extension: &str) -> bool {
        self.entries.iter().any(|plugin| {
            plugin
                .supported_extensions()
                .iter()
                .any(|ext| *ext == extension)
        })
    }

    /// Run `check` on every active plugin concurrently and merge the
    /// contributions in registration order. A failing plugin becomes one
    /// synthetic error diagnostic attributed to it; it never aborts the
    /// other plugins' runs.
    pub async fn check(&self, doc: &DocumentSnapshot, opts: &RunOptions) -> CheckReport {
        let runs = self
            .entries
            .iter()
            .filter(|plugin| self.active.contains(plugin.name()))
            .map(|plugin| async move { (plugin.name(), plugin.check(doc, opts).await) });
        let results = join_all(runs).await;
        if results.is_empty() {
            return CheckReport::clean();
        }

        let mut merged = CheckReport::inconclusive();
        for (name, result) in results {
            match result {
                Ok(report) => merged.merge(report),
                Err(error) => {
                    tracing::warn!(plugin = name, %error, "check failed");
                    merged.merge(CheckReport::from_diagnostics(vec![plugin_failure(
                        doc, name, &error,
                    )]));
                }
            }
        }
        merged
    }

    /// Try active formatting plugins in registration order; the first
    /// replacement wins. Formatting results are not composable, so there
    /// is no merge. When nothing wins, the diagnostics collected from
    /// the attempts let callers tell "blocked" from "nothing to do".
    pub async fn format(&self, doc: &DocumentSnapshot, opts: &RunOptions) -> FormatReport {
        let mut collected = Vec::new();
        for plugin in &self.entries {
            if !self.active.contains(plugin.name()) || !plugin.can_format() {
                continue;
            }
            match plugin.format(doc, opts).await {
                Ok(report) if report.has_replacement() => return report,
                Ok(report) => collected.extend(report.into_diagnostics()),
                Err(error) => {
                    tracing::warn!(plugin = plugin.name(), %error, "format failed, trying next");
                }
            }
        }
        if collected.is_empty() {
            FormatReport::unchanged()
        } else {
            FormatReport::blocked(collected)
        }
    }

    /// Registry totals plus per-plugin detail, in registration order.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let plugins = self
            .entries
            .iter()
            .map(|plugin| PluginInfo {
                name: plugin.name().to_string(),
                display_name: plugin.display_name().to_string(),
                version: plugin.version().to_string(),
                active: self.active.contains(plugin.name()),
                can_format: plugin.can_format(),
            })
            .collect();
        RegistryStats {
            total: self.entries.len(),
            active: self.active.len(),
            plugins,
        }
    }
}

fn plugin_failure(doc: &DocumentSnapshot, name: &str, error: &PluginError) -> Diagnostic {
    Diagnostic::new(
        doc.first_line_span(),
        Severity::Error,
        "plugin-error",
        name,
        error.to_string(),
    )
}
