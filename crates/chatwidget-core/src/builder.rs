//! Session construction from configuration.

use crate::error::ChatCoreError;
use crate::session::{SessionManager, SessionOptions};
use chatwidget_client::OpenAiCompletionClient;
use chatwidget_config::{ChatWidgetConfig, HistoryConfig};
use chatwidget_history::{FileHistoryBackend, HistoryPolicy, MessageHistory};
use directories::BaseDirs;
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;

impl SessionManager {
    /// Build a session backed by the OpenAI-compatible client and, when
    /// enabled, the file history store.
    ///
    /// The session is not initialized; call [`SessionManager::initialize`]
    /// with the user id and welcome message.
    pub fn from_config(config: &ChatWidgetConfig) -> Result<Self, ChatCoreError> {
        let client = OpenAiCompletionClient::from_config(&config.client)?;
        let options = SessionOptions {
            busy_policy: config.session.busy_policy,
            context_messages: config.client.context_messages,
            ..SessionOptions::default()
        };
        let mut manager = SessionManager::new(Arc::new(client)).with_options(options);
        if let Some(history) = build_default_history(&config.history)? {
            manager = manager.with_history(history);
        }
        Ok(manager)
    }
}

/// Build the file history store from config, or `None` when disabled.
fn build_default_history(
    config: &HistoryConfig,
) -> Result<Option<MessageHistory>, ChatCoreError> {
    if !config.enabled {
        info!("history persistence disabled");
        return Ok(None);
    }
    let root = resolve_default_root(config.path.as_ref(), "history")?;
    info!("initializing history store (root={})", root.display());
    let backend = FileHistoryBackend::new(root)?;
    let policy = HistoryPolicy::new(config.max_messages, config.max_age_days);
    Ok(Some(MessageHistory::with_policy(Arc::new(backend), policy)))
}

/// Resolve an absolute storage root for config-specified paths.
fn resolve_default_root(
    path: Option<&String>,
    fallback_dir: &str,
) -> Result<PathBuf, ChatCoreError> {
    let cwd = std::env::current_dir()?;
    if let Some(path) = path {
        let path = PathBuf::from(path);
        if path.is_absolute() {
            debug!("using absolute storage root: {}", path.display());
            return Ok(path);
        }
        debug!(
            "resolving storage root relative to cwd: {}",
            cwd.join(&path).display()
        );
        return Ok(cwd.join(path));
    }

    if let Some(home) = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()) {
        return Ok(home.join(".chatwidget").join(fallback_dir));
    }

    Ok(cwd.join(".chatwidget").join(fallback_dir))
}

#[cfg(test)]
mod tests {
    use super::{build_default_history, resolve_default_root};
    use crate::SessionManager;
    use chatwidget_config::{BusyPolicy, ChatWidgetConfig, ClientConfig, HistoryConfig};
    use chatwidget_protocol::Message;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn resolve_default_root_respects_absolute_and_relative_paths() {
        let temp = tempdir().expect("tempdir");
        let absolute = temp.path().join("history");
        let absolute_str = absolute.to_string_lossy().to_string();
        let resolved = resolve_default_root(Some(&absolute_str), "history").expect("absolute");
        assert_eq!(resolved, absolute);

        let relative = "tmp/history".to_string();
        let cwd = std::env::current_dir().expect("cwd");
        let resolved = resolve_default_root(Some(&relative), "history").expect("relative");
        assert_eq!(resolved, cwd.join(&relative));
    }

    #[test]
    fn resolve_default_root_falls_back_to_dot_dir() {
        let resolved = resolve_default_root(None, "history").expect("fallback");
        assert!(resolved.ends_with(".chatwidget/history"));
    }

    #[test]
    fn disabled_history_builds_nothing() {
        let config = HistoryConfig {
            enabled: false,
            ..HistoryConfig::default()
        };
        assert!(build_default_history(&config).expect("build").is_none());
    }

    #[test]
    fn history_store_uses_configured_policy() {
        let temp = tempdir().expect("tempdir");
        let config = HistoryConfig {
            path: Some(temp.path().to_string_lossy().to_string()),
            max_messages: 7,
            ..HistoryConfig::default()
        };
        let history = build_default_history(&config)
            .expect("build")
            .expect("enabled");
        assert_eq!(history.policy().max_messages, 7);
        assert_eq!(history.policy().max_age, chrono::Duration::days(30));
    }

    #[test]
    fn from_config_restores_persisted_history() {
        let temp = tempdir().expect("tempdir");
        let mut config = ChatWidgetConfig::builder()
            .client(ClientConfig {
                api_key: Some("sk-test".to_string()),
                ..ClientConfig::default()
            })
            .history(HistoryConfig {
                path: Some(temp.path().to_string_lossy().to_string()),
                ..HistoryConfig::default()
            })
            .build();
        config.session.busy_policy = BusyPolicy::Ignore;

        let history = build_default_history(&config.history)
            .expect("build")
            .expect("enabled");
        history.save("alice", &[Message::user("remembered")]);

        let manager = SessionManager::from_config(&config).expect("manager");
        manager.initialize("alice", Some("Hello!"));
        let contents: Vec<String> = manager
            .messages()
            .into_iter()
            .map(|message| message.content)
            .collect();
        assert_eq!(contents, vec!["remembered".to_string()]);
    }
}
