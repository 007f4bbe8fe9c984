//! Builds pipeline collaborators from process configuration.

use std::sync::Arc;
use std::time::Duration;

use brandpulse_core::{AppConfig, PipelineConfig};
use brandpulse_sentiment::{
    Lexicon, MentionSource, OpenAiSentimentModel, SentimentClassifier, SentimentModel,
    TwitterSource,
};

use crate::error::MonitorError;
use crate::pipeline::MonitorDeps;
use crate::sinks::{AlertSink, LogSink, WebhookSink};
use crate::store::MonitorStore;

/// Assemble [`MonitorDeps`] for `store`.
///
/// The model classifier is used when `OPENAI_API_KEY` is set, otherwise the
/// keyword heuristic alone. Ingestion is enabled only with a Twitter bearer
/// token. Alerts always go to the log and, when configured, to the webhook.
///
/// # Errors
///
/// Returns [`MonitorError::Setup`] if an HTTP client cannot be built.
pub fn build_deps(
    app: &AppConfig,
    pipeline: PipelineConfig,
    store: Arc<dyn MonitorStore>,
) -> Result<MonitorDeps, MonitorError> {
    let timeout = Duration::from_secs(app.classifier_timeout_secs);
    let lexicon = Lexicon::from_config(&pipeline);

    let classifier = match app.openai_api_key.as_deref() {
        Some(key) => {
            let mut model = OpenAiSentimentModel::new(key, &app.openai_model, timeout).map_err(
                |source| MonitorError::Setup {
                    component: "sentiment model",
                    source,
                },
            )?;
            if let Some(url) = app.openai_base_url.as_deref() {
                model = model.with_base_url(url);
            }
            tracing::info!(model = %app.openai_model, "model classifier enabled");
            let model: Arc<dyn SentimentModel> = Arc::new(model);
            SentimentClassifier::new(Some(model), lexicon)
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set; classifying with the keyword heuristic only");
            SentimentClassifier::heuristic_only(lexicon)
        }
    };

    let source: Option<Arc<dyn MentionSource>> = match app.twitter_bearer_token.as_deref() {
        Some(token) => {
            let twitter =
                TwitterSource::new(token, timeout).map_err(|source| MonitorError::Setup {
                    component: "twitter source",
                    source,
                })?;
            Some(Arc::new(twitter))
        }
        None => {
            tracing::warn!("TWITTER_BEARER_TOKEN not set; mention ingestion disabled");
            None
        }
    };

    let mut sinks: Vec<Arc<dyn AlertSink>> = vec![Arc::new(LogSink)];
    if let Some(url) = app.alert_webhook_url.as_deref() {
        let webhook = WebhookSink::new(url, Duration::from_secs(app.alert_timeout_secs))?;
        sinks.push(Arc::new(webhook));
    }

    Ok(MonitorDeps {
        store,
        source,
        classifier,
        sinks,
        config: pipeline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use brandpulse_core::Environment;

    fn app_config() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/brandpulse".to_string(),
            env: Environment::Test,
            bind_addr: "127.0.0.1:3000".parse().unwrap(),
            log_level: "info".to_string(),
            pipeline_config_path: None,
            db_max_connections: 10,
            db_min_connections: 1,
            db_acquire_timeout_secs: 10,
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: None,
            classifier_timeout_secs: 20,
            twitter_bearer_token: None,
            alert_webhook_url: None,
            alert_timeout_secs: 10,
        }
    }

    #[test]
    fn bare_config_uses_heuristic_without_source() {
        let deps = build_deps(
            &app_config(),
            PipelineConfig::default(),
            Arc::new(MemoryStore::new()),
        )
        .unwrap();

        assert!(!deps.classifier.has_primary());
        assert!(deps.source.is_none());
        assert_eq!(deps.sinks.len(), 1);
        assert_eq!(deps.sinks[0].name(), "log");
    }

    #[test]
    fn credentials_enable_model_source_and_webhook() {
        let mut app = app_config();
        app.openai_api_key = Some("sk-test".to_string());
        app.openai_base_url = Some("http://127.0.0.1:9".to_string());
        app.twitter_bearer_token = Some("bearer".to_string());
        app.alert_webhook_url = Some("http://127.0.0.1:9/hook".to_string());

        let deps = build_deps(&app, PipelineConfig::default(), Arc::new(MemoryStore::new()))
            .unwrap();

        assert!(deps.classifier.has_primary());
        assert_eq!(deps.source.as_ref().map(|s| s.name()), Some("twitter"));
        let names: Vec<_> = deps.sinks.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["log", "webhook"]);
    }
}
