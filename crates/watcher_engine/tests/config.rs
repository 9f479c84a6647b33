use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use pretty_assertions::assert_eq;
use watcher_core::LengthBound;
use watcher_engine::{
    ChannelKind, ConfigError, Pipeline, Secret, SmtpTls, SummarizerChoice, WatcherConfig,
    DEFAULT_SUBJECT,
};

const FULL: &str = r#"
(
    listing_url: "https://www.whitehouse.gov/presidential-actions/",
    state_path: "state/last_title.txt",
    summary: (strategy: Extractive, bound: Chars(500)),
    dispatch_timeout_secs: 10,
    channels: [
        Webhook(name: "ops", url_env: "OPS_HOOK", token_env: Some("OPS_TOKEN")),
        Discord(name: "discord", webhook_url_env: "DISCORD_WEBHOOK_URL"),
        Email(
            name: "inbox",
            smtp_host: "smtp.example.org",
            smtp_port: 587,
            tls: StartTls,
            username_env: "SMTP_USERNAME",
            password_env: "SMTP_PASSWORD",
            from: "watcher@example.org",
            to: ["alerts@example.org"],
        ),
    ],
)
"#;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |var| map.get(var).cloned()
}

fn full_env() -> impl Fn(&str) -> Option<String> {
    env(&[
        ("OPS_HOOK", "https://hooks.example.org/ops"),
        ("OPS_TOKEN", "token"),
        ("DISCORD_WEBHOOK_URL", "https://discord.example.org/api/webhooks/1/x"),
        ("SMTP_USERNAME", "user"),
        ("SMTP_PASSWORD", "hunter2"),
    ])
}

#[test]
fn minimal_config_uses_defaults() {
    let config =
        WatcherConfig::from_ron(r#"(listing_url: "https://example.gov/actions/")"#).unwrap();
    let resolved = config.resolve(env(&[])).unwrap();

    assert_eq!(resolved.state_path, PathBuf::from("last_title.txt"));
    assert_eq!(resolved.bound, LengthBound::Sentences(3));
    assert_eq!(resolved.dispatch_timeout, Duration::from_secs(15));
    assert_eq!(resolved.notice_label, "New Executive Order");
    assert!(resolved.channels.is_empty());
    assert!(matches!(
        resolved.summarizer,
        SummarizerChoice::Extractive { min_input_words: 40 }
    ));
}

#[test]
fn channels_resolve_secrets_from_the_environment() {
    let resolved = WatcherConfig::from_ron(FULL).unwrap().resolve(full_env()).unwrap();

    assert_eq!(resolved.bound, LengthBound::Chars(500));
    assert_eq!(resolved.dispatch_timeout, Duration::from_secs(10));
    let names: Vec<&str> = resolved.channels.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["ops", "discord", "inbox"]);

    match &resolved.channels[0].kind {
        ChannelKind::Webhook { url, bearer_token } => {
            assert_eq!(url.expose(), "https://hooks.example.org/ops");
            assert_eq!(bearer_token.as_ref().map(Secret::expose), Some("token"));
        }
        other => panic!("unexpected channel {other:?}"),
    }
    match &resolved.channels[2].kind {
        ChannelKind::Email(settings) => {
            assert_eq!(settings.smtp_port, 587);
            assert_eq!(settings.tls, SmtpTls::StartTls);
            assert_eq!(settings.password.expose(), "hunter2");
            assert_eq!(settings.subject, DEFAULT_SUBJECT);
            assert_eq!(settings.timeout, Duration::from_secs(10));
        }
        other => panic!("unexpected channel {other:?}"),
    }
}

#[test]
fn missing_secret_names_the_variable_and_channel() {
    let lookup = env(&[("OPS_HOOK", "https://hooks.example.org/ops"), ("OPS_TOKEN", "t")]);
    let err = WatcherConfig::from_ron(FULL).unwrap().resolve(lookup).unwrap_err();
    match err {
        ConfigError::MissingEnv { var, owner } => {
            assert_eq!(var, "DISCORD_WEBHOOK_URL");
            assert_eq!(owner, "discord");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn blank_secrets_count_as_missing() {
    let config = WatcherConfig::from_ron(
        r#"(listing_url: "https://example.gov/", channels: [Discord(name: "d", webhook_url_env: "HOOK")])"#,
    )
    .unwrap();
    let err = config.resolve(env(&[("HOOK", "  ")])).unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnv { .. }));
}

#[test]
fn duplicate_channel_names_are_rejected() {
    let config = WatcherConfig::from_ron(
        r#"(
            listing_url: "https://example.gov/",
            channels: [
                Discord(name: "alerts", webhook_url_env: "A"),
                Webhook(name: "alerts", url_env: "B"),
            ],
        )"#,
    )
    .unwrap();
    let err = config
        .resolve(env(&[("A", "https://a.example"), ("B", "https://b.example")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("alerts")));
}

#[test]
fn non_http_listing_is_rejected() {
    let config = WatcherConfig::from_ron(r#"(listing_url: "ftp://example.gov/")"#).unwrap();
    assert!(matches!(config.resolve(env(&[])), Err(ConfigError::Invalid(_))));
}

#[test]
fn unknown_fields_fail_to_parse() {
    let err = WatcherConfig::from_ron(r#"(listing_url: "https://example.gov/", smtp_password: "x")"#)
        .unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn generative_strategy_reads_its_key() {
    let config = WatcherConfig::from_ron(
        r#"(
            listing_url: "https://example.gov/",
            summary: (strategy: Generative(model: "gpt-4o-mini", api_key_env: "OPENAI_API_KEY")),
        )"#,
    )
    .unwrap();
    let resolved = config.resolve(env(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
    match resolved.summarizer {
        SummarizerChoice::Generative(settings) => {
            assert_eq!(settings.api_key.expose(), "sk-test");
            assert_eq!(settings.base_url, "https://api.openai.com/v1");
            assert_eq!(settings.model, "gpt-4o-mini");
        }
        other => panic!("unexpected summarizer {other:?}"),
    }
}

#[test]
fn secrets_never_show_in_debug_output() {
    let resolved = WatcherConfig::from_ron(FULL).unwrap().resolve(full_env()).unwrap();
    let debug = format!("{resolved:?}");
    assert!(!debug.contains("hunter2"));
    assert!(!debug.contains("discord.example.org"));
    assert!(debug.contains("Secret(***)"));
}

#[tokio::test]
async fn resolved_config_builds_a_pipeline() {
    let resolved = WatcherConfig::from_ron(FULL).unwrap().resolve(full_env()).unwrap();
    assert!(Pipeline::from_config(resolved).is_ok());
}
