use std::env;

use chrono::Duration;
use leaveflow::config::{Config, DEFAULT_PAYROLL_TIMEZONE};
use serial_test::serial;

mod common;

const KEYS: [&str; 8] = [
    "DATABASE_URL",
    "HOST",
    "PORT",
    "ENVIRONMENT",
    "CORS_ALLOWED_ORIGIN",
    "PAYROLL_TIMEZONE",
    "ESCALATION_INTERVAL_SECS",
    "ESCALATION_IDLE_HOURS",
];

/// Run `f` with the config keys set to `values`, restoring the previous environment afterwards
fn with_env(values: &[(&str, &str)], f: impl FnOnce()) {
    let original: Vec<(&str, Option<String>)> =
        KEYS.iter().map(|key| (*key, env::var(key).ok())).collect();

    unsafe {
        for key in KEYS {
            env::remove_var(key);
        }
        for (key, value) in values {
            env::set_var(key, value);
        }
    }

    f();

    unsafe {
        for (key, value) in original {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
    }
}

#[test]
#[serial]
fn test_config_defaults() {
    common::setup_test_env();

    with_env(&[], || {
        let config = Config::from_env_only().unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.environment, "development");
        assert!(config.is_development());
        assert_eq!(config.payroll_timezone, DEFAULT_PAYROLL_TIMEZONE);
        assert_eq!(
            config.payroll_timezone().unwrap(),
            chrono_tz::America::Mexico_City
        );

        let settings = config.escalation_settings();
        assert_eq!(settings.interval_secs, 3600);
        assert_eq!(settings.idle_threshold, Duration::hours(24));
    });
}

#[test]
#[serial]
fn test_config_custom_values() {
    common::setup_test_env();

    with_env(
        &[
            ("DATABASE_URL", "postgres://leave:leave@db:5432/leave"),
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("ENVIRONMENT", "production"),
            ("PAYROLL_TIMEZONE", "America/Monterrey"),
            ("ESCALATION_INTERVAL_SECS", "600"),
            ("ESCALATION_IDLE_HOURS", "48"),
        ],
        || {
            let config = Config::from_env_only().unwrap();

            assert_eq!(config.database_url, "postgres://leave:leave@db:5432/leave");
            assert_eq!(config.server_address(), "0.0.0.0:9000");
            assert!(config.is_production());
            assert_eq!(
                config.payroll_timezone().unwrap(),
                chrono_tz::America::Monterrey
            );

            let settings = config.escalation_settings();
            assert_eq!(settings.interval_secs, 600);
            assert_eq!(settings.idle_threshold, Duration::hours(48));
        },
    );
}

#[test]
#[serial]
fn test_invalid_values_fall_back_or_fail() {
    common::setup_test_env();

    with_env(
        &[
            ("PORT", "not-a-port"),
            ("ESCALATION_IDLE_HOURS", "soon"),
            ("PAYROLL_TIMEZONE", "Mars/Olympus_Mons"),
        ],
        || {
            let config = Config::from_env_only().unwrap();

            assert_eq!(config.port, 8080);
            assert_eq!(config.escalation_idle_hours, 24);
            assert!(config.payroll_timezone().is_err());
        },
    );
}
