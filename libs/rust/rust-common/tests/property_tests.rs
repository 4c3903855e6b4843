//! Property-based tests for rust-common crate.

use proptest::prelude::*;
use rust_common::{HttpConfig, PlatformError, build_http_client};
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_http_config_builder_keeps_values(
        timeout_secs in 1u64..600,
        connect_secs in 1u64..60,
        agent in "[a-z-]{1,20}/[0-9]\\.[0-9]",
    ) {
        let config = HttpConfig::default()
            .with_timeout(Duration::from_secs(timeout_secs))
            .with_connect_timeout(Duration::from_secs(connect_secs))
            .with_user_agent(agent.clone());

        prop_assert_eq!(config.timeout, Duration::from_secs(timeout_secs));
        prop_assert_eq!(config.connect_timeout, Duration::from_secs(connect_secs));
        prop_assert_eq!(&config.user_agent, &agent);
        prop_assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn prop_error_messages_carry_context(msg in "[a-zA-Z0-9 ]{1,50}") {
        let errors = [
            PlatformError::invalid_input(msg.clone()),
            PlatformError::internal(msg.clone()),
        ];

        for err in errors {
            prop_assert!(err.to_string().contains(&msg), "{err} should mention {msg}");
        }
    }
}
