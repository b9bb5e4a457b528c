// src/health/plan.rs
use super::probe::ProbeSpec;
use crate::config::Config;

/// Ordered probes for one invocation: primary endpoint, then the database
/// (when configured), then each extra endpoint in the order listed.
pub fn build_plan(config: &Config) -> Vec<ProbeSpec> {
    let mut plan = vec![ProbeSpec::primary(config.primary_endpoint.clone())];

    if let Some(target) = config.database_target() {
        plan.push(ProbeSpec::database(target));
    }

    if let Some(extras) = config.extra_endpoints.as_deref() {
        plan.extend(parse_extra_endpoints(extras).map(ProbeSpec::extra));
    }

    plan
}

/// Split a comma-separated endpoint list, trimming entries and skipping blanks.
/// URLs are not validated here; a malformed one fails its own probe.
pub fn parse_extra_endpoints(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|url| !url.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::probe::{ProbeKind, ProbeRole};
    use proptest::prelude::*;

    fn targets(plan: &[ProbeSpec]) -> Vec<&str> {
        plan.iter().map(|spec| spec.target()).collect()
    }

    #[test]
    fn test_default_config_plans_primary_only() {
        let plan = build_plan(&Config::default());

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].kind(), ProbeKind::HttpEndpoint);
        assert_eq!(plan[0].role(), ProbeRole::Primary);
        assert_eq!(plan[0].target(), "http://localhost:5000/health");
    }

    #[test]
    fn test_plan_order() {
        let config = Config {
            primary_endpoint: "http://svc/health".to_string(),
            database_url: Some("postgres://db/app".to_string()),
            extra_endpoints: Some("https://b.test,https://a.test".to_string()),
            ..Config::default()
        };

        let plan = build_plan(&config);

        assert_eq!(
            targets(&plan),
            vec!["http://svc/health", "postgres://db/app", "https://b.test", "https://a.test"]
        );
        let roles: Vec<_> = plan.iter().map(|spec| spec.role()).collect();
        assert_eq!(
            roles,
            vec![ProbeRole::Primary, ProbeRole::Database, ProbeRole::Extra, ProbeRole::Extra]
        );
        assert_eq!(plan[1].kind(), ProbeKind::DatabaseConnection);
    }

    #[test]
    fn test_no_database_probe_without_target() {
        for database_url in [None, Some(String::new()), Some("  ".to_string())] {
            let config = Config {
                database_url,
                extra_endpoints: Some("https://a.test".to_string()),
                ..Config::default()
            };
            let plan = build_plan(&config);

            assert!(plan
                .iter()
                .all(|spec| spec.kind() != ProbeKind::DatabaseConnection));
            assert_eq!(plan.len(), 2);
        }
    }

    #[test]
    fn test_extra_endpoints_are_trimmed_and_blanks_dropped() {
        let parsed: Vec<_> = parse_extra_endpoints(" https://a.test , ,https://b.test ").collect();
        assert_eq!(parsed, vec!["https://a.test", "https://b.test"]);

        assert_eq!(parse_extra_endpoints("").count(), 0);
        assert_eq!(parse_extra_endpoints(" , ,, ").count(), 0);
    }

    #[test]
    fn test_malformed_extra_is_still_planned() {
        let config = Config {
            extra_endpoints: Some("not a url".to_string()),
            ..Config::default()
        };
        let plan = build_plan(&config);
        assert_eq!(plan[1].target(), "not a url");
    }

    proptest! {
        #[test]
        fn prop_parsed_entries_are_trimmed_and_non_empty(list in "[a-z:/. ,]{0,64}") {
            for entry in parse_extra_endpoints(&list) {
                prop_assert!(!entry.is_empty());
                prop_assert_eq!(entry, entry.trim());
                prop_assert!(!entry.contains(','));
            }
        }

        #[test]
        fn prop_parsing_keeps_listed_order(
            hosts in proptest::collection::vec("[a-z]{1,8}", 0..8),
            padding in " {0,3}",
        ) {
            let urls: Vec<String> = hosts.iter().map(|h| format!("https://{}.test", h)).collect();
            let list = urls
                .iter()
                .map(|url| format!("{padding}{url}{padding}"))
                .collect::<Vec<_>>()
                .join(",");

            let parsed: Vec<_> = parse_extra_endpoints(&list).collect();
            prop_assert_eq!(parsed, urls.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }
}
