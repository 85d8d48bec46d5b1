//! Activation routes: `/{screen}/_test/{scenario}/{count}/{tags...}?mock=...`.
//!
//! Parsing is total. Anything malformed after the marker degrades to "no test
//! configuration" for that route while the screen path is kept, so a typo in
//! a test URL never breaks the host application's navigation.

use mirage_core::EndpointSelector;
use mirage_core::config::RouteConfig;
use mirage_deps::tracing;
use mirage_deps::url::{Url, form_urlencoded};
use serde::Serialize;
use std::collections::BTreeSet;

const MOCK_PARAM: &str = "mock";
const REAL_PARAM: &str = "real";

/// How endpoints are mocked for a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MockMode {
    /// Every endpoint is mocked (no directive, or `?mock=all`)
    #[default]
    All,
    /// No endpoint is mocked (`?mock=none`)
    None,
    /// Only the listed endpoints are mocked, or all but the listed ones
    Explicit,
}

/// Per-endpoint mock/real directives taken from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MockDirectives {
    /// Endpoints named by `?mock=a,b`
    pub enabled: BTreeSet<EndpointSelector>,
    /// Endpoints named by `?real=a,b`
    pub disabled: BTreeSet<EndpointSelector>,
    /// Overall mode
    pub mode: MockMode,
}

/// Test configuration carried by an activation route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRouteConfig {
    /// Screen the route renders, always starting with `/`
    pub screen_path: String,
    /// Scenario to activate
    pub scenario_id: Option<String>,
    /// Number of items the screen should show
    pub item_count: Option<u64>,
    /// Free-form tags in first-occurrence order
    pub tags: Vec<String>,
    /// Query string directives
    pub mock_directives: MockDirectives,
}

impl TestRouteConfig {
    /// Route for `screen_path` with no test parameters
    #[must_use]
    pub fn screen(screen_path: impl Into<String>) -> Self {
        Self {
            screen_path: screen_path.into(),
            scenario_id: None,
            item_count: None,
            tags: Vec::new(),
            mock_directives: MockDirectives::default(),
        }
    }

    /// Whether `tag` was given
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }
}

/// Parses and builds activation routes around a marker segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteParser {
    marker: String,
}

impl Default for RouteParser {
    fn default() -> Self {
        Self::new(&RouteConfig::default())
    }
}

impl RouteParser {
    /// Parser using the configured marker
    #[must_use]
    pub fn new(config: &RouteConfig) -> Self {
        Self {
            marker: config.marker.clone(),
        }
    }

    /// Marker segment separating screen path from test parameters
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Parse a path and query string (with or without the leading `?`).
    pub fn parse(&self, pathname: &str, search: &str) -> TestRouteConfig {
        let segments: Vec<&str> = pathname
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        let Some(marker_index) = segments.iter().position(|segment| *segment == self.marker)
        else {
            let mut config = TestRouteConfig::screen(join_path(&segments));
            config.mock_directives = parse_directives(search);
            return config;
        };

        let mut config = TestRouteConfig::screen(join_path(&segments[..marker_index]));
        config.mock_directives = parse_directives(search);

        let mut rest = segments[marker_index + 1..].iter().copied();
        let Some(scenario) = rest.next() else {
            return config;
        };
        if !is_scenario_id(scenario) {
            tracing::warn!("Ignoring test route with malformed scenario segment {scenario:?}");
            return config;
        }

        let mut remaining: Vec<&str> = rest.collect();
        let mut item_count = None;
        if let Some(first) = remaining.first()
            && !first.is_empty()
            && first.bytes().all(|byte| byte.is_ascii_digit())
        {
            let Ok(count) = first.parse::<u64>() else {
                tracing::warn!("Ignoring test route with out-of-range item count {first:?}");
                return config;
            };
            item_count = Some(count);
            remaining.remove(0);
        }

        let mut tags: Vec<String> = Vec::with_capacity(remaining.len());
        for tag in remaining {
            if !tags.iter().any(|seen| seen == tag) {
                tags.push(tag.to_owned());
            }
        }

        config.scenario_id = Some(scenario.to_owned());
        config.item_count = item_count;
        config.tags = tags;
        config
    }

    /// Parse a full href, relative (`/a/_test/x?mock=all`) or absolute.
    pub fn parse_href(&self, href: &str) -> TestRouteConfig {
        if let Ok(url) = Url::parse(href)
            && url.has_host()
        {
            return self.parse(url.path(), url.query().unwrap_or_default());
        }
        let without_fragment = href.split('#').next().unwrap_or_default();
        let (path, query) = without_fragment
            .split_once('?')
            .unwrap_or((without_fragment, ""));
        self.parse(path, query)
    }

    /// Build the href for `config`; absent optional parts are left out.
    pub fn build(&self, config: &TestRouteConfig) -> String {
        let mut href = config.screen_path.trim_end_matches('/').to_owned();

        if let Some(scenario) = &config.scenario_id {
            href.push('/');
            href.push_str(&self.marker);
            href.push('/');
            href.push_str(scenario);
            if let Some(count) = config.item_count {
                href.push('/');
                href.push_str(&count.to_string());
            }
            for tag in &config.tags {
                href.push('/');
                href.push_str(tag);
            }
        }
        if href.is_empty() {
            href.push('/');
        }

        if let Some(query) = build_directives(&config.mock_directives) {
            href.push('?');
            href.push_str(&query);
        }
        href
    }
}

/// Parse with the default `_test` marker.
pub fn parse(pathname: &str, search: &str) -> TestRouteConfig {
    RouteParser::default().parse(pathname, search)
}

/// Parse an href with the default `_test` marker.
pub fn parse_href(href: &str) -> TestRouteConfig {
    RouteParser::default().parse_href(href)
}

/// Build an href with the default `_test` marker.
pub fn build(config: &TestRouteConfig) -> String {
    RouteParser::default().build(config)
}

fn join_path(segments: &[&str]) -> String {
    format!("/{}", segments.join("/"))
}

fn is_scenario_id(segment: &str) -> bool {
    segment
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_alphanumeric())
        && segment
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
}

fn parse_directives(search: &str) -> MockDirectives {
    let query = search.strip_prefix('?').unwrap_or(search);
    let mut mock = None;
    let mut real = None;
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        match name.as_ref() {
            MOCK_PARAM if mock.is_none() => mock = Some(value.into_owned()),
            REAL_PARAM if real.is_none() => real = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(value) = mock {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => return MockDirectives::default(),
            "none" => {
                return MockDirectives {
                    mode: MockMode::None,
                    ..MockDirectives::default()
                };
            }
            _ => {}
        }
        let enabled = selectors(&value);
        if !enabled.is_empty() {
            return MockDirectives {
                enabled,
                disabled: BTreeSet::new(),
                mode: MockMode::Explicit,
            };
        }
    } else if let Some(value) = real {
        let disabled = selectors(&value);
        if !disabled.is_empty() {
            return MockDirectives {
                enabled: BTreeSet::new(),
                disabled,
                mode: MockMode::Explicit,
            };
        }
    }
    MockDirectives::default()
}

fn selectors(list: &str) -> BTreeSet<EndpointSelector> {
    list.split(',')
        .filter(|item| !item.trim().is_empty())
        .filter_map(|item| match EndpointSelector::parse(item) {
            Ok(selector) => Some(selector),
            Err(err) => {
                tracing::warn!("Ignoring mock directive entry {item:?}: {err}");
                None
            }
        })
        .collect()
}

fn build_directives(directives: &MockDirectives) -> Option<String> {
    let join = |set: &BTreeSet<EndpointSelector>| {
        set.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    };
    let (name, value) = match directives.mode {
        MockMode::All => return None,
        MockMode::None => (MOCK_PARAM, "none".to_owned()),
        MockMode::Explicit if !directives.enabled.is_empty() => {
            (MOCK_PARAM, join(&directives.enabled))
        }
        MockMode::Explicit if !directives.disabled.is_empty() => {
            (REAL_PARAM, join(&directives.disabled))
        }
        MockMode::Explicit => return None,
    };
    Some(
        form_urlencoded::Serializer::new(String::new())
            .append_pair(name, &value)
            .finish(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments(items: &[&str]) -> BTreeSet<EndpointSelector> {
        items
            .iter()
            .map(|item| EndpointSelector::parse(item).unwrap())
            .collect()
    }

    #[test]
    fn test_full_route() {
        let config = parse("/chat/_test/empty/10", "");
        assert_eq!(config.screen_path, "/chat");
        assert_eq!(config.scenario_id.as_deref(), Some("empty"));
        assert_eq!(config.item_count, Some(10));
        assert!(config.tags.is_empty());
        assert_eq!(config.mock_directives, MockDirectives::default());
    }

    #[test]
    fn test_nested_screen_and_tags() {
        let config = parse("/settings/profile/_test/error/slow/offline/slow", "");
        assert_eq!(config.screen_path, "/settings/profile");
        assert_eq!(config.scenario_id.as_deref(), Some("error"));
        assert_eq!(config.item_count, None);
        assert_eq!(config.tags, vec!["slow".to_owned(), "offline".to_owned()]);
        assert!(config.has_tag("offline"));
    }

    #[test]
    fn test_no_marker() {
        let config = parse("/chat/sessions", "");
        assert_eq!(config, TestRouteConfig::screen("/chat/sessions"));
    }

    #[test]
    fn test_marker_without_scenario() {
        let config = parse("/chat/_test", "");
        assert_eq!(config, TestRouteConfig::screen("/chat"));
        let config = parse("/chat/_test/", "");
        assert_eq!(config, TestRouteConfig::screen("/chat"));
    }

    #[test]
    fn test_second_marker_becomes_a_tag() {
        let config = parse("/a/_test/empty/_test/x", "");
        assert_eq!(config.screen_path, "/a");
        assert_eq!(config.tags, vec!["_test".to_owned(), "x".to_owned()]);
    }

    #[test]
    fn test_malformed_segments_degrade() {
        let config = parse("/a/_test/%%bad/10", "");
        assert_eq!(config, TestRouteConfig::screen("/a"));

        let config = parse("/a/_test/empty/99999999999999999999999/x", "");
        assert_eq!(config, TestRouteConfig::screen("/a"));
    }

    #[test]
    fn test_query_directives() {
        let mock = parse("/a", "?mock=sessions,messages");
        assert_eq!(mock.mock_directives.mode, MockMode::Explicit);
        assert_eq!(mock.mock_directives.enabled, fragments(&["sessions", "messages"]));

        let real = parse("/a", "real=sessions");
        assert_eq!(real.mock_directives.mode, MockMode::Explicit);
        assert_eq!(real.mock_directives.disabled, fragments(&["sessions"]));

        assert_eq!(parse("/a", "mock=all").mock_directives, MockDirectives::default());
        assert_eq!(parse("/a", "mock=none").mock_directives.mode, MockMode::None);
    }

    #[test]
    fn test_mock_wins_over_real() {
        let config = parse("/a", "real=x&mock=y");
        assert_eq!(config.mock_directives.enabled, fragments(&["y"]));
        assert!(config.mock_directives.disabled.is_empty());
    }

    #[test]
    fn test_full_endpoint_key_in_directive() {
        let config = parse("/a", "mock=GET+%2Fapi%2Fitems%2F%3Aid,sessions");
        assert_eq!(
            config.mock_directives.enabled,
            fragments(&["GET /api/items/:id", "sessions"])
        );
    }

    #[test]
    fn test_parse_href() {
        let relative = parse_href("/chat/_test/slow?mock=none#top");
        assert_eq!(relative.scenario_id.as_deref(), Some("slow"));
        assert_eq!(relative.mock_directives.mode, MockMode::None);

        let absolute = parse_href("http://localhost:3000/chat/_test/empty/3?real=sessions");
        assert_eq!(absolute.screen_path, "/chat");
        assert_eq!(absolute.item_count, Some(3));
        assert_eq!(absolute.mock_directives.disabled, fragments(&["sessions"]));
    }

    #[test]
    fn test_build_omits_absent_parts() {
        assert_eq!(build(&TestRouteConfig::screen("/chat")), "/chat");
        assert_eq!(build(&TestRouteConfig::screen("/")), "/");

        let mut config = TestRouteConfig::screen("/chat");
        config.scenario_id = Some("empty".to_owned());
        config.item_count = Some(10);
        assert_eq!(build(&config), "/chat/_test/empty/10");
    }

    #[test]
    fn test_round_trip() {
        let hrefs = [
            "/",
            "/chat",
            "/_test/empty",
            "/chat/_test/empty/10",
            "/settings/profile/_test/error/slow/paginated",
            "/chat/_test/very-slow/0/loading?mock=none",
            "/chat/_test/empty?mock=messages%2Csessions",
            "/chat?real=sessions",
            "/chat/_test/default?mock=GET+%2Fapi%2Fitems%2F%3Aid",
        ];
        for href in hrefs {
            let config = parse_href(href);
            let rebuilt = build(&config);
            assert_eq!(parse_href(&rebuilt), config, "round trip failed for {href}");
        }
    }

    #[test]
    fn test_custom_marker() {
        let parser = RouteParser::new(&RouteConfig {
            marker: "__mock".to_owned(),
        });
        let config = parser.parse("/inbox/__mock/error", "");
        assert_eq!(config.scenario_id.as_deref(), Some("error"));
        assert_eq!(parser.build(&config), "/inbox/__mock/error");
        assert_eq!(parser.parse("/inbox/_test/error", "").scenario_id, None);
    }
}
