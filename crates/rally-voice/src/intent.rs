//! Intent routing for voice queries.
//!
//! An ordered list of (pattern, handler) routes evaluated first-match-wins.
//! Anything that matches no route goes to the remote model.

use std::sync::LazyLock;

use regex::Regex;

use rally_core::{StatStore, Timestamp};

use crate::answers;

/// Local analytics intents the assistant can answer without the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    /// "How long are the points?"
    PointDuration,
    /// "How fast are the serves?"
    ServeSpeed,
}

/// Produces an answer for a matched intent from the session statistics.
pub type AnswerFn = fn(&StatStore, Timestamp) -> String;

/// A single compiled route.
pub struct IntentRoute {
    pub pattern: Regex,
    pub intent: Intent,
    pub answer: AnswerFn,
}

// Priority order matters: point duration is checked before serve speed.
static DEFAULT_ROUTES: LazyLock<Vec<(Regex, Intent, AnswerFn)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(?i)duraci[oó]n.*punto").expect("Invalid intent regex"),
            Intent::PointDuration,
            answers::point_duration as AnswerFn,
        ),
        (
            Regex::new(r"(?i)velocidad.*saque").expect("Invalid intent regex"),
            Intent::ServeSpeed,
            answers::serve_speed as AnswerFn,
        ),
    ]
});

/// First-match-wins intent router.
pub struct IntentRouter {
    routes: Vec<IntentRoute>,
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentRouter {
    /// Router with the built-in analytics routes.
    pub fn new() -> Self {
        let routes = DEFAULT_ROUTES
            .iter()
            .map(|(pattern, intent, answer)| IntentRoute {
                pattern: pattern.clone(),
                intent: *intent,
                answer: *answer,
            })
            .collect();
        Self { routes }
    }

    /// Router with no routes; every query falls through to the model.
    pub fn empty() -> Self {
        Self { routes: Vec::new() }
    }

    /// Append a route after the existing ones.
    #[cfg(test)]
    pub(crate) fn push(&mut self, pattern: Regex, intent: Intent, answer: AnswerFn) {
        self.routes.push(IntentRoute {
            pattern,
            intent,
            answer,
        });
    }

    pub fn routes(&self) -> &[IntentRoute] {
        &self.routes
    }

    /// The first route whose pattern matches `text`.
    pub fn route(&self, text: &str) -> Option<&IntentRoute> {
        self.routes.iter().find(|r| r.pattern.is_match(text))
    }

    #[cfg(test)]
    pub(crate) fn classify(&self, text: &str) -> Option<Intent> {
        self.route(text).map(|r| r.intent)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_duration_patterns() {
        let router = IntentRouter::new();
        for text in [
            "cuál es la duración de los puntos",
            "duracion media por punto",
            "DURACIÓN DEL PUNTO",
        ] {
            assert_eq!(router.classify(text), Some(Intent::PointDuration), "{text}");
        }
    }

    #[test]
    fn test_serve_speed_patterns() {
        let router = IntentRouter::new();
        for text in [
            "qué velocidad tiene el saque",
            "velocidad máxima de saque",
            "Velocidad del Saque",
        ] {
            assert_eq!(router.classify(text), Some(Intent::ServeSpeed), "{text}");
        }
    }

    #[test]
    fn test_words_out_of_order_do_not_match() {
        let router = IntentRouter::new();
        assert_eq!(router.classify("punto de duración"), None);
        assert_eq!(router.classify("saque con velocidad"), None);
    }

    #[test]
    fn test_first_match_wins() {
        let router = IntentRouter::new();
        let text = "velocidad del saque y duración del punto";
        // Both match; point duration is listed first.
        assert_eq!(router.classify(text), Some(Intent::PointDuration));
    }

    #[test]
    fn test_unmatched_falls_through() {
        let router = IntentRouter::new();
        assert_eq!(router.classify("quién ganó ayer"), None);
        assert_eq!(router.classify(""), None);
    }

    #[test]
    fn test_empty_router_matches_nothing() {
        let router = IntentRouter::empty();
        assert!(router.routes().is_empty());
        assert_eq!(router.classify("duración del punto"), None);
    }

    #[test]
    fn test_push_appends_lower_priority_route() {
        fn custom(_: &StatStore, _: Timestamp) -> String {
            "custom".to_string()
        }

        let mut router = IntentRouter::new();
        router.push(
            Regex::new(r"(?i)saque").unwrap(),
            Intent::ServeSpeed,
            custom,
        );
        assert_eq!(router.routes().len(), 3);

        // The built-in serve route still wins.
        let route = router.route("velocidad del saque").unwrap();
        assert_ne!((route.answer)(&StatStore::new(), 0), "custom");

        // Only the custom route matches this one.
        let route = router.route("un saque").unwrap();
        assert_eq!((route.answer)(&StatStore::new(), 0), "custom");
    }

    #[test]
    fn test_route_answers_from_stats() {
        let router = IntentRouter::new();
        let mut stats = StatStore::new();
        stats.record_serve(201.0);
        let route = router.route("velocidad del saque").unwrap();
        assert!((route.answer)(&stats, 0).contains("201 km/h"));
    }
}
