use std::collections::HashSet;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::debug;

use super::surface::RenderEvents;
use crate::config::ProbeSettings;
use crate::models::{OrderedMap, VisualElement, VISUAL_TIMEOUT_MESSAGE};

#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(15),
        }
    }
}

impl From<&ProbeSettings> for WaitPolicy {
    fn from(s: &ProbeSettings) -> Self {
        Self { poll_interval: s.poll_interval, timeout: s.render_timeout }
    }
}

/// What the event queues delivered before the wait ended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaitOutcome {
    pub rendered: HashSet<String>,
    /// Report-level error messages in arrival order.
    pub errors: Vec<String>,
    pub timed_out: bool,
}

impl WaitOutcome {
    fn drain(&mut self, events: &mut RenderEvents) {
        while let Ok(id) = events.rendered.try_recv() {
            self.rendered.insert(id);
        }
        while let Ok(msg) = events.errors.try_recv() {
            self.errors.push(msg);
        }
    }

    fn settled(&self, visuals: &[VisualElement]) -> bool {
        !self.errors.is_empty() || visuals.iter().all(|v| self.rendered.contains(&v.id))
    }
}

/// Wait until any error arrives, every visual has rendered, or the timeout elapses.
///
/// Conditions are checked up front, on each poll tick and whenever an event arrives.
/// A page without visuals settles immediately.
pub async fn await_page_render(
    visuals: &[VisualElement],
    events: &mut RenderEvents,
    policy: &WaitPolicy,
) -> WaitOutcome {
    let deadline = Instant::now() + policy.timeout;
    let mut outcome = WaitOutcome::default();

    loop {
        outcome.drain(events);
        if outcome.settled(visuals) {
            break;
        }

        let now = Instant::now();
        if now >= deadline {
            outcome.timed_out = true;
            break;
        }

        let wake = (now + policy.poll_interval).min(deadline);
        tokio::select! {
            Some(id) = events.rendered.recv() => {
                outcome.rendered.insert(id);
            }
            Some(msg) = events.errors.recv() => {
                outcome.errors.push(msg);
            }
            _ = sleep_until(wake) => {}
        }
    }

    debug!(
        visuals = visuals.len(),
        rendered = outcome.rendered.len(),
        errors = outcome.errors.len(),
        timed_out = outcome.timed_out,
        "Page wait finished"
    );
    outcome
}

/// Page error mapping: unrendered visuals by label first, then `report-error-<n>`.
///
/// A label already taken by another visual or by a report-error key becomes
/// `<label> (<id>)`, so every entry survives.
pub fn synthesize_page_errors(visuals: &[VisualElement], outcome: &WaitOutcome) -> OrderedMap<String> {
    let report_keys: Vec<String> = (1..=outcome.errors.len())
        .map(|n| format!("report-error-{}", n))
        .collect();

    let mut errors = OrderedMap::new();
    for v in visuals.iter().filter(|v| !outcome.rendered.contains(&v.id)) {
        let label = v.label();
        let key = if errors.contains_key(label) || report_keys.iter().any(|k| k == label) {
            format!("{} ({})", label, v.id)
        } else {
            label.to_string()
        };
        errors.insert(key, VISUAL_TIMEOUT_MESSAGE.to_string());
    }
    for (key, msg) in report_keys.into_iter().zip(&outcome.errors) {
        errors.insert(key, msg.clone());
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visual(id: &str, title: &str) -> VisualElement {
        VisualElement { id: id.into(), title: Some(title.into()), kind: "card".into() }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_visuals_pass_immediately() {
        let (_r, _e, mut events) = RenderEvents::channel();
        let started = Instant::now();
        let outcome = await_page_render(&[], &mut events, &WaitPolicy::default()).await;
        assert!(!outcome.timed_out);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(synthesize_page_errors(&[], &outcome).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_visual_never_renders() {
        let visuals = vec![visual("a", "Revenue"), visual("b", "Margin"), visual("c", "Units")];
        let (rendered_tx, _errors_tx, mut events) = RenderEvents::channel();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            rendered_tx.send("a".into()).unwrap();
            tokio::time::sleep(Duration::from_secs(3)).await;
            rendered_tx.send("b".into()).unwrap();
            // keep the sender alive past the timeout
            tokio::time::sleep(Duration::from_secs(60)).await;
            drop(rendered_tx);
        });

        let started = Instant::now();
        let outcome = await_page_render(&visuals, &mut events, &WaitPolicy::default()).await;
        assert!(outcome.timed_out);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(15) && waited < Duration::from_secs(16));

        let errors = synthesize_page_errors(&visuals, &outcome);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("Units").map(String::as_str), Some(VISUAL_TIMEOUT_MESSAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_rendered_ends_early() {
        let visuals = vec![visual("a", "Revenue"), visual("b", "Margin")];
        let (rendered_tx, _errors_tx, mut events) = RenderEvents::channel();
        rendered_tx.send("b".into()).unwrap();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            rendered_tx.send("a".into()).unwrap();
        });

        let started = Instant::now();
        let outcome = await_page_render(&visuals, &mut events, &WaitPolicy::default()).await;
        assert!(!outcome.timed_out);
        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(synthesize_page_errors(&visuals, &outcome).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_ends_wait_and_is_numbered() {
        let visuals = vec![visual("a", "Revenue"), visual("b", "")];
        let (rendered_tx, errors_tx, mut events) = RenderEvents::channel();
        rendered_tx.send("a".into()).unwrap();
        errors_tx.send("Dataset refresh failed".into()).unwrap();
        errors_tx.send("Token expired".into()).unwrap();

        let outcome = await_page_render(&visuals, &mut events, &WaitPolicy::default()).await;
        assert!(!outcome.timed_out);

        let errors = synthesize_page_errors(&visuals, &outcome);
        let keys: Vec<&str> = errors.keys().collect();
        assert_eq!(keys, vec!["b", "report-error-1", "report-error-2"]);
        assert_eq!(errors.get("report-error-2").map(String::as_str), Some("Token expired"));
    }

    #[test]
    fn test_colliding_labels_keep_every_entry() {
        let visuals = vec![
            visual("a", "report-error-1"),
            visual("b", "Sales"),
            visual("c", "Sales"),
        ];
        let outcome = WaitOutcome {
            rendered: HashSet::new(),
            errors: vec!["Dataset refresh failed".into()],
            timed_out: false,
        };

        let errors = synthesize_page_errors(&visuals, &outcome);
        let keys: Vec<&str> = errors.keys().collect();
        assert_eq!(keys, vec!["report-error-1 (a)", "Sales", "Sales (c)", "report-error-1"]);
        assert_eq!(errors.get("report-error-1 (a)").map(String::as_str), Some(VISUAL_TIMEOUT_MESSAGE));
        assert_eq!(errors.get("report-error-1").map(String::as_str), Some("Dataset refresh failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_ids_do_not_count() {
        let visuals = vec![visual("a", "Revenue")];
        let (rendered_tx, _errors_tx, mut events) = RenderEvents::channel();
        rendered_tx.send("other-page-visual".into()).unwrap();

        let policy = WaitPolicy { poll_interval: Duration::from_secs(1), timeout: Duration::from_secs(3) };
        let outcome = await_page_render(&visuals, &mut events, &policy).await;
        assert!(outcome.timed_out);
        assert_eq!(synthesize_page_errors(&visuals, &outcome).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_queues_still_time_out() {
        let visuals = vec![visual("a", "Revenue")];
        let (rendered_tx, errors_tx, mut events) = RenderEvents::channel();
        drop(rendered_tx);
        drop(errors_tx);

        let policy = WaitPolicy { poll_interval: Duration::from_secs(1), timeout: Duration::from_secs(4) };
        let started = Instant::now();
        let outcome = await_page_render(&visuals, &mut events, &policy).await;
        assert!(outcome.timed_out);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(4) && waited < Duration::from_secs(5));
    }
}
