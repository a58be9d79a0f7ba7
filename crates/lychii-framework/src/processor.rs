//! Per-plugin message processor.
//!
//! A [`MessageProcessor`] is an ordered list of `(pattern, handler)` entries.
//! For each message every entry whose pattern matches runs, in registration
//! order. A match never short-circuits the entries after it, so several
//! independent responders can react to the same message.
//!
//! Handlers receive the message mutably. A change made by one handler (or
//! its pre-hook) is visible to every entry and plugin that runs after it for
//! the same message.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut processor = MessageProcessor::new();
//!
//! // Bare handler: matches against the trimmed text.
//! processor.register(Regex::new(r"^ping$")?, |msg: &mut InboundMessage, _: &Matches| -> HandlerResult {
//!     session.reply("pong", msg)?;
//!     Ok(())
//! });
//!
//! // Full specification: pre-hook and raw text.
//! processor.register(
//!     Regex::new(r"(?i)^deploy (\w+)")?,
//!     ProcessorSpec::new(deploy).pre(check_permissions).use_raw_text(true),
//! );
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use regex::{Captures, Regex};
use tracing::{error, trace, warn};

use lychii_core::InboundMessage;

use crate::error::{HandlerError, HandlerResult, PluginResult};

// =============================================================================
// Matches
// =============================================================================

/// Owned result of a successful pattern match.
///
/// Captures are copied out of the message text so that handlers can take the
/// message by `&mut` while still reading their groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matches {
    groups: Vec<Option<String>>,
    named: HashMap<String, String>,
    words: Vec<String>,
}

impl Matches {
    fn new(pattern: &Regex, captures: &Captures<'_>, text: &str) -> Self {
        let groups = captures
            .iter()
            .map(|group| group.map(|m| m.as_str().to_string()))
            .collect();

        let named = pattern
            .capture_names()
            .flatten()
            .filter_map(|name| {
                captures
                    .name(name)
                    .map(|m| (name.to_string(), m.as_str().to_string()))
            })
            .collect();

        let words = text.split(' ').map(str::to_string).collect();

        Self {
            groups,
            named,
            words,
        }
    }

    /// Returns the whole match (group 0).
    pub fn whole(&self) -> &str {
        self.get(0).unwrap_or_default()
    }

    /// Returns capture group `index`, if it participated in the match.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|group| group.as_deref())
    }

    /// Returns the named capture group `name`, if it participated in the match.
    pub fn name(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    /// Number of groups, including group 0.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The trimmed message text split on single spaces.
    pub fn words(&self) -> &[String] {
        &self.words
    }
}

// =============================================================================
// Processor specification
// =============================================================================

/// A boxed handler or pre-hook.
pub type HandlerFn = Box<dyn Fn(&mut InboundMessage, &Matches) -> HandlerResult + Send + Sync>;

/// Everything about a processor entry except its pattern.
pub struct ProcessorSpec {
    handler: HandlerFn,
    pre: Option<HandlerFn>,
    use_raw_text: bool,
}

impl ProcessorSpec {
    /// Creates a specification that matches against the trimmed text.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&mut InboundMessage, &Matches) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            pre: None,
            use_raw_text: false,
        }
    }

    /// Sets a hook that runs before the handler on every match.
    ///
    /// If the hook fails, the handler of this entry is skipped.
    pub fn pre<F>(mut self, pre: F) -> Self
    where
        F: Fn(&mut InboundMessage, &Matches) -> HandlerResult + Send + Sync + 'static,
    {
        self.pre = Some(Box::new(pre));
        self
    }

    /// Matches against the raw text instead of the trimmed text.
    pub fn use_raw_text(mut self, use_raw_text: bool) -> Self {
        self.use_raw_text = use_raw_text;
        self
    }
}

impl fmt::Debug for ProcessorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorSpec")
            .field("pre", &self.pre.is_some())
            .field("use_raw_text", &self.use_raw_text)
            .finish_non_exhaustive()
    }
}

/// Anything that can be registered with [`MessageProcessor::register`]:
/// a [`ProcessorSpec`] or a bare handler.
pub trait IntoProcessor {
    fn into_processor(self) -> ProcessorSpec;
}

impl IntoProcessor for ProcessorSpec {
    fn into_processor(self) -> ProcessorSpec {
        self
    }
}

impl<F> IntoProcessor for F
where
    F: Fn(&mut InboundMessage, &Matches) -> HandlerResult + Send + Sync + 'static,
{
    fn into_processor(self) -> ProcessorSpec {
        ProcessorSpec::new(self)
    }
}

// =============================================================================
// MessageProcessor
// =============================================================================

struct ProcessorEntry {
    pattern: Regex,
    spec: ProcessorSpec,
}

/// Ordered list of processor entries owned by one plugin.
#[derive(Default)]
pub struct MessageProcessor {
    entries: Vec<ProcessorEntry>,
}

impl MessageProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. Entries are evaluated in registration order.
    pub fn register(&mut self, pattern: Regex, processor: impl IntoProcessor) -> &mut Self {
        self.entries.push(ProcessorEntry {
            pattern,
            spec: processor.into_processor(),
        });
        self
    }

    /// Compiles `pattern` and appends an entry.
    pub fn register_str(
        &mut self,
        pattern: &str,
        processor: impl IntoProcessor,
    ) -> PluginResult<&mut Self> {
        let pattern = Regex::new(pattern)?;
        Ok(self.register(pattern, processor))
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs every matching entry against `message`, in registration order.
    ///
    /// Handler errors and panics are logged and do not stop later entries.
    /// Returns the number of entries whose pattern matched.
    pub fn process(&self, message: &mut InboundMessage) -> usize {
        let mut matched = 0;

        for (index, entry) in self.entries.iter().enumerate() {
            let subject = if entry.spec.use_raw_text {
                &message.raw_text
            } else {
                &message.text
            };
            let Some(captures) = entry.pattern.captures(subject) else {
                continue;
            };
            let matches = Matches::new(&entry.pattern, &captures, &message.text);
            matched += 1;
            trace!(index, pattern = %entry.pattern, "Processor matched");

            if let Some(pre) = &entry.spec.pre
                && let Err(e) = invoke(pre, message, &matches)
            {
                warn!(
                    index,
                    pattern = %entry.pattern,
                    error = %e,
                    "Pre-hook failed, skipping handler"
                );
                continue;
            }

            if let Err(e) = invoke(&entry.spec.handler, message, &matches) {
                error!(
                    index,
                    pattern = %entry.pattern,
                    error = %e,
                    "Handler returned an error"
                );
            }
        }

        matched
    }
}

impl fmt::Debug for MessageProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| entry.pattern.as_str()))
            .finish()
    }
}

/// Calls `f`, turning a panic into a [`HandlerError`].
fn invoke(f: &HandlerFn, message: &mut InboundMessage, matches: &Matches) -> HandlerResult {
    match catch_unwind(AssertUnwindSafe(|| f(message, matches))) {
        Ok(result) => result,
        Err(payload) => Err(panic_error(payload)),
    }
}

pub(crate) fn panic_error(payload: Box<dyn Any + Send>) -> HandlerError {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("handler panicked: {detail}").into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lychii_core::{Channel, User};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn message(text: &str) -> InboundMessage {
        InboundMessage::new(text, User::default(), Channel::named("C1", "general"))
    }

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> ProcessorSpec {
        let log = log.clone();
        ProcessorSpec::new(move |_, _| {
            log.lock().push(tag.to_string());
            Ok(())
        })
    }

    #[test]
    fn test_all_matching_entries_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut processor = MessageProcessor::new();
        processor
            .register(Regex::new("hi").unwrap(), recorder(&log, "A"))
            .register(Regex::new("nope").unwrap(), recorder(&log, "X"))
            .register(Regex::new("^hi").unwrap(), recorder(&log, "B"))
            .register(Regex::new("there$").unwrap(), recorder(&log, "C"));

        let matched = processor.process(&mut message("hi there"));

        assert_eq!(matched, 3);
        assert_eq!(*log.lock(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_pre_hook_runs_before_handler_and_can_mutate() {
        let seen = Arc::new(Mutex::new(None));
        let seen_in_handler = seen.clone();

        let spec = ProcessorSpec::new(move |msg, _| {
            *seen_in_handler.lock() = Some(msg.text.clone());
            Ok(())
        })
        .pre(|msg, _| {
            msg.text = msg.text.to_uppercase();
            Ok(())
        });

        let mut processor = MessageProcessor::new();
        processor.register(Regex::new("echo").unwrap(), spec);
        processor.process(&mut message("echo me"));

        assert_eq!(seen.lock().as_deref(), Some("ECHO ME"));
    }

    #[test]
    fn test_mutation_is_visible_to_later_entries() {
        let mut processor = MessageProcessor::new();
        processor
            .register(
                Regex::new("^first").unwrap(),
                |msg: &mut InboundMessage, _: &Matches| -> HandlerResult {
                    msg.text = "second".into();
                    Ok(())
                },
            )
            .register(
                Regex::new("^second$").unwrap(),
                |msg: &mut InboundMessage, _: &Matches| -> HandlerResult {
                    msg.topic = Some("rewritten".into());
                    Ok(())
                },
            );

        let mut msg = message("first");
        assert_eq!(processor.process(&mut msg), 2);
        assert_eq!(msg.topic.as_deref(), Some("rewritten"));
    }

    #[test]
    fn test_failing_pre_hook_skips_only_its_handler() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut processor = MessageProcessor::new();

        let log_a = log.clone();
        processor.register(
            Regex::new("go").unwrap(),
            ProcessorSpec::new(move |_, _| {
                log_a.lock().push("A".to_string());
                Ok(())
            })
            .pre(|_, _| Err("not allowed".into())),
        );
        processor.register(Regex::new("go").unwrap(), recorder(&log, "B"));

        processor.process(&mut message("go"));
        assert_eq!(*log.lock(), vec!["B"]);
    }

    #[test]
    fn test_errors_and_panics_are_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut processor = MessageProcessor::new();
        processor
            .register(
                Regex::new(".").unwrap(),
                ProcessorSpec::new(|_, _| Err("boom".into())),
            )
            .register(
                Regex::new(".").unwrap(),
                ProcessorSpec::new(|_, _| panic!("handler bug")),
            )
            .register(Regex::new(".").unwrap(), recorder(&log, "survivor"));

        assert_eq!(processor.process(&mut message("x")), 3);
        assert_eq!(*log.lock(), vec!["survivor"]);
    }

    #[test]
    fn test_use_raw_text_matches_untrimmed_text() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut processor = MessageProcessor::new();
        processor
            .register(Regex::new("^lychii").unwrap(), recorder(&log, "trimmed"))
            .register(
                Regex::new("^lychii").unwrap(),
                recorder(&log, "raw").use_raw_text(true),
            );

        let mut msg = message("lychii status");
        msg.text = "status".into();
        processor.process(&mut msg);

        assert_eq!(*log.lock(), vec!["raw"]);
    }

    #[test]
    fn test_matches_expose_groups_and_words() {
        let captured = Arc::new(Mutex::new(Matches::default()));
        let sink = captured.clone();

        let mut processor = MessageProcessor::new();
        processor
            .register_str(
                r"^deploy (?P<service>\w+)(?: to (\w+))?",
                ProcessorSpec::new(move |_, m| {
                    *sink.lock() = m.clone();
                    Ok(())
                }),
            )
            .unwrap();

        processor.process(&mut message("deploy api now"));

        let m = captured.lock();
        assert_eq!(m.whole(), "deploy api");
        assert_eq!(m.get(1), Some("api"));
        assert_eq!(m.get(2), None);
        assert_eq!(m.name("service"), Some("api"));
        assert_eq!(m.len(), 3);
        assert_eq!(m.words(), ["deploy", "api", "now"]);
    }

    #[test]
    fn test_empty_text_matches_nothing_anchored() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut processor = MessageProcessor::new();
        processor.register(Regex::new(r"^\w+").unwrap(), recorder(&log, "A"));

        assert_eq!(processor.process(&mut message("")), 0);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let mut processor = MessageProcessor::new();
        let result = processor.register_str("(unclosed", ProcessorSpec::new(|_, _| Ok(())));
        tokio_test::assert_err!(result);
        assert!(processor.is_empty());
    }
}
