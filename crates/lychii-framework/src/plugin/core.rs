use lychii_core::InboundMessage;

use crate::error::HandlerError;
use crate::processor::MessageProcessor;

/// A live plugin instance.
///
/// A plugin owns a [`MessageProcessor`] and registers its patterns either
/// while it is constructed or from [`init`](Plugin::init). The registry calls
/// `init` once, after every plugin has been registered, then hands each
/// accepted message to [`process_message`](Plugin::process_message).
///
/// # Example
///
/// ```rust,ignore
/// struct Ping {
///     processor: MessageProcessor,
/// }
///
/// impl Ping {
///     fn create(session: SessionHandle) -> Box<dyn Plugin> {
///         let mut processor = MessageProcessor::new();
///         processor.register(Regex::new("^ping$").unwrap(), ProcessorSpec::new(move |msg, _| {
///             session.reply("pong", msg)?;
///             Ok(())
///         }));
///         Box::new(Self { processor })
///     }
/// }
///
/// impl Plugin for Ping {
///     fn name(&self) -> &str { "ping" }
///     fn processor(&self) -> &MessageProcessor { &self.processor }
/// }
/// ```
pub trait Plugin: Send + Sync {
    /// Display name, used in logs.
    fn name(&self) -> &str;

    /// The processor messages are dispatched through.
    fn processor(&self) -> &MessageProcessor;

    /// One-time initialisation hook.
    ///
    /// Runs after every plugin from the default set and the user directory is
    /// registered, so the session's plugin list is complete at this point.
    fn init(&mut self) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Handles one accepted message. Returns the number of matched entries.
    fn process_message(&self, message: &mut InboundMessage) -> usize {
        self.processor().process(message)
    }
}
