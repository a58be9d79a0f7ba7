use regex::Regex;

use crate::error::PluginResult;
use crate::plugin::{Plugin, PluginDescriptor};
use crate::processor::{MessageProcessor, ProcessorSpec};
use crate::session::SessionHandle;

crate::export_plugin! {
    /// Replies "Hello!" to greetings.
    pub GREETER = PluginDescriptor::new("greeter", Greeter::create)
        .with_desc("Replies to greetings")
}

/// Answers `hi` and `hello`.
pub struct Greeter {
    processor: MessageProcessor,
}

impl Greeter {
    pub fn new(session: SessionHandle) -> PluginResult<Self> {
        let mut processor = MessageProcessor::new();
        processor.register(
            Regex::new(r"(?i)^(hi|hello)")?,
            ProcessorSpec::new(move |msg, _| {
                session.reply("Hello!", msg)?;
                Ok(())
            })
            .use_raw_text(true),
        );
        Ok(Self { processor })
    }

    fn create(session: SessionHandle) -> Box<dyn Plugin> {
        match Self::new(session) {
            Ok(greeter) => Box::new(greeter),
            Err(e) => {
                tracing::error!(error = %e, "Greeter pattern failed to compile");
                Box::new(Self {
                    processor: MessageProcessor::new(),
                })
            }
        }
    }
}

impl Plugin for Greeter {
    fn name(&self) -> &str {
        "greeter"
    }

    fn processor(&self) -> &MessageProcessor {
        &self.processor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::find;
    use lychii_core::{Channel, InboundMessage, Transport, TransportCommand, User, create_transport_channels};
    use serde_json::Value;

    #[test]
    fn test_greeter_is_in_catalog() {
        let desc = find("greeter").unwrap();
        assert_eq!(desc.desc, "Replies to greetings");
    }

    #[test]
    fn test_greeter_replies_to_greetings() {
        let (channels, mut link) = create_transport_channels(1);
        channels.transport.start().unwrap();
        let session = SessionHandle::new(channels.transport, Value::Null);
        let greeter = (GREETER.create)(session);

        let channel = Channel::named("D1", "dm");
        let mut hello = InboundMessage::new("Hello there", User::default(), channel.clone());
        let mut prefixed = InboundMessage::new("highway", User::default(), channel.clone());
        let mut other = InboundMessage::new("oh hi", User::default(), channel.clone());

        assert_eq!(greeter.process_message(&mut hello), 1);
        assert_eq!(greeter.process_message(&mut prefixed), 1);
        assert_eq!(greeter.process_message(&mut other), 0);

        assert_eq!(link.commands.try_recv().unwrap(), TransportCommand::Start);
        for _ in 0..2 {
            assert_eq!(
                link.commands.try_recv().unwrap(),
                TransportCommand::Reply {
                    text: "Hello!".into(),
                    channel: channel.clone(),
                    thread_ts: None,
                }
            );
        }
        assert!(link.commands.try_recv().is_err());
    }
}
