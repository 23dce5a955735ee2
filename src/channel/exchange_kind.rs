//! The exchange-type string carried by `exchange.declare`. Grounded on lapin's `ExchangeKind`
//! (named directly in `src/channel.rs`'s `exchange_declare` signature),
//! typed here over the four kinds RabbitMQ ships built in.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExchangeKind {
    Direct,
    Fanout,
    Topic,
    Headers,
    Custom(String),
}

impl ExchangeKind {
    pub fn kind(&self) -> &str {
        match self {
            ExchangeKind::Direct => "direct",
            ExchangeKind::Fanout => "fanout",
            ExchangeKind::Topic => "topic",
            ExchangeKind::Headers => "headers",
            ExchangeKind::Custom(s) => s,
        }
    }
}

impl Default for ExchangeKind {
    fn default() -> Self {
        ExchangeKind::Direct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_kind_round_trips_as_its_own_string() {
        assert_eq!(ExchangeKind::Custom("x-delayed-message".to_string()).kind(), "x-delayed-message");
    }

    #[test]
    fn builtin_kinds_match_rabbitmq_names() {
        assert_eq!(ExchangeKind::Topic.kind(), "topic");
    }
}
