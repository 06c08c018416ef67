use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TradeError {
    #[error("{buyer} doesn't have enough funds to purchase an item for {cost}gp.")]
    InsufficientFunds { buyer: String, cost: Decimal },

    #[error("item {0} is no longer in the source inventory")]
    StaleItemReference(String),

    #[error("Not enough items on vendor.")]
    ZeroQuantityRequest,

    #[error("unknown trade type: {0}")]
    UnknownTradeType(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("actor not found: {0}")]
    ActorNotFound(String),

    #[error("{0} cannot trade with itself")]
    SelfTrade(String),

    #[error(transparent)]
    Host(anyhow::Error),
}

/// Host failures that started out as a `TradeError` come back unwrapped.
impl From<anyhow::Error> for TradeError {
    fn from(err: anyhow::Error) -> Self {
        err.downcast::<TradeError>().unwrap_or_else(TradeError::Host)
    }
}

pub type TradeResult<T> = Result<T, TradeError>;

#[cfg(test)]
mod test {
    use crate::error::TradeError;
    use anyhow::anyhow;

    #[test]
    fn should_unwrap_trade_errors_raised_by_the_host() {
        let err: TradeError = anyhow::Error::from(TradeError::ActorNotFound("nobody".to_string())).into();
        assert!(matches!(err, TradeError::ActorNotFound(id) if id == "nobody"));

        let err: TradeError = anyhow!("disk on fire").into();
        assert!(matches!(err, TradeError::Host(_)));
        assert_eq!(err.to_string(), "disk on fire");
    }
}
