use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenParamsError {
    #[error("invalid 'token_bound_cidrs' entry {value:?}: {reason}")]
    InvalidBoundCidr { value: String, reason: String },
    #[error("'token_num_uses' cannot be negative")]
    NegativeNumUses,
    #[error("invalid 'token_type' value {0:?}")]
    InvalidTokenType(String),
    #[error("'token_ttl' cannot be greater than 'token_max_ttl'")]
    TtlExceedsMaxTtl,
    #[error(
        "'token_type' cannot be 'batch' or 'default-batch' when set to generate periodic tokens"
    )]
    BatchWithPeriod,
    #[error(
        "'token_type' cannot be 'batch' or 'default-batch' when set to generate tokens with limited use count"
    )]
    BatchWithNumUses,
}

pub type TokenParamsResult<T> = Result<T, TokenParamsError>;
