use thiserror;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SM2Error {
    #[error("sm2: invalid length")]
    InvalidLength,

    #[error("sm2: invalid encoding")]
    InvalidEncoding,

    #[error("sm2: invalid scalar")]
    InvalidScalar,

    #[error("sm2: invalid point")]
    InvalidPoint,

    #[error("sm2: decryption error")]
    DecryptionError,

    #[error("sm2: verification failure")]
    VerificationFailure,

    #[error("sm2: randomness source failure")]
    RandomnessFailure,

    #[error("sm2: too many retries")]
    ResourceExhausted,

    #[error("sm2: uid too long")]
    InvalidUid,

    #[error("sm2: key exchange step out of order")]
    InvalidState,
}

pub type Result<T> = core::result::Result<T, SM2Error>;
