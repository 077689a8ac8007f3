//! Error types for the protocol layer.

/// Errors raised while building protocol values from transport input.
///
/// The queue engine itself never fails; these only surface at the edge,
/// where raw chat text is turned into identifiers and commands.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A user or room name was empty or only whitespace.
    /// The payload names which kind of identifier it was.
    #[error("{0} identifier must not be empty")]
    EmptyIdentifier(&'static str),

    /// An argument started with `@` but named nobody.
    #[error("invalid mention: {0:?}")]
    InvalidMention(String),
}
