pub mod inspect;
pub mod render;
pub mod worker;

/// Represents a command in the Mandelsync application.
pub trait Command {
    /// Consumes a command object and executes the handler actions
    /// associated with it.
    ///
    /// On failure, an error will be reported.
    fn handle(self) -> eyre::Result<()>;
}
