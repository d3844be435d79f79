//! Host entity types.

/// An application type whose instances carry a state machine.
///
/// `host_members` lists the names the host already uses for its own
/// accessors. Binding fails if any of them is also a member of the machine,
/// so a call site can never be unsure which of the two it reaches.
///
/// # Example
///
/// ```rust
/// use statehold::Host;
///
/// struct Article {
///     sku: String,
/// }
///
/// impl Host for Article {
///     fn host_members() -> &'static [&'static str] {
///         &["sku"]
///     }
/// }
/// ```
pub trait Host: 'static {
    fn host_members() -> &'static [&'static str] {
        &[]
    }
}
