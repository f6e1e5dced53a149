//! Client configuration.

/// Settings for [`crate::Gdb::new`].
///
/// ```rust
/// use gdbmi_core::ClientConfig;
///
/// let config = ClientConfig::default().with_event_capacity(1024).with_load_scripts(false);
/// assert_eq!(config.event_capacity, 1024);
/// assert!(!config.load_scripts);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig
{
    /// Events buffered per subscriber before the oldest are dropped.
    pub event_capacity: usize,
    /// Whether [`crate::Gdb::init`] uploads the extension scripts.
    pub load_scripts: bool,
}

impl ClientConfig
{
    /// Default broadcast buffer for domain events.
    pub const DEFAULT_EVENT_CAPACITY: usize = 256;

    /// Set the per-subscriber event buffer. Zero is raised to one.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self
    {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Choose whether `init` uploads the extension scripts.
    #[must_use]
    pub fn with_load_scripts(mut self, load: bool) -> Self
    {
        self.load_scripts = load;
        self
    }
}

impl Default for ClientConfig
{
    fn default() -> Self
    {
        Self {
            event_capacity: Self::DEFAULT_EVENT_CAPACITY,
            load_scripts: true,
        }
    }
}
