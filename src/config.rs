use crate::error::LinkConfigError;
use crate::link::{NodeId, PortId};

pub const DEFAULT_DMGP_SIZE_KB: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmgpConfig {
    pub size_kb: usize,
}

impl Default for DmgpConfig {
    fn default() -> Self {
        Self {
            size_kb: DEFAULT_DMGP_SIZE_KB,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockConfig {
    /// Nanoseconds of simulated time per tick.
    pub step: u64,
    /// Total simulated nanoseconds in a run.
    pub duration: u64,
    /// Run each listener on its own scoped thread during a broadcast.
    pub parallel_dispatch: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            step: 1,
            duration: 1_000,
            parallel_dispatch: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    pub name: String,
    /// Propagation delay in simulated nanoseconds, the unit of the clock step.
    /// Values `<= 0` become 1.
    pub delay: i64,
    pub head_end_node: Option<NodeId>,
    pub tail_end_node: Option<NodeId>,
    pub head_end_port: Option<PortId>,
    pub tail_end_port: Option<PortId>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            delay: 1,
            head_end_node: None,
            tail_end_node: None,
            head_end_port: None,
            tail_end_port: None,
        }
    }
}

impl LinkConfig {
    /// Checks the configuration against the names of the links already in the topology.
    pub fn validate<'a, I>(&self, existing_names: I) -> Result<(), LinkConfigError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        if self.name.is_empty() {
            return Err(LinkConfigError::Unnamed);
        }
        if self.name.trim().is_empty() {
            return Err(LinkConfigError::OnlyBlankSpaces);
        }
        if existing_names.into_iter().any(|n| n == self.name) {
            return Err(LinkConfigError::NameAlreadyExists(self.name.clone()));
        }
        if self.head_end_node.is_none() {
            return Err(LinkConfigError::HeadEndNodeMissing);
        }
        if self.tail_end_node.is_none() {
            return Err(LinkConfigError::TailEndNodeMissing);
        }
        if self.head_end_port.is_none() {
            return Err(LinkConfigError::HeadEndNodePortMissing);
        }
        if self.tail_end_port.is_none() {
            return Err(LinkConfigError::TailEndNodePortMissing);
        }
        Ok(())
    }
}
