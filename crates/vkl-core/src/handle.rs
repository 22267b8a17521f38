use std::fmt;

/// Raw value of the null handle. Never routable.
pub const NULL_HANDLE: u64 = 0;

/// Type tag carried by every registry entry, for diagnostics and teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Instance,
    PhysicalDevice,
    Device,
    Queue,
    SwapChain,
    Display,
}

impl HandleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandleKind::Instance => "VkInstance",
            HandleKind::PhysicalDevice => "VkPhysicalDevice",
            HandleKind::Device => "VkDevice",
            HandleKind::Queue => "VkQueue",
            HandleKind::SwapChain => "VkSwapChainWSI",
            HandleKind::Display => "VkDisplayWSI",
        }
    }
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
