use super::handle::NodeId;

/// Hands out node ids for a single compilation.
///
/// A fresh allocator is created for every compile call, so numbering always starts at 1
/// and never leaks between compilations.
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    last: u32,
}

impl IdAllocator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next_id(&mut self) -> NodeId {
        self.last += 1;
        NodeId::new(self.last)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) fn reset(&mut self) {
        self.last = 0;
    }
}
