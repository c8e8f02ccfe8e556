/// How many messages to request for one room.
///
/// Known limitation: this trusts the server's total counter to be
/// monotonically non-decreasing and assumes no already-archived message was
/// edited or deleted. A violated assumption shows up as undercounting (we
/// fetch too few) or as messages missed entirely; it is not detected here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPlan {
    /// Total message count the server reports for the room, if any.
    pub server_total: Option<u64>,
    /// Messages already present in the local archive (0 when not running
    /// incrementally or no prior archive exists).
    pub stored: u64,
}

impl FetchPlan {
    pub fn new(server_total: Option<u64>, stored: u64) -> Self {
        Self {
            server_total,
            stored,
        }
    }

    /// Number of messages to fetch, or `None` when there is nothing to do:
    /// the server reported no counter (room has no messages) or it holds no
    /// more messages than we already store.
    pub fn delta(&self) -> Option<u64> {
        let total = self.server_total?;
        if total > self.stored {
            Some(total - self.stored)
        } else {
            None
        }
    }
}
