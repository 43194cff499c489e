//! Request tickets: every backend call that may write grid content carries one, and only the
//! most recently issued ticket may apply its response.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub struct RequestSequencer {
    issued: u64,
    current: Option<u64>,
    suppress_stale: bool,
}

impl RequestSequencer {
    /// With `suppress_stale` off every response is accepted (last write wins).
    pub fn new(suppress_stale: bool) -> Self {
        Self {
            issued: 0,
            current: None,
            suppress_stale,
        }
    }

    pub fn issue(&mut self) -> RequestTicket {
        self.issued += 1;
        self.current = Some(self.issued);
        RequestTicket(self.issued)
    }

    /// Retire every outstanding ticket without issuing a new one.
    pub fn invalidate(&mut self) {
        self.current = None;
    }

    pub fn accepts(&self, ticket: RequestTicket) -> bool {
        !self.suppress_stale || self.current == Some(ticket.0)
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }
}
