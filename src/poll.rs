//! C8: Poll & FD Multiplexer.
//!
//! Owns the round-robin dispatch across the admin subsystem's and the
//! transport's file descriptors; the actual blocking wait syscall is
//! supplied by a [`Waiter`] the embedder implements, since the concrete
//! socket/transport stack is an external collaborator (§1, §6).

use std::io;

/// A file descriptor, kept as a plain integer rather than
/// `std::os::unix::io::RawFd` so this module stays platform-agnostic.
pub type Fd = i32;

/// The admin subsystem's side of the poll set: device discovery,
/// registration, and map negotiation traffic.
pub trait AdminHandle {
    fn fds(&self) -> Vec<Fd>;
    fn service(&mut self, fd: Fd) -> io::Result<()>;
}

/// The OSC-like value-message transport's side of the poll set.
pub trait SignalTransport {
    fn fds(&self) -> Vec<Fd>;
    fn service(&mut self, fd: Fd) -> io::Result<()>;
}

/// Blocks until one or more of `fds` is ready, or `block_ms` milliseconds
/// elapse, whichever comes first. Implemented by the embedder on top of
/// whatever OS polling facility it already uses.
pub trait Waiter {
    fn wait(&mut self, fds: &[Fd], block_ms: i64) -> io::Result<Vec<Fd>>;
}

/// Combines an [`AdminHandle`] and a [`SignalTransport`] into a single poll
/// set and dispatches readiness back to whichever one owns the fd.
pub struct Poller<A, T> {
    admin: A,
    transport: T,
}

impl<A: AdminHandle, T: SignalTransport> Poller<A, T> {
    pub fn new(admin: A, transport: T) -> Self {
        Self { admin, transport }
    }

    pub fn admin(&self) -> &A {
        &self.admin
    }

    pub fn admin_mut(&mut self) -> &mut A {
        &mut self.admin
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn num_fds(&self) -> usize {
        self.admin.fds().len() + self.transport.fds().len()
    }

    pub fn get_fds(&self) -> Vec<Fd> {
        let mut fds = self.admin.fds();
        fds.extend(self.transport.fds());
        fds
    }

    /// Service one fd directly, without waiting — used when the embedder's
    /// own event loop (e.g. epoll) already knows a specific fd is ready.
    pub fn service_fd(&mut self, fd: Fd) -> io::Result<()> {
        if self.admin.fds().contains(&fd) {
            self.admin.service(fd)
        } else {
            self.transport.service(fd)
        }
    }

    /// Block up to `block_ms` for any owned fd to become ready, then
    /// service every fd that was. Returns the number serviced.
    pub fn poll(&mut self, waiter: &mut dyn Waiter, block_ms: i64) -> io::Result<usize> {
        let fds = self.get_fds();
        if fds.is_empty() {
            return Ok(0);
        }
        let ready = waiter.wait(&fds, block_ms)?;
        for fd in &ready {
            self.service_fd(*fd)?;
        }
        Ok(ready.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FakeHandle {
        owned: Vec<Fd>,
        serviced: RefCell<Vec<Fd>>,
    }

    impl AdminHandle for FakeHandle {
        fn fds(&self) -> Vec<Fd> {
            self.owned.clone()
        }
        fn service(&mut self, fd: Fd) -> io::Result<()> {
            self.serviced.borrow_mut().push(fd);
            Ok(())
        }
    }

    impl SignalTransport for FakeHandle {
        fn fds(&self) -> Vec<Fd> {
            self.owned.clone()
        }
        fn service(&mut self, fd: Fd) -> io::Result<()> {
            self.serviced.borrow_mut().push(fd);
            Ok(())
        }
    }

    struct AlwaysReady;
    impl Waiter for AlwaysReady {
        fn wait(&mut self, fds: &[Fd], _block_ms: i64) -> io::Result<Vec<Fd>> {
            Ok(fds.to_vec())
        }
    }

    #[test]
    fn num_fds_sums_both_collaborators() {
        let poller = Poller::new(
            FakeHandle { owned: vec![1, 2], serviced: RefCell::new(vec![]) },
            FakeHandle { owned: vec![3], serviced: RefCell::new(vec![]) },
        );
        assert_eq!(poller.num_fds(), 3);
    }

    #[test]
    fn poll_services_every_ready_fd() {
        let mut poller = Poller::new(
            FakeHandle { owned: vec![1], serviced: RefCell::new(vec![]) },
            FakeHandle { owned: vec![2], serviced: RefCell::new(vec![]) },
        );
        let serviced = poller.poll(&mut AlwaysReady, 100).unwrap();
        assert_eq!(serviced, 2);
    }

    #[test]
    fn poll_with_no_fds_returns_immediately() {
        let mut poller = Poller::new(
            FakeHandle { owned: vec![], serviced: RefCell::new(vec![]) },
            FakeHandle { owned: vec![], serviced: RefCell::new(vec![]) },
        );
        assert_eq!(poller.poll(&mut AlwaysReady, 100).unwrap(), 0);
    }
}
