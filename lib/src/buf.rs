use core::fmt;
use core::mem::MaybeUninit;
use core::slice;

/// Size of the receive buffer. Large enough for the biggest IPv4 header
/// followed by any echo reply we are willing to send.
pub const RECV_SIZE: usize = 512;

/// The largest IPv4 header a raw socket may prefix a reply with.
pub(crate) const MAX_IPV4_HEADER: usize = 60;

/// A fixed-size receive buffer which is filled directly by socket reads.
pub struct Buffer<const N: usize = RECV_SIZE> {
    /// Source buffer.
    buf: [MaybeUninit<u8>; N],
    /// Length that has been initialized by a read.
    init: usize,
}

impl Buffer {
    /// Create a new receive buffer.
    pub fn new() -> Self {
        Self {
            buf: [MaybeUninit::uninit(); RECV_SIZE],
            init: 0,
        }
    }
}

impl<const N: usize> Buffer<N> {
    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.init = 0;
    }

    /// Advance the initialized length of the buffer by the given amount.
    #[inline]
    pub fn advance(&mut self, len: usize) {
        self.init = self.init.saturating_add(len).min(N);
    }

    /// Get the initialized bytes of the buffer.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: Everything up to `init` has been written by a read or a copy.
        unsafe { slice::from_raw_parts(self.buf.as_ptr().cast::<u8>(), self.init) }
    }

    /// Get remaining number of uninitialized bytes in the buffer.
    pub fn remaining_mut(&self) -> usize {
        N.saturating_sub(self.init)
    }

    /// Get a mutable uninitialized slice of the buffer.
    #[inline]
    pub fn as_uninit_mut(&mut self) -> &mut [MaybeUninit<u8>] {
        let init = self.init;
        &mut self.buf[init..]
    }

    /// Extend the buffer by copying data from the given slice, truncating what
    /// does not fit.
    pub fn extend_from_slice(&mut self, data: &[u8]) {
        let len = data.len().min(self.remaining_mut());

        for (to, from) in self.as_uninit_mut().iter_mut().zip(&data[..len]) {
            to.write(*from);
        }

        self.init += len;
    }
}

impl<const N: usize> fmt::Debug for Buffer<N> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_bytes().fmt(f)
    }
}
