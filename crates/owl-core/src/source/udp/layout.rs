/// Receive buffer size; observed gateway packets stay well below 1 KiB.
pub const RECV_BUFFER_SIZE: usize = 4096;
