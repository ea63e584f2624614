/// Possible errors from the DHT11 driver.
#[derive(Debug, PartialEq, Eq)]
pub enum DhtError<E> {
    /// The sensor did not pull the line low after the start signal.
    NoResponse,
    /// The sensor started its handshake but never finished it.
    ResponseTimeout,
    /// A data bit phase (low sync or high pulse) exceeded its timeout.
    BitTimeout,
    /// Checksum did not match the received data.
    ChecksumMismatch,
    /// Error from the GPIO pin (input/output).
    Pin(E),
}

impl<E> DhtError<E> {
    /// Returns the payload-free kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DhtError::NoResponse => ErrorKind::NoResponse,
            DhtError::ResponseTimeout => ErrorKind::ResponseTimeout,
            DhtError::BitTimeout => ErrorKind::BitTimeout,
            DhtError::ChecksumMismatch => ErrorKind::ChecksumMismatch,
            DhtError::Pin(_) => ErrorKind::Pin,
        }
    }
}

impl<E> From<E> for DhtError<E> {
    fn from(value: E) -> Self {
        Self::Pin(value)
    }
}

/// Kind of a failed read, without the pin error payload.
///
/// Used for logging and statistics where the GPIO error type is not needed.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NoResponse,
    ResponseTimeout,
    BitTimeout,
    ChecksumMismatch,
    Pin,
}

impl ErrorKind {
    /// True for failures raised while talking to the sensor, as opposed to
    /// a complete frame that failed its checksum.
    pub fn is_transport(self) -> bool {
        !matches!(self, ErrorKind::ChecksumMismatch)
    }
}
