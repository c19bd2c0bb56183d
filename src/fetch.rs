//! Zero-copy fetch pipeline.
//!
//! A consumer fetch writes the response header and per-partition metadata
//! with ordinary buffered writes, then hands the record bytes themselves
//! to `sendfile(2)` so they go straight from the log segment's file
//! descriptor to the socket without an extra copy through user space. Any
//! `sendfile` failure (a non-regular-file log backend, a platform where
//! it's unsupported) falls back to a plain read-then-write.
//!
//! A replica fetch additionally reports its resulting LEO back into the
//! ISR engine and the produce waiter, since the follower making the fetch
//! is itself advancing that partition's replication state.

use std::io::Write;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{instrument, warn};

use crate::produce_waiter::ProduceWaiter;
use crate::topic::Partition;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = FetchError> = std::result::Result<T, E>;

/// A contiguous span of a partition's log to ship back to the fetcher.
pub struct SegmentSpan {
    pub fd: RawFd,
    pub offset: i64,
    pub len: usize,
}

/// Writes `header_and_metadata` followed by every span in `spans` to
/// `out`, preferring `sendfile` for each span and falling back to a
/// regular copy if it fails.
pub fn write_fetch_response<W: Write + AsRawFd>(
    out: &mut W,
    header_and_metadata: &[u8],
    spans: &[SegmentSpan],
) -> Result<()> {
    out.write_all(header_and_metadata)?;

    for span in spans {
        if let Err(err) = send_span(out.as_raw_fd(), span) {
            warn!(error = %err, "sendfile failed, falling back to buffered copy");
            copy_span_buffered(out, span)?;
        }
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn send_span(out_fd: RawFd, span: &SegmentSpan) -> Result<()> {
    let mut remaining = span.len;
    let mut offset = span.offset;
    while remaining > 0 {
        let sent = nix::sys::sendfile::sendfile(out_fd, span.fd, Some(&mut offset), remaining)
            .map_err(std::io::Error::from)?;
        if sent == 0 {
            break;
        }
        remaining -= sent;
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn send_span(_out_fd: RawFd, _span: &SegmentSpan) -> Result<()> {
    Err(FetchError::Io(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "sendfile is only wired up on linux",
    )))
}

fn copy_span_buffered<W: Write>(out: &mut W, span: &SegmentSpan) -> Result<()> {
    use std::io::{Read, Seek, SeekFrom};

    // SAFETY: `fd` is owned by the log segment for the duration of this
    // call and outlives it; we never close it here.
    let mut file = unsafe { std::fs::File::from_raw_fd(span.fd) };
    let result = (|| -> std::io::Result<()> {
        file.seek(SeekFrom::Start(span.offset as u64))?;
        let mut remaining = span.len;
        let mut buf = [0u8; 64 * 1024];
        while remaining > 0 {
            let want = remaining.min(buf.len());
            let got = file.read(&mut buf[..want])?;
            if got == 0 {
                break;
            }
            out.write_all(&buf[..got])?;
            remaining -= got;
        }
        Ok(())
    })();
    std::mem::forget(file);
    result.map_err(FetchError::from)
}

use std::os::unix::io::FromRawFd;

/// Records a replica fetch's resulting LEO, recomputes the ISR, and wakes
/// any producer waiting on the resulting HWM advance.
#[instrument(skip(partition, waiter), fields(topic, partition_index = partition_index))]
pub fn record_replica_fetch(
    topic: &str,
    partition_index: i32,
    partition: &Partition,
    replica_id: i32,
    fetched_up_to: i64,
    now: Instant,
    replica_lag_max_messages: i64,
    waiter: &Arc<ProduceWaiter>,
) {
    let hwm_before_isr = partition.hwm();
    partition.recompute_isr(now, replica_lag_max_messages);
    if partition.hwm() > hwm_before_isr {
        waiter.notify_hwm_advanced(topic, partition_index, partition.hwm());
    }

    if let Some(new_hwm) = partition.update_follower_leo(replica_id, fetched_up_to, now) {
        waiter.notify_hwm_advanced(topic, partition_index, new_hwm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn replica_fetch_advances_hwm_and_notifies_waiter() {
        let partition = Partition::new(1, vec![1, 2], 10_000);
        partition.advance_leo(500);
        let waiter = ProduceWaiter::new();
        let now = Instant::now();

        record_replica_fetch("orders", 0, &partition, 2, 500, now, 0, &waiter);
        assert_eq!(partition.hwm(), 500);
    }

    #[test]
    fn buffered_fallback_copies_expected_bytes() {
        let mut tmp = tempfile_like_buffer(b"hello world");
        let span = SegmentSpan {
            fd: tmp.as_raw_fd(),
            offset: 6,
            len: 5,
        };
        let mut out = Cursor::new(Vec::new());
        copy_span_buffered(&mut out, &span).unwrap();
        assert_eq!(out.into_inner(), b"world");
        std::mem::forget(tmp);
    }

    fn tempfile_like_buffer(data: &[u8]) -> std::fs::File {
        use std::io::Write as _;
        let mut path = std::env::temp_dir();
        path.push(format!("kbroker-fetch-test-{}", uuid::Uuid::new_v4()));
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(&path)
            .unwrap();
        file.write_all(data).unwrap();
        file
    }
}
