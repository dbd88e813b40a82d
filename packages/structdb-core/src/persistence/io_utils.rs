//! I/O error classification and retry for seed persistence.

use std::io::ErrorKind;

use crate::error::StructureError;

/// Classifies I/O errors into specific StructureError variants.
pub fn classify_io_error(error: std::io::Error, context: &str) -> StructureError {
    match error.kind() {
        ErrorKind::StorageFull | ErrorKind::OutOfMemory => {
            StructureError::DiskFull(format!("{}: {}", context, error))
        }
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
            StructureError::TransientIoError(format!("{}: {}", context, error))
        }
        _ => StructureError::IoError(format!("{}: {}", context, error)),
    }
}

/// Runs `operation`, retrying only transient I/O errors up to `max_retries` times.
pub fn retry_io_operation<F, T>(
    operation: F,
    max_retries: u32,
    retry_delay_ms: u64,
    context: &str,
) -> Result<T, StructureError>
where
    F: Fn() -> Result<T, StructureError>,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(StructureError::TransientIoError(reason)) if attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    "Transient I/O error in {} (attempt {}/{}): {}",
                    context,
                    attempt,
                    max_retries,
                    reason
                );
                if retry_delay_ms > 0 {
                    std::thread::sleep(std::time::Duration::from_millis(retry_delay_ms));
                }
            }
            Err(err) => return Err(err),
        }
    }
}
