//! Kind of a misc for various CAN related things

/// Polls `done` up to `limit` times. Returns `true` as soon as it reports
/// true, `false` if the limit ran out. Hardware acknowledgement waits go
/// through here so a dead clock can never hang the caller.
#[cfg_attr(not(feature = "imxrt1062"), allow(dead_code))]
pub(crate) fn wait_until(limit: u32, mut done: impl FnMut() -> bool) -> bool {
    for _ in 0..limit {
        if done() {
            return true;
        }
    }

    done()
}
