use std::io::{self, BufRead, Seek, SeekFrom};

use log::debug;

/// Probe granularity; matches the typical page-cache block.
pub const BLOCK_SIZE: u64 = 4096;
/// Files under this many blocks are not worth seeking in.
const MIN_BLOCKS: u64 = 5;
/// Safety cap on binary-search probes; at 4096-byte blocks this covers files
/// of hundreds of gigabytes. On cap exhaustion the best candidate so far is
/// used rather than failing.
const MAX_PROBES: u32 = 20;

/// Repositions `reader` at (or immediately before) the first line whose
/// leading timestamp is just under `target`, via binary search over
/// fixed-size blocks of a time-ordered file of `file_len` bytes.
///
/// Best effort only: the cursor lands within roughly two blocks of the true
/// first qualifying line and never past it. Downstream consumers still
/// filter by timestamp. Targets below the first block's timestamp leave the
/// cursor at offset 0; files under five blocks are left untouched.
/// Non-seekable sources never reach here — seekability is a type property,
/// so callers skip the optimization for streams like stdin.
pub fn seek_just_before<R: BufRead + Seek>(
    reader: &mut R,
    file_len: u64,
    target: i64,
) -> io::Result<()> {
    let last_block = file_len / BLOCK_SIZE;
    if last_block < MIN_BLOCKS {
        return Ok(());
    }

    let mut lo = 0u64;
    let mut hi = last_block;
    let mut best = 0u64;
    let mut probes = MAX_PROBES;
    let mut line = String::new();

    while probes > 0 && hi - lo > 1 {
        probes -= 1;
        let mid = (lo + hi) / 2;
        reader.seek(SeekFrom::Start(mid * BLOCK_SIZE))?;
        // The first line after a block seek is likely partial; discard it.
        line.clear();
        reader.read_line(&mut line)?;
        line.clear();
        reader.read_line(&mut line)?;
        let index = match leading_timestamp(&line) {
            Some(index) => index,
            None => {
                // Unparsable probe line; settle for the best candidate.
                debug!("seek probe at block {mid} hit an unparsable line; stopping early");
                break;
            }
        };
        debug!("seek probe: lo={lo} hi={hi} mid={mid} index={index} best={best}");
        if index < target {
            lo = mid;
            best = reader.stream_position()?;
        } else {
            hi = mid;
        }
    }

    reader.seek(SeekFrom::Start(best))?;
    Ok(())
}

fn leading_timestamp(line: &str) -> Option<i64> {
    line.split_whitespace().next()?.parse().ok()
}
