#![forbid(unsafe_code)]

use std::fs::OpenOptions;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use crate::tar::error::{TarError, TarResult};
use crate::tar::format::{Block, BLOCK_SIZE, FOOTER_BLOCKS};

const ZERO_BLOCK: Block = [0u8; BLOCK_SIZE];

/// `len` rounded up to the next block boundary.
pub fn padded_len(len: u64) -> u64 {
    let block = BLOCK_SIZE as u64;
    len.div_ceil(block) * block
}

pub fn is_zero_block(block: &Block) -> bool {
    block.iter().all(|&b| b == 0)
}

/// Writes `content`, then zeros up to the next block boundary.
pub fn write_padded(w: &mut dyn Write, content: &[u8]) -> TarResult<()> {
    w.write_all(content)?;
    let pad = (padded_len(content.len() as u64) - content.len() as u64) as usize;
    if pad != 0 {
        w.write_all(&ZERO_BLOCK[..pad])?;
    }
    Ok(())
}

pub fn write_footer(w: &mut dyn Write) -> TarResult<()> {
    for _ in 0..FOOTER_BLOCKS {
        w.write_all(&ZERO_BLOCK)?;
    }
    Ok(())
}

/// Shortens the file at `path` by `n_bytes`. Asking for more than the file
/// holds leaves it empty.
pub fn drop_trailing(path: &Path, n_bytes: u64) -> TarResult<()> {
    let truncate_err = |source| TarError::Truncate {
        path: path.to_path_buf(),
        source,
    };

    let file = OpenOptions::new().write(true).open(path).map_err(truncate_err)?;
    let len = file.metadata().map_err(truncate_err)?.len();
    file.set_len(len.saturating_sub(n_bytes)).map_err(truncate_err)?;
    Ok(())
}

/// Reads one block. `Ok(None)` on a clean end of stream; a block cut short
/// by end of stream is an `UnexpectedEof` error.
pub fn read_block(r: &mut dyn Read) -> TarResult<Option<Block>> {
    let mut block = ZERO_BLOCK;
    let mut filled = 0;
    while filled < BLOCK_SIZE {
        match r.read(&mut block[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    match filled {
        0 => Ok(None),
        BLOCK_SIZE => Ok(Some(block)),
        short => Err(TarError::Io(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("truncated block: {short} of {BLOCK_SIZE} bytes"),
        ))),
    }
}
