#![forbid(unsafe_code)]

mod error;
mod extract;
mod format;
mod header;
mod identity;
mod io;
mod mutate;
mod ops;
mod path;
mod read;
mod write;

pub use error::{MemberFailure, Phase, TarError, TarResult};
pub use format::{EntryInfo, EntryType, BLOCK_SIZE, FOOTER_BLOCKS, MAGIC, VERSION};
pub use header::{checksum, Header};
pub use identity::{IdentityMap, IdentityResolver, SystemIdentity};
pub use io::{drop_trailing, padded_len, write_footer, write_padded};
pub use ops::Archiver;
pub use path::stored_name;
pub use read::{Member, Members};
