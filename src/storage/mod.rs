//!  Record files are plain text, see [codec].
//!  The basic idea is:
//!   - One record per line, every line ends with `\n`.
//!   - A line is `<start>,<end>` or `<start>,<end>,<category>`.
//!   - Timestamps keep 100ns precision and the UTC offset they were taken in.
//!
//!  Reading and writing the actual file lives in [crate::fs::record_file]; this module never
//!  touches the disk.

pub mod codec;
