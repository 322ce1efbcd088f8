/// Filesystem transport for reading split files line by line.
pub mod fs;
