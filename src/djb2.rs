/// Hashes a cache file name the way the reference tables store it.
///
/// This is the djb2 variant used by the client (`h * 31 + c`), wrapping on
/// overflow, so the legacy map archives `m{x}_{z}` / `l{x}_{z}` can be looked
/// up by name.
pub fn djb2_hash<T: AsRef<str>>(string: T) -> u32 {
    string
        .as_ref()
        .bytes()
        .fold(0u32, |hash, c| (hash << 5).wrapping_sub(hash).wrapping_add(c as u32))
}
